use std::collections::BTreeMap;

use stereotri_core::{Pt2, Real};
use thiserror::Error;

/// Errors raised while building frame bundles.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Parallel arrays of a point set have different lengths.
    #[error("point set arrays must have equal lengths: {ids} ids, {img} image, {obj} board")]
    MismatchedLengths { ids: usize, img: usize, obj: usize },
}

/// All detections of one camera at one synchronized instant.
///
/// Parallel arrays aligned by position: `point_id[i]` was detected at pixel
/// `img_loc[i]` and corresponds to board-space location `obj_loc[i]`.
/// Identifiers are assumed unique within one set; duplicated ids make
/// correspondence matching undefined.
#[derive(Clone, Debug, PartialEq)]
pub struct PointSet {
    pub point_id: Vec<i64>,
    pub img_loc: Vec<Pt2>,
    pub obj_loc: Vec<Pt2>,
}

impl PointSet {
    pub fn new(
        point_id: Vec<i64>,
        img_loc: Vec<Pt2>,
        obj_loc: Vec<Pt2>,
    ) -> Result<Self, BundleError> {
        if point_id.len() != img_loc.len() || point_id.len() != obj_loc.len() {
            return Err(BundleError::MismatchedLengths {
                ids: point_id.len(),
                img: img_loc.len(),
                obj: obj_loc.len(),
            });
        }
        Ok(Self {
            point_id,
            img_loc,
            obj_loc,
        })
    }

    pub fn len(&self) -> usize {
        self.point_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point_id.is_empty()
    }
}

/// One camera's observation at one synchronized instant.
///
/// `points` is `None` when the camera produced no detections at this
/// instant. No raw image is carried on this path; the pipeline consumes
/// already-persisted detections only.
#[derive(Clone, Debug)]
pub struct FrameSnapshot {
    pub port: u32,
    pub frame_index: i64,
    pub frame_time: Real,
    pub points: Option<PointSet>,
}

/// One synchronized instant across the whole camera array.
///
/// Every active port has an entry, `None` where the camera was absent, so
/// consumers can tell "camera had nothing" from "camera never considered".
#[derive(Clone, Debug)]
pub struct SyncBundle {
    pub sync_index: i64,
    pub frames: BTreeMap<u32, Option<FrameSnapshot>>,
}

impl SyncBundle {
    /// Build a bundle covering `ports`, filling cameras without a snapshot
    /// with an explicit empty entry.
    pub fn new(
        sync_index: i64,
        ports: &[u32],
        mut snapshots: BTreeMap<u32, FrameSnapshot>,
    ) -> Self {
        let frames = ports
            .iter()
            .map(|&port| (port, snapshots.remove(&port)))
            .collect();
        Self { sync_index, frames }
    }

    /// The point set of one camera, if that camera observed anything.
    pub fn points(&self, port: u32) -> Option<&PointSet> {
        self.frames
            .get(&port)
            .and_then(|f| f.as_ref())
            .and_then(|f| f.points.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[i64]) -> PointSet {
        let locs: Vec<Pt2> = ids.iter().map(|&i| Pt2::new(i as Real, 0.0)).collect();
        PointSet::new(ids.to_vec(), locs.clone(), locs).unwrap()
    }

    #[test]
    fn point_set_rejects_mismatched_lengths() {
        let err = PointSet::new(vec![1, 2], vec![Pt2::new(0.0, 0.0)], vec![]);
        assert!(matches!(
            err,
            Err(BundleError::MismatchedLengths {
                ids: 2,
                img: 1,
                obj: 0
            })
        ));
    }

    #[test]
    fn bundle_has_entry_for_every_port() {
        let mut snapshots = BTreeMap::new();
        snapshots.insert(
            1,
            FrameSnapshot {
                port: 1,
                frame_index: 0,
                frame_time: 0.0,
                points: Some(set(&[7])),
            },
        );
        let bundle = SyncBundle::new(0, &[0, 1, 2], snapshots);

        assert_eq!(bundle.frames.len(), 3);
        assert!(bundle.frames[&0].is_none());
        assert!(bundle.frames[&2].is_none());
        assert_eq!(bundle.points(1).unwrap().point_id, vec![7]);
        assert!(bundle.points(0).is_none());
    }
}
