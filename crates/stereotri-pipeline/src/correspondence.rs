use std::collections::{BTreeMap, HashMap};

use stereotri_core::Pt2;

use crate::bundle::{PointSet, SyncBundle};

/// Unordered camera pair, normalized so the smaller port comes first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CameraPair {
    pub a: u32,
    pub b: u32,
}

impl CameraPair {
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }
}

impl std::fmt::Display for CameraPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.a, self.b)
    }
}

/// Points observed by both cameras of one pair at one instant.
///
/// `point_ids` is ascending; `img_loc_a[i]` and `img_loc_b[i]` are the two
/// cameras' pixel observations of `point_ids[i]`.
#[derive(Clone, Debug)]
pub struct PairedPoints {
    pub pair: CameraPair,
    pub sync_index: i64,
    pub point_ids: Vec<i64>,
    pub img_loc_a: Vec<Pt2>,
    pub img_loc_b: Vec<Pt2>,
}

impl PairedPoints {
    pub fn len(&self) -> usize {
        self.point_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point_ids.is_empty()
    }
}

/// Correspondences for every camera pair at one instant.
///
/// Every pair the builder knows about has an entry; `None` means the pair
/// was checked and had no overlap (or one side was absent), which is
/// distinct from a pair never being considered.
#[derive(Clone, Debug)]
pub struct SyncedPairedPoints {
    pub sync_index: i64,
    pub pairs: BTreeMap<CameraPair, Option<PairedPoints>>,
}

/// Builds pairwise point correspondences from sync bundles.
///
/// The pair list is fixed at construction from the stable port ordering, so
/// every bundle is checked against the same pairs.
#[derive(Clone, Debug)]
pub struct PairedPointsBuilder {
    pairs: Vec<CameraPair>,
}

impl PairedPointsBuilder {
    pub fn new(ports: &[u32]) -> Self {
        let mut pairs = Vec::new();
        for (i, &a) in ports.iter().enumerate() {
            for &b in &ports[i + 1..] {
                pairs.push(CameraPair::new(a, b));
            }
        }
        Self { pairs }
    }

    pub fn pairs(&self) -> &[CameraPair] {
        &self.pairs
    }

    /// Correspondences for every pair in one bundle.
    pub fn synched_paired_points(&self, bundle: &SyncBundle) -> SyncedPairedPoints {
        let pairs = self
            .pairs
            .iter()
            .map(|&pair| {
                let matched = match (bundle.points(pair.a), bundle.points(pair.b)) {
                    (Some(set_a), Some(set_b)) => {
                        match_point_sets(pair, bundle.sync_index, set_a, set_b)
                    }
                    _ => None,
                };
                (pair, matched)
            })
            .collect();
        SyncedPairedPoints {
            sync_index: bundle.sync_index,
            pairs,
        }
    }
}

/// Intersect two point sets by identifier and gather aligned coordinates.
///
/// Matching is by identifier, never by array position; the two sets may
/// order or subset their points differently. Returns `None` for an empty
/// intersection.
fn match_point_sets(
    pair: CameraPair,
    sync_index: i64,
    set_a: &PointSet,
    set_b: &PointSet,
) -> Option<PairedPoints> {
    let index_a: HashMap<i64, usize> = set_a
        .point_id
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i))
        .collect();
    let index_b: HashMap<i64, usize> = set_b
        .point_id
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i))
        .collect();

    let mut common: Vec<i64> = index_a
        .keys()
        .filter(|id| index_b.contains_key(id))
        .copied()
        .collect();
    if common.is_empty() {
        return None;
    }
    common.sort_unstable();

    let img_loc_a = common.iter().map(|id| set_a.img_loc[index_a[id]]).collect();
    let img_loc_b = common.iter().map(|id| set_b.img_loc[index_b[id]]).collect();

    Some(PairedPoints {
        pair,
        sync_index,
        point_ids: common,
        img_loc_a,
        img_loc_b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::FrameSnapshot;
    use stereotri_core::Real;

    fn set(ids: &[i64]) -> PointSet {
        let img: Vec<Pt2> = ids
            .iter()
            .map(|&i| Pt2::new(i as Real * 10.0, i as Real))
            .collect();
        let obj = vec![Pt2::new(0.0, 0.0); ids.len()];
        PointSet::new(ids.to_vec(), img, obj).unwrap()
    }

    fn bundle(entries: &[(u32, Option<&[i64]>)]) -> SyncBundle {
        let ports: Vec<u32> = entries.iter().map(|(p, _)| *p).collect();
        let snapshots = entries
            .iter()
            .filter_map(|&(port, ids)| {
                ids.map(|ids| {
                    (
                        port,
                        FrameSnapshot {
                            port,
                            frame_index: 0,
                            frame_time: 0.0,
                            points: Some(set(ids)),
                        },
                    )
                })
            })
            .collect();
        SyncBundle::new(0, &ports, snapshots)
    }

    #[test]
    fn enumerates_all_unordered_pairs() {
        let builder = PairedPointsBuilder::new(&[0, 1, 2]);
        assert_eq!(
            builder.pairs(),
            &[
                CameraPair::new(0, 1),
                CameraPair::new(0, 2),
                CameraPair::new(1, 2)
            ]
        );
    }

    #[test]
    fn matches_by_identifier_not_position() {
        let builder = PairedPointsBuilder::new(&[0, 1]);
        // Same ids, permuted and subset differently on each side.
        let b = bundle(&[(0, Some(&[5, 3, 9])), (1, Some(&[9, 2, 5]))]);
        let synched = builder.synched_paired_points(&b);

        let matched = synched.pairs[&CameraPair::new(0, 1)].as_ref().unwrap();
        assert_eq!(matched.point_ids, vec![5, 9]);
        // Coordinates gathered from each side's own positions.
        assert_eq!(matched.img_loc_a[0], Pt2::new(50.0, 5.0));
        assert_eq!(matched.img_loc_b[0], Pt2::new(50.0, 5.0));
        assert_eq!(matched.img_loc_a[1], Pt2::new(90.0, 9.0));
    }

    #[test]
    fn disjoint_sets_yield_explicit_none() {
        let builder = PairedPointsBuilder::new(&[0, 1]);
        let b = bundle(&[(0, Some(&[1, 2])), (1, Some(&[3, 4]))]);
        let synched = builder.synched_paired_points(&b);

        let entry = &synched.pairs[&CameraPair::new(0, 1)];
        assert!(entry.is_none());
        // The pair was still checked: the entry exists.
        assert!(synched.pairs.contains_key(&CameraPair::new(0, 1)));
    }

    #[test]
    fn absent_camera_yields_none_without_matching() {
        let builder = PairedPointsBuilder::new(&[0, 1, 2]);
        let b = bundle(&[(0, Some(&[1])), (1, None), (2, Some(&[1]))]);
        let synched = builder.synched_paired_points(&b);

        assert!(synched.pairs[&CameraPair::new(0, 1)].is_none());
        assert!(synched.pairs[&CameraPair::new(1, 2)].is_none());
        assert!(synched.pairs[&CameraPair::new(0, 2)].is_some());
    }
}
