use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::camera::CameraData;
use crate::math::Mat34;

/// Stereo geometry for one camera pair: both cameras plus their
/// normalized-coordinate projection matrices.
#[derive(Clone, Debug)]
pub struct StereoPair<'a> {
    pub cam_a: &'a CameraData,
    pub cam_b: &'a CameraData,
    pub proj_a: Mat34,
    pub proj_b: Mat34,
}

/// The calibrated camera array, keyed by port.
///
/// Read-only collaborator for the triangulation pipeline: it answers which
/// ports exist and whether a given pair has a usable geometric relationship.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CameraArray {
    pub cameras: BTreeMap<u32, CameraData>,
}

impl CameraArray {
    pub fn new(cameras: impl IntoIterator<Item = CameraData>) -> Self {
        Self {
            cameras: cameras.into_iter().map(|c| (c.port, c)).collect(),
        }
    }

    /// Ports in ascending order. This ordering is the stable camera ordering
    /// used everywhere downstream.
    pub fn ports(&self) -> Vec<u32> {
        self.cameras.keys().copied().collect()
    }

    /// Stereo geometry for a camera pair, or `None` if either camera is
    /// missing or has no extrinsics. Absence is always explicit; there is no
    /// default geometry.
    pub fn stereo_pair(&self, port_a: u32, port_b: u32) -> Option<StereoPair<'_>> {
        let cam_a = self.cameras.get(&port_a)?;
        let cam_b = self.cameras.get(&port_b)?;
        let proj_a = cam_a.projection_matrix()?;
        let proj_b = cam_b.projection_matrix()?;
        Some(StereoPair {
            cam_a,
            cam_b,
            proj_a,
            proj_b,
        })
    }
}
