use log::debug;
use nalgebra::SMatrix;
use stereotri_core::{CameraArray, CameraData, Mat34, Pt2, Pt3, Real, StereoPair};

use crate::correspondence::{CameraPair, PairedPoints};

/// Triangulated points for one camera pair at one instant.
///
/// Arrays are parallel: `xyz[i]` and `reproj_errors[i]` belong to
/// `point_ids[i]`. Produced as a new value; the input correspondences are
/// never mutated.
#[derive(Clone, Debug)]
pub struct TriangulatedPair {
    pub pair: CameraPair,
    pub sync_index: i64,
    pub point_ids: Vec<i64>,
    pub xyz: Vec<Pt3>,
    /// Mean pixel reprojection distance over the two views.
    pub reproj_errors: Vec<Real>,
}

/// Outcome of triangulating one pair's correspondences.
///
/// `GeometryUnavailable` is deliberately distinct from a triangulated pair
/// with zero points: the first means the pair could not be checked at all,
/// the second that it was checked and nothing survived.
#[derive(Clone, Debug)]
pub enum PairTriangulation {
    Triangulated(TriangulatedPair),
    GeometryUnavailable,
}

/// Triangulates paired points against a calibrated camera array.
#[derive(Clone, Debug)]
pub struct ArrayTriangulator<'a> {
    array: &'a CameraArray,
}

impl<'a> ArrayTriangulator<'a> {
    pub fn new(array: &'a CameraArray) -> Self {
        Self { array }
    }

    /// Triangulate every matched point of one pair.
    ///
    /// Points are independent: each is undistorted to normalized
    /// coordinates and solved by two-view DLT. Points with a degenerate
    /// solution (homogeneous scale near zero, behind either camera, or a
    /// singular intrinsics matrix) are dropped from the output.
    pub fn triangulate_pair(&self, paired: &PairedPoints) -> PairTriangulation {
        let Some(stereo) = self.array.stereo_pair(paired.pair.a, paired.pair.b) else {
            return PairTriangulation::GeometryUnavailable;
        };

        let mut point_ids = Vec::with_capacity(paired.len());
        let mut xyz = Vec::with_capacity(paired.len());
        let mut reproj_errors = Vec::with_capacity(paired.len());

        for (i, &point_id) in paired.point_ids.iter().enumerate() {
            let px_a = paired.img_loc_a[i];
            let px_b = paired.img_loc_b[i];
            match triangulate_observation(&stereo, &px_a, &px_b) {
                Some((world, err)) => {
                    point_ids.push(point_id);
                    xyz.push(world);
                    reproj_errors.push(err);
                }
                None => {
                    debug!(
                        "dropping degenerate point {point_id} at sync {} for pair {}",
                        paired.sync_index, paired.pair
                    );
                }
            }
        }

        PairTriangulation::Triangulated(TriangulatedPair {
            pair: paired.pair,
            sync_index: paired.sync_index,
            point_ids,
            xyz,
            reproj_errors,
        })
    }
}

fn triangulate_observation(
    stereo: &StereoPair<'_>,
    px_a: &Pt2,
    px_b: &Pt2,
) -> Option<(Pt3, Real)> {
    let n_a = stereo.cam_a.undistort_pixel(px_a).ok()?;
    let n_b = stereo.cam_b.undistort_pixel(px_b).ok()?;

    let world = triangulate_point_pair(&stereo.proj_a, &n_a, &stereo.proj_b, &n_b)?;
    let err = reprojection_error(stereo.cam_a, stereo.cam_b, &world, px_a, px_b)?;
    Some((world, err))
}

/// Two-view linear (DLT) triangulation in normalized image coordinates.
///
/// Builds the standard 4x4 system from `u * P.row(2) - P.row(0)` rows and
/// takes the SVD null vector. Returns `None` when the SVD fails or the
/// homogeneous scale is degenerate.
pub fn triangulate_point_pair(
    proj_a: &Mat34,
    n_a: &Pt2,
    proj_b: &Mat34,
    n_b: &Pt2,
) -> Option<Pt3> {
    let mut a = SMatrix::<Real, 4, 4>::zeros();
    for (view, (proj, n)) in [(proj_a, n_a), (proj_b, n_b)].into_iter().enumerate() {
        let row0 = proj.row(0);
        let row1 = proj.row(1);
        let row2 = proj.row(2);

        a.row_mut(2 * view).copy_from(&(n.x * row2 - row0));
        a.row_mut(2 * view + 1).copy_from(&(n.y * row2 - row1));
    }

    let svd = a.svd(true, true);
    let v_t = svd.v_t?;
    let x_h = v_t.row(v_t.nrows() - 1);

    let w = x_h[3];
    if w.abs() <= Real::EPSILON {
        return None;
    }
    Some(Pt3::new(x_h[0] / w, x_h[1] / w, x_h[2] / w))
}

/// Mean pixel distance between the observations and the reprojected point.
///
/// `None` when the point lands behind either camera, filtering out
/// cheirality-violating solutions.
fn reprojection_error(
    cam_a: &CameraData,
    cam_b: &CameraData,
    world: &Pt3,
    px_a: &Pt2,
    px_b: &Pt2,
) -> Option<Real> {
    let back_a = cam_a.project(world)?;
    let back_b = cam_b.project(world)?;
    Some(((back_a - px_a).norm() + (back_b - px_b).norm()) / 2.0)
}
