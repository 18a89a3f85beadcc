use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{
    extrinsic_matrix, from_homogeneous, to_homogeneous, Iso3, Mat3, Mat34, Pt2, Pt3, Real, Vec2,
};

/// Errors raised when interpreting camera calibration data.
#[derive(Debug, Error)]
pub enum CameraError {
    /// Intrinsics matrix is singular and cannot map pixels to rays.
    #[error("intrinsics matrix for port {0} is not invertible")]
    SingularIntrinsics(u32),
}

/// Brown-Conrady distortion with three radial and two tangential terms.
///
/// `undistort` inverts the model by fixed-point iteration, matching the
/// OpenCV convention used when the coefficients were estimated.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct BrownConrady5 {
    pub k1: Real,
    pub k2: Real,
    pub k3: Real,
    pub p1: Real,
    pub p2: Real,
}

impl BrownConrady5 {
    const UNDISTORT_ITERS: u32 = 8;

    fn distort_impl(&self, x: Real, y: Real) -> (Real, Real) {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        let radial = 1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6;

        let x_tan = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let y_tan = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;

        (x * radial + x_tan, y * radial + y_tan)
    }

    /// Apply distortion to undistorted normalized coordinates.
    pub fn distort(&self, n_undist: &Vec2) -> Vec2 {
        let (xd, yd) = self.distort_impl(n_undist.x, n_undist.y);
        Vec2::new(xd, yd)
    }

    /// Remove distortion from distorted normalized coordinates.
    pub fn undistort(&self, n_dist: &Vec2) -> Vec2 {
        let mut x = n_dist.x;
        let mut y = n_dist.y;

        for _ in 0..Self::UNDISTORT_ITERS {
            let (xd, yd) = self.distort_impl(x, y);
            x -= xd - n_dist.x;
            y -= yd - n_dist.y;
        }
        Vec2::new(x, y)
    }
}

/// Calibration data for one camera in the array.
///
/// `extrinsics` is the world-to-camera transform. It is `None` for a camera
/// whose pose was never estimated; such a camera cannot participate in any
/// stereo pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraData {
    /// Camera identifier (capture port).
    pub port: u32,
    /// Intrinsics matrix `K`.
    pub matrix: Mat3,
    /// Brown-Conrady distortion coefficients.
    #[serde(default)]
    pub distortions: BrownConrady5,
    /// World-to-camera transform, absent for an uncalibrated camera.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extrinsics: Option<Iso3>,
}

impl CameraData {
    /// Normalized-coordinate projection matrix `[R | t]`.
    ///
    /// Returns `None` when the camera has no extrinsics.
    pub fn projection_matrix(&self) -> Option<Mat34> {
        self.extrinsics.as_ref().map(extrinsic_matrix)
    }

    /// Map a pixel observation to undistorted normalized coordinates.
    pub fn undistort_pixel(&self, px: &Pt2) -> Result<Pt2, CameraError> {
        let k_inv = self
            .matrix
            .try_inverse()
            .ok_or(CameraError::SingularIntrinsics(self.port))?;
        let s = from_homogeneous(&(k_inv * to_homogeneous(px)));
        let n = self.distortions.undistort(&s.coords);
        Ok(Pt2::new(n.x, n.y))
    }

    /// Project a world point to pixel coordinates through the full model.
    ///
    /// Returns `None` for a camera without extrinsics or a point behind it.
    pub fn project(&self, world: &Pt3) -> Option<Pt2> {
        let iso = self.extrinsics.as_ref()?;
        let p_c = iso.transform_point(world);
        if p_c.z <= 0.0 {
            return None;
        }
        let n = Vec2::new(p_c.x / p_c.z, p_c.y / p_c.z);
        let d = self.distortions.distort(&n);
        let px = self.matrix * to_homogeneous(&Pt2::new(d.x, d.y));
        Some(from_homogeneous(&px))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    fn test_camera() -> CameraData {
        CameraData {
            port: 0,
            matrix: Mat3::new(1000.0, 0.0, 640.0, 0.0, 1000.0, 360.0, 0.0, 0.0, 1.0),
            distortions: BrownConrady5 {
                k1: -0.1,
                k2: 0.02,
                k3: 0.0,
                p1: 1e-3,
                p2: -5e-4,
            },
            extrinsics: Some(Iso3::from_parts(
                Translation3::new(0.0, 0.0, 0.0),
                UnitQuaternion::identity(),
            )),
        }
    }

    #[test]
    fn distort_undistort_round_trip() {
        let d = test_camera().distortions;
        let n = Vec2::new(0.21, -0.13);
        let back = d.undistort(&d.distort(&n));
        assert_relative_eq!(back.x, n.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, n.y, epsilon = 1e-9);
    }

    #[test]
    fn project_then_undistort_recovers_normalized_coords() {
        let cam = test_camera();
        let world = Pt3::new(0.4, -0.2, 2.0);
        let px = cam.project(&world).unwrap();
        let n = cam.undistort_pixel(&px).unwrap();
        assert_relative_eq!(n.x, world.x / world.z, epsilon = 1e-8);
        assert_relative_eq!(n.y, world.y / world.z, epsilon = 1e-8);
    }

    #[test]
    fn point_behind_camera_does_not_project() {
        let cam = test_camera();
        assert!(cam.project(&Pt3::new(0.0, 0.0, -1.0)).is_none());
    }

    #[test]
    fn uncalibrated_camera_has_no_projection_matrix() {
        let mut cam = test_camera();
        cam.extrinsics = None;
        assert!(cam.projection_matrix().is_none());
        assert!(cam.project(&Pt3::new(0.0, 0.0, 1.0)).is_none());
    }
}
