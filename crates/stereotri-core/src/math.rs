use nalgebra::{Isometry3, Matrix3, Matrix3x4, Point2, Point3, Vector2, Vector3};

pub type Real = f64;

pub type Vec2 = Vector2<Real>;
pub type Vec3 = Vector3<Real>;
pub type Pt2 = Point2<Real>;
pub type Pt3 = Point3<Real>;
pub type Mat3 = Matrix3<Real>;
pub type Iso3 = Isometry3<Real>;

/// 3x4 projection matrix `[R | t]` mapping world points to normalized
/// image coordinates.
pub type Mat34 = Matrix3x4<Real>;

pub fn to_homogeneous(p: &Pt2) -> Vec3 {
    Vec3::new(p.x, p.y, 1.0)
}

pub fn from_homogeneous(v: &Vec3) -> Pt2 {
    Pt2::new(v.x / v.z, v.y / v.z)
}

/// Build the `[R | t]` matrix of a world-to-camera transform.
pub fn extrinsic_matrix(iso: &Iso3) -> Mat34 {
    let r = iso.rotation.to_rotation_matrix();
    let t = iso.translation.vector;
    let mut m = Mat34::zeros();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(r.matrix());
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(&t);
    m
}
