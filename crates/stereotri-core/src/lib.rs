//! Camera-array geometry primitives for `stereotri-rs`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Pt2`, `Pt3`, `Mat34`, ...),
//! - per-camera calibration data (`CameraData`) with Brown-Conrady
//!   distortion and optional extrinsics,
//! - the read-only camera array (`CameraArray`) and its stereo-pair
//!   geometry query.
//!
//! Observation pipeline:
//! `pixel -> undistort -> normalized -> triangulate against [R | t]`

/// Linear algebra type aliases and helpers.
pub mod math;
/// Per-camera calibration data and distortion.
pub mod camera;
/// Camera array and stereo-pair geometry lookup.
pub mod array;

pub use array::*;
pub use camera::*;
pub use math::*;
