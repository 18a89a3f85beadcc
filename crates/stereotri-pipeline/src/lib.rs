//! Synchronized stereo-correspondence and triangulation pipeline.
//!
//! Turns a persisted table of per-camera, per-frame 2D point detections into
//! a table of pairwise-triangulated 3D point estimates:
//!
//! 1. group detections by synchronization index into [`SyncBundle`]s,
//! 2. for every camera pair, match points observed by both cameras
//!    ([`PairedPointsBuilder`]),
//! 3. triangulate each matched point against the pair's geometry
//!    ([`ArrayTriangulator`]),
//! 4. flatten all pairs across all bundles into one output table
//!    ([`assembler`], per-bundle or batched mode).
//!
//! The two assembler modes are row-for-row equivalent modulo ordering; the
//! batched mode remaps every `(sync_index, point_id)` into one combined
//! identifier ([`PointIdCodec`]) so the whole dataset is processed as a
//! single virtual bundle.

/// Frame bundle model: point sets, frame snapshots, sync bundles.
pub mod bundle;
/// Pairwise point correspondence builder.
pub mod correspondence;
/// Combined identifier encode/decode for the batched assembler.
pub mod codec;
/// Per-pair linear triangulation.
pub mod triangulator;
/// Detection and output tables (CSV).
pub mod table;
/// Output-table assembly, per-bundle and batched.
pub mod assembler;

pub use assembler::*;
pub use bundle::*;
pub use codec::*;
pub use correspondence::*;
pub use table::*;
pub use triangulator::*;
