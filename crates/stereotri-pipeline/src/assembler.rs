use std::collections::{BTreeMap, HashSet};

use log::{info, warn};
use stereotri_core::{CameraArray, Pt2};
use thiserror::Error;

use crate::bundle::{BundleError, FrameSnapshot, PointSet, SyncBundle};
use crate::codec::{CodecError, PointIdCodec};
use crate::correspondence::{CameraPair, PairedPointsBuilder, SyncedPairedPoints};
use crate::table::{DetectionRow, DetectionTable, TriangulatedRow};
use crate::triangulator::{ArrayTriangulator, PairTriangulation};

/// Errors raised while assembling the output table.
#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error(transparent)]
    Bundle(#[from] BundleError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Options for the per-bundle assembler.
#[derive(Clone, Copy, Debug)]
pub struct AssemblerOptions {
    /// Report progress every this many bundles.
    pub progress_every: usize,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self { progress_every: 25 }
    }
}

/// Progress through the per-bundle assembler.
#[derive(Clone, Copy, Debug)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

/// Triangulate the whole table bundle by bundle.
///
/// Correctness-reference mode: each sync index independently goes through
/// correspondence building and triangulation, and every triangulated pair is
/// appended to the output. `progress` is invoked at the configured cadence.
pub fn triangulate_per_bundle(
    array: &CameraArray,
    table: &DetectionTable,
    options: &AssemblerOptions,
    mut progress: Option<&mut dyn FnMut(Progress)>,
) -> Result<Vec<TriangulatedRow>, AssemblerError> {
    let ports = array.ports();
    let builder = PairedPointsBuilder::new(&ports);
    let triangulator = ArrayTriangulator::new(array);

    let groups = table.group_by_sync_index();
    let total = groups.len();
    let cadence = options.progress_every.max(1);

    info!("triangulating {total} sync bundles across {} cameras", ports.len());

    let mut out = Vec::new();
    let mut unavailable_reported = HashSet::new();

    for (i, (&sync_index, rows)) in groups.iter().enumerate() {
        if i % cadence == 0 {
            info!("processing stereotriangulation estimates... {i}/{total}");
            if let Some(cb) = progress.as_mut() {
                cb(Progress {
                    processed: i,
                    total,
                });
            }
        }

        let snapshots = snapshots_from_rows(&ports, rows, |row| Ok(row.point_id))?;
        let bundle = SyncBundle::new(sync_index, &ports, snapshots);
        let synched = builder.synched_paired_points(&bundle);
        collect_pair_rows(&synched, &triangulator, &mut unavailable_reported, &mut out);
    }

    info!("assembled {} triangulated rows from {total} bundles", out.len());
    Ok(out)
}

/// Triangulate the whole table in a single batched pass.
///
/// Every `(sync_index, point_id)` is remapped to one combined identifier,
/// all rows are forced into a single virtual bundle, and correspondence
/// building plus triangulation run exactly once. Output identifiers are
/// decoded back afterwards. Row-for-row equivalent to
/// [`triangulate_per_bundle`] modulo ordering.
pub fn triangulate_batched(
    array: &CameraArray,
    table: &DetectionTable,
) -> Result<Vec<TriangulatedRow>, AssemblerError> {
    let Some(max_point_id) = table.max_point_id() else {
        return Ok(Vec::new());
    };
    let codec = PointIdCodec::new(max_point_id)?;

    let ports = array.ports();
    let builder = PairedPointsBuilder::new(&ports);
    let triangulator = ArrayTriangulator::new(array);

    info!(
        "remapping {} detections into one virtual bundle (multiplier {})",
        table.rows.len(),
        max_point_id + 1
    );

    let rows: Vec<&DetectionRow> = table.rows.iter().collect();
    let snapshots = snapshots_from_rows(&ports, &rows, |row| {
        Ok(codec.encode(row.sync_index, row.point_id)?)
    })?;
    let bundle = SyncBundle::new(0, &ports, snapshots);

    let synched = builder.synched_paired_points(&bundle);
    let mut out = Vec::new();
    let mut unavailable_reported = HashSet::new();
    collect_pair_rows(&synched, &triangulator, &mut unavailable_reported, &mut out);

    for row in &mut out {
        let (sync_index, point_id) = codec.decode(row.point_id);
        row.sync_index = sync_index;
        row.point_id = point_id;
    }

    info!("assembled {} triangulated rows in one batched pass", out.len());
    Ok(out)
}

/// Build one snapshot per observed port from a slice of detection rows.
///
/// `point_id_of` lets the batched mode substitute combined identifiers; it
/// may fail, which aborts the run.
fn snapshots_from_rows(
    ports: &[u32],
    rows: &[&DetectionRow],
    point_id_of: impl Fn(&DetectionRow) -> Result<i64, AssemblerError>,
) -> Result<BTreeMap<u32, FrameSnapshot>, AssemblerError> {
    let mut snapshots = BTreeMap::new();
    for &port in ports {
        let port_rows: Vec<&DetectionRow> =
            rows.iter().copied().filter(|r| r.port == port).collect();
        if port_rows.is_empty() {
            continue;
        }

        let mut point_id = Vec::with_capacity(port_rows.len());
        let mut img_loc = Vec::with_capacity(port_rows.len());
        let mut obj_loc = Vec::with_capacity(port_rows.len());
        for &row in &port_rows {
            point_id.push(point_id_of(row)?);
            img_loc.push(Pt2::new(row.img_loc_x, row.img_loc_y));
            obj_loc.push(Pt2::new(row.obj_loc_x, row.obj_loc_y));
        }

        let first = port_rows[0];
        snapshots.insert(
            port,
            FrameSnapshot {
                port,
                frame_index: first.frame_index,
                frame_time: first.frame_time,
                points: Some(PointSet::new(point_id, img_loc, obj_loc)?),
            },
        );
    }
    Ok(snapshots)
}

/// Append every triangulated pair of one synched set to the output.
///
/// A pair without usable geometry contributes nothing and is warned about
/// once per run; a pair with an empty intersection is skipped silently.
fn collect_pair_rows(
    synched: &SyncedPairedPoints,
    triangulator: &ArrayTriangulator<'_>,
    unavailable_reported: &mut HashSet<CameraPair>,
    out: &mut Vec<TriangulatedRow>,
) {
    for (&pair, paired) in &synched.pairs {
        let Some(paired) = paired else {
            continue;
        };
        match triangulator.triangulate_pair(paired) {
            PairTriangulation::Triangulated(result) => {
                for i in 0..result.point_ids.len() {
                    out.push(TriangulatedRow {
                        sync_index: result.sync_index,
                        point_id: result.point_ids[i],
                        port_a: pair.a,
                        port_b: pair.b,
                        x: result.xyz[i].x,
                        y: result.xyz[i].y,
                        z: result.xyz[i].z,
                        reproj_error: result.reproj_errors[i],
                    });
                }
            }
            PairTriangulation::GeometryUnavailable => {
                if unavailable_reported.insert(pair) {
                    warn!("no stereo geometry for pair {pair}; skipping its correspondences");
                }
            }
        }
    }
}
