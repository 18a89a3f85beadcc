//! Row-level equivalence between the per-bundle and batched assemblers.

use nalgebra::{Translation3, UnitQuaternion};
use stereotri_core::{BrownConrady5, CameraArray, CameraData, Iso3, Mat3, Pt3, Real};
use stereotri_pipeline::{
    triangulate_batched, triangulate_per_bundle, AssemblerOptions, DetectionRow, DetectionTable,
    TriangulatedRow,
};

fn camera(port: u32, position: Pt3) -> CameraData {
    CameraData {
        port,
        matrix: Mat3::new(1200.0, 0.0, 960.0, 0.0, 1200.0, 540.0, 0.0, 0.0, 1.0),
        distortions: BrownConrady5::default(),
        extrinsics: Some(Iso3::from_parts(
            Translation3::new(-position.x, -position.y, -position.z),
            UnitQuaternion::identity(),
        )),
    }
}

fn array() -> CameraArray {
    CameraArray::new([
        camera(0, Pt3::new(0.0, 0.0, 0.0)),
        camera(1, Pt3::new(100.0, 0.0, 0.0)),
        camera(2, Pt3::new(0.0, 80.0, 0.0)),
    ])
}

fn detection(cam: &CameraData, sync_index: i64, point_id: i64, world: &Pt3) -> DetectionRow {
    let px = cam.project(world).expect("synthetic point must project");
    DetectionRow {
        sync_index,
        port: cam.port,
        point_id,
        frame_time: sync_index as Real / 30.0,
        frame_index: sync_index,
        img_loc_x: px.x,
        img_loc_y: px.y,
        obj_loc_x: 0.0,
        obj_loc_y: 0.0,
    }
}

/// Synthetic session: several bundles, uneven visibility per camera.
fn synthetic_table(array: &CameraArray) -> DetectionTable {
    let mut rows = Vec::new();
    for sync_index in 0..6_i64 {
        for point_id in 0..8_i64 {
            let world = Pt3::new(
                20.0 + 7.0 * point_id as Real,
                -10.0 + 5.0 * (sync_index as Real),
                250.0 + 3.0 * (point_id + sync_index) as Real,
            );
            for cam in array.cameras.values() {
                // Drop some observations so intersections differ per pair
                // and per bundle.
                let visible = (point_id + sync_index + cam.port as i64) % 3 != 0;
                if visible {
                    rows.push(detection(cam, sync_index, point_id, &world));
                }
            }
        }
    }
    DetectionTable::new(rows)
}

fn sort_key(row: &TriangulatedRow) -> (i64, i64, u32, u32) {
    (row.sync_index, row.point_id, row.port_a, row.port_b)
}

#[test]
fn per_bundle_and_batched_modes_produce_identical_rows() {
    let array = array();
    let table = synthetic_table(&array);

    let mut per_bundle =
        triangulate_per_bundle(&array, &table, &AssemblerOptions::default(), None).unwrap();
    let mut batched = triangulate_batched(&array, &table).unwrap();

    assert!(!per_bundle.is_empty());
    per_bundle.sort_by_key(sort_key);
    batched.sort_by_key(sort_key);

    // Same correspondences, same arithmetic path: rows must match exactly,
    // coordinates included.
    assert_eq!(per_bundle, batched);
}

#[test]
fn pipeline_is_idempotent() {
    let array = array();
    let table = synthetic_table(&array);

    let first = triangulate_per_bundle(&array, &table, &AssemblerOptions::default(), None).unwrap();
    let second =
        triangulate_per_bundle(&array, &table, &AssemblerOptions::default(), None).unwrap();
    assert_eq!(first, second);

    let batched_first = triangulate_batched(&array, &table).unwrap();
    let batched_second = triangulate_batched(&array, &table).unwrap();
    assert_eq!(batched_first, batched_second);
}

#[test]
fn progress_callback_fires_at_requested_cadence() {
    let array = array();
    let table = synthetic_table(&array);

    let mut reports = Vec::new();
    let options = AssemblerOptions { progress_every: 2 };
    let mut record = |p: stereotri_pipeline::Progress| reports.push((p.processed, p.total));
    triangulate_per_bundle(&array, &table, &options, Some(&mut record)).unwrap();

    // 6 bundles at cadence 2: callbacks at 0, 2, 4.
    assert_eq!(reports, vec![(0, 6), (2, 6), (4, 6)]);
}

#[test]
fn empty_table_yields_empty_output_in_both_modes() {
    let array = array();
    let table = DetectionTable::default();

    let per_bundle =
        triangulate_per_bundle(&array, &table, &AssemblerOptions::default(), None).unwrap();
    let batched = triangulate_batched(&array, &table).unwrap();

    assert!(per_bundle.is_empty());
    assert!(batched.is_empty());
}
