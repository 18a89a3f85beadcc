use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stereotri_core::Real;
use thiserror::Error;

/// Errors raised while reading or writing tables. All are fatal for a run.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read or write table: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush table: {0}")]
    Io(#[from] std::io::Error),
}

/// One persisted 2D detection: one point seen by one camera at one instant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectionRow {
    pub sync_index: i64,
    pub port: u32,
    pub point_id: i64,
    pub frame_time: Real,
    pub frame_index: i64,
    pub img_loc_x: Real,
    pub img_loc_y: Real,
    pub obj_loc_x: Real,
    pub obj_loc_y: Real,
}

/// The full detection table, fully materialized before the pipeline runs.
#[derive(Clone, Debug, Default)]
pub struct DetectionTable {
    pub rows: Vec<DetectionRow>,
}

impl DetectionTable {
    pub fn new(rows: Vec<DetectionRow>) -> Self {
        Self { rows }
    }

    pub fn load_csv(path: &Path) -> Result<Self, TableError> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<DetectionRow>, _>>()?;
        Ok(Self { rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Largest point identifier anywhere in the table.
    pub fn max_point_id(&self) -> Option<i64> {
        self.rows.iter().map(|r| r.point_id).max()
    }

    /// Rows grouped by sync index, ascending, preserving row order within
    /// each group.
    pub fn group_by_sync_index(&self) -> BTreeMap<i64, Vec<&DetectionRow>> {
        let mut groups: BTreeMap<i64, Vec<&DetectionRow>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.sync_index).or_default().push(row);
        }
        groups
    }
}

/// One triangulated 3D estimate in the output table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriangulatedRow {
    pub sync_index: i64,
    pub point_id: i64,
    pub port_a: u32,
    pub port_b: u32,
    pub x: Real,
    pub y: Real,
    pub z: Real,
    pub reproj_error: Real,
}

/// Write the output table. Row order is preserved as given.
pub fn write_triangulated_csv(path: &Path, rows: &[TriangulatedRow]) -> Result<(), TableError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
