use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use stereotri_core::CameraArray;
use stereotri_pipeline::{
    triangulate_batched, triangulate_per_bundle, write_triangulated_csv, AssemblerOptions,
    DetectionTable,
};

/// Stereo triangulation of a recorded multi-camera point table.
#[derive(Debug, Parser)]
#[command(author, version, about = "Triangulate 2D point detections into a 3D point table")]
struct Args {
    /// Path to the detection table CSV (sync_index, port, point_id, ...).
    #[arg(long)]
    points: PathBuf,

    /// Path to the camera array JSON (intrinsics, distortion, extrinsics).
    #[arg(long)]
    cameras: PathBuf,

    /// Assembler strategy.
    #[arg(long, value_enum, default_value = "batched")]
    mode: Mode,

    /// Output CSV path. Defaults to stereotriangulated_points.csv next to
    /// the input table.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Report progress every N bundles (per-bundle mode only).
    #[arg(long, default_value_t = 25)]
    progress_every: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Iterate sync bundles one at a time (correctness reference).
    PerBundle,
    /// Fold the whole table into one virtual bundle (single pass).
    Batched,
}

fn load_camera_array(path: &Path) -> Result<CameraArray> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading camera array from {}", path.display()))?;
    let array = serde_json::from_str(&data)
        .with_context(|| format!("parsing camera array from {}", path.display()))?;
    Ok(array)
}

fn main() {
    env_logger::init();
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();

    let array = load_camera_array(&args.cameras)?;
    let table = DetectionTable::load_csv(&args.points)
        .with_context(|| format!("loading detection table from {}", args.points.display()))?;
    info!(
        "loaded {} detections across {} cameras",
        table.rows.len(),
        array.cameras.len()
    );

    let rows = match args.mode {
        Mode::PerBundle => {
            let options = AssemblerOptions {
                progress_every: args.progress_every,
            };
            triangulate_per_bundle(&array, &table, &options, None)?
        }
        Mode::Batched => triangulate_batched(&array, &table)?,
    };

    let output = args.output.unwrap_or_else(|| {
        args.points
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("stereotriangulated_points.csv")
    });
    write_triangulated_csv(&output, &rows)
        .with_context(|| format!("writing output table to {}", output.display()))?;
    info!("wrote {} triangulated rows to {}", rows.len(), output.display());

    Ok(())
}
