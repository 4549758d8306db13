//! TerraVec CLI - vector operations over shapefile and GeoJSON layers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use terravec_algorithms::ingest::ingest_archive;
use terravec_algorithms::runner::{OperationOutput, OperationRunner, VectorOp};
use terravec_algorithms::vector::{
    AggregateParams, AreaUnit, BufferAccuracy, BufferParams, ChangeParams, LengthUnit,
    MeasureMode, MeasureParams, UnionParams,
};
use terravec_core::fs::TempArena;
use terravec_core::Config;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "terravec")]
#[command(author, version, about = "Vector operations over shapefile and GeoJSON layers", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a shapefile archive and store a projected GeoJSON copy
    Ingest {
        /// Zip archive containing a shapefile
        archive: PathBuf,
        /// Directory receiving the working copy; defaults to `upload_dir`
        /// from configuration
        #[arg(short, long)]
        upload_dir: Option<PathBuf>,
    },
    /// Buffer every feature of a layer
    Buffer {
        /// Input layer (.shp or .geojson)
        input: PathBuf,
        /// Buffer distance
        #[arg(short, long, default_value = "10.0")]
        distance: f64,
        /// Distance unit: m, km, ft, mi, degrees
        #[arg(short, long)]
        unit: Option<String>,
        /// Output CRS, e.g. EPSG:3857
        #[arg(short, long)]
        target_crs: Option<String>,
        /// Segments approximating circular arcs
        #[arg(short, long, default_value = "16")]
        segments: usize,
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Overlay-union two or more layers
    Union {
        /// Input layers, in fold order
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,
        /// Do not stamp per-layer SRC_<n> source identifiers
        #[arg(long)]
        no_source_id: bool,
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Classify temporal change from two stamped fields
    Change {
        /// Input layer (typically a union result)
        input: PathBuf,
        /// Field marking the "before" layer
        #[arg(short, long, default_value = "SRC_1")]
        before: String,
        /// Field marking the "after" layer
        #[arg(short, long, default_value = "SRC_2")]
        after: String,
        /// Field receiving the classification
        #[arg(short, long, default_value = "change_type")]
        field: String,
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute a geometric attribute (area or length) per feature
    Measure {
        /// Input layer
        input: PathBuf,
        /// What to compute: area, length
        #[arg(short, long, default_value = "area")]
        mode: String,
        /// CRS to measure in, e.g. EPSG:3857
        #[arg(short, long)]
        target_crs: Option<String>,
        /// Output field; defaults to the mode name
        #[arg(short, long)]
        field: Option<String>,
        /// Keep an existing field instead of recomputing it
        #[arg(long)]
        no_overwrite: bool,
        /// Area unit: m2, km2, mu
        #[arg(long, default_value = "m2")]
        area_unit: String,
        /// Length unit: m, km
        #[arg(long, default_value = "m")]
        length_unit: String,
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Sum a value field per group into a CSV table
    Aggregate {
        /// Input layer
        input: PathBuf,
        /// Mode the values were measured in: area, length
        #[arg(short, long, default_value = "area")]
        mode: String,
        /// Field to group by
        #[arg(short, long, default_value = "change_type")]
        group_field: String,
        /// Field to sum; defaults to the mode name
        #[arg(long)]
        value_field: Option<String>,
        /// Area unit: m2, km2, mu
        #[arg(long, default_value = "m2")]
        area_unit: String,
        /// Length unit: m, km
        #[arg(long, default_value = "m")]
        length_unit: String,
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(p) => Config::from_file(p).with_context(|| format!("reading {}", p.display())),
        None => Ok(Config::empty()),
    }
}

fn report(output: &OperationOutput, elapsed: std::time::Duration) -> Result<()> {
    if output.accuracy == BufferAccuracy::CrsFallback {
        eprintln!("warning: metric reprojection failed, result buffered in the input CRS");
    }
    info!("finished in {:.2?}", elapsed);
    let summary = serde_json::json!({
        "path": output.path,
        "geojson": output.geojson,
    });
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

// ─── Entry point ────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let config = load_config(cli.config.as_ref())?;
    let runner = OperationRunner::new(&config);

    match cli.command {
        Commands::Ingest {
            archive,
            upload_dir,
        } => {
            let start = Instant::now();
            let upload_dir =
                upload_dir.unwrap_or_else(|| config.get_path("upload_dir", "data/upload/vector"));
            let scratch = TempArena::create(&config)?;
            let (path, geojson) = ingest_archive(&archive, &upload_dir, &scratch)
                .with_context(|| format!("ingesting {}", archive.display()))?;
            info!("finished in {:.2?}", start.elapsed());
            let summary = serde_json::json!({ "path": path, "geojson": geojson });
            println!("{}", serde_json::to_string(&summary)?);
        }
        Commands::Buffer {
            input,
            distance,
            unit,
            target_crs,
            segments,
            output,
        } => {
            let op = VectorOp::Buffer(BufferParams {
                distance,
                unit,
                target_crs,
                segments,
            });
            let start = Instant::now();
            let result = runner.execute(&op, &[input], output)?;
            report(&result, start.elapsed())?;
        }
        Commands::Union {
            inputs,
            no_source_id,
            output,
        } => {
            let op = VectorOp::Union(UnionParams {
                keep_source_id: !no_source_id,
            });
            let start = Instant::now();
            let result = runner.execute(&op, &inputs, output)?;
            report(&result, start.elapsed())?;
        }
        Commands::Change {
            input,
            before,
            after,
            field,
            output,
        } => {
            let op = VectorOp::ChangeAnalyze(ChangeParams {
                before_field: before,
                after_field: after,
                output_field: field,
            });
            let start = Instant::now();
            let result = runner.execute(&op, &[input], output)?;
            report(&result, start.elapsed())?;
        }
        Commands::Measure {
            input,
            mode,
            target_crs,
            field,
            no_overwrite,
            area_unit,
            length_unit,
            output,
        } => {
            let op = VectorOp::CalculateGeometry(MeasureParams {
                mode: MeasureMode::parse(&mode)?,
                target_crs,
                field_name: field,
                overwrite: !no_overwrite,
                area_unit: AreaUnit::parse(&area_unit)?,
                length_unit: LengthUnit::parse(&length_unit)?,
            });
            let start = Instant::now();
            let result = runner.execute(&op, &[input], output)?;
            report(&result, start.elapsed())?;
        }
        Commands::Aggregate {
            input,
            mode,
            group_field,
            value_field,
            area_unit,
            length_unit,
            output,
        } => {
            let op = VectorOp::AggregateGroup(AggregateParams {
                mode: MeasureMode::parse(&mode)?,
                group_field,
                value_field,
                area_unit: AreaUnit::parse(&area_unit)?,
                length_unit: LengthUnit::parse(&length_unit)?,
            });
            let start = Instant::now();
            let result = runner.execute(&op, &[input], output)?;
            report(&result, start.elapsed())?;
        }
    }

    Ok(())
}
