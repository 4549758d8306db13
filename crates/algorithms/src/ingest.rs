//! Shapefile archive ingestion
//!
//! An uploaded zip archive is extracted into session scratch space, the
//! shapefile inside is read and normalized: a WGS84 rendering is returned
//! for display, and a web-mercator GeoJSON copy is persisted under the
//! upload directory so later operations work in a projected CRS. The
//! extraction itself is discarded with the scratch arena.

use std::path::{Path, PathBuf};
use terravec_core::fs::TempArena;
use terravec_core::{crs, fs, io, Error, Result};
use tracing::{debug, info};

/// CRS of the GeoJSON string returned for display
const DISPLAY_CRS: &str = "EPSG:4326";
/// CRS of the persisted working copy
const STORAGE_CRS: &str = "EPSG:3857";

/// Extract a shapefile archive, persist a projected GeoJSON working copy
/// under `upload_dir` and return its path together with a WGS84 GeoJSON
/// string for display.
pub fn ingest_archive(
    archive_path: &Path,
    upload_dir: &Path,
    scratch: &TempArena,
) -> Result<(PathBuf, String)> {
    let extracted = fs::extract_archive(archive_path, scratch.root())?;
    debug!("archive extracted to {}", extracted.display());

    let shp_path = io::locate_shapefile(&extracted)?;
    let dataset = io::read_dataset(&shp_path)?;
    if dataset.is_empty() {
        return Err(Error::EmptyDataset);
    }

    let display = crs::ensure_projected(dataset.clone(), DISPLAY_CRS)?;
    let display_geojson = io::to_geojson_string(&display)?;

    let storage = crs::ensure_projected(dataset, STORAGE_CRS)?;
    let stem = shp_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layer".to_string());
    fs::ensure_dir(upload_dir)?;
    let save_path = fs::unique_path(upload_dir, &format!("{stem}_3857.geojson"));
    io::write_dataset(&storage, &save_path)?;

    info!(
        "ingested {} ({} features) into {}",
        shp_path.display(),
        storage.len(),
        save_path.display()
    );
    Ok((save_path, display_geojson))
}
