//! I/O for vector datasets
//!
//! Inputs may be shapefiles (uploaded archives) or GeoJSON (outputs of a
//! previous operation); the reader dispatches on extension. Operation
//! results are persisted as GeoJSON, aggregate tables as CSV.

mod geojson_io;
mod shp;
mod table;

pub use geojson_io::{
    pseudo_collection_string, read_geojson, to_feature_collection, to_geojson_string,
    write_geojson,
};
pub use shp::{locate_shapefile, read_shapefile, validate_components};
pub use table::write_table;

use crate::error::{Error, Result};
use crate::vector::Dataset;
use std::path::Path;

/// Read a dataset, dispatching on the file extension
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "shp" => read_shapefile(path),
        "geojson" | "json" => read_geojson(path),
        other => Err(Error::UnsupportedFormat(format!(
            "{} ({})",
            path.display(),
            other
        ))),
    }
}

/// Persist a dataset to its canonical on-disk form (GeoJSON)
pub fn write_dataset(dataset: &Dataset, path: &Path) -> Result<()> {
    write_geojson(dataset, path)
}
