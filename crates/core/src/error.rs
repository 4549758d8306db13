//! Error types for Terravec

use thiserror::Error;

/// Main error type for Terravec operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input dataset is empty")]
    EmptyDataset,

    #[error("dataset has no coordinate reference system: {0}")]
    MissingCrs(String),

    #[error("required field '{field}' is missing from the dataset")]
    MissingField { field: String },

    #[error("geometry type mismatch: expected {expected}, dataset has {found}")]
    GeometryTypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("at least {needed} input datasets required, got {got}")]
    InsufficientInputs { needed: usize, got: usize },

    #[error("incomplete shapefile set: missing {missing} file")]
    IncompleteDataset { missing: String },

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("cannot resolve CRS from '{0}'")]
    CrsResolution(String),

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("projection error: {0}")]
    Projection(String),

    #[error("shapefile error: {0}")]
    Shapefile(String),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Result type alias for Terravec operations
pub type Result<T> = std::result::Result<T, Error>;
