//! # Terravec Core
//!
//! Core types and I/O for the Terravec vector-operation pipeline.
//!
//! This crate provides:
//! - `Dataset` / `Feature`: vector data with one CRS per dataset
//! - `Crs`: coordinate reference system parsing, comparison, reprojection
//! - `Config`: YAML configuration with dotted-key lookup
//! - I/O for shapefile input and GeoJSON/CSV output
//! - File management: unique naming, safe archive extraction, `TempArena`

pub mod config;
pub mod crs;
pub mod error;
pub mod fs;
pub mod io;
pub mod vector;

pub use config::Config;
pub use crs::Crs;
pub use error::{Error, Result};
pub use vector::{AttributeValue, Dataset, Feature};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crs::Crs;
    pub use crate::error::{Error, Result};
    pub use crate::vector::{AttributeValue, Dataset, Feature};
}
