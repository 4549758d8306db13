//! # TerraVec Algorithms
//!
//! Vector operations for TerraVec.
//!
//! ## Available Operation Categories
//!
//! - **ingest**: Shapefile archive extraction and CRS normalization
//! - **vector**: Buffer, union overlay, change analysis, geometric attributes, aggregation
//! - **runner**: Save-path strategy and operation dispatch

pub mod ingest;
pub mod runner;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::ingest::ingest_archive;
    pub use crate::runner::{OpKind, OperationOutput, OperationRunner, VectorOp};
    pub use crate::vector::{
        aggregate_core, buffer_core, change_analyze_core, measure_core, union_core,
        AggregateParams, AreaUnit, BufferAccuracy, BufferParams, ChangeParams, DistanceUnit,
        LengthUnit, MeasureMode, MeasureParams, UnionParams,
    };
    pub use terravec_core::prelude::*;
}
