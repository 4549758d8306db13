//! Vector operations
//!
//! Each operation reads a dataset (or several), transforms it and persists
//! the result, returning a GeoJSON string. The `geometry` module holds the
//! repair and buffer primitives the operations share.

pub mod aggregate;
pub mod buffer;
pub mod change;
pub mod geometry;
pub mod measure;
pub mod union;

pub use aggregate::{aggregate_core, AggregateParams};
pub use buffer::{buffer_core, BufferAccuracy, BufferParams, DistanceUnit};
pub use change::{change_analyze_core, ChangeParams};
pub use measure::{measure_core, AreaUnit, LengthUnit, MeasureMode, MeasureParams};
pub use union::{union_core, UnionParams};
