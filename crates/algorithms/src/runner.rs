//! Operation runner: save-path strategy and dispatch
//!
//! Resolves where an operation's result lands (caller-supplied path or the
//! configured vector directory with a derived filename, both routed through
//! collision-free naming) and dispatches to the operation cores.

use crate::vector::aggregate::{aggregate_core, AggregateParams};
use crate::vector::buffer::{buffer_core, BufferAccuracy, BufferParams};
use crate::vector::change::{change_analyze_core, ChangeParams};
use crate::vector::measure::{measure_core, MeasureParams};
use crate::vector::union::{union_core, UnionParams};
use std::path::{Path, PathBuf};
use terravec_core::{fs, Config, Error, Result};
use tracing::{debug, info};

/// The operations the runner can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Buffer,
    Union,
    ChangeAnalyze,
    CalculateGeometry,
    AggregateGroup,
}

impl OpKind {
    /// Directory results land in when no explicit path is given
    pub fn default_dir(&self, config: &Config) -> PathBuf {
        config.get_path("vector_dir", "data/upload/vector")
    }

    /// Default output filename derived from the input stems
    pub fn default_filename(&self, inputs: &[PathBuf]) -> String {
        let stem = |p: &PathBuf| {
            p.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "layer".to_string())
        };
        let first = inputs.first().map(stem).unwrap_or_else(|| "layer".to_string());
        match self {
            OpKind::Buffer => format!("{first}_buffer.geojson"),
            OpKind::Union => match inputs.get(1) {
                Some(second) => format!("{first}_{}_union.geojson", stem(second)),
                None => format!("{first}_union.geojson"),
            },
            OpKind::ChangeAnalyze => format!("{first}_change.geojson"),
            OpKind::CalculateGeometry => format!("{first}_calc.geojson"),
            OpKind::AggregateGroup => format!("{first}_aggregate.csv"),
        }
    }
}

/// A fully-parameterized operation ready for dispatch
#[derive(Debug, Clone)]
pub enum VectorOp {
    Buffer(BufferParams),
    Union(UnionParams),
    ChangeAnalyze(ChangeParams),
    CalculateGeometry(MeasureParams),
    AggregateGroup(AggregateParams),
}

impl VectorOp {
    pub fn kind(&self) -> OpKind {
        match self {
            VectorOp::Buffer(_) => OpKind::Buffer,
            VectorOp::Union(_) => OpKind::Union,
            VectorOp::ChangeAnalyze(_) => OpKind::ChangeAnalyze,
            VectorOp::CalculateGeometry(_) => OpKind::CalculateGeometry,
            VectorOp::AggregateGroup(_) => OpKind::AggregateGroup,
        }
    }

    pub fn min_inputs(&self) -> usize {
        match self {
            VectorOp::Union(_) => 2,
            _ => 1,
        }
    }
}

/// Result of a dispatched operation
#[derive(Debug, Clone)]
pub struct OperationOutput {
    /// Where the result was persisted
    pub path: PathBuf,
    /// GeoJSON rendering of the result
    pub geojson: String,
    /// Degradation marker; only the buffer operation can set CrsFallback
    pub accuracy: BufferAccuracy,
}

/// Dispatches operations and owns the save-path strategy
pub struct OperationRunner<'a> {
    config: &'a Config,
}

impl<'a> OperationRunner<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Run an operation over `inputs`, persisting to `save_path` or to the
    /// configured vector directory under a derived name.
    pub fn execute(
        &self,
        op: &VectorOp,
        inputs: &[PathBuf],
        save_path: Option<PathBuf>,
    ) -> Result<OperationOutput> {
        if inputs.len() < op.min_inputs() {
            return Err(Error::InsufficientInputs {
                needed: op.min_inputs(),
                got: inputs.len(),
            });
        }

        let path = self.prepare_save_path(op.kind(), inputs, save_path)?;
        debug!("dispatching {:?} to {}", op.kind(), path.display());

        let (geojson, accuracy) = match op {
            VectorOp::Buffer(params) => buffer_core(&inputs[0], params, self.config, &path)?,
            VectorOp::Union(params) => {
                (union_core(inputs, params, &path)?, BufferAccuracy::Exact)
            }
            VectorOp::ChangeAnalyze(params) => (
                change_analyze_core(&inputs[0], params, &path)?,
                BufferAccuracy::Exact,
            ),
            VectorOp::CalculateGeometry(params) => (
                measure_core(&inputs[0], params, self.config, &path)?,
                BufferAccuracy::Exact,
            ),
            VectorOp::AggregateGroup(params) => (
                aggregate_core(&inputs[0], params, &path)?,
                BufferAccuracy::Exact,
            ),
        };

        info!("{:?} finished, result at {}", op.kind(), path.display());
        Ok(OperationOutput {
            path,
            geojson,
            accuracy,
        })
    }

    /// Resolve the output path: explicit paths keep their directory, default
    /// paths land in the configured vector directory. Both go through
    /// collision-free naming so an existing file is never overwritten.
    fn prepare_save_path(
        &self,
        kind: OpKind,
        inputs: &[PathBuf],
        save_path: Option<PathBuf>,
    ) -> Result<PathBuf> {
        let (dir, name) = match save_path {
            Some(explicit) => {
                let dir = explicit
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                let name = explicit
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| kind.default_filename(inputs));
                (dir, name)
            }
            None => (kind.default_dir(self.config), kind.default_filename(inputs)),
        };
        fs::ensure_dir(&dir)?;
        Ok(fs::unique_path(&dir, &name))
    }
}
