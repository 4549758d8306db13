//! Buffer operation
//!
//! Distances are normalized to meters and applied after a round-trip through
//! the configured metric CRS; the degrees unit is a sentinel meaning "buffer
//! directly in the dataset's native angular units". When the metric
//! reprojection fails the buffer degrades to the dataset's current CRS
//! rather than aborting, and the result is flagged accordingly.

use crate::vector::geometry::{buffer as buffer_geom, collapse, repair, DEFAULT_SEGMENTS};
use std::path::Path;
use terravec_core::{crs, io, Config, Dataset, Error, Result};
use tracing::{debug, info, warn};

/// Distance units recognized by the buffer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    Feet,
    Miles,
    /// Sentinel: no conversion, buffer in native angular units
    Degrees,
}

impl DistanceUnit {
    /// Parse a unit name. Unrecognized names fall back to meters, matching
    /// the configured default-unit behavior.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "m" | "meter" | "meters" => DistanceUnit::Meters,
            "km" | "kilometer" | "kilometers" => DistanceUnit::Kilometers,
            "ft" | "feet" => DistanceUnit::Feet,
            "mi" | "mile" | "miles" => DistanceUnit::Miles,
            "deg" | "degree" | "degrees" => DistanceUnit::Degrees,
            other => {
                warn!("unrecognized distance unit '{other}', assuming meters");
                DistanceUnit::Meters
            }
        }
    }

    /// Distance in meters, or `None` for the degree sentinel
    pub fn to_meters(self, distance: f64) -> Option<f64> {
        match self {
            DistanceUnit::Meters => Some(distance),
            DistanceUnit::Kilometers => Some(distance * 1000.0),
            DistanceUnit::Feet => Some(distance * 0.3048),
            DistanceUnit::Miles => Some(distance * 1609.344),
            DistanceUnit::Degrees => None,
        }
    }
}

/// Whether the buffer took the precise path or the degraded fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferAccuracy {
    #[default]
    Exact,
    /// Metric reprojection failed; buffered in the dataset's current CRS
    CrsFallback,
}

/// Parameters for the buffer operation
#[derive(Debug, Clone)]
pub struct BufferParams {
    pub distance: f64,
    /// Unit name; defaults to `buffer.distance_unit` from configuration
    pub unit: Option<String>,
    /// Output CRS; defaults to `buffer.output_crs` from configuration
    pub target_crs: Option<String>,
    /// Segments approximating circular arcs
    pub segments: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            distance: 10.0,
            unit: None,
            target_crs: None,
            segments: DEFAULT_SEGMENTS,
        }
    }
}

/// Buffer every feature of the dataset at `input_path`, write the result to
/// `save_path` and return the GeoJSON string plus the accuracy taken.
pub fn buffer_core(
    input_path: &Path,
    params: &BufferParams,
    config: &Config,
    save_path: &Path,
) -> Result<(String, BufferAccuracy)> {
    let unit_name = params
        .unit
        .clone()
        .unwrap_or_else(|| config.get_str("buffer.distance_unit", "meters"));
    let target_crs = params
        .target_crs
        .clone()
        .unwrap_or_else(|| config.get_str("buffer.output_crs", "EPSG:3857"));
    let metric_crs = config.get_str("buffer.metric_crs", "EPSG:3857");

    let mut dataset = io::read_dataset(input_path)?;
    for feature in &mut dataset.features {
        if let Some(geom) = &feature.geometry {
            feature.geometry = Some(repair(geom));
        }
    }
    if dataset.is_empty() {
        return Err(Error::EmptyDataset);
    }
    if dataset.crs.is_none() {
        return Err(Error::MissingCrs(input_path.display().to_string()));
    }
    let dataset = crs::ensure_projected(dataset, &target_crs)?;
    debug!("buffer input reprojected to {target_crs}");

    let unit = DistanceUnit::parse(&unit_name);
    let (out, accuracy) = match unit.to_meters(params.distance) {
        // degree sentinel: buffer in place, no reprojection round-trip
        None => (
            buffer_dataset(&dataset, params.distance, params.segments),
            BufferAccuracy::Exact,
        ),
        Some(meters) => buffer_metric(dataset, meters, params.segments, &metric_crs, &target_crs),
    };

    info!(
        "buffered {} features by {} {unit_name}",
        out.len(),
        params.distance
    );
    io::write_dataset(&out, save_path)?;
    let geojson = io::to_geojson_string(&out)?;
    Ok((geojson, accuracy))
}

/// Round-trip through the metric CRS, falling back to the current CRS when
/// either reprojection leg fails
fn buffer_metric(
    dataset: Dataset,
    meters: f64,
    segments: usize,
    metric_crs: &str,
    target_crs: &str,
) -> (Dataset, BufferAccuracy) {
    match crs::ensure_projected(dataset.clone(), metric_crs) {
        Ok(metric_dataset) => {
            let buffered = buffer_dataset(&metric_dataset, meters, segments);
            match crs::ensure_projected(buffered, target_crs) {
                Ok(back) => (back, BufferAccuracy::Exact),
                Err(e) => {
                    warn!("reprojection to {target_crs} failed, buffering in current CRS: {e}");
                    (
                        buffer_dataset(&dataset, meters, segments),
                        BufferAccuracy::CrsFallback,
                    )
                }
            }
        }
        Err(e) => {
            warn!("reprojection to {metric_crs} failed, buffering in current CRS: {e}");
            (
                buffer_dataset(&dataset, meters, segments),
                BufferAccuracy::CrsFallback,
            )
        }
    }
}

fn buffer_dataset(dataset: &Dataset, distance: f64, segments: usize) -> Dataset {
    let mut out = dataset.clone();
    for feature in &mut out.features {
        if let Some(geom) = &feature.geometry {
            feature.geometry = Some(collapse(buffer_geom(geom, distance, segments)));
        }
    }
    out
}
