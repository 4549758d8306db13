//! Geometric attribute calculation: planar area and length fields
//!
//! Values are computed in a projected CRS (area/length in angular units
//! would be meaningless) and converted to the requested unit before being
//! written into the target field.

use crate::vector::geometry::repair;
use geo::line_measures::LengthMeasurable;
use geo::{Area, Euclidean, Geometry};
use std::path::Path;
use terravec_core::{crs, io, AttributeValue, Config, Error, Result};
use tracing::{debug, info, warn};

/// What to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureMode {
    Area,
    Length,
}

impl MeasureMode {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "area" => Ok(MeasureMode::Area),
            "length" => Ok(MeasureMode::Length),
            other => Err(Error::InvalidParameter {
                name: "mode",
                value: other.to_string(),
                reason: "must be 'area' or 'length'".to_string(),
            }),
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            MeasureMode::Area => "area",
            MeasureMode::Length => "length",
        }
    }
}

/// Area units with their divisor from square meters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaUnit {
    #[default]
    SquareMeters,
    SquareKilometers,
    /// Traditional unit, 666.6667 m²
    Mu,
}

impl AreaUnit {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "m2" => Ok(AreaUnit::SquareMeters),
            "km2" => Ok(AreaUnit::SquareKilometers),
            "mu" => Ok(AreaUnit::Mu),
            other => Err(Error::InvalidParameter {
                name: "area_unit",
                value: other.to_string(),
                reason: "must be 'm2', 'km2' or 'mu'".to_string(),
            }),
        }
    }

    pub fn from_square_meters(&self, value: f64) -> f64 {
        match self {
            AreaUnit::SquareMeters => value,
            AreaUnit::SquareKilometers => value / 1e6,
            AreaUnit::Mu => value / 666.6667,
        }
    }
}

/// Length units with their divisor from meters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthUnit {
    #[default]
    Meters,
    Kilometers,
}

impl LengthUnit {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "m" => Ok(LengthUnit::Meters),
            "km" => Ok(LengthUnit::Kilometers),
            other => Err(Error::InvalidParameter {
                name: "length_unit",
                value: other.to_string(),
                reason: "must be 'm' or 'km'".to_string(),
            }),
        }
    }

    pub fn from_meters(&self, value: f64) -> f64 {
        match self {
            LengthUnit::Meters => value,
            LengthUnit::Kilometers => value / 1000.0,
        }
    }
}

/// Parameters for geometric attribute calculation
#[derive(Debug, Clone)]
pub struct MeasureParams {
    pub mode: MeasureMode,
    /// Target CRS; defaults to `project_crs` from configuration
    pub target_crs: Option<String>,
    /// Output field; defaults to the mode name
    pub field_name: Option<String>,
    /// Recompute when the field already exists
    pub overwrite: bool,
    pub area_unit: AreaUnit,
    pub length_unit: LengthUnit,
}

impl Default for MeasureParams {
    fn default() -> Self {
        Self {
            mode: MeasureMode::Area,
            target_crs: None,
            field_name: None,
            overwrite: true,
            area_unit: AreaUnit::default(),
            length_unit: LengthUnit::default(),
        }
    }
}

/// Planar unsigned area of a geometry; collections sum their polygonal
/// members
pub fn area(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::Polygon(p) => p.unsigned_area(),
        Geometry::MultiPolygon(mp) => mp.unsigned_area(),
        Geometry::Rect(r) => r.unsigned_area(),
        Geometry::Triangle(t) => t.unsigned_area(),
        Geometry::GeometryCollection(gc) => gc.0.iter().map(area).sum(),
        _ => 0.0,
    }
}

/// Euclidean length of a geometry; collections sum their linear members
pub fn length(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::LineString(ls) => ls.length(&Euclidean),
        Geometry::MultiLineString(mls) => mls.0.iter().map(|ls| ls.length(&Euclidean)).sum(),
        Geometry::Line(l) => {
            let dx = l.end.x - l.start.x;
            let dy = l.end.y - l.start.y;
            (dx * dx + dy * dy).sqrt()
        }
        Geometry::GeometryCollection(gc) => gc.0.iter().map(length).sum(),
        _ => 0.0,
    }
}

/// Compute the configured measure for every feature of the dataset at
/// `input_path`, write the result to `save_path` and return the GeoJSON
/// string.
pub fn measure_core(
    input_path: &Path,
    params: &MeasureParams,
    config: &Config,
    save_path: &Path,
) -> Result<String> {
    let target_crs = params
        .target_crs
        .clone()
        .unwrap_or_else(|| config.get_str("project_crs", "EPSG:3857"));
    let field = params
        .field_name
        .clone()
        .unwrap_or_else(|| params.mode.field_name().to_string());

    let mut dataset = io::read_dataset(input_path)?;
    if dataset.is_empty() {
        return Err(Error::EmptyDataset);
    }
    if dataset.crs.is_none() {
        return Err(Error::MissingCrs(input_path.display().to_string()));
    }
    for feature in &mut dataset.features {
        if let Some(geom) = &feature.geometry {
            feature.geometry = Some(repair(geom));
        }
    }

    // short-circuit, not an error: the existing field is preserved
    if !params.overwrite && dataset.has_field(&field) {
        warn!("field '{field}' already exists and overwrite is off, skipping computation");
        io::write_dataset(&dataset, save_path)?;
        return io::to_geojson_string(&dataset);
    }

    let mut dataset = crs::ensure_projected(dataset, &target_crs)?;
    debug!("measuring in {target_crs}");

    match params.mode {
        MeasureMode::Area => {
            if !dataset.has_polygonal() {
                return Err(Error::GeometryTypeMismatch {
                    expected: "Polygon or MultiPolygon",
                    found: dataset.geometry_type_names(),
                });
            }
            for feature in &mut dataset.features {
                let raw = feature.geometry.as_ref().map(area).unwrap_or(0.0);
                feature.set_property(
                    field.clone(),
                    AttributeValue::Float(params.area_unit.from_square_meters(raw)),
                );
            }
        }
        MeasureMode::Length => {
            if !dataset.has_linear() {
                return Err(Error::GeometryTypeMismatch {
                    expected: "LineString or MultiLineString",
                    found: dataset.geometry_type_names(),
                });
            }
            for feature in &mut dataset.features {
                let raw = feature.geometry.as_ref().map(length).unwrap_or(0.0);
                feature.set_property(
                    field.clone(),
                    AttributeValue::Float(params.length_unit.from_meters(raw)),
                );
            }
        }
    }

    io::write_dataset(&dataset, save_path)?;
    info!(
        "computed {} for {} features into field '{field}'",
        params.mode.field_name(),
        dataset.len()
    );
    io::to_geojson_string(&dataset)
}
