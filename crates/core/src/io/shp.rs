//! Shapefile reading
//!
//! A usable shapefile set is the `.shp` geometry file plus its `.shx` index,
//! `.dbf` attribute table and `.prj` projection sidecars. Anything missing
//! fails with `IncompleteDataset` naming the extension, before any parsing.

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Dataset, Feature};
use shapefile::dbase::FieldValue;
use shapefile::Shape;
use std::path::{Path, PathBuf};
use tracing::debug;

const REQUIRED_SIDECARS: [&str; 3] = ["shx", "dbf", "prj"];

/// Find the `.shp` file inside an extracted upload directory
pub fn locate_shapefile(dir: &Path) -> Result<PathBuf> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("shp"))
        {
            return Ok(path);
        }
    }
    Err(Error::IncompleteDataset {
        missing: ".shp".to_string(),
    })
}

/// Check that every required sidecar of `shp_path` exists
pub fn validate_components(shp_path: &Path) -> Result<()> {
    for ext in REQUIRED_SIDECARS {
        if !shp_path.with_extension(ext).exists() {
            return Err(Error::IncompleteDataset {
                missing: format!(".{ext}"),
            });
        }
    }
    Ok(())
}

/// Read a shapefile set into a dataset, taking the CRS from the `.prj` WKT
pub fn read_shapefile(shp_path: &Path) -> Result<Dataset> {
    validate_components(shp_path)?;

    let prj_text = std::fs::read_to_string(shp_path.with_extension("prj"))?;
    let crs = Crs::parse(&prj_text)?;
    debug!("read projection {} from sidecar", crs);

    let mut reader = shapefile::Reader::from_path(shp_path)
        .map_err(|e| Error::Shapefile(e.to_string()))?;

    let mut dataset = Dataset::new(Some(crs));
    for pair in reader.iter_shapes_and_records() {
        let (shape, record) = pair.map_err(|e| Error::Shapefile(e.to_string()))?;
        let mut feature = Feature::empty();
        feature.geometry = match shape {
            Shape::NullShape => None,
            other => Some(
                geo_types::Geometry::<f64>::try_from(other)
                    .map_err(|e| Error::Shapefile(e.to_string()))?,
            ),
        };
        for (name, value) in record {
            feature.properties.insert(name, attribute_from_dbase(value));
        }
        dataset.features.push(feature);
    }
    Ok(dataset)
}

fn attribute_from_dbase(value: FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(s)) => AttributeValue::String(s),
        FieldValue::Character(None) => AttributeValue::Null,
        FieldValue::Numeric(Some(n)) => AttributeValue::Float(n),
        FieldValue::Numeric(None) => AttributeValue::Null,
        FieldValue::Logical(Some(b)) => AttributeValue::Bool(b),
        FieldValue::Logical(None) => AttributeValue::Null,
        FieldValue::Integer(i) => AttributeValue::Int(i as i64),
        FieldValue::Float(Some(f)) => AttributeValue::Float(f as f64),
        FieldValue::Float(None) => AttributeValue::Null,
        FieldValue::Double(d) => AttributeValue::Float(d),
        FieldValue::Currency(c) => AttributeValue::Float(c),
        FieldValue::Memo(s) => AttributeValue::String(s),
        FieldValue::Date(Some(d)) => AttributeValue::String(format!(
            "{:04}-{:02}-{:02}",
            d.year(),
            d.month(),
            d.day()
        )),
        FieldValue::Date(None) => AttributeValue::Null,
        _ => AttributeValue::Null,
    }
}
