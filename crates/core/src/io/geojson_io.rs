//! GeoJSON reading, writing and interchange serialization
//!
//! Persisted files carry a legacy `crs` foreign member so chained
//! operations can recover the dataset CRS; per RFC 7946 a file without one
//! is taken as WGS84.

use crate::crs::Crs;
use crate::error::Result;
use crate::vector::{AttributeValue, Dataset, Feature};
use geojson::{FeatureCollection, GeoJson, JsonObject};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Read a GeoJSON FeatureCollection into a dataset
pub fn read_geojson(path: &Path) -> Result<Dataset> {
    let file = File::open(path)?;
    let geojson = GeoJson::from_reader(BufReader::new(file))?;
    let fc = FeatureCollection::try_from(geojson)?;

    let crs = match crs_from_foreign_members(fc.foreign_members.as_ref()) {
        Some(crs) => Some(crs),
        None => {
            debug!("no crs member in {}, assuming WGS84", path.display());
            Some(Crs::wgs84())
        }
    };

    let mut dataset = Dataset::new(crs);
    for feature in fc.features {
        let geometry = match feature.geometry {
            Some(g) => Some(geo_types::Geometry::<f64>::try_from(g.value)?),
            None => None,
        };
        let mut out = Feature::empty();
        out.geometry = geometry;
        if let Some(props) = feature.properties {
            for (key, value) in props {
                out.properties.insert(key, AttributeValue::from_json(&value));
            }
        }
        out.id = match feature.id {
            Some(geojson::feature::Id::String(s)) => Some(s),
            Some(geojson::feature::Id::Number(n)) => Some(n.to_string()),
            None => None,
        };
        dataset.features.push(out);
    }
    Ok(dataset)
}

/// Build a GeoJSON FeatureCollection from a dataset
pub fn to_feature_collection(dataset: &Dataset) -> FeatureCollection {
    let features = dataset
        .features
        .iter()
        .map(|feature| {
            let geometry = feature
                .geometry
                .as_ref()
                .map(|g| geojson::Geometry::new(geojson::Value::from(g)));
            let mut properties = JsonObject::new();
            for (key, value) in &feature.properties {
                properties.insert(key.clone(), value.to_json());
            }
            geojson::Feature {
                bbox: None,
                geometry,
                id: feature
                    .id
                    .clone()
                    .map(geojson::feature::Id::String),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Serialize a dataset as a GeoJSON FeatureCollection string
pub fn to_geojson_string(dataset: &Dataset) -> Result<String> {
    let fc = to_feature_collection(dataset);
    Ok(serde_json::to_string(&fc)?)
}

/// Persist a dataset as GeoJSON, tagging it with its CRS
pub fn write_geojson(dataset: &Dataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut fc = to_feature_collection(dataset);
    if let Some(crs) = &dataset.crs {
        let mut foreign = JsonObject::new();
        foreign.insert(
            "crs".to_string(),
            serde_json::json!({
                "type": "name",
                "properties": { "name": crs.identifier() }
            }),
        );
        fc.foreign_members = Some(foreign);
    }
    let file = File::create(path)?;
    serde_json::to_writer(file, &fc)?;
    Ok(())
}

/// Serialize attribute-only rows as a geometry-null pseudo-FeatureCollection
pub fn pseudo_collection_string(rows: &[Vec<(String, AttributeValue)>]) -> Result<String> {
    let features: Vec<geojson::Feature> = rows
        .iter()
        .map(|row| {
            let mut properties = JsonObject::new();
            for (key, value) in row {
                properties.insert(key.clone(), value.to_json());
            }
            geojson::Feature {
                bbox: None,
                geometry: None,
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    let fc = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    Ok(serde_json::to_string(&fc)?)
}

fn crs_from_foreign_members(foreign: Option<&JsonObject>) -> Option<Crs> {
    let name = foreign?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;
    Crs::parse(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Geometry, Point};
    use tempfile::tempdir;

    fn sample_dataset() -> Dataset {
        let mut dataset = Dataset::new(Some(Crs::web_mercator()));
        let mut f = Feature::new(Geometry::Point(Point::new(100.0, 200.0)));
        f.set_property("name", AttributeValue::String("pt".into()));
        f.set_property("count", AttributeValue::Int(3));
        dataset.features.push(f);
        dataset
    }

    #[test]
    fn test_write_read_roundtrip_keeps_crs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        write_geojson(&sample_dataset(), &path).unwrap();

        let back = read_geojson(&path).unwrap();
        assert_eq!(back.crs.as_ref().unwrap().epsg(), Some(3857));
        assert_eq!(back.len(), 1);
        assert_eq!(
            back.features[0].get_property("count"),
            Some(&AttributeValue::Int(3))
        );
        match back.features[0].geometry.as_ref().unwrap() {
            Geometry::Point(p) => assert_eq!((p.x(), p.y()), (100.0, 200.0)),
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn test_missing_crs_member_defaults_to_wgs84() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.geojson");
        std::fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[]}"#,
        )
        .unwrap();
        let dataset = read_geojson(&path).unwrap();
        assert_eq!(dataset.crs.as_ref().unwrap().epsg(), Some(4326));
    }

    #[test]
    fn test_pseudo_collection_shape() {
        let rows = vec![vec![
            ("group".to_string(), AttributeValue::String("A".into())),
            ("area_sum".to_string(), AttributeValue::Float(150.0)),
        ]];
        let text = pseudo_collection_string(&rows).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert!(value["features"][0]["geometry"].is_null());
        assert_eq!(value["features"][0]["properties"]["group"], "A");
        assert_eq!(value["features"][0]["properties"]["area_sum"], 150.0);
    }
}
