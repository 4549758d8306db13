//! Multi-layer overlay union
//!
//! Layers are folded left-to-right with a binary overlay-union: pairwise
//! intersections carry merged attributes, residuals keep their own side's
//! attributes with explicit nulls for the other side's fields. The fold is
//! an ordered reduce and must stay sequential: geometry-type filtering makes
//! overlay order-sensitive.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use terravec_core::{io, AttributeValue, Dataset, Error, Feature, Result};
use tracing::{debug, info, warn};

use crate::vector::geometry::collapse;
use geo::{unary_union, BooleanOps, Geometry, MultiPolygon};
use std::collections::HashMap;

/// Parameters for the union operation
#[derive(Debug, Clone)]
pub struct UnionParams {
    /// Stamp a per-layer `SRC_<n>` source identifier field (1-based)
    pub keep_source_id: bool,
}

impl Default for UnionParams {
    fn default() -> Self {
        Self {
            keep_source_id: true,
        }
    }
}

/// Union two or more layers, write the result to `save_path` and return the
/// GeoJSON string.
pub fn union_core(
    input_paths: &[PathBuf],
    params: &UnionParams,
    save_path: &Path,
) -> Result<String> {
    if input_paths.len() < 2 {
        return Err(Error::InsufficientInputs {
            needed: 2,
            got: input_paths.len(),
        });
    }

    let mut layers = Vec::with_capacity(input_paths.len());
    for (i, path) in input_paths.iter().enumerate() {
        debug!("reading layer {}: {}", i + 1, path.display());
        let mut layer = io::read_dataset(path)?;
        if params.keep_source_id {
            let field = format!("SRC_{}", i + 1);
            // 1-based so that zero reliably means "no source contribution"
            if !layer.has_field(&field) {
                for (j, feature) in layer.features.iter_mut().enumerate() {
                    feature
                        .properties
                        .insert(field.clone(), AttributeValue::Int(j as i64 + 1));
                }
            }
        }
        layers.push(layer);
    }
    info!("read {} layers, starting overlay fold", layers.len());

    let mut iter = layers.into_iter();
    let Some(mut result) = iter.next() else {
        return Err(Error::InsufficientInputs { needed: 2, got: 0 });
    };
    for (i, layer) in iter.enumerate() {
        debug!("folding layer {}", i + 2);
        let incoming = layer.len();
        result = overlay_union(result, layer)?;
        if result.len() < incoming {
            warn!(
                "{} geometries dropped by the type-preserving overlay",
                incoming - result.len()
            );
        }
    }

    io::write_dataset(&result, save_path)?;
    info!("union result saved to {}", save_path.display());
    io::to_geojson_string(&result)
}

/// Binary overlay union of two polygonal layers.
///
/// Output features are: every non-empty pairwise intersection (attributes of
/// both sides merged), plus each side's residual outside the other layer.
/// Non-polygonal geometry does not survive the overlay.
fn overlay_union(a: Dataset, b: Dataset) -> Result<Dataset> {
    if let (Some(ca), Some(cb)) = (&a.crs, &b.crs) {
        if !ca.is_equivalent(cb) {
            return Err(Error::CrsMismatch(ca.identifier(), cb.identifier()));
        }
    } else {
        warn!("overlaying layers with an undefined CRS");
    }

    let a_feats = polygonal_features(&a);
    let b_feats = polygonal_features(&b);
    let a_cover: MultiPolygon<f64> = unary_union(a_feats.iter().map(|(g, _)| g));
    let b_cover: MultiPolygon<f64> = unary_union(b_feats.iter().map(|(g, _)| g));

    let mut features = Vec::new();
    for (ga, pa) in &a_feats {
        for (gb, pb) in &b_feats {
            let pieces = ga.intersection(gb);
            if !pieces.0.is_empty() {
                let mut props = pa.clone();
                // later layer wins on conflicting field names
                props.extend(pb.clone());
                features.push(feature_from(pieces, props));
            }
        }
        let residual = ga.difference(&b_cover);
        if !residual.0.is_empty() {
            features.push(feature_from(residual, pa.clone()));
        }
    }
    for (gb, pb) in &b_feats {
        let residual = gb.difference(&a_cover);
        if !residual.0.is_empty() {
            features.push(feature_from(residual, pb.clone()));
        }
    }

    // uniform schema: both layers' fields on every feature
    let mut names: BTreeSet<String> = BTreeSet::new();
    for (_, props) in a_feats.iter().chain(b_feats.iter()) {
        names.extend(props.keys().cloned());
    }
    for feature in &mut features {
        for name in &names {
            feature
                .properties
                .entry(name.clone())
                .or_insert(AttributeValue::Null);
        }
    }

    Ok(Dataset {
        features,
        crs: a.crs,
    })
}

fn polygonal_features(
    dataset: &Dataset,
) -> Vec<(MultiPolygon<f64>, HashMap<String, AttributeValue>)> {
    dataset
        .features
        .iter()
        .filter_map(|f| {
            let mp = match &f.geometry {
                Some(Geometry::Polygon(p)) => MultiPolygon::new(vec![p.clone()]),
                Some(Geometry::MultiPolygon(mp)) => mp.clone(),
                Some(Geometry::Rect(r)) => MultiPolygon::new(vec![r.to_polygon()]),
                Some(Geometry::Triangle(t)) => MultiPolygon::new(vec![t.to_polygon()]),
                _ => return None,
            };
            Some((mp, f.properties.clone()))
        })
        .collect()
}

fn feature_from(mp: MultiPolygon<f64>, props: HashMap<String, AttributeValue>) -> Feature {
    let mut feature = Feature::new(collapse(mp));
    feature.properties = props;
    feature
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;
    use geo_types::{LineString, Polygon};
    use terravec_core::Crs;

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x, y),
                (x + size, y),
                (x + size, y + size),
                (x, y + size),
                (x, y),
            ]),
            vec![],
        )
    }

    fn layer(dir: &Path, name: &str, polys: &[Polygon<f64>]) -> PathBuf {
        let mut dataset = Dataset::new(Some(Crs::web_mercator()));
        for p in polys {
            dataset
                .features
                .push(Feature::new(Geometry::Polygon(p.clone())));
        }
        let path = dir.join(name);
        io::write_dataset(&dataset, &path).unwrap();
        path
    }

    #[test]
    fn test_requires_two_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let a = layer(dir.path(), "a.geojson", &[square(0.0, 0.0, 1.0)]);
        let out = dir.path().join("out.geojson");
        assert!(matches!(
            union_core(&[a], &UnionParams::default(), &out),
            Err(Error::InsufficientInputs { needed: 2, got: 1 })
        ));
    }

    #[test]
    fn test_disjoint_layers_keep_source_stamps() {
        let dir = tempfile::tempdir().unwrap();
        let a = layer(dir.path(), "a.geojson", &[square(0.0, 0.0, 10.0)]);
        let b = layer(dir.path(), "b.geojson", &[square(100.0, 0.0, 10.0)]);
        let out = dir.path().join("out.geojson");

        union_core(&[a, b], &UnionParams::default(), &out).unwrap();
        let result = io::read_dataset(&out).unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.has_field("SRC_1"));
        assert!(result.has_field("SRC_2"));

        let from_a = result
            .iter()
            .find(|f| f.get_property("SRC_1") == Some(&AttributeValue::Int(1)))
            .unwrap();
        assert_eq!(from_a.get_property("SRC_2"), Some(&AttributeValue::Null));

        let from_b = result
            .iter()
            .find(|f| f.get_property("SRC_2") == Some(&AttributeValue::Int(1)))
            .unwrap();
        assert_eq!(from_b.get_property("SRC_1"), Some(&AttributeValue::Null));
    }

    #[test]
    fn test_overlapping_layers_partition() {
        let dir = tempfile::tempdir().unwrap();
        // 10x10 squares overlapping in a 5x10 strip
        let a = layer(dir.path(), "a.geojson", &[square(0.0, 0.0, 10.0)]);
        let b = layer(dir.path(), "b.geojson", &[square(5.0, 0.0, 10.0)]);
        let out = dir.path().join("out.geojson");

        union_core(&[a, b], &UnionParams::default(), &out).unwrap();
        let result = io::read_dataset(&out).unwrap();

        // intersection + residual of each side
        assert_eq!(result.len(), 3);
        let total: f64 = result
            .iter()
            .map(|f| match f.geometry.as_ref().unwrap() {
                Geometry::Polygon(p) => p.unsigned_area(),
                Geometry::MultiPolygon(mp) => mp.unsigned_area(),
                other => panic!("unexpected geometry {other:?}"),
            })
            .sum();
        assert!((total - 150.0).abs() < 1e-6);

        let overlap = result
            .iter()
            .find(|f| {
                f.get_property("SRC_1") == Some(&AttributeValue::Int(1))
                    && f.get_property("SRC_2") == Some(&AttributeValue::Int(1))
            })
            .expect("intersection piece carries both stamps");
        match overlap.geometry.as_ref().unwrap() {
            Geometry::Polygon(p) => assert!((p.unsigned_area() - 50.0).abs() < 1e-6),
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn test_existing_stamp_field_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::new(Some(Crs::web_mercator()));
        let mut f = Feature::new(Geometry::Polygon(square(0.0, 0.0, 1.0)));
        f.set_property("SRC_1", AttributeValue::Int(99));
        dataset.features.push(f);
        let a = dir.path().join("a.geojson");
        io::write_dataset(&dataset, &a).unwrap();
        let b = layer(dir.path(), "b.geojson", &[square(50.0, 0.0, 1.0)]);

        let out = dir.path().join("out.geojson");
        union_core(&[a, b], &UnionParams::default(), &out).unwrap();
        let result = io::read_dataset(&out).unwrap();
        assert!(result
            .iter()
            .any(|f| f.get_property("SRC_1") == Some(&AttributeValue::Int(99))));
    }

    #[test]
    fn test_non_polygonal_features_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::new(Some(Crs::web_mercator()));
        dataset
            .features
            .push(Feature::new(Geometry::Polygon(square(0.0, 0.0, 1.0))));
        dataset.features.push(Feature::new(Geometry::LineString(
            LineString::from(vec![(0.0, 0.0), (5.0, 5.0)]),
        )));
        let a = dir.path().join("a.geojson");
        io::write_dataset(&dataset, &a).unwrap();
        let b = layer(dir.path(), "b.geojson", &[square(50.0, 0.0, 1.0)]);

        let out = dir.path().join("out.geojson");
        union_core(&[a, b], &UnionParams::default(), &out).unwrap();
        let result = io::read_dataset(&out).unwrap();
        // the line does not survive the polygon overlay
        assert_eq!(result.len(), 2);
    }
}
