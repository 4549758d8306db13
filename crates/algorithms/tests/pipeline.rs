//! End-to-end pipeline: union two layers, classify the change, compute
//! areas and aggregate them per change class.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use terravec_algorithms::prelude::*;
use terravec_core::{io, AttributeValue, Crs, Dataset, Feature};

use geo_types::{Geometry, LineString, Polygon};

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

fn layer(dir: &Path, name: &str, poly: Polygon<f64>) -> PathBuf {
    let mut dataset = Dataset::new(Some(Crs::web_mercator()));
    dataset.features.push(Feature::new(Geometry::Polygon(poly)));
    let path = dir.join(name);
    io::write_dataset(&dataset, &path).unwrap();
    path
}

#[test]
fn test_change_analysis_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::from_str(&format!(
        "vector_dir: {}",
        dir.path().join("vector").display()
    ))
    .unwrap();
    let runner = OperationRunner::new(&config);

    // two 1km squares sharing a 500m strip
    let before = layer(dir.path(), "before.geojson", square(0.0, 0.0, 1000.0));
    let after = layer(dir.path(), "after.geojson", square(500.0, 0.0, 1000.0));

    let union = runner
        .execute(&VectorOp::Union(UnionParams::default()), &[before, after], None)
        .unwrap();
    assert_eq!(
        union.path.file_name().unwrap().to_str().unwrap(),
        "before_after_union.geojson"
    );

    let change = runner
        .execute(
            &VectorOp::ChangeAnalyze(ChangeParams::default()),
            &[union.path],
            None,
        )
        .unwrap();

    let measured = runner
        .execute(
            &VectorOp::CalculateGeometry(MeasureParams {
                area_unit: AreaUnit::SquareKilometers,
                target_crs: Some("EPSG:3857".to_string()),
                ..Default::default()
            }),
            &[change.path],
            None,
        )
        .unwrap();
    assert_eq!(measured.accuracy, BufferAccuracy::Exact);

    let classified = io::read_dataset(&measured.path).unwrap();
    assert_eq!(classified.len(), 3);

    let aggregated = runner
        .execute(
            &VectorOp::AggregateGroup(AggregateParams {
                area_unit: AreaUnit::SquareKilometers,
                ..Default::default()
            }),
            &[measured.path],
            None,
        )
        .unwrap();
    assert!(aggregated.path.extension().unwrap() == "csv");
    assert!(aggregated.geojson.contains("\"geometry\":null"));

    let table = std::fs::read_to_string(&aggregated.path).unwrap();
    let sums: BTreeMap<String, f64> = table
        .lines()
        .skip(1)
        .map(|line| {
            let (group, value) = line.split_once(',').unwrap();
            (group.to_string(), value.parse().unwrap())
        })
        .collect();

    // residual of the old layer, the shared strip, residual of the new layer
    assert!((sums["lost"] - 0.5).abs() < 1e-9, "{sums:?}");
    assert!((sums["unchanged"] - 0.5).abs() < 1e-9, "{sums:?}");
    assert!((sums["new"] - 0.5).abs() < 1e-9, "{sums:?}");
}

#[test]
fn test_buffer_then_measure() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::from_str(&format!(
        "vector_dir: {}",
        dir.path().join("vector").display()
    ))
    .unwrap();
    let runner = OperationRunner::new(&config);

    let input = layer(dir.path(), "plot.geojson", square(0.0, 0.0, 1000.0));
    let buffered = runner
        .execute(
            &VectorOp::Buffer(BufferParams {
                distance: 0.1,
                unit: Some("km".to_string()),
                target_crs: Some("EPSG:3857".to_string()),
                segments: 64,
            }),
            &[input],
            None,
        )
        .unwrap();
    assert_eq!(buffered.accuracy, BufferAccuracy::Exact);

    let measured = runner
        .execute(
            &VectorOp::CalculateGeometry(MeasureParams {
                target_crs: Some("EPSG:3857".to_string()),
                ..Default::default()
            }),
            &[buffered.path],
            None,
        )
        .unwrap();

    let out = io::read_dataset(&measured.path).unwrap();
    let area = out.features[0]
        .get_property("area")
        .and_then(AttributeValue::as_f64)
        .unwrap();
    // 1km square grown by 100m: 1e6 + 4*1000*100 + pi*100^2
    let expected = 1.0e6 + 4.0e5 + std::f64::consts::PI * 1.0e4;
    assert!((area - expected).abs() / expected < 0.01, "area {area}");
}
