//! Grouped aggregation of a numeric field
//!
//! Sums a value field per group and persists the result as a CSV table. The
//! returned GeoJSON is a pseudo feature collection with null geometries so
//! that tabular results travel through the same channel as spatial ones.
//! Values are summed as stored; no reprojection happens here, the measure
//! operation is responsible for producing values in a sensible CRS.

use crate::vector::measure::{AreaUnit, LengthUnit, MeasureMode};
use std::collections::BTreeMap;
use std::path::Path;
use terravec_core::{io, AttributeValue, Error, Result};
use tracing::info;

/// Parameters for grouped aggregation
#[derive(Debug, Clone)]
pub struct AggregateParams {
    pub mode: MeasureMode,
    pub group_field: String,
    /// Field to sum; defaults to the mode name
    pub value_field: Option<String>,
    pub area_unit: AreaUnit,
    pub length_unit: LengthUnit,
}

impl Default for AggregateParams {
    fn default() -> Self {
        Self {
            mode: MeasureMode::Area,
            group_field: "change_type".to_string(),
            value_field: None,
            area_unit: AreaUnit::default(),
            length_unit: LengthUnit::default(),
        }
    }
}

/// Sum the value field per group, write a CSV table to `save_path` and
/// return a pseudo feature collection string of the rows.
pub fn aggregate_core(
    input_path: &Path,
    params: &AggregateParams,
    save_path: &Path,
) -> Result<String> {
    let value_field = params
        .value_field
        .clone()
        .unwrap_or_else(|| params.mode.field_name().to_string());

    let dataset = io::read_dataset(input_path)?;
    if dataset.is_empty() {
        return Err(Error::EmptyDataset);
    }
    if !dataset.has_field(&params.group_field) {
        return Err(Error::MissingField {
            field: params.group_field.clone(),
        });
    }
    if !dataset.has_field(&value_field) {
        // the measure operation produces this field
        return Err(Error::MissingField { field: value_field });
    }

    // keyed by display form, keeping the first-seen raw group value; this
    // means numerically equal Int and Float keys land in one group and a
    // null group renders as the empty string
    let mut groups: BTreeMap<String, (AttributeValue, f64)> = BTreeMap::new();
    for feature in dataset.iter() {
        let group = feature
            .get_property(&params.group_field)
            .cloned()
            .unwrap_or(AttributeValue::Null);
        let value = feature
            .get_property(&value_field)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let entry = groups.entry(group.to_string()).or_insert((group, 0.0));
        entry.1 += value;
    }

    let convert = |sum: f64| match params.mode {
        MeasureMode::Area => params.area_unit.from_square_meters(sum),
        MeasureMode::Length => params.length_unit.from_meters(sum),
    };

    let sum_field = format!("{value_field}_sum");
    let mut rows = Vec::with_capacity(groups.len());
    let mut csv_rows = Vec::with_capacity(groups.len());
    for (group, sum) in groups.into_values() {
        let total = convert(sum);
        csv_rows.push(vec![group.clone(), AttributeValue::Float(total)]);
        rows.push(vec![
            (params.group_field.clone(), group),
            (sum_field.clone(), AttributeValue::Float(total)),
        ]);
    }

    io::write_table(
        save_path,
        &[params.group_field.clone(), sum_field],
        &csv_rows,
    )?;
    info!(
        "aggregated {} features into {} groups, table at {}",
        dataset.len(),
        rows.len(),
        save_path.display()
    );
    io::pseudo_collection_string(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Geometry, Point};
    use std::path::PathBuf;
    use terravec_core::{Crs, Dataset, Feature};

    fn grouped_feature(group: &str, value: f64) -> Feature {
        let mut f = Feature::new(Geometry::Point(Point::new(0.0, 0.0)));
        f.set_property("change_type", AttributeValue::String(group.to_string()));
        f.set_property("area", AttributeValue::Float(value));
        f
    }

    fn write_input(dir: &Path, features: Vec<Feature>) -> PathBuf {
        let mut dataset = Dataset::new(Some(Crs::web_mercator()));
        dataset.features = features;
        let path = dir.join("in.geojson");
        io::write_dataset(&dataset, &path).unwrap();
        path
    }

    fn read_sums(path: &Path) -> BTreeMap<String, f64> {
        let text = std::fs::read_to_string(path).unwrap();
        text.lines()
            .skip(1)
            .map(|line| {
                let (group, value) = line.split_once(',').unwrap();
                (group.to_string(), value.parse().unwrap())
            })
            .collect()
    }

    #[test]
    fn test_sums_per_group() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            vec![
                grouped_feature("A", 100.0),
                grouped_feature("A", 50.0),
                grouped_feature("B", 10.0),
            ],
        );
        let out = dir.path().join("agg.csv");
        let pseudo = aggregate_core(&input, &AggregateParams::default(), &out).unwrap();

        let sums = read_sums(&out);
        assert_eq!(sums["A"], 150.0);
        assert_eq!(sums["B"], 10.0);
        assert!(pseudo.contains("\"geometry\":null"));
        assert!(pseudo.contains("area_sum"));
    }

    #[test]
    fn test_unit_conversion_applies_to_sums() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            vec![grouped_feature("A", 150.0), grouped_feature("B", 10.0)],
        );
        let out = dir.path().join("agg.csv");
        let params = AggregateParams {
            area_unit: AreaUnit::SquareKilometers,
            ..Default::default()
        };
        aggregate_core(&input, &params, &out).unwrap();

        let sums = read_sums(&out);
        assert!((sums["A"] - 0.00015).abs() < 1e-12);
        assert!((sums["B"] - 0.00001).abs() < 1e-12);
    }

    fn typed_feature(group: AttributeValue, value: f64) -> Feature {
        let mut f = Feature::new(Geometry::Point(Point::new(0.0, 0.0)));
        f.set_property("change_type", group);
        f.set_property("area", AttributeValue::Float(value));
        f
    }

    #[test]
    fn test_group_keys_compare_by_display_form() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            vec![
                // Int(1) and Float(1.0) render identically and merge
                typed_feature(AttributeValue::Int(1), 10.0),
                typed_feature(AttributeValue::Float(1.0), 5.0),
                typed_feature(AttributeValue::Null, 2.0),
            ],
        );
        let out = dir.path().join("agg.csv");
        aggregate_core(&input, &AggregateParams::default(), &out).unwrap();

        let sums = read_sums(&out);
        assert_eq!(sums.len(), 2);
        assert_eq!(sums["1"], 15.0);
        // the null group renders as the empty string
        assert_eq!(sums[""], 2.0);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = Feature::new(Geometry::Point(Point::new(0.0, 0.0)));
        f.set_property("area", AttributeValue::Float(1.0));
        let input = write_input(dir.path(), vec![f]);
        let out = dir.path().join("agg.csv");

        let result = aggregate_core(&input, &AggregateParams::default(), &out);
        assert!(matches!(
            result,
            Err(Error::MissingField { field }) if field == "change_type"
        ));

        let mut g = Feature::new(Geometry::Point(Point::new(0.0, 0.0)));
        g.set_property("change_type", AttributeValue::String("A".into()));
        let input2 = write_input(dir.path(), vec![g]);
        let result = aggregate_core(&input2, &AggregateParams::default(), &out);
        assert!(matches!(
            result,
            Err(Error::MissingField { field }) if field == "area"
        ));
    }
}
