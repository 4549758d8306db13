//! Temporal change classification
//!
//! Classifies each feature from the presence of two stamped fields
//! (typically the SRC identifiers produced by a union of a "before" and an
//! "after" layer). A field is present when it exists and is neither null
//! nor zero: source stamps are 1-based, so zero means no contribution.

use std::path::Path;
use terravec_core::{io, AttributeValue, Error, Result};
use tracing::info;

/// Parameters for change analysis
#[derive(Debug, Clone)]
pub struct ChangeParams {
    pub before_field: String,
    pub after_field: String,
    /// Field receiving the classification
    pub output_field: String,
}

impl Default for ChangeParams {
    fn default() -> Self {
        Self {
            before_field: "SRC_1".to_string(),
            after_field: "SRC_2".to_string(),
            output_field: "change_type".to_string(),
        }
    }
}

/// Classify a before/after presence pair
pub fn classify(before: bool, after: bool) -> &'static str {
    match (before, after) {
        (true, true) => "unchanged",
        (true, false) => "lost",
        (false, true) => "new",
        (false, false) => "unknown",
    }
}

fn is_present(value: Option<&AttributeValue>) -> bool {
    match value {
        None | Some(AttributeValue::Null) => false,
        Some(AttributeValue::Int(i)) => *i != 0,
        Some(AttributeValue::Float(f)) => *f != 0.0,
        Some(AttributeValue::Bool(b)) => *b,
        Some(AttributeValue::String(_)) => true,
    }
}

/// Classify every feature of the dataset at `input_path`, write the result
/// to `save_path` and return the GeoJSON string.
pub fn change_analyze_core(
    input_path: &Path,
    params: &ChangeParams,
    save_path: &Path,
) -> Result<String> {
    let mut dataset = io::read_dataset(input_path)?;

    for field in [&params.before_field, &params.after_field] {
        if !dataset.has_field(field) {
            return Err(Error::MissingField {
                field: field.clone(),
            });
        }
    }

    for feature in &mut dataset.features {
        let before = is_present(feature.get_property(&params.before_field));
        let after = is_present(feature.get_property(&params.after_field));
        feature.set_property(
            params.output_field.clone(),
            AttributeValue::String(classify(before, after).to_string()),
        );
    }

    io::write_dataset(&dataset, save_path)?;
    info!("change analysis saved to {}", save_path.display());
    io::to_geojson_string(&dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Geometry, Point};
    use std::path::PathBuf;
    use terravec_core::{Crs, Dataset, Feature};

    #[test]
    fn test_truth_table() {
        assert_eq!(classify(true, true), "unchanged");
        assert_eq!(classify(true, false), "lost");
        assert_eq!(classify(false, true), "new");
        assert_eq!(classify(false, false), "unknown");
    }

    #[test]
    fn test_presence_predicate() {
        assert!(!is_present(None));
        assert!(!is_present(Some(&AttributeValue::Null)));
        assert!(!is_present(Some(&AttributeValue::Int(0))));
        assert!(!is_present(Some(&AttributeValue::Float(0.0))));
        assert!(!is_present(Some(&AttributeValue::Bool(false))));
        assert!(is_present(Some(&AttributeValue::Int(1))));
        assert!(is_present(Some(&AttributeValue::Float(2.5))));
        assert!(is_present(Some(&AttributeValue::String("x".into()))));
    }

    fn stamped(before: AttributeValue, after: AttributeValue) -> Feature {
        let mut f = Feature::new(Geometry::Point(Point::new(0.0, 0.0)));
        f.set_property("SRC_1", before);
        f.set_property("SRC_2", after);
        f
    }

    fn run(dataset: Dataset, dir: &Path) -> Dataset {
        let input = dir.join("in.geojson");
        io::write_dataset(&dataset, &input).unwrap();
        let output = dir.join("out.geojson");
        change_analyze_core(&input, &ChangeParams::default(), &output).unwrap();
        io::read_dataset(&output).unwrap()
    }

    #[test]
    fn test_all_four_classifications() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::new(Some(Crs::web_mercator()));
        dataset.features = vec![
            stamped(AttributeValue::Int(1), AttributeValue::Int(2)),
            stamped(AttributeValue::Int(1), AttributeValue::Null),
            stamped(AttributeValue::Int(0), AttributeValue::Int(2)),
            stamped(AttributeValue::Null, AttributeValue::Null),
        ];
        let result = run(dataset, dir.path());

        let classes: Vec<_> = result
            .iter()
            .map(|f| match f.get_property("change_type") {
                Some(AttributeValue::String(s)) => s.as_str().to_string(),
                other => panic!("unexpected classification {other:?}"),
            })
            .collect();
        assert_eq!(classes, ["unchanged", "lost", "new", "unknown"]);
    }

    #[test]
    fn test_missing_field_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::new(Some(Crs::web_mercator()));
        let mut f = Feature::new(Geometry::Point(Point::new(0.0, 0.0)));
        f.set_property("SRC_1", AttributeValue::Int(1));
        dataset.features.push(f);
        let input: PathBuf = dir.path().join("in.geojson");
        io::write_dataset(&dataset, &input).unwrap();

        let result = change_analyze_core(
            &input,
            &ChangeParams::default(),
            &dir.path().join("out.geojson"),
        );
        assert!(matches!(
            result,
            Err(Error::MissingField { field }) if field == "SRC_2"
        ));
    }
}
