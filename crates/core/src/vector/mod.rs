//! Vector data structures
//!
//! A `Dataset` is an ordered sequence of features (geometry + attributes)
//! sharing one CRS. Operations that need projection-aware math reject
//! datasets whose CRS is unset.

use crate::crs::Crs;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(i) => Some(*i as f64),
            AttributeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert from a JSON value (numbers keep integer-ness where possible)
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttributeValue::Null,
            serde_json::Value::Bool(b) => AttributeValue::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    AttributeValue::Int(i)
                } else {
                    AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => AttributeValue::String(s.clone()),
            other => AttributeValue::String(other.to_string()),
        }
    }

    /// Convert into a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeValue::Null => serde_json::Value::Null,
            AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
            AttributeValue::Int(i) => serde_json::Value::from(*i),
            AttributeValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            AttributeValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::String(s) => write!(f, "{s}"),
        }
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry (absent for attribute-only rows)
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// An ordered sequence of features sharing one CRS
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub features: Vec<Feature>,
    pub crs: Option<Crs>,
}

impl Dataset {
    pub fn new(crs: Option<Crs>) -> Self {
        Self {
            features: Vec::new(),
            crs,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// A field is part of the schema if any feature carries it
    pub fn has_field(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.properties.contains_key(name))
    }

    /// Sorted set of all field names present across features
    pub fn field_names(&self) -> BTreeSet<String> {
        self.features
            .iter()
            .flat_map(|f| f.properties.keys().cloned())
            .collect()
    }

    /// True if any feature carries a polygonal geometry
    pub fn has_polygonal(&self) -> bool {
        self.features.iter().any(|f| {
            matches!(
                f.geometry,
                Some(Geometry::Polygon(_))
                    | Some(Geometry::MultiPolygon(_))
                    | Some(Geometry::Rect(_))
                    | Some(Geometry::Triangle(_))
            )
        })
    }

    /// True if any feature carries a linear geometry
    pub fn has_linear(&self) -> bool {
        self.features.iter().any(|f| {
            matches!(
                f.geometry,
                Some(Geometry::LineString(_))
                    | Some(Geometry::MultiLineString(_))
                    | Some(Geometry::Line(_))
            )
        })
    }

    /// Human-readable list of distinct geometry type names, for diagnostics
    pub fn geometry_type_names(&self) -> String {
        let mut names = BTreeSet::new();
        for f in &self.features {
            let name = match &f.geometry {
                Some(Geometry::Point(_)) => "Point",
                Some(Geometry::MultiPoint(_)) => "MultiPoint",
                Some(Geometry::Line(_)) => "Line",
                Some(Geometry::LineString(_)) => "LineString",
                Some(Geometry::MultiLineString(_)) => "MultiLineString",
                Some(Geometry::Polygon(_)) => "Polygon",
                Some(Geometry::MultiPolygon(_)) => "MultiPolygon",
                Some(Geometry::Rect(_)) => "Rect",
                Some(Geometry::Triangle(_)) => "Triangle",
                Some(Geometry::GeometryCollection(_)) => "GeometryCollection",
                None => "None",
            };
            names.insert(name);
        }
        names.into_iter().collect::<Vec<_>>().join(", ")
    }
}

impl IntoIterator for Dataset {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}
