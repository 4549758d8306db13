//! Process configuration
//!
//! A small YAML-backed lookup table with dotted-key access. Operations take
//! a `&Config` and ask for their defaults with `get_str`; unknown keys fall
//! back to the caller-supplied default and never fail.

use crate::error::{Error, Result};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Loaded configuration values
#[derive(Debug, Clone)]
pub struct Config {
    root: Value,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&text)
    }

    /// Parse configuration from a YAML string
    pub fn from_str(text: &str) -> Result<Self> {
        let root: Value =
            serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self { root })
    }

    /// An empty configuration: every lookup returns its default
    pub fn empty() -> Self {
        Self { root: Value::Null }
    }

    /// Look up a string value by dotted key, falling back to `default`
    pub fn get_str(&self, key: &str, default: &str) -> String {
        match self.lookup(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => default.to_string(),
        }
    }

    /// Look up a path value by dotted key, falling back to `default`
    pub fn get_path(&self, key: &str, default: impl Into<PathBuf>) -> PathBuf {
        match self.lookup(key) {
            Some(Value::String(s)) => PathBuf::from(s),
            _ => default.into(),
        }
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        let mut value = &self.root;
        for part in key.split('.') {
            value = value.get(part)?;
        }
        Some(value)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::empty()
    }
}
