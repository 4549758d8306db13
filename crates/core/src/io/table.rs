//! Flat tabular output for attribute-only results

use crate::error::Result;
use crate::vector::AttributeValue;
use std::path::Path;

/// Write rows of attribute values as a CSV file with the given header
pub fn write_table(
    path: &Path,
    header: &[String],
    rows: &[Vec<AttributeValue>],
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
