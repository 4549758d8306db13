//! File management: unique naming, archive extraction, session scratch space

mod archive;
mod naming;
mod temp;

pub use archive::extract_archive;
pub use naming::unique_path;
pub use temp::TempArena;

use crate::error::Result;
use std::path::Path;

/// Create a directory (and parents) if it does not exist yet
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
