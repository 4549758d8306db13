//! Session scratch space
//!
//! One `TempArena` is created at process start and passed by reference to
//! anything needing scratch directories. Teardown happens once, on drop;
//! individual removal failures are logged and swallowed so one locked file
//! cannot abort overall cleanup.

use crate::config::Config;
use crate::error::Result;
use crate::fs::unique_path;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Process-lifetime temporary root, named by process-start timestamp
#[derive(Debug)]
pub struct TempArena {
    root: PathBuf,
    tracked: Mutex<Vec<PathBuf>>,
}

impl TempArena {
    /// Create the session root under `temp_dir` (or the OS temp directory)
    pub fn create(config: &Config) -> Result<Self> {
        let base = config.get_path("temp_dir", std::env::temp_dir());
        std::fs::create_dir_all(&base)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let root = unique_path(&base, &stamp);
        std::fs::create_dir_all(&root)?;
        debug!("session temp root: {}", root.display());
        Ok(Self {
            root,
            tracked: Mutex::new(Vec::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hand out a fresh tracked subdirectory named after `prefix`
    pub fn mkdir(&self, prefix: &str) -> Result<PathBuf> {
        let dir = unique_path(&self.root, prefix);
        std::fs::create_dir_all(&dir)?;
        if let Ok(mut tracked) = self.tracked.lock() {
            tracked.push(dir.clone());
        }
        Ok(dir)
    }
}

impl Drop for TempArena {
    fn drop(&mut self) {
        if let Ok(tracked) = self.tracked.get_mut() {
            for dir in tracked.drain(..) {
                if let Err(e) = std::fs::remove_dir_all(&dir) {
                    warn!("failed to remove temp dir {}: {e}", dir.display());
                }
            }
        }
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            warn!("failed to remove session temp root {}: {e}", self.root.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn arena_in(dir: &Path) -> TempArena {
        let yaml = format!("temp_dir: {}", dir.display());
        let config = Config::from_str(&yaml).unwrap();
        TempArena::create(&config).unwrap()
    }

    #[test]
    fn test_mkdir_unique_and_tracked() {
        let base = tempdir().unwrap();
        let arena = arena_in(base.path());
        let a = arena.mkdir("work").unwrap();
        let b = arena.mkdir("work").unwrap();
        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
        assert!(a.starts_with(arena.root()));
    }

    #[test]
    fn test_drop_cleans_root() {
        let base = tempdir().unwrap();
        let root = {
            let arena = arena_in(base.path());
            arena.mkdir("scratch").unwrap();
            arena.root().to_path_buf()
        };
        assert!(!root.exists());
    }
}
