//! Collision-free output naming

use std::path::{Path, PathBuf};

/// Resolve a path under `directory` that does not exist at call time.
///
/// Tries `desired` verbatim, then appends `_1`, `_2`, … before the
/// extension until a free name is found. Does not create the file, so the
/// check is not atomic across concurrent callers (see the concurrency notes
/// in DESIGN.md): callers needing strictness must serialize per directory.
pub fn unique_path(directory: &Path, desired: &str) -> PathBuf {
    let candidate = directory.join(desired);
    if !candidate.exists() {
        return candidate;
    }

    let desired_path = Path::new(desired);
    let stem = desired_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| desired.to_string());
    let extension = desired_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = directory.join(format!("{stem}_{counter}{extension}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
