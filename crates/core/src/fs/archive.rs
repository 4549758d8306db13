//! Safe zip extraction for uploaded shapefile sets
//!
//! Entry names are decoded as UTF-8 with a GBK fallback: shapefile
//! bundles packed by regional desktop tools rarely set the zip UTF-8 flag.
//! Entries whose resolved path would escape the extraction root are skipped
//! with a warning; the rest of the archive still extracts.

use crate::error::Result;
use crate::fs::{ensure_dir, unique_path};
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Unpack `archive_path` into a fresh, uniquely-named subdirectory of
/// `extract_root` and return the created directory.
pub fn extract_archive(archive_path: &Path, extract_root: &Path) -> Result<PathBuf> {
    ensure_dir(extract_root)?;
    let stem = archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let dest = unique_path(extract_root, &stem);
    std::fs::create_dir_all(&dest)?;

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = decode_entry_name(entry.name_raw());
        let Some(relative) = contained_entry_path(&name) else {
            warn!("skipping archive entry escaping the extraction root: {name}");
            continue;
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            std::io::copy(&mut entry, &mut out)?;
        }
    }

    debug!("extracted {} -> {}", archive_path.display(), dest.display());
    Ok(dest)
}

/// Decode a stored entry name: UTF-8 when valid, otherwise GBK, otherwise
/// lossy UTF-8 with undecodable bytes replaced.
fn decode_entry_name(raw: &[u8]) -> String {
    if let Ok(name) = std::str::from_utf8(raw) {
        return name.to_string();
    }
    let (decoded, _, had_errors) = encoding_rs::GBK.decode(raw);
    if had_errors {
        String::from_utf8_lossy(raw).into_owned()
    } else {
        decoded.into_owned()
    }
}

/// Normalize an entry name into a path guaranteed to stay below the
/// extraction root. Returns `None` for absolute paths or names whose `..`
/// components would climb out.
fn contained_entry_path(name: &str) -> Option<PathBuf> {
    let name = name.replace('\\', "/");
    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(&name).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.iter().collect())
    }
}
