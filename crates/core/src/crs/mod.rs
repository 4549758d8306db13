//! Coordinate Reference System handling
//!
//! A `Crs` is parsed from user input (a bare EPSG code, an `EPSG:n` label,
//! or WKT) and canonicalized to its authority code where one is resolvable.
//! Equality is decided by authority code, never by raw string comparison.
//! Actual reprojection is delegated to the `proj` crate.

use crate::error::{Error, Result};
use crate::vector::Dataset;
use geo::MapCoords;
use geo_types::Coord;
use proj::Proj;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    /// EPSG code if resolvable
    epsg: Option<u32>,
    /// WKT representation, kept when no EPSG code could be extracted
    wkt: Option<String>,
}

impl Crs {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
        }
    }

    /// Create a CRS from a WKT string, extracting the authority code if present
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        let wkt = wkt.into();
        let epsg = extract_epsg_from_wkt(&wkt);
        Self {
            epsg,
            wkt: Some(wkt),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    /// Parse a CRS descriptor: a bare code (`"4326"`), an `EPSG:n` label,
    /// or WKT text. Fails with `CrsResolution` on anything else.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::CrsResolution(input.to_string()));
        }
        if let Ok(code) = trimmed.parse::<u32>() {
            return Ok(Self::from_epsg(code));
        }
        if let Some(rest) = strip_prefix_ignore_case(trimmed, "EPSG:") {
            return rest
                .trim()
                .parse::<u32>()
                .map(Self::from_epsg)
                .map_err(|_| Error::CrsResolution(input.to_string()));
        }
        // WKT1 starts with e.g. PROJCS[ / GEOGCS[; WKT2 with PROJCRS[ / GEOGCRS[
        if trimmed.contains('[') {
            return Ok(Self::from_wkt(trimmed));
        }
        Err(Error::CrsResolution(input.to_string()))
    }

    /// Get the EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get the WKT representation if available
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Check whether two CRS denote the same system.
    ///
    /// Compares by authority code when both sides resolve to one; falls back
    /// to whitespace-normalized WKT comparison otherwise.
    pub fn is_equivalent(&self, other: &Crs) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            let norm = |s: &str| s.split_whitespace().collect::<String>();
            return norm(a) == norm(b);
        }
        false
    }

    /// `"EPSG:<code>"` when the code is known, full WKT text otherwise
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            return wkt.clone();
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// Extract the outermost EPSG authority code from WKT text.
///
/// In WKT1 the top-level `AUTHORITY["EPSG","n"]` is the last one in the
/// string; WKT2 uses `ID["EPSG",n]`. Both are matched, last occurrence wins.
fn extract_epsg_from_wkt(wkt: &str) -> Option<u32> {
    let upper = wkt.to_ascii_uppercase();
    let mut result = None;
    let mut search = 0;
    while let Some(pos) = upper[search..].find("\"EPSG\"") {
        let after = search + pos + "\"EPSG\"".len();
        search = after;
        let rest = upper[after..]
            .trim_start_matches(|c: char| c == ',' || c == '"' || c.is_whitespace());
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(code) = digits.parse::<u32>() {
            result = Some(code);
        }
    }
    result
}

/// Compare two CRS descriptors for equivalence.
///
/// Canonicalizes both inputs and compares by authority code. A descriptor
/// that fails to parse yields `false` (never an error) and logs a warning.
pub fn are_equal(a: &str, b: &str) -> bool {
    match (Crs::parse(a), Crs::parse(b)) {
        (Ok(ca), Ok(cb)) => ca.is_equivalent(&cb),
        (Err(e), _) | (_, Err(e)) => {
            warn!("CRS comparison failed: {e}");
            false
        }
    }
}

/// Canonicalize a CRS descriptor to an `"EPSG:<code>"` label, falling back
/// to the full WKT text when no code is resolvable.
pub fn to_epsg_label(input: &str) -> Result<String> {
    let crs = Crs::parse(input)?;
    Ok(crs.identifier())
}

/// Reproject every geometry of `dataset` from its CRS into `target`.
fn reproject(dataset: &Dataset, target: &Crs) -> Result<Dataset> {
    let source = dataset
        .crs
        .as_ref()
        .ok_or_else(|| Error::MissingCrs("cannot reproject".to_string()))?;
    let proj = Proj::new_known_crs(&source.identifier(), &target.identifier(), None)
        .map_err(|e| Error::Projection(e.to_string()))?;

    let mut out = dataset.clone();
    for feature in &mut out.features {
        if let Some(geometry) = feature.geometry.take() {
            let projected = geometry
                .try_map_coords(|Coord { x, y }| {
                    let (nx, ny) = proj
                        .convert((x, y))
                        .map_err(|e| Error::Projection(e.to_string()))?;
                    Ok::<_, Error>(Coord { x: nx, y: ny })
                })?;
            feature.geometry = Some(projected);
        }
    }
    out.crs = Some(target.clone());
    Ok(out)
}

/// Ensure `dataset` is expressed in `target_crs`, reprojecting only when the
/// current CRS differs from the canonicalized target.
///
/// The equality gate matters: repeated reprojection accumulates
/// floating-point drift, so an already-matching dataset is returned as is.
pub fn ensure_projected(dataset: Dataset, target_crs: &str) -> Result<Dataset> {
    if target_crs.trim().is_empty() {
        return Err(Error::MissingCrs("empty target CRS".to_string()));
    }
    let source = dataset
        .crs
        .clone()
        .ok_or_else(|| Error::MissingCrs("input dataset".to_string()))?;
    let target = Crs::parse(target_crs)?;
    if source.is_equivalent(&target) {
        return Ok(dataset);
    }
    reproject(&dataset, &target)
}
