//! World files - six-line sidecar georeferencing for rasters
//!
//! Lines are `A D B E C F`: pixel x size, row rotation, column rotation,
//! pixel y size, then the x/y centre of the upper-left pixel.

use crate::error::{Result, RasterError};
use crate::types::GeoTransform;
use crate::utils::{file_extension, replace_extension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parse world file text into a transform
pub fn parse_world_file(text: &str) -> Result<GeoTransform> {
    let values = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(6)
        .map(|line| {
            let token = line.split_whitespace().next().unwrap_or(line);
            token.parse::<f64>().map_err(|_| {
                RasterError::WorldFile(format!("Cannot parse '{}' as a number", line))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    if values.len() < 6 {
        return Err(RasterError::WorldFile(format!(
            "Expected 6 values, found {}",
            values.len()
        )));
    }

    let (a, d, b, e, c, f) = (values[0], values[1], values[2], values[3], values[4], values[5]);
    if (a == 0.0 && b == 0.0) || (d == 0.0 && e == 0.0) {
        return Err(RasterError::WorldFile(
            "Degenerate pixel size in world file".to_string(),
        ));
    }

    // World files reference pixel centres; transforms reference corners.
    Ok(GeoTransform::new([
        c - 0.5 * a - 0.5 * b,
        a,
        b,
        f - 0.5 * d - 0.5 * e,
        d,
        e,
    ]))
}

/// Sidecar paths to try, in order
///
/// An explicit extension replaces the raster's own. Without one, the
/// extension is derived from the raster's: first+last letter plus `w`
/// (`tif` -> `tfw`), then the whole extension plus `w` (`tif` -> `tifw`).
pub fn candidate_paths(path: &Path, extension: Option<&str>) -> Vec<PathBuf> {
    let extensions: Vec<String> = match extension {
        Some(ext) => vec![ext.to_string()],
        None => derived_extensions(path),
    };

    let mut candidates: Vec<PathBuf> = Vec::new();
    for ext in &extensions {
        for variant in [ext.clone(), ext.to_lowercase(), ext.to_uppercase()] {
            let candidate = replace_extension(path, &variant);
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

fn derived_extensions(path: &Path) -> Vec<String> {
    let Some(ext) = file_extension(path) else {
        return Vec::new();
    };
    let chars: Vec<char> = ext.chars().collect();
    if chars.len() < 2 {
        return Vec::new();
    }

    vec![
        format!("{}{}w", chars[0], chars[chars.len() - 1]),
        format!("{}w", ext),
    ]
}

/// Read the world file for `path`, if one exists
///
/// The first existing candidate decides the outcome. Errors name that
/// candidate.
pub fn read_world_file(path: &Path, extension: Option<&str>) -> Result<Option<GeoTransform>> {
    for candidate in candidate_paths(path, extension) {
        if !candidate.is_file() {
            continue;
        }
        debug!(world_file = %candidate.display(), "reading world file");
        return fs::read_to_string(&candidate)
            .map_err(RasterError::from)
            .and_then(|text| parse_world_file(&text))
            .map(Some)
            .map_err(|e| RasterError::WorldFile(format!("{}: {}", candidate.display(), e)));
    }
    Ok(None)
}
