//! Utility functions

use std::path::{Path, PathBuf};

/// Format byte size in human-readable form
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Extension of the final path component, without the dot
pub fn file_extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Replace (or append) the extension of `path`
pub fn replace_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}

/// Append a synthetic extension so a later replacement keeps the original one
///
/// `a.tif` becomes `a.tif.xxx`, whose sidecar is then `a.tif.wld`.
pub fn with_synthetic_extension(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".xxx");
    PathBuf::from(name)
}
