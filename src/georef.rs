//! Georeference resolution with world-file fallbacks

use crate::backend::{RasterBackend, RasterDataset};
use crate::types::GeoTransform;
use crate::utils::with_synthetic_extension;
use std::path::Path;

/// Where a transform was found, in the order sources are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoSource {
    /// Stored inside the source
    Internal,
    /// `a.tif` -> `a.wld`
    WorldFile,
    /// `a.tif` -> `a.tif.wld`
    AppendedWorldFile,
    /// Extension guessed by the backend, e.g. `a.tfw`
    GuessedWorldFile,
}

impl GeoSource {
    pub const ORDER: [GeoSource; 4] = [
        GeoSource::Internal,
        GeoSource::WorldFile,
        GeoSource::AppendedWorldFile,
        GeoSource::GuessedWorldFile,
    ];

    fn attempt(
        &self,
        backend: &dyn RasterBackend,
        dataset: &dyn RasterDataset,
        path: &Path,
    ) -> Option<GeoTransform> {
        match self {
            GeoSource::Internal => dataset.geo_transform(),
            GeoSource::WorldFile => backend.read_world_file(path, Some("wld")),
            GeoSource::AppendedWorldFile => {
                backend.read_world_file(&with_synthetic_extension(path), Some("wld"))
            }
            GeoSource::GuessedWorldFile => {
                if backend.supports_world_file_guess() {
                    backend.read_world_file(path, None)
                } else {
                    None
                }
            }
        }
    }
}

/// Find a transform for `dataset`, stopping at the first source that has one
///
/// Absence is not an error; many rasters are simply unreferenced.
pub fn resolve_with_source(
    backend: &dyn RasterBackend,
    dataset: &dyn RasterDataset,
    path: &Path,
) -> Option<(GeoTransform, GeoSource)> {
    GeoSource::ORDER.iter().find_map(|source| {
        source
            .attempt(backend, dataset, path)
            .map(|transform| (transform, *source))
    })
}

pub fn resolve(
    backend: &dyn RasterBackend,
    dataset: &dyn RasterDataset,
    path: &Path,
) -> Option<GeoTransform> {
    resolve_with_source(backend, dataset, path).map(|(transform, _)| transform)
}
