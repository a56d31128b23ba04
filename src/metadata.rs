//! Source metadata - the nested description of a raster source

use crate::backend::{DriverInfo, RasterBackend, RasterBand, RasterDataset};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::georef;
use crate::types::GeoTransform;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Size of one reduced-resolution overview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewInfo {
    pub width: usize,
    pub height: usize,
}

/// Description of one band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandInfo {
    pub width: usize,
    pub height: usize,
    pub data_type_name: String,
    /// `None` when the band declares no no-data value
    pub no_data_value: Option<f64>,
    /// Empty when the band has no overviews
    pub overviews: Vec<OverviewInfo>,
}

/// Complete description of a raster source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    /// Projection definition, possibly empty
    pub projection_text: String,

    /// Absent (not zeroed) when no georeferencing could be found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_transform: Option<GeoTransform>,

    pub driver_short_name: String,
    pub driver_long_name: String,
    pub width: usize,
    pub height: usize,
    pub band_count: usize,

    /// Every driver the backend has registered, in registry order
    pub drivers: Vec<DriverInfo>,

    /// One entry per band, in band order
    pub bands: Vec<BandInfo>,
}

impl SourceMetadata {
    /// Serialize into the host's generic record form
    pub fn to_record(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} ({}): {}x{}, {} band(s), {}",
            self.driver_short_name,
            self.driver_long_name,
            self.width,
            self.height,
            self.band_count,
            if self.geo_transform.is_some() {
                "georeferenced"
            } else {
                "not georeferenced"
            }
        )
    }
}

/// Open `path` and describe it
///
/// The source is closed before returning.
pub fn describe(
    backend: &dyn RasterBackend,
    path: &Path,
    diag: &mut Diagnostics<'_>,
) -> Result<SourceMetadata> {
    let drivers = backend.drivers();

    let dataset = backend.open(path)?;
    diag.trace(|| format!("Describing {}", path.display()));

    describe_dataset(backend, dataset.as_ref(), path, drivers, diag)
}

fn describe_dataset(
    backend: &dyn RasterBackend,
    dataset: &dyn RasterDataset,
    path: &Path,
    drivers: Vec<DriverInfo>,
    diag: &mut Diagnostics<'_>,
) -> Result<SourceMetadata> {
    let geo_transform = match georef::resolve_with_source(backend, dataset, path) {
        Some((transform, source)) => {
            diag.trace(|| format!("GeoTransform from {:?}", source));
            Some(transform)
        }
        None => {
            diag.warn(format!(
                "No internal georeferencing exists for {}, and could not find a suitable world file either.",
                path.display()
            ));
            None
        }
    };

    let driver = dataset.driver();
    let (width, height) = dataset.raster_size();
    let band_count = dataset.raster_count();

    let bands = (1..=band_count)
        .map(|index| {
            let band = dataset.band(index)?;
            describe_band(band.as_ref())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SourceMetadata {
        projection_text: dataset.projection(),
        geo_transform,
        driver_short_name: driver.short_name,
        driver_long_name: driver.long_name,
        width,
        height,
        band_count,
        drivers,
        bands,
    })
}

fn describe_band(band: &dyn RasterBand) -> Result<BandInfo> {
    let (width, height) = band.size();

    let overviews = (0..band.overview_count())
        .map(|index| {
            let (width, height) = band.overview(index)?.size();
            Ok(OverviewInfo { width, height })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BandInfo {
        width,
        height,
        data_type_name: band.data_type().name().to_string(),
        no_data_value: band.no_data_value(),
        overviews,
    })
}
