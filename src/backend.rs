//! Decoder backends - the boundary to the library that actually reads rasters
//!
//! Everything behind these traits is synchronous. Dropping a dataset handle
//! closes the source.

use crate::error::Result;
use crate::types::{DataType, GeoTransform};
use crate::window::Window;
use crate::worldfile;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Identity of a format driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverInfo {
    pub short_name: String,
    pub long_name: String,
}

impl DriverInfo {
    pub fn new(short_name: impl Into<String>, long_name: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            long_name: long_name.into(),
        }
    }
}

/// Trait for raster decoding libraries
pub trait RasterBackend {
    /// Register the format drivers; called at most once per process
    fn register_drivers(&self);

    /// All registered drivers, in registry order
    fn drivers(&self) -> Vec<DriverInfo>;

    /// Open a source read-only
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn RasterDataset + 'a>>;

    /// Read a sidecar world file for `path`
    ///
    /// With `Some(ext)` the raster's extension is replaced by `ext`; with
    /// `None` the extension is guessed from the raster's own.
    fn read_world_file(&self, path: &Path, extension: Option<&str>) -> Option<GeoTransform> {
        match worldfile::read_world_file(path, extension) {
            Ok(found) => found,
            Err(e) => {
                debug!(
                    raster = %path.display(),
                    extension = ?extension,
                    error = %e,
                    "world file unreadable, trying next strategy"
                );
                None
            }
        }
    }

    /// Whether `read_world_file` accepts `None` for the extension
    fn supports_world_file_guess(&self) -> bool {
        true
    }
}

/// An opened raster source
pub trait RasterDataset {
    /// Projection definition, empty when the source has none
    fn projection(&self) -> String;

    /// Internally stored transform, if any
    fn geo_transform(&self) -> Option<GeoTransform>;

    /// Driver that opened this source
    fn driver(&self) -> DriverInfo;

    /// `(width, height)` of the dataset
    fn raster_size(&self) -> (usize, usize);

    fn raster_count(&self) -> usize;

    /// 1-based band access
    fn band<'a>(&'a self, index: usize) -> Result<Box<dyn RasterBand + 'a>>;
}

/// A single band, or one of its overviews
pub trait RasterBand {
    /// `(width, height)` of the band
    fn size(&self) -> (usize, usize);

    fn data_type(&self) -> DataType;

    fn no_data_value(&self) -> Option<f64>;

    fn overview_count(&self) -> usize;

    /// 0-based overview access
    fn overview<'a>(&'a self, index: usize) -> Result<Box<dyn RasterBand + 'a>>;

    fn color_interpretation(&self) -> String {
        "Undefined".to_string()
    }

    /// Stored min/max statistics, if the source carries them
    fn min_max(&self) -> Option<(f64, f64)> {
        None
    }

    /// Scan the band for its min/max
    fn compute_min_max(&self) -> Result<(f64, f64)>;

    /// Read `window` resampled into `buf` as bytes, row-major
    fn read_u8(&self, window: &Window, buf: &mut [u8]) -> Result<()>;

    /// Read `window` resampled into `buf` widened to f64, row-major
    fn read_f64(&self, window: &Window, buf: &mut [f64]) -> Result<()>;
}

impl<T: RasterBackend + ?Sized> RasterBackend for &T {
    fn register_drivers(&self) {
        (**self).register_drivers()
    }

    fn drivers(&self) -> Vec<DriverInfo> {
        (**self).drivers()
    }

    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn RasterDataset + 'a>> {
        (**self).open(path)
    }

    fn read_world_file(&self, path: &Path, extension: Option<&str>) -> Option<GeoTransform> {
        (**self).read_world_file(path, extension)
    }

    fn supports_world_file_guess(&self) -> bool {
        (**self).supports_world_file_guess()
    }
}

impl<T: RasterDataset + ?Sized> RasterDataset for &T {
    fn projection(&self) -> String {
        (**self).projection()
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        (**self).geo_transform()
    }

    fn driver(&self) -> DriverInfo {
        (**self).driver()
    }

    fn raster_size(&self) -> (usize, usize) {
        (**self).raster_size()
    }

    fn raster_count(&self) -> usize {
        (**self).raster_count()
    }

    fn band<'a>(&'a self, index: usize) -> Result<Box<dyn RasterBand + 'a>> {
        (**self).band(index)
    }
}

impl<T: RasterBand + ?Sized> RasterBand for &T {
    fn size(&self) -> (usize, usize) {
        (**self).size()
    }

    fn data_type(&self) -> DataType {
        (**self).data_type()
    }

    fn no_data_value(&self) -> Option<f64> {
        (**self).no_data_value()
    }

    fn overview_count(&self) -> usize {
        (**self).overview_count()
    }

    fn overview<'a>(&'a self, index: usize) -> Result<Box<dyn RasterBand + 'a>> {
        (**self).overview(index)
    }

    fn color_interpretation(&self) -> String {
        (**self).color_interpretation()
    }

    fn min_max(&self) -> Option<(f64, f64)> {
        (**self).min_max()
    }

    fn compute_min_max(&self) -> Result<(f64, f64)> {
        (**self).compute_min_max()
    }

    fn read_u8(&self, window: &Window, buf: &mut [u8]) -> Result<()> {
        (**self).read_u8(window, buf)
    }

    fn read_f64(&self, window: &Window, buf: &mut [f64]) -> Result<()> {
        (**self).read_f64(window, buf)
    }
}
