//! GDAL backend - reads real raster files through the `gdal` crate

use crate::backend::{DriverInfo, RasterBackend, RasterBand, RasterDataset};
use crate::error::{RasterError, Result};
use crate::types::{DataType, GeoTransform};
use crate::window::Window;
use gdal::errors::GdalError;
use gdal::raster::{GdalDataType, GdalType, RasterBand as GdalRasterBand, ResampleAlg};
use gdal::{Dataset, DriverManager};
use std::path::Path;
use tracing::debug;

/// Backend opening files with GDAL
#[derive(Debug, Default, Clone, Copy)]
pub struct GdalBackend;

impl GdalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl RasterBackend for GdalBackend {
    fn register_drivers(&self) {
        DriverManager::register_all();
    }

    fn drivers(&self) -> Vec<DriverInfo> {
        (0..DriverManager::count())
            .filter_map(|index| DriverManager::get_driver(index).ok())
            .map(|driver| DriverInfo::new(driver.short_name(), driver.long_name()))
            .collect()
    }

    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn RasterDataset + 'a>> {
        let dataset = Dataset::open(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "GDAL open failed");
            RasterError::OpenFailed {
                path: path.display().to_string(),
            }
        })?;
        Ok(Box::new(GdalDataset { dataset }))
    }
}

/// An open GDAL dataset; dropping it closes the file
pub struct GdalDataset {
    dataset: Dataset,
}

impl RasterDataset for GdalDataset {
    fn projection(&self) -> String {
        self.dataset.projection()
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        self.dataset.geo_transform().ok().map(GeoTransform::new)
    }

    fn driver(&self) -> DriverInfo {
        let driver = self.dataset.driver();
        DriverInfo::new(driver.short_name(), driver.long_name())
    }

    fn raster_size(&self) -> (usize, usize) {
        self.dataset.raster_size()
    }

    fn raster_count(&self) -> usize {
        self.dataset.raster_count()
    }

    fn band<'a>(&'a self, index: usize) -> Result<Box<dyn RasterBand + 'a>> {
        let band = self.dataset.rasterband(index).map_err(read_error)?;
        Ok(Box::new(GdalBand { band }))
    }
}

/// A band or overview of a [`GdalDataset`]
pub struct GdalBand<'a> {
    band: GdalRasterBand<'a>,
}

impl GdalBand<'_> {
    fn read_into<T: Copy + GdalType>(&self, window: &Window, buf: &mut [T]) -> Result<()> {
        let origin = (to_offset(window.x_origin)?, to_offset(window.y_origin)?);
        self.band
            .read_into_slice(
                origin,
                (window.x_extent, window.y_extent),
                (window.x_out, window.y_out),
                buf,
                Some(ResampleAlg::NearestNeighbour),
            )
            .map_err(read_error)
    }
}

impl RasterBand for GdalBand<'_> {
    fn size(&self) -> (usize, usize) {
        self.band.size()
    }

    fn data_type(&self) -> DataType {
        data_type_from_gdal(self.band.band_type())
    }

    fn no_data_value(&self) -> Option<f64> {
        self.band.no_data_value()
    }

    fn overview_count(&self) -> usize {
        self.band
            .overview_count()
            .ok()
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(0)
    }

    fn overview<'b>(&'b self, index: usize) -> Result<Box<dyn RasterBand + 'b>> {
        let band = self.band.overview(index).map_err(read_error)?;
        Ok(Box::new(GdalBand { band }))
    }

    fn color_interpretation(&self) -> String {
        self.band.color_interpretation().name()
    }

    fn min_max(&self) -> Option<(f64, f64)> {
        match self.band.get_statistics(false, true) {
            Ok(Some(stats)) => Some((stats.min, stats.max)),
            _ => None,
        }
    }

    fn compute_min_max(&self) -> Result<(f64, f64)> {
        self.band
            .compute_raster_min_max(false)
            .map(|stats| (stats.min, stats.max))
            .map_err(read_error)
    }

    fn read_u8(&self, window: &Window, buf: &mut [u8]) -> Result<()> {
        self.read_into(window, buf)
    }

    fn read_f64(&self, window: &Window, buf: &mut [f64]) -> Result<()> {
        self.read_into(window, buf)
    }
}

/// GDAL types without a `DataType` counterpart come back as `Unknown`
pub fn data_type_from_gdal(data_type: GdalDataType) -> DataType {
    match data_type {
        GdalDataType::UInt8 => DataType::Byte,
        GdalDataType::UInt16 => DataType::UInt16,
        GdalDataType::Int16 => DataType::Int16,
        GdalDataType::UInt32 => DataType::UInt32,
        GdalDataType::Int32 => DataType::Int32,
        GdalDataType::Float32 => DataType::Float32,
        GdalDataType::Float64 => DataType::Float64,
        _ => DataType::Unknown,
    }
}

fn to_offset(value: usize) -> Result<isize> {
    isize::try_from(value)
        .map_err(|_| RasterError::InvalidWindow(format!("origin {} exceeds the offset range", value)))
}

fn read_error(err: GdalError) -> RasterError {
    RasterError::Read(err.to_string())
}
