//! In-process raster backend
//!
//! Holds datasets in memory keyed by path. Sidecar world files are still
//! read from disk through the default [`RasterBackend::read_world_file`].

use crate::backend::{DriverInfo, RasterBackend, RasterBand, RasterDataset};
use crate::error::{Result, RasterError};
use crate::types::{DataType, GeoTransform};
use crate::window::Window;
use num_traits::ToPrimitive;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Typed sample storage, row-major
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    /// Complex bands keep only their type; they cannot be read
    Complex(DataType),
}

impl Samples {
    pub fn data_type(&self) -> DataType {
        match self {
            Samples::U8(_) => DataType::Byte,
            Samples::U16(_) => DataType::UInt16,
            Samples::I16(_) => DataType::Int16,
            Samples::U32(_) => DataType::UInt32,
            Samples::I32(_) => DataType::Int32,
            Samples::F32(_) => DataType::Float32,
            Samples::F64(_) => DataType::Float64,
            Samples::Complex(dt) => *dt,
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Samples::U8(v) => Some(v.len()),
            Samples::U16(v) => Some(v.len()),
            Samples::I16(v) => Some(v.len()),
            Samples::U32(v) => Some(v.len()),
            Samples::I32(v) => Some(v.len()),
            Samples::F32(v) => Some(v.len()),
            Samples::F64(v) => Some(v.len()),
            Samples::Complex(_) => None,
        }
    }

    /// Sample at `index` widened to f64
    fn value(&self, index: usize) -> Option<f64> {
        match self {
            Samples::U8(v) => widen(v, index),
            Samples::U16(v) => widen(v, index),
            Samples::I16(v) => widen(v, index),
            Samples::U32(v) => widen(v, index),
            Samples::I32(v) => widen(v, index),
            Samples::F32(v) => widen(v, index),
            Samples::F64(v) => widen(v, index),
            Samples::Complex(_) => None,
        }
    }
}

fn widen<T: ToPrimitive>(values: &[T], index: usize) -> Option<f64> {
    values.get(index).and_then(ToPrimitive::to_f64)
}

/// One in-memory band with optional overviews
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryBand {
    width: usize,
    height: usize,
    samples: Samples,
    no_data: Option<f64>,
    color_interpretation: String,
    statistics: Option<(f64, f64)>,
    overviews: Vec<MemoryBand>,
}

impl MemoryBand {
    /// Create a band, checking the sample count against the size
    pub fn new(width: usize, height: usize, samples: Samples) -> Result<Self> {
        if let Some(len) = samples.len() {
            if len != width * height {
                return Err(RasterError::InvalidWindow(format!(
                    "{} samples do not fill a {}x{} band",
                    len, width, height
                )));
            }
        }
        Ok(Self {
            width,
            height,
            samples,
            no_data: None,
            color_interpretation: "Gray".to_string(),
            statistics: None,
            overviews: Vec::new(),
        })
    }

    pub fn from_u8(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, Samples::U8(data))
    }

    pub fn from_i16(width: usize, height: usize, data: Vec<i16>) -> Result<Self> {
        Self::new(width, height, Samples::I16(data))
    }

    pub fn from_f32(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        Self::new(width, height, Samples::F32(data))
    }

    pub fn from_f64(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        Self::new(width, height, Samples::F64(data))
    }

    pub fn filled_u8(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            samples: Samples::U8(vec![value; width * height]),
            no_data: None,
            color_interpretation: "Gray".to_string(),
            statistics: None,
            overviews: Vec::new(),
        }
    }

    /// A band of a complex type, which has no readable samples
    pub fn complex(data_type: DataType, width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            samples: Samples::Complex(data_type),
            no_data: None,
            color_interpretation: "Undefined".to_string(),
            statistics: None,
            overviews: Vec::new(),
        }
    }

    pub fn with_no_data(mut self, value: f64) -> Self {
        self.no_data = Some(value);
        self
    }

    pub fn with_color_interpretation(mut self, name: impl Into<String>) -> Self {
        self.color_interpretation = name.into();
        self
    }

    pub fn with_statistics(mut self, min: f64, max: f64) -> Self {
        self.statistics = Some((min, max));
        self
    }

    pub fn with_overview(mut self, overview: MemoryBand) -> Self {
        self.overviews.push(overview);
        self
    }

    /// Nearest-neighbour resample of `window`, visiting outputs row-major
    fn resample<F>(&self, window: &Window, out_len: usize, mut emit: F) -> Result<()>
    where
        F: FnMut(usize, f64),
    {
        if window.x_out == 0 || window.y_out == 0 || window.x_extent == 0 || window.y_extent == 0 {
            return Err(RasterError::Read(format!(
                "Illegal window {}x{} at ({}, {}) into {}x{} buffer",
                window.x_extent, window.y_extent, window.x_origin, window.y_origin, window.x_out,
                window.y_out
            )));
        }
        if !window.fits_within(self.width, self.height) {
            return Err(RasterError::Read(format!(
                "Access window {}x{} at ({}, {}) is out of range for {}x{} band",
                window.x_extent, window.y_extent, window.x_origin, window.y_origin, self.width,
                self.height
            )));
        }
        if window.output_len() != Some(out_len) {
            return Err(RasterError::Read(format!(
                "Buffer holds {} samples, window needs {}x{}",
                out_len, window.x_out, window.y_out
            )));
        }

        let x_ratio = window.x_extent as f64 / window.x_out as f64;
        let y_ratio = window.y_extent as f64 / window.y_out as f64;

        for oy in 0..window.y_out {
            let sy = ((oy as f64 + 0.5) * y_ratio) as usize;
            let sy = window.y_origin + sy.min(window.y_extent - 1);
            for ox in 0..window.x_out {
                let sx = ((ox as f64 + 0.5) * x_ratio) as usize;
                let sx = window.x_origin + sx.min(window.x_extent - 1);
                let value = self
                    .samples
                    .value(sy * self.width + sx)
                    .ok_or(RasterError::UnsupportedDataType(self.samples.data_type()))?;
                emit(oy * window.x_out + ox, value);
            }
        }
        Ok(())
    }
}

impl RasterBand for MemoryBand {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn data_type(&self) -> DataType {
        self.samples.data_type()
    }

    fn no_data_value(&self) -> Option<f64> {
        self.no_data
    }

    fn overview_count(&self) -> usize {
        self.overviews.len()
    }

    fn overview<'a>(&'a self, index: usize) -> Result<Box<dyn RasterBand + 'a>> {
        self.overviews
            .get(index)
            .map(|o| Box::new(o) as Box<dyn RasterBand + 'a>)
            .ok_or_else(|| {
                RasterError::Read(format!(
                    "overview {} out of range, band has {}",
                    index,
                    self.overviews.len()
                ))
            })
    }

    fn color_interpretation(&self) -> String {
        self.color_interpretation.clone()
    }

    fn min_max(&self) -> Option<(f64, f64)> {
        self.statistics
    }

    fn compute_min_max(&self) -> Result<(f64, f64)> {
        let len = self.width * self.height;
        let mut range: Option<(f64, f64)> = None;
        for index in 0..len {
            let value = self
                .samples
                .value(index)
                .ok_or(RasterError::UnsupportedDataType(self.samples.data_type()))?;
            if self.no_data == Some(value) || value.is_nan() {
                continue;
            }
            range = Some(match range {
                Some((min, max)) => (min.min(value), max.max(value)),
                None => (value, value),
            });
        }
        range.ok_or_else(|| RasterError::Read("No valid pixels to compute min/max".to_string()))
    }

    fn read_u8(&self, window: &Window, buf: &mut [u8]) -> Result<()> {
        let len = buf.len();
        self.resample(window, len, |i, v| {
            buf[i] = v.round().clamp(0.0, 255.0) as u8;
        })
    }

    fn read_f64(&self, window: &Window, buf: &mut [f64]) -> Result<()> {
        let len = buf.len();
        self.resample(window, len, |i, v| buf[i] = v)
    }
}

/// An in-memory dataset
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDataset {
    driver: DriverInfo,
    projection: String,
    geo_transform: Option<GeoTransform>,
    size: Option<(usize, usize)>,
    bands: Vec<MemoryBand>,
}

impl MemoryDataset {
    pub fn new(bands: Vec<MemoryBand>) -> Self {
        Self {
            driver: DriverInfo::new("MEM", "In Memory Raster"),
            projection: String::new(),
            geo_transform: None,
            size: None,
            bands,
        }
    }

    pub fn with_driver(mut self, driver: DriverInfo) -> Self {
        self.driver = driver;
        self
    }

    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = projection.into();
        self
    }

    pub fn with_geo_transform(mut self, geo_transform: GeoTransform) -> Self {
        self.geo_transform = Some(geo_transform);
        self
    }

    /// Override the dataset size, which otherwise follows the first band
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.size = Some((width, height));
        self
    }
}

impl RasterDataset for MemoryDataset {
    fn projection(&self) -> String {
        self.projection.clone()
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    fn driver(&self) -> DriverInfo {
        self.driver.clone()
    }

    fn raster_size(&self) -> (usize, usize) {
        self.size
            .or_else(|| self.bands.first().map(|b| b.size()))
            .unwrap_or((0, 0))
    }

    fn raster_count(&self) -> usize {
        self.bands.len()
    }

    fn band<'a>(&'a self, index: usize) -> Result<Box<dyn RasterBand + 'a>> {
        index
            .checked_sub(1)
            .and_then(|i| self.bands.get(i))
            .map(|b| Box::new(b) as Box<dyn RasterBand + 'a>)
            .ok_or_else(|| {
                RasterError::Read(format!(
                    "band {} out of range 1..={}",
                    index,
                    self.bands.len()
                ))
            })
    }
}

/// Backend serving [`MemoryDataset`]s by path
#[derive(Debug)]
pub struct MemoryBackend {
    drivers: Vec<DriverInfo>,
    datasets: HashMap<PathBuf, MemoryDataset>,
    registrations: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            drivers: vec![DriverInfo::new("MEM", "In Memory Raster")],
            datasets: HashMap::new(),
            registrations: AtomicUsize::new(0),
        }
    }

    /// Replace the driver registry
    pub fn with_drivers(mut self, drivers: Vec<DriverInfo>) -> Self {
        self.drivers = drivers;
        self
    }

    pub fn with_dataset(mut self, path: impl AsRef<Path>, dataset: MemoryDataset) -> Self {
        self.insert(path, dataset);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, dataset: MemoryDataset) {
        self.datasets.insert(path.as_ref().to_path_buf(), dataset);
    }

    /// How many times driver registration ran
    pub fn registration_count(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterBackend for MemoryBackend {
    fn register_drivers(&self) {
        self.registrations.fetch_add(1, Ordering::SeqCst);
    }

    fn drivers(&self) -> Vec<DriverInfo> {
        self.drivers.clone()
    }

    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn RasterDataset + 'a>> {
        self.datasets
            .get(path)
            .map(|d| Box::new(d) as Box<dyn RasterDataset + 'a>)
            .ok_or_else(|| RasterError::OpenFailed {
                path: path.display().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> MemoryBand {
        let data = (0..width * height).map(|i| i as f64).collect();
        MemoryBand::from_f64(width, height, data).unwrap()
    }

    #[test]
    fn test_band_size_checked() {
        assert!(MemoryBand::from_u8(3, 3, vec![0; 8]).is_err());
    }

    #[test]
    fn test_sub_window_read() {
        let band = gradient(4, 4);
        let window = Window {
            x_origin: 1,
            y_origin: 2,
            x_extent: 2,
            y_extent: 2,
            x_out: 2,
            y_out: 2,
        };
        let mut buf = vec![0.0; 4];
        band.read_f64(&window, &mut buf).unwrap();
        assert_eq!(buf, vec![9.0, 10.0, 13.0, 14.0]);
    }

    #[test]
    fn test_nearest_downsample() {
        let band = gradient(4, 4);
        let window = Window {
            x_out: 2,
            y_out: 2,
            ..Window::full(4, 4)
        };
        let mut buf = vec![0.0; 4];
        band.read_f64(&window, &mut buf).unwrap();
        assert_eq!(buf, vec![5.0, 7.0, 13.0, 15.0]);
    }

    #[test]
    fn test_out_of_range_window() {
        let band = gradient(4, 4);
        let window = Window {
            x_origin: 3,
            ..Window::full(4, 4)
        };
        let mut buf = vec![0.0; 16];
        assert!(matches!(
            band.read_f64(&window, &mut buf),
            Err(RasterError::Read(_))
        ));
    }

    #[test]
    fn test_zero_sized_output_rejected() {
        let band = gradient(4, 4);
        let window = Window {
            x_out: 0,
            ..Window::full(4, 4)
        };
        assert!(band.read_f64(&window, &mut []).is_err());
    }

    #[test]
    fn test_compute_min_max_skips_no_data() {
        let band = MemoryBand::from_i16(2, 2, vec![-9999, 3, 7, -2])
            .unwrap()
            .with_no_data(-9999.0);
        assert_eq!(band.compute_min_max().unwrap(), (-2.0, 7.0));
    }

    #[test]
    fn test_dataset_size_override() {
        let dataset = MemoryDataset::new(vec![gradient(3, 2)]);
        assert_eq!(dataset.raster_size(), (3, 2));
        assert_eq!(dataset.with_size(6, 4).raster_size(), (6, 4));
        assert_eq!(MemoryDataset::new(Vec::new()).raster_size(), (0, 0));
    }

    #[test]
    fn test_open_and_band_access() {
        let backend = MemoryBackend::new().with_dataset(
            "a.tif",
            MemoryDataset::new(vec![gradient(3, 2), gradient(3, 2)]),
        );

        assert!(matches!(
            backend.open(Path::new("b.tif")),
            Err(RasterError::OpenFailed { path }) if path == "b.tif"
        ));

        let dataset = backend.open(Path::new("a.tif")).unwrap();
        assert_eq!(dataset.raster_size(), (3, 2));
        assert_eq!(dataset.raster_count(), 2);
        assert!(dataset.band(2).is_ok());
        assert!(matches!(
            dataset.band(0),
            Err(RasterError::Read(msg)) if msg.contains("1..=2")
        ));
        assert!(dataset.band(3).is_err());
    }
}
