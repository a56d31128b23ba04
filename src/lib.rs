//! rasterwin - windowed raster extraction with nested source metadata
//!
//! Reads rectangular windows of pixels from raster sources and hands them to
//! host environments that only understand two numeric array types (8-bit
//! unsigned and 64-bit float) and generic records.
//!
//! # Features
//!
//! - Sub-window reads with optional resampling, defaults filled from the band
//! - Byte bands stay `u8`, every other numeric type is widened to `f64`
//! - Column-major output, shaped `(rows, cols)` for the host
//! - Nested metadata: drivers, bands and their overviews, no-data values
//! - Georeferencing from the source or from `.wld`-style world files
//!
//! Decoding itself is delegated to a [`RasterBackend`]. [`MemoryBackend`]
//! serves in-process datasets; with the `gdal` feature, `GdalBackend` opens
//! files on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use rasterwin::{RasterReader, RequestOptions, TracingSink};
//!
//! let reader = RasterReader::new(backend);
//! let options = RequestOptions::new().with_window(0, 0, 250, 300);
//! let pixels = reader.read_pixels("scan.tif", &options, &mut TracingSink)?;
//! assert_eq!(pixels.dims(), (300, 250));
//! ```

pub mod access;
pub mod backend;
pub mod diagnostics;
pub mod error;
pub mod fetch;
#[cfg(feature = "gdal")]
pub mod gdal_backend;
pub mod georef;
pub mod host;
pub mod memory;
pub mod metadata;
pub mod options;
pub mod types;
pub mod utils;
pub mod window;
pub mod worldfile;

// Re-exports
pub use access::{RasterReader, Response};
pub use backend::{DriverInfo, RasterBackend, RasterBand, RasterDataset};
pub use diagnostics::{CollectingSink, DiagnosticSink, Diagnostics, TracingSink};
pub use error::{RasterError, Result};
#[cfg(feature = "gdal")]
pub use gdal_backend::GdalBackend;
pub use georef::GeoSource;
pub use host::{HostValue, Matrix, OptionsRecord};
pub use memory::{MemoryBackend, MemoryBand, MemoryDataset, Samples};
pub use metadata::{BandInfo, OverviewInfo, SourceMetadata};
pub use options::RequestOptions;
pub use types::{DataType, GeoTransform, PixelArray, PixelRepr};
pub use window::Window;

/// Version of this crate
pub const RASTERWIN_VERSION: &str = env!("CARGO_PKG_VERSION");
