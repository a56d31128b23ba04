//! Raster access - main API for pixel and metadata requests

use crate::backend::{RasterBackend, RasterBand};
use crate::diagnostics::{DiagnosticSink, Diagnostics};
use crate::error::{Result, RasterError};
use crate::fetch;
use crate::host::HostValue;
use crate::metadata::{self, SourceMetadata};
use crate::options::{self, RequestOptions};
use crate::types::PixelArray;
use crate::window;
use parking_lot::Once;
use std::path::Path;
use tracing::debug;

/// Result of a request: pixels or metadata, never both
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Pixels(PixelArray),
    Metadata(SourceMetadata),
}

impl Response {
    pub fn as_pixels(&self) -> Option<&PixelArray> {
        match self {
            Response::Pixels(p) => Some(p),
            Response::Metadata(_) => None,
        }
    }

    pub fn as_metadata(&self) -> Option<&SourceMetadata> {
        match self {
            Response::Metadata(m) => Some(m),
            Response::Pixels(_) => None,
        }
    }

    pub fn into_pixels(self) -> Option<PixelArray> {
        match self {
            Response::Pixels(p) => Some(p),
            Response::Metadata(_) => None,
        }
    }

    pub fn into_metadata(self) -> Option<SourceMetadata> {
        match self {
            Response::Metadata(m) => Some(m),
            Response::Pixels(_) => None,
        }
    }
}

/// Guards driver registration for the lifetime of the process
static REGISTRATION: Once = Once::new();

/// Whether driver registration has already run in this process
pub fn drivers_registered() -> bool {
    REGISTRATION.state().done()
}

/// Main interface for reading rasters through a backend
///
/// Driver registration runs on the first request made through any reader
/// and never again in the same process.
pub struct RasterReader<B: RasterBackend> {
    backend: B,
}

impl<B: RasterBackend> RasterReader<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn ensure_registered(&self) {
        REGISTRATION.call_once(|| {
            debug!("registering drivers");
            self.backend.register_drivers()
        });
    }

    /// Host entry point: `args` are `(filename)` or `(filename, options)`
    pub fn invoke(
        &self,
        args: &[HostValue],
        outputs: usize,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Response> {
        if outputs != 1 {
            return Err(RasterError::InvalidCall(
                "Only one output argument is allowed.".to_string(),
            ));
        }
        match args {
            [] => Err(RasterError::InvalidCall(
                "At least one input argument is required.".to_string(),
            )),
            [filename] => self.fetch_pixels(filename, None, sink),
            [filename, options] => self.fetch_pixels(filename, Some(options), sink),
            _ => Err(RasterError::InvalidCall(
                "No more than two input arguments are allowed.".to_string(),
            )),
        }
    }

    /// Validate host arguments, resolve options and dispatch
    pub fn fetch_pixels(
        &self,
        filename: &HostValue,
        options: Option<&HostValue>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Response> {
        let path = match filename {
            HostValue::Text(name) => name,
            other => {
                return Err(RasterError::InvalidCall(format!(
                    "Input file name must be a string, not {}",
                    other.kind()
                )))
            }
        };

        let record = match options {
            None => None,
            Some(HostValue::Record(record)) => Some(record),
            Some(other) => {
                return Err(RasterError::InvalidCall(format!(
                    "2nd input argument must be a structure, not {}",
                    other.kind()
                )))
            }
        };

        let options = {
            let mut diag = Diagnostics::new(&mut *sink, true);
            options::resolve_or_default(record, &mut diag)?
        };

        self.request(path, &options, sink)
    }

    /// Metadata when `dump_metadata_only` is set, pixels otherwise
    pub fn request(
        &self,
        path: impl AsRef<Path>,
        options: &RequestOptions,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Response> {
        let path = path.as_ref();
        if options.dump_metadata_only {
            debug!(path = %path.display(), "metadata request");
            self.describe(path, options.verbose, sink)
                .map(Response::Metadata)
        } else {
            debug!(path = %path.display(), band = options.band, "pixel request");
            self.read_pixels(path, options, sink).map(Response::Pixels)
        }
    }

    /// Describe a source without reading any pixels
    pub fn describe(
        &self,
        path: impl AsRef<Path>,
        verbose: bool,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<SourceMetadata> {
        self.ensure_registered();
        let mut diag = Diagnostics::new(sink, verbose);
        metadata::describe(&self.backend, path.as_ref(), &mut diag)
    }

    /// Read the requested band (or overview) window
    pub fn read_pixels(
        &self,
        path: impl AsRef<Path>,
        options: &RequestOptions,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<PixelArray> {
        self.ensure_registered();
        let path = path.as_ref();
        let mut diag = Diagnostics::new(sink, options.verbose);

        let dataset = self.backend.open(path)?;
        let count = dataset.raster_count();
        let index = usize::try_from(options.band)
            .ok()
            .filter(|b| (1..=count).contains(b))
            .ok_or_else(|| RasterError::InvalidBand {
                path: path.display().to_string(),
                band: options.band,
                count,
            })?;
        let band = dataset.band(index)?;

        let result = match options.overview {
            None => read_band(band.as_ref(), options, &mut diag),
            Some(overview) => {
                let available = band.overview_count();
                if overview >= available {
                    return Err(RasterError::InvalidOverview {
                        path: path.display().to_string(),
                        overview,
                        count: available,
                    });
                }
                let reduced = band.overview(overview)?;
                read_band(reduced.as_ref(), options, &mut diag)
            }
        };

        result.map_err(|e| match e {
            RasterError::Read(msg) => RasterError::Read(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }
}

fn read_band(
    band: &dyn RasterBand,
    options: &RequestOptions,
    diag: &mut Diagnostics<'_>,
) -> Result<PixelArray> {
    let (width, height) = band.size();
    let window = window::plan(options, width, height)?;
    fetch::fetch(band, &window, diag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::host::OptionsRecord;
    use crate::memory::{MemoryBackend, MemoryBand, MemoryDataset};

    fn reader() -> RasterReader<MemoryBackend> {
        let band = MemoryBand::from_u8(5, 4, (0..20).collect())
            .unwrap()
            .with_overview(MemoryBand::from_u8(2, 2, vec![7, 8, 9, 10]).unwrap());
        let second = MemoryBand::from_f64(5, 4, vec![1.5; 20]).unwrap();
        RasterReader::new(
            MemoryBackend::new().with_dataset("img.tif", MemoryDataset::new(vec![band, second])),
        )
    }

    #[test]
    fn test_default_call_reads_band_one() {
        let reader = reader();
        let mut sink = CollectingSink::new();
        let response = reader
            .invoke(&[HostValue::text("img.tif")], 1, &mut sink)
            .unwrap();
        let pixels = response.into_pixels().unwrap();
        assert_eq!(pixels.dims(), (4, 5));
        assert_eq!(pixels.get(1, 2), Some(7.0));
        // verbose is on by default
        assert!(sink.traces().next().is_some());
    }

    #[test]
    fn test_band_and_overview_selection() {
        let reader = reader();
        let mut sink = CollectingSink::new();

        let options = RequestOptions::new().with_band(2).with_verbose(false);
        let pixels = reader.read_pixels("img.tif", &options, &mut sink).unwrap();
        assert_eq!(pixels.get(0, 0), Some(1.5));
        assert!(pixels.as_f64().is_some());

        let options = RequestOptions::new().with_overview(0).with_verbose(false);
        let pixels = reader.read_pixels("img.tif", &options, &mut sink).unwrap();
        assert_eq!(pixels.dims(), (2, 2));
        assert_eq!(pixels.get(1, 0), Some(9.0));
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_invalid_band_and_overview() {
        let reader = reader();
        let mut sink = CollectingSink::new();

        for band in [0, 3, -1] {
            let options = RequestOptions::new().with_band(band);
            match reader.read_pixels("img.tif", &options, &mut sink) {
                Err(RasterError::InvalidBand { path, count: 2, .. }) => assert_eq!(path, "img.tif"),
                other => panic!("unexpected {:?}", other),
            }
        }

        let options = RequestOptions::new().with_overview(1);
        let err = reader.read_pixels("img.tif", &options, &mut sink).unwrap_err();
        assert!(matches!(
            err,
            RasterError::InvalidOverview { overview: 1, count: 1, .. }
        ));
        assert!(err.to_string().contains("img.tif"));
    }

    #[test]
    fn test_read_errors_name_the_file() {
        let reader = reader();
        let mut sink = CollectingSink::new();
        let options = RequestOptions::new().with_window(3, 0, 5, 4).with_verbose(false);
        match reader.read_pixels("img.tif", &options, &mut sink) {
            Err(RasterError::Read(msg)) => assert!(msg.starts_with("img.tif: ")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_call_shape_validation() {
        let reader = reader();
        let mut sink = CollectingSink::new();
        let name = HostValue::text("img.tif");

        assert!(matches!(
            reader.invoke(&[name.clone()], 2, &mut sink),
            Err(RasterError::InvalidCall(_))
        ));
        assert!(matches!(reader.invoke(&[], 1, &mut sink), Err(RasterError::InvalidCall(_))));
        assert!(matches!(
            reader.invoke(&[name.clone(), name.clone(), name.clone()], 1, &mut sink),
            Err(RasterError::InvalidCall(_))
        ));
        assert!(matches!(
            reader.invoke(&[HostValue::scalar(1.0)], 1, &mut sink),
            Err(RasterError::InvalidCall(msg)) if msg.contains("string")
        ));
        assert!(matches!(
            reader.invoke(&[name, HostValue::scalar(1.0)], 1, &mut sink),
            Err(RasterError::InvalidCall(msg)) if msg.contains("structure")
        ));
    }

    #[test]
    fn test_dump_mode_returns_metadata_only() {
        let reader = reader();
        let mut sink = CollectingSink::new();
        let options = HostValue::Record(
            OptionsRecord::new()
                .with("gdal_dump", 1.0)
                .with("verbose", 0.0),
        );
        let response = reader
            .invoke(&[HostValue::text("img.tif"), options], 1, &mut sink)
            .unwrap();
        let metadata = response.as_metadata().unwrap();
        assert_eq!(metadata.band_count, 2);
        assert!(response.as_pixels().is_none());
    }

    #[test]
    fn test_drivers_registered_once_across_readers() {
        // other tests in this process may have registered already
        let backend = reader().backend;
        let first = RasterReader::new(&backend);
        let second = RasterReader::new(&backend);
        let mut sink = CollectingSink::new();
        let quiet = RequestOptions::new().with_verbose(false);
        for _ in 0..3 {
            first.read_pixels("img.tif", &quiet, &mut sink).unwrap();
            second.describe("img.tif", false, &mut sink).unwrap();
        }
        assert!(drivers_registered());
        assert!(backend.registration_count() <= 1);
    }
}
