//! Error types for raster window and metadata requests

use crate::types::DataType;
use thiserror::Error;

/// Main error type for raster requests
#[derive(Error, Debug)]
pub enum RasterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid call: {0}")]
    InvalidCall(String),

    #[error("Unable to open {path}")]
    OpenFailed { path: String },

    #[error("{field} field must be 1x1 rather than {rows}x{cols}")]
    InvalidOptionShape {
        field: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("Band {band} requested but {path} has {count} band(s)")]
    InvalidBand { path: String, band: i64, count: usize },

    #[error("Overview {overview} requested but the band of {path} has {count} overview(s)")]
    InvalidOverview {
        path: String,
        overview: usize,
        count: usize,
    },

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Unhandled data type {} (code {})", .0, .0.code())]
    UnsupportedDataType(DataType),

    #[error("Read error: {0}")]
    Read(String),

    #[error("World file error: {0}")]
    WorldFile(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Specialized Result type for raster requests
pub type Result<T> = std::result::Result<T, RasterError>;

impl From<serde_json::Error> for RasterError {
    fn from(err: serde_json::Error) -> Self {
        RasterError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = RasterError::OpenFailed {
            path: "missing.tif".to_string(),
        };
        assert!(err.to_string().contains("missing.tif"));

        let err = RasterError::InvalidOptionShape {
            field: "xout",
            rows: 1,
            cols: 2,
        };
        assert_eq!(err.to_string(), "xout field must be 1x1 rather than 1x2");

        let err = RasterError::InvalidBand {
            path: "scan.tif".to_string(),
            band: 4,
            count: 3,
        };
        assert_eq!(err.to_string(), "Band 4 requested but scan.tif has 3 band(s)");

        let err = RasterError::InvalidOverview {
            path: "scan.tif".to_string(),
            overview: 2,
            count: 1,
        };
        assert!(err.to_string().contains("scan.tif"));

        let err = RasterError::UnsupportedDataType(DataType::CFloat32);
        assert!(err.to_string().contains("CFloat32"));
        assert!(err.to_string().contains("10"));
    }
}
