//! Core data types for raster requests

use crate::error::{Result, RasterError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Native pixel types a raster source can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataType {
    /// Type not known to the decoder
    Unknown = 0,
    /// Unsigned 8-bit integer
    Byte = 1,
    /// Unsigned 16-bit integer
    UInt16 = 2,
    /// Signed 16-bit integer
    Int16 = 3,
    /// Unsigned 32-bit integer
    UInt32 = 4,
    /// Signed 32-bit integer
    Int32 = 5,
    /// 32-bit floating point
    Float32 = 6,
    /// 64-bit floating point
    Float64 = 7,
    /// Complex pair of signed 16-bit integers
    CInt16 = 8,
    /// Complex pair of signed 32-bit integers
    CInt32 = 9,
    /// Complex pair of 32-bit floats
    CFloat32 = 10,
    /// Complex pair of 64-bit floats
    CFloat64 = 11,
}

impl DataType {
    /// Numeric type code, as reported in verbose traces
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Get the type from its numeric code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(DataType::Unknown),
            1 => Some(DataType::Byte),
            2 => Some(DataType::UInt16),
            3 => Some(DataType::Int16),
            4 => Some(DataType::UInt32),
            5 => Some(DataType::Int32),
            6 => Some(DataType::Float32),
            7 => Some(DataType::Float64),
            8 => Some(DataType::CInt16),
            9 => Some(DataType::CInt32),
            10 => Some(DataType::CFloat32),
            11 => Some(DataType::CFloat64),
            _ => None,
        }
    }

    /// Type name as it appears in band metadata
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Unknown => "Unknown",
            DataType::Byte => "Byte",
            DataType::UInt16 => "UInt16",
            DataType::Int16 => "Int16",
            DataType::UInt32 => "UInt32",
            DataType::Int32 => "Int32",
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
            DataType::CInt16 => "CInt16",
            DataType::CInt32 => "CInt32",
            DataType::CFloat32 => "CFloat32",
            DataType::CFloat64 => "CFloat64",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output representation handed to the caller
///
/// Byte sources stay 8-bit; every other supported native type is widened to
/// 64-bit float by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelRepr {
    Byte,
    Wide,
}

impl PixelRepr {
    /// Map a native type to its output representation
    ///
    /// This is the only place the native-type dispatch is decided.
    pub fn for_data_type(data_type: DataType) -> Result<Self> {
        match data_type {
            DataType::Byte => Ok(PixelRepr::Byte),
            DataType::UInt16
            | DataType::Int16
            | DataType::UInt32
            | DataType::Int32
            | DataType::Float32
            | DataType::Float64 => Ok(PixelRepr::Wide),
            DataType::Unknown
            | DataType::CInt16
            | DataType::CInt32
            | DataType::CFloat32
            | DataType::CFloat64 => Err(RasterError::UnsupportedDataType(data_type)),
        }
    }

    /// Size in bytes of one output element
    pub fn element_size(&self) -> usize {
        match self {
            PixelRepr::Byte => std::mem::size_of::<u8>(),
            PixelRepr::Wide => std::mem::size_of::<f64>(),
        }
    }
}

/// Affine transform from pixel/line to georeferenced coordinates
///
/// Coefficients are `[origin_x, pixel_width, row_rotation, origin_y,
/// col_rotation, pixel_height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    pub fn new(coefficients: [f64; 6]) -> Self {
        Self(coefficients)
    }

    pub fn coefficients(&self) -> &[f64; 6] {
        &self.0
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }

    pub fn pixel_size(&self) -> (f64, f64) {
        (self.0[1], self.0[5])
    }

    /// Georeferenced position of a pixel/line coordinate
    pub fn apply(&self, pixel: f64, line: f64) -> (f64, f64) {
        let gt = &self.0;
        (
            gt[0] + pixel * gt[1] + line * gt[2],
            gt[3] + pixel * gt[4] + line * gt[5],
        )
    }
}

/// Pixel data as handed to the caller
///
/// Both variants are column-major with shape `(rows, cols) = (y_out, x_out)`.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelArray {
    U8(Array2<u8>),
    F64(Array2<f64>),
}

impl PixelArray {
    /// Reported dimensions as `(rows, cols)`
    pub fn dims(&self) -> (usize, usize) {
        match self {
            PixelArray::U8(a) => a.dim(),
            PixelArray::F64(a) => a.dim(),
        }
    }

    pub fn repr(&self) -> PixelRepr {
        match self {
            PixelArray::U8(_) => PixelRepr::Byte,
            PixelArray::F64(_) => PixelRepr::Wide,
        }
    }

    pub fn element_size(&self) -> usize {
        self.repr().element_size()
    }

    pub fn len(&self) -> usize {
        match self {
            PixelArray::U8(a) => a.len(),
            PixelArray::F64(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_u8(&self) -> Option<&Array2<u8>> {
        match self {
            PixelArray::U8(a) => Some(a),
            PixelArray::F64(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<&Array2<f64>> {
        match self {
            PixelArray::F64(a) => Some(a),
            PixelArray::U8(_) => None,
        }
    }

    /// Value at `(row, col)` widened to f64
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        match self {
            PixelArray::U8(a) => a.get((row, col)).map(|&v| f64::from(v)),
            PixelArray::F64(a) => a.get((row, col)).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_codes() {
        for code in 0..12u8 {
            let dt = DataType::from_code(code).unwrap();
            assert_eq!(dt.code(), code);
        }
        assert_eq!(DataType::from_code(12), None);
        assert_eq!(DataType::Float32.to_string(), "Float32");
    }

    #[test]
    fn test_repr_dispatch() {
        assert_eq!(PixelRepr::for_data_type(DataType::Byte).unwrap(), PixelRepr::Byte);
        for dt in [
            DataType::UInt16,
            DataType::Int16,
            DataType::UInt32,
            DataType::Int32,
            DataType::Float32,
            DataType::Float64,
        ] {
            assert_eq!(PixelRepr::for_data_type(dt).unwrap(), PixelRepr::Wide);
        }
        for dt in [DataType::Unknown, DataType::CInt16, DataType::CFloat64] {
            assert!(matches!(
                PixelRepr::for_data_type(dt),
                Err(RasterError::UnsupportedDataType(t)) if t == dt
            ));
        }
    }

    #[test]
    fn test_geotransform_apply() {
        let gt = GeoTransform::new([440720.0, 60.0, 0.0, 3751320.0, 0.0, -60.0]);
        assert_eq!(gt.apply(0.0, 0.0), (440720.0, 3751320.0));
        assert_eq!(gt.apply(1.0, 2.0), (440780.0, 3751200.0));
        assert_eq!(gt.pixel_size(), (60.0, -60.0));
    }
}
