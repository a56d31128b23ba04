//! Windowed pixel reads and the row-major to column-major transpose

use crate::backend::RasterBand;
use crate::diagnostics::Diagnostics;
use crate::error::{Result, RasterError};
use crate::types::{PixelArray, PixelRepr};
use crate::utils::format_bytes;
use crate::window::Window;
use ndarray::{Array2, ShapeBuilder};
use num_traits::Zero;

/// Read `window` from `band` into a column-major array of shape `(y_out, x_out)`
///
/// Byte bands stay `u8`; every other supported type comes back as `f64`.
pub fn fetch(band: &dyn RasterBand, window: &Window, diag: &mut Diagnostics<'_>) -> Result<PixelArray> {
    let data_type = band.data_type();
    let repr = PixelRepr::for_data_type(data_type)?;
    let bytes = window.output_bytes(repr.element_size())?;
    let len = bytes / repr.element_size();

    if diag.is_verbose() {
        trace_band(band, window, diag);
    }

    diag.trace(|| format!("Now reading into buffer ({})...", format_bytes(bytes)));

    let pixels = match repr {
        PixelRepr::Byte => PixelArray::U8(read_transposed(window, len, diag, |buf| {
            band.read_u8(window, buf)
        })?),
        PixelRepr::Wide => PixelArray::F64(read_transposed(window, len, diag, |buf| {
            band.read_f64(window, buf)
        })?),
    };

    diag.trace(|| "Finished copying into output array...");
    Ok(pixels)
}

fn read_transposed<T, F>(
    window: &Window,
    len: usize,
    diag: &mut Diagnostics<'_>,
    read: F,
) -> Result<Array2<T>>
where
    T: Copy + Zero,
    F: FnOnce(&mut [T]) -> Result<()>,
{
    let (x_out, y_out) = (window.x_out, window.y_out);

    let mut decoded = allocate(len, x_out, y_out)?;
    decoded.resize(len, T::zero());
    read(&mut decoded)?;

    diag.trace(|| "Now copying into output array...");
    let transposed = transpose(&decoded, x_out, y_out)?;

    Array2::from_shape_vec((y_out, x_out).f(), transposed)
        .map_err(|e| RasterError::InvalidWindow(format!("{}x{} output: {}", y_out, x_out, e)))
}

/// Copy a row-major `y_out` x `x_out` buffer into column-major order
///
/// `output[col * y_out + row] = decoded[row * x_out + col]`. Calling it again
/// with the dimensions swapped restores the original layout.
pub fn transpose<T: Copy>(decoded: &[T], x_out: usize, y_out: usize) -> Result<Vec<T>> {
    if x_out.checked_mul(y_out) != Some(decoded.len()) {
        return Err(RasterError::InvalidWindow(format!(
            "decode buffer holds {} samples, expected {}x{}",
            decoded.len(),
            x_out,
            y_out
        )));
    }

    let mut output = allocate(decoded.len(), x_out, y_out)?;
    for col in 0..x_out {
        for row in 0..y_out {
            output.push(decoded[row * x_out + col]);
        }
    }
    Ok(output)
}

fn allocate<T>(len: usize, x_out: usize, y_out: usize) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|e| {
        RasterError::InvalidWindow(format!(
            "cannot allocate xout x yout = {} x {} output: {}",
            x_out, y_out, e
        ))
    })?;
    Ok(buffer)
}

fn trace_band(band: &dyn RasterBand, window: &Window, diag: &mut Diagnostics<'_>) {
    let data_type = band.data_type();
    let (width, height) = band.size();

    diag.trace(|| format!("data type is {}", data_type.code()));
    diag.trace(|| {
        format!(
            "Block={}x{} Type={}, ColorInterp={}",
            window.x_extent,
            window.y_extent,
            data_type.name(),
            band.color_interpretation()
        )
    });

    match band.min_max().map(Ok).unwrap_or_else(|| band.compute_min_max()) {
        Ok((min, max)) => diag.trace(|| format!("Min={:.3}, Max={:.3}", min, max)),
        Err(e) => diag.trace(|| format!("Min/Max unavailable: {}", e)),
    }

    diag.trace(|| format!("xOrigin = {}", window.x_origin));
    diag.trace(|| format!("yOrigin = {}", window.y_origin));
    diag.trace(|| format!("RasterXSize = {}", width));
    diag.trace(|| format!("RasterYSize = {}", height));
    diag.trace(|| format!("xExtent = {}", window.x_extent));
    diag.trace(|| format!("yExtent = {}", window.y_extent));
    diag.trace(|| format!("xOut = {}", window.x_out));
    diag.trace(|| format!("yOut = {}", window.y_out));
}
