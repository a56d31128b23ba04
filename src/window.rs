//! Window planning - resolve the read window and output size against a band

use crate::error::{Result, RasterError};
use crate::options::RequestOptions;
use crate::types::PixelRepr;
use serde::{Deserialize, Serialize};

/// A concrete read window and the size it is resampled into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub x_origin: usize,
    pub y_origin: usize,
    pub x_extent: usize,
    pub y_extent: usize,
    pub x_out: usize,
    pub y_out: usize,
}

impl Window {
    /// Whole band, no resampling
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x_origin: 0,
            y_origin: 0,
            x_extent: width,
            y_extent: height,
            x_out: width,
            y_out: height,
        }
    }

    /// Number of output samples, `None` if `x_out * y_out` overflows
    pub fn output_len(&self) -> Option<usize> {
        self.x_out.checked_mul(self.y_out)
    }

    /// Size in bytes of an output buffer of `element_size`-byte samples
    ///
    /// Fails when the buffer could not be allocated at all.
    pub fn output_bytes(&self, element_size: usize) -> Result<usize> {
        self.output_len()
            .and_then(|len| len.checked_mul(element_size))
            .filter(|&bytes| bytes <= isize::MAX as usize)
            .ok_or_else(|| {
                RasterError::InvalidWindow(format!(
                    "xout x yout = {} x {} overflows the output buffer",
                    self.x_out, self.y_out
                ))
            })
    }

    /// Whether the source region lies inside a `width` x `height` raster
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        self.x_origin
            .checked_add(self.x_extent)
            .is_some_and(|end| end <= width)
            && self
                .y_origin
                .checked_add(self.y_extent)
                .is_some_and(|end| end <= height)
    }
}

/// Fill in defaults for any extent or output size not given
///
/// No bounds clamping happens here; the read reports windows that fall
/// outside the band. Output sizes default to `extent - origin`.
pub fn plan(options: &RequestOptions, band_width: usize, band_height: usize) -> Result<Window> {
    let x_extent = options.x_extent.unwrap_or(band_width as i64);
    let y_extent = options.y_extent.unwrap_or(band_height as i64);

    let x_out = match options.x_out {
        Some(x_out) => x_out,
        None => default_out("xout", x_extent, options.x_origin)?,
    };
    let y_out = match options.y_out {
        Some(y_out) => y_out,
        None => default_out("yout", y_extent, options.y_origin)?,
    };

    let window = Window {
        x_origin: non_negative("xorigin", options.x_origin)?,
        y_origin: non_negative("yorigin", options.y_origin)?,
        x_extent: non_negative("xextend", x_extent)?,
        y_extent: non_negative("yextend", y_extent)?,
        x_out: non_negative("xout", x_out)?,
        y_out: non_negative("yout", y_out)?,
    };

    // widest sample decides whether any output buffer fits
    window.output_bytes(PixelRepr::Wide.element_size())?;
    Ok(window)
}

fn default_out(name: &str, extent: i64, origin: i64) -> Result<i64> {
    extent.checked_sub(origin).ok_or_else(|| {
        RasterError::InvalidWindow(format!(
            "{} overflows for extent {} and origin {}",
            name, extent, origin
        ))
    })
}

fn non_negative(name: &str, value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| RasterError::InvalidWindow(format!("{} resolved to {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_band() {
        let window = plan(&RequestOptions::default(), 500, 600).unwrap();
        assert_eq!(
            window,
            Window {
                x_origin: 0,
                y_origin: 0,
                x_extent: 500,
                y_extent: 600,
                x_out: 500,
                y_out: 600,
            }
        );
        assert_eq!(window, Window::full(500, 600));
    }

    #[test]
    fn test_sub_window_identity_resample() {
        let options = RequestOptions::new().with_window(0, 0, 250, 300);
        let window = plan(&options, 500, 600).unwrap();
        assert_eq!((window.x_out, window.y_out), (250, 300));
    }

    #[test]
    fn test_out_defaults_subtract_origin() {
        let mut options = RequestOptions::new();
        options.x_origin = 100;
        options.y_origin = 50;
        let window = plan(&options, 500, 600).unwrap();
        assert_eq!((window.x_extent, window.y_extent), (500, 600));
        assert_eq!((window.x_out, window.y_out), (400, 550));
    }

    #[test]
    fn test_explicit_out_wins() {
        let options = RequestOptions::new().with_output_size(50, 60);
        let window = plan(&options, 500, 600).unwrap();
        assert_eq!((window.x_extent, window.y_extent), (500, 600));
        assert_eq!((window.x_out, window.y_out), (50, 60));
    }

    #[test]
    fn test_no_clamping() {
        let options = RequestOptions::new().with_window(400, 0, 200, 600);
        let window = plan(&options, 500, 600).unwrap();
        assert_eq!(window.x_extent, 200);
        assert!(!window.fits_within(500, 600));
    }

    #[test]
    fn test_negative_components_rejected() {
        let mut options = RequestOptions::new();
        options.x_origin = 600;
        match plan(&options, 500, 600) {
            Err(RasterError::InvalidWindow(msg)) => assert!(msg.contains("xout")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_huge_output_rejected() {
        let options = RequestOptions::new().with_output_size(1 << 33, 1 << 33);
        match plan(&options, 500, 600) {
            Err(RasterError::InvalidWindow(msg)) => {
                assert!(msg.contains("xout"));
                assert!(msg.contains("yout"));
            }
            other => panic!("unexpected {:?}", other),
        }

        // a saturated xout still fails even with a single row
        let options = RequestOptions::new().with_output_size(i64::MAX, 1);
        assert!(matches!(plan(&options, 500, 600), Err(RasterError::InvalidWindow(_))));
    }

    #[test]
    fn test_default_out_subtraction_checked() {
        let mut options = RequestOptions::new().with_window(0, 0, i64::MAX, 10);
        options.x_origin = -1;
        assert!(matches!(plan(&options, 500, 600), Err(RasterError::InvalidWindow(_))));
    }

    #[test]
    fn test_output_bytes() {
        let window = Window::full(4, 3);
        assert_eq!(window.output_len(), Some(12));
        assert_eq!(window.output_bytes(8).unwrap(), 96);

        let mut huge = window;
        huge.x_out = usize::MAX;
        huge.y_out = 2;
        assert_eq!(huge.output_len(), None);
        assert!(huge.output_bytes(1).is_err());
    }
}
