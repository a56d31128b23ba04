//! Request options and the resolver that builds them from host records

use crate::diagnostics::Diagnostics;
use crate::error::{Result, RasterError};
use crate::host::{HostValue, OptionsRecord};
use serde::{Deserialize, Serialize};

/// Fully resolved request options
///
/// Extent and output sizes stay `None` until the window planner knows the
/// band dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestOptions {
    /// 1-based band index
    pub band: i64,
    /// Overview index, `None` reads the full-resolution band
    pub overview: Option<usize>,
    pub dump_metadata_only: bool,
    pub verbose: bool,
    pub x_origin: i64,
    pub y_origin: i64,
    pub x_extent: Option<i64>,
    pub y_extent: Option<i64>,
    pub x_out: Option<i64>,
    pub y_out: Option<i64>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            band: 1,
            overview: None,
            dump_metadata_only: false,
            verbose: true,
            x_origin: 0,
            y_origin: 0,
            x_extent: None,
            y_extent: None,
            x_out: None,
            y_out: None,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_band(mut self, band: i64) -> Self {
        self.band = band;
        self
    }

    pub fn with_overview(mut self, overview: usize) -> Self {
        self.overview = Some(overview);
        self
    }

    pub fn with_dump_metadata_only(mut self, dump: bool) -> Self {
        self.dump_metadata_only = dump;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the source window origin and extent
    pub fn with_window(mut self, x_origin: i64, y_origin: i64, x_extent: i64, y_extent: i64) -> Self {
        self.x_origin = x_origin;
        self.y_origin = y_origin;
        self.x_extent = Some(x_extent);
        self.y_extent = Some(y_extent);
        self
    }

    /// Set the resampled output size
    pub fn with_output_size(mut self, x_out: i64, y_out: i64) -> Self {
        self.x_out = Some(x_out);
        self.y_out = Some(y_out);
        self
    }
}

/// Shape a field's value must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Exactly 1x1
    Scalar,
    /// One row, any column count; the first element is used
    Row,
}

/// What a shape mismatch does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnMismatch {
    /// Warn and keep the current value
    Warn,
    /// Fail the whole call
    Fail,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Band,
    Overview,
    DumpMetadataOnly,
    Verbose,
    XOrigin,
    YOrigin,
    XExtent,
    YExtent,
    XOut,
    YOut,
}

impl Field {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "band" => Some(Field::Band),
            "overview" => Some(Field::Overview),
            "gdal_dump" | "dumpMetadataOnly" => Some(Field::DumpMetadataOnly),
            "verbose" => Some(Field::Verbose),
            "xorigin" => Some(Field::XOrigin),
            "yorigin" => Some(Field::YOrigin),
            "xextend" => Some(Field::XExtent),
            "yextend" => Some(Field::YExtent),
            "xout" => Some(Field::XOut),
            "yout" => Some(Field::YOut),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Field::Band => "band",
            Field::Overview => "overview",
            Field::DumpMetadataOnly => "gdal_dump",
            Field::Verbose => "verbose",
            Field::XOrigin => "xorigin",
            Field::YOrigin => "yorigin",
            Field::XExtent => "xextend",
            Field::YExtent => "yextend",
            Field::XOut => "xout",
            Field::YOut => "yout",
        }
    }

    fn policy(&self) -> (Shape, OnMismatch) {
        match self {
            // Historically lenient: any single-row value, first element wins.
            Field::Overview | Field::DumpMetadataOnly => (Shape::Row, OnMismatch::Warn),
            Field::Band | Field::Verbose | Field::XOrigin | Field::YOrigin => {
                (Shape::Scalar, OnMismatch::Warn)
            }
            // These size the output buffer.
            Field::XExtent | Field::YExtent | Field::XOut | Field::YOut => {
                (Shape::Scalar, OnMismatch::Fail)
            }
        }
    }
}

/// Build [`RequestOptions`] from a host record
///
/// Unrecognized keys are ignored. Shape problems produce warnings except for
/// the extent and output size fields, which fail the call.
pub fn resolve(raw: &OptionsRecord, diag: &mut Diagnostics<'_>) -> Result<RequestOptions> {
    let mut options = RequestOptions::default();

    for (key, value) in raw.iter() {
        let Some(field) = Field::from_key(key) else {
            continue;
        };
        if let Some(number) = extract(field, value, diag)? {
            apply(&mut options, field, number);
        }
    }

    Ok(options)
}

/// Resolve an optional record, falling back to all defaults
pub fn resolve_or_default(
    raw: Option<&OptionsRecord>,
    diag: &mut Diagnostics<'_>,
) -> Result<RequestOptions> {
    match raw {
        Some(record) => resolve(record, diag),
        None => Ok(RequestOptions::default()),
    }
}

fn extract(field: Field, value: &HostValue, diag: &mut Diagnostics<'_>) -> Result<Option<f64>> {
    let (shape, on_mismatch) = field.policy();
    let (rows, cols) = value.shape();

    let accepted = match (value.as_matrix(), shape) {
        (Some(m), Shape::Scalar) if m.is_scalar() => m.first(),
        (Some(m), Shape::Row) if m.rows == 1 => m.first(),
        _ => None,
    };

    if accepted.is_some() {
        return Ok(accepted);
    }

    match on_mismatch {
        OnMismatch::Fail => Err(RasterError::InvalidOptionShape {
            field: field.name(),
            rows,
            cols,
        }),
        OnMismatch::Warn => {
            let expected = match shape {
                Shape::Scalar => "1x1",
                Shape::Row => "1xN",
            };
            diag.warn(format!(
                "{} field must be a numeric {} rather than {} {}x{}, keeping default",
                field.name(),
                expected,
                value.kind(),
                rows,
                cols
            ));
            Ok(None)
        }
    }
}

fn apply(options: &mut RequestOptions, field: Field, number: f64) {
    // Host numbers are doubles; truncate toward zero like an integer cast.
    let int = number as i64;
    match field {
        Field::Band => options.band = int,
        Field::Overview => options.overview = usize::try_from(int).ok(),
        Field::DumpMetadataOnly => options.dump_metadata_only = int != 0,
        Field::Verbose => options.verbose = int != 0,
        Field::XOrigin => options.x_origin = int,
        Field::YOrigin => options.y_origin = int,
        Field::XExtent => options.x_extent = Some(int),
        Field::YExtent => options.y_extent = Some(int),
        Field::XOut => options.x_out = Some(int),
        Field::YOut => options.y_out = Some(int),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::host::Matrix;

    fn run(record: &OptionsRecord) -> (Result<RequestOptions>, Vec<String>) {
        let mut sink = CollectingSink::new();
        let result = {
            let mut diag = Diagnostics::new(&mut sink, true);
            resolve(record, &mut diag)
        };
        let warnings = sink.warnings().map(str::to_string).collect();
        (result, warnings)
    }

    #[test]
    fn test_defaults() {
        let (options, warnings) = run(&OptionsRecord::new());
        let options = options.unwrap();
        assert_eq!(options, RequestOptions::default());
        assert_eq!(options.band, 1);
        assert_eq!(options.overview, None);
        assert!(options.verbose);
        assert!(!options.dump_metadata_only);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_all_keys() {
        let record = OptionsRecord::new()
            .with("band", 2.0)
            .with("overview", 1.0)
            .with("gdal_dump", 0.0)
            .with("verbose", 0.0)
            .with("xorigin", 10.0)
            .with("yorigin", 20.0)
            .with("xextend", 250.0)
            .with("yextend", 300.0)
            .with("xout", 25.0)
            .with("yout", 30.0);

        let options = run(&record).0.unwrap();
        assert_eq!(
            options,
            RequestOptions::new()
                .with_band(2)
                .with_overview(1)
                .with_verbose(false)
                .with_window(10, 20, 250, 300)
                .with_output_size(25, 30)
        );
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let record = OptionsRecord::new()
            .with("colour", 3.0)
            .with("Band", 4.0)
            .with("band", 2.0);
        let (options, warnings) = run(&record);
        assert_eq!(options.unwrap().band, 2);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_dump_aliases() {
        let options = run(&OptionsRecord::new().with("dumpMetadataOnly", 1.0)).0.unwrap();
        assert!(options.dump_metadata_only);

        let options = run(&OptionsRecord::new().with("gdal_dump", 1.0)).0.unwrap();
        assert!(options.dump_metadata_only);
    }

    #[test]
    fn test_lenient_row_fields_take_first_element() {
        let record = OptionsRecord::new()
            .with("overview", Matrix::row(vec![2.0, 7.0, 9.0]))
            .with("gdal_dump", Matrix::row(vec![1.0, 0.0]));
        let (options, warnings) = run(&record);
        let options = options.unwrap();
        assert_eq!(options.overview, Some(2));
        assert!(options.dump_metadata_only);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_lenient_row_fields_warn_on_multiple_rows() {
        let column = Matrix::new(2, 1, vec![1.0, 1.0]).unwrap();
        let record = OptionsRecord::new()
            .with("overview", column.clone())
            .with("gdal_dump", column);
        let (options, warnings) = run(&record);
        let options = options.unwrap();
        assert_eq!(options.overview, None);
        assert!(!options.dump_metadata_only);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("overview"));
    }

    #[test]
    fn test_scalar_fields_warn_and_keep_default() {
        let record = OptionsRecord::new()
            .with("band", Matrix::row(vec![3.0, 4.0]))
            .with("xorigin", Matrix::row(vec![5.0, 6.0]))
            .with("verbose", HostValue::text("no"));
        let (options, warnings) = run(&record);
        let options = options.unwrap();
        assert_eq!(options.band, 1);
        assert_eq!(options.x_origin, 0);
        assert!(options.verbose);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("band field must be a numeric 1x1 rather than numeric 1x2"));
        assert!(warnings[2].contains("text"));
    }

    #[test]
    fn test_size_fields_fail_on_bad_shape() {
        for key in ["xextend", "yextend", "xout", "yout"] {
            let record = OptionsRecord::new().with(key, Matrix::row(vec![1.0, 2.0]));
            match run(&record).0 {
                Err(RasterError::InvalidOptionShape { field, rows, cols }) => {
                    assert_eq!(field, key);
                    assert_eq!((rows, cols), (1, 2));
                }
                other => panic!("expected shape error for {}, got {:?}", key, other),
            }
        }

        let record = OptionsRecord::new().with("xout", Matrix::empty());
        assert!(matches!(
            run(&record).0,
            Err(RasterError::InvalidOptionShape { field: "xout", rows: 0, cols: 0 })
        ));
    }

    #[test]
    fn test_values_truncate_and_negative_overview_means_none() {
        let record = OptionsRecord::new()
            .with("xorigin", 3.9)
            .with("overview", -1.0)
            .with("verbose", 0.5);
        let options = run(&record).0.unwrap();
        assert_eq!(options.x_origin, 3);
        assert_eq!(options.overview, None);
        assert!(!options.verbose);
    }

    #[test]
    fn test_serde_camel_case() {
        let options: RequestOptions =
            serde_json::from_str(r#"{"band": 3, "xExtent": 10, "dumpMetadataOnly": true}"#).unwrap();
        assert_eq!(options.band, 3);
        assert_eq!(options.x_extent, Some(10));
        assert!(options.dump_metadata_only);
        assert!(options.verbose);
        assert_eq!(options.x_out, None);
    }
}
