//! Values exchanged with the calling environment
//!
//! The host only knows numeric matrices, text and records. Requests arrive as
//! these values and the resolver in [`crate::options`] turns them into typed
//! options.

use crate::error::{Result, RasterError};
use serde_json::Value;

/// Column-major numeric matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    /// Create a matrix, checking that `data` holds `rows * cols` values
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(RasterError::InvalidCall(format!(
                "Matrix data length {} does not match {}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn scalar(value: f64) -> Self {
        Self {
            rows: 1,
            cols: 1,
            data: vec![value],
        }
    }

    pub fn row(values: Vec<f64>) -> Self {
        Self {
            rows: 1,
            cols: values.len(),
            data: values,
        }
    }

    pub fn empty() -> Self {
        Self {
            rows: 0,
            cols: 0,
            data: Vec::new(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    pub fn first(&self) -> Option<f64> {
        self.data.first().copied()
    }
}

/// A generic host value
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Numeric(Matrix),
    Text(String),
    Record(OptionsRecord),
}

impl HostValue {
    pub fn scalar(value: f64) -> Self {
        HostValue::Numeric(Matrix::scalar(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        HostValue::Text(value.into())
    }

    /// Shape as the host reports it; text is a single row of characters
    pub fn shape(&self) -> (usize, usize) {
        match self {
            HostValue::Numeric(m) => m.shape(),
            HostValue::Text(s) => (1, s.chars().count()),
            HostValue::Record(_) => (1, 1),
        }
    }

    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            HostValue::Numeric(m) => Some(m),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HostValue::Numeric(_) => "numeric",
            HostValue::Text(_) => "text",
            HostValue::Record(_) => "record",
        }
    }

    /// Convert a JSON value into its host equivalent
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(HostValue::Numeric(Matrix::empty())),
            Value::Bool(b) => Ok(HostValue::scalar(if *b { 1.0 } else { 0.0 })),
            Value::Number(n) => n.as_f64().map(HostValue::scalar).ok_or_else(|| {
                RasterError::Serialization(format!("Number {} is not representable", n))
            }),
            Value::String(s) => Ok(HostValue::Text(s.clone())),
            Value::Array(items) => json_array_to_matrix(items).map(HostValue::Numeric),
            Value::Object(_) => OptionsRecord::from_json(value).map(HostValue::Record),
        }
    }
}

impl From<Matrix> for HostValue {
    fn from(m: Matrix) -> Self {
        HostValue::Numeric(m)
    }
}

impl From<f64> for HostValue {
    fn from(v: f64) -> Self {
        HostValue::scalar(v)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::text(s)
    }
}

/// Flat arrays become one row; arrays of arrays become one row per element.
fn json_array_to_matrix(items: &[Value]) -> Result<Matrix> {
    if items.is_empty() {
        return Ok(Matrix::empty());
    }

    let rows: Vec<Vec<f64>> = if items.iter().all(Value::is_array) {
        items
            .iter()
            .map(|row| json_numbers(row.as_array().map(Vec::as_slice).unwrap_or(&[])))
            .collect::<Result<_>>()?
    } else {
        vec![json_numbers(items)?]
    };

    let cols = rows[0].len();
    if rows.iter().any(|r| r.len() != cols) {
        return Err(RasterError::Serialization(
            "Nested arrays must all have the same length".to_string(),
        ));
    }

    // Row-major input, column-major storage
    let mut data = Vec::with_capacity(rows.len() * cols);
    for col in 0..cols {
        for row in &rows {
            data.push(row[col]);
        }
    }

    Matrix::new(rows.len(), cols, data)
}

fn json_numbers(items: &[Value]) -> Result<Vec<f64>> {
    items
        .iter()
        .map(|v| match v {
            Value::Number(n) => n.as_f64().ok_or_else(|| {
                RasterError::Serialization(format!("Number {} is not representable", n))
            }),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Err(RasterError::Serialization(format!(
                "Expected a number in array, found {}",
                other
            ))),
        })
        .collect()
}

/// Ordered record of named host values with unique keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsRecord {
    fields: Vec<(String, HostValue)>,
}

impl OptionsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any existing field with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<HostValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder form of [`OptionsRecord::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&HostValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HostValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a record from a JSON object
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            RasterError::InvalidCall("Options must be a record (JSON object)".to_string())
        })?;

        let mut record = OptionsRecord::new();
        for (name, field) in object {
            record.insert(name.clone(), HostValue::from_json(field)?);
        }
        Ok(record)
    }
}
