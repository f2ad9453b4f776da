use serde::Serialize;
use std::collections::HashMap;

/// A scalar cell as returned by the search daemon.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Column descriptor reported by the driver for the current statement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnMeta {
    pub name: String,
    /// Driver-specific type name, e.g. `LONG` or `VAR_STRING`.
    pub native_type: Option<String>,
    pub len: Option<usize>,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_type: None,
            len: None,
        }
    }

    pub fn with_type(mut self, native_type: impl Into<String>) -> Self {
        self.native_type = Some(native_type.into());
        self
    }
}

/// Positional row: values in column order.
pub type Row = Vec<Value>;

/// Associative row keyed by column name. Duplicate names collapse, last wins.
pub type NamedRow = HashMap<String, Value>;

pub fn name_row(columns: &[ColumnMeta], row: &[Value]) -> NamedRow {
    columns
        .iter()
        .zip(row.iter())
        .map(|(col, value)| (col.name.clone(), value.clone()))
        .collect()
}
