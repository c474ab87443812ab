//! Classification of raw backend replies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// A store-integrity code returned by the backend in place of a payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreCode {
    /// Code 1: the table does not exist in the store file.
    MissingTable,
    /// Code 26: the file is not a database.
    NotADatabase,
    /// Any other number, fractional ones included.
    Unknown(Number),
}

impl StoreCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => StoreCode::MissingTable,
            26 => StoreCode::NotADatabase,
            other => StoreCode::Unknown(Number::from(other)),
        }
    }

    /// Classify a JSON number. Only integral values match a known code, so
    /// `1.0` is a missing table but `1.5` is unknown.
    pub fn from_number(number: &Number) -> Self {
        match integral(number) {
            Some(code) => Self::from_code(code),
            None => StoreCode::Unknown(number.clone()),
        }
    }

    /// The integer code, or `None` for a fractional or out-of-range number.
    pub fn code(&self) -> Option<i64> {
        match self {
            StoreCode::MissingTable => Some(1),
            StoreCode::NotADatabase => Some(26),
            StoreCode::Unknown(number) => integral(number),
        }
    }
}

/// The integer value of a JSON number, when it has one.
fn integral(number: &Number) -> Option<i64> {
    if let Some(code) = number.as_i64() {
        return Some(code);
    }
    let value = number.as_f64()?;
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

impl fmt::Display for StoreCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreCode::MissingTable => write!(f, "table does not exist (1)"),
            StoreCode::NotADatabase => write!(f, "file is not a database (26)"),
            StoreCode::Unknown(code) => write!(f, "unknown store error ({})", code),
        }
    }
}

/// A backend reply, classified by shape.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendReply {
    /// A bare number: the store-integrity code.
    Code(StoreCode),
    /// A non-empty list of rows.
    Rows(Vec<Value>),
    /// A single non-empty row.
    Row(Map<String, Value>),
    /// `null`, `[]` or `{}`.
    Empty,
    /// Anything else (strings, booleans).
    Other(Value),
}

impl BackendReply {
    pub fn decode(raw: Value) -> Self {
        match raw {
            Value::Number(number) => BackendReply::Code(StoreCode::from_number(&number)),
            Value::Null => BackendReply::Empty,
            Value::Array(rows) if rows.is_empty() => BackendReply::Empty,
            Value::Array(rows) => BackendReply::Rows(rows),
            Value::Object(row) if row.is_empty() => BackendReply::Empty,
            Value::Object(row) => BackendReply::Row(row),
            other => BackendReply::Other(other),
        }
    }

    /// Short description of the reply shape for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendReply::Code(_) => "code",
            BackendReply::Rows(_) => "rows",
            BackendReply::Row(_) => "row",
            BackendReply::Empty => "empty",
            BackendReply::Other(_) => "other",
        }
    }
}
