//! Driver-neutral row values returned by a [`Session`](crate::Session).

use crate::error::{Error, GenResult};
use chrono::NaiveDateTime;
use std::sync::Arc;

/// A single column value.
///
/// Numbers are carried as their exact decimal text so no precision is lost
/// between the driver and the generated literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Number(String),
    Text(String),
    Date(NaiveDateTime),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Plain display form used for previews (no SQL quoting).
    pub fn display(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Number(s) | Value::Text(s) => s.clone(),
            Value::Date(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Timestamp(dt) => dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        }
    }
}

/// An ordered row of named values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row. `columns` is shared between all rows of a result set.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Look up a value by column name (case-insensitive).
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|i| self.values.get(i))
    }
}

/// Extension trait for reading typed columns with proper errors.
pub trait RowExt {
    /// Get a non-null text column.
    fn try_text(&self, column: &str) -> GenResult<&str>;

    /// Get a text column, `None` when NULL.
    fn try_opt_text(&self, column: &str) -> GenResult<Option<&str>>;

    /// Get a non-null integer column.
    fn try_i64(&self, column: &str) -> GenResult<i64>;
}

impl RowExt for Row {
    fn try_text(&self, column: &str) -> GenResult<&str> {
        self.try_opt_text(column)?
            .ok_or_else(|| Error::decode(column, "unexpected NULL"))
    }

    fn try_opt_text(&self, column: &str) -> GenResult<Option<&str>> {
        match self.get(column) {
            None => Err(Error::decode(column, "no such column")),
            Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) | Some(Value::Number(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(Error::decode(
                column,
                format!("expected text, got {other:?}"),
            )),
        }
    }

    fn try_i64(&self, column: &str) -> GenResult<i64> {
        let text = self.try_text(column)?;
        text.trim()
            .parse::<i64>()
            .map_err(|e| Error::decode(column, e.to_string()))
    }
}
