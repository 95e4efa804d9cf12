//! SQL value binding
//!
//! [`SqlValue`] is the owned, driver-agnostic representation of a single bind
//! parameter. Builders collect values alongside generated SQL so that the
//! executor can bind them positionally; values are never interpolated into
//! the statement text.

use crate::error::{Result, StoreError};

/// A SQL value that can be bound to a parameterized query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl SqlValue {
    /// Whether this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Bind this value to a sqlx query at the next positional parameter.
    pub fn bind_to_query<'q>(
        &'q self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        match self {
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Bool(b) => query.bind(if *b { 1i32 } else { 0i32 }),
            SqlValue::Null => query.bind(None::<String>),
        }
    }

    /// Convert a JSON scalar into a bindable value.
    ///
    /// Patch documents arrive as JSON objects; only scalars map onto single
    /// columns. Arrays and nested objects are rejected as malformed input.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(SqlValue::Null),
            serde_json::Value::Bool(b) => Ok(SqlValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(SqlValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(SqlValue::Float(f))
                } else {
                    Err(StoreError::Build(format!("unrepresentable number: {n}")))
                }
            }
            serde_json::Value::String(s) => Ok(SqlValue::Text(s.clone())),
            other => Err(StoreError::Build(format!(
                "non-scalar value cannot be bound to a column: {other}"
            ))),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        SqlValue::Int(i)
    }
}

impl From<f64> for SqlValue {
    fn from(f: f64) -> Self {
        SqlValue::Float(f)
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        SqlValue::Bool(b)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// An ordered set of `(column, value)` pairs extracted from one entity
/// instance, in schema column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pairs: Vec<(&'static str, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a column value. Order is preserved and should follow the
    /// entity's schema.
    pub fn push(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.pairs.push((column, value.into()));
        self
    }

    /// Look up a column's value, if present.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.pairs
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, SqlValue)> {
        self.pairs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}
