//! Partial-update ("patch") resolution
//!
//! A [`PatchDocument`] is an unordered mapping from external field names to
//! new values: an arbitrary, caller-chosen subset of an entity's non-key
//! fields plus its primary key. Resolution intersects the document's keys
//! with the schema's non-key column set and builds an UPDATE touching exactly
//! that intersection, keyed by primary key. Fields absent from the document
//! are never written, which is the property that distinguishes PATCH from a
//! full PUT-style replace.

use crate::error::{Result, StoreError};
use crate::orm::schema::Schema;
use crate::orm::statement::Statement;
use crate::orm::value::SqlValue;

/// A partial-field document keyed by external field names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchDocument {
    fields: Vec<(String, SqlValue)>,
}

impl PatchDocument {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Record a field's new value. Setting the same field twice keeps the
    /// last value.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        let field = field.into();
        self.fields.retain(|(f, _)| *f != field);
        self.fields.push((field, value.into()));
        self
    }

    /// Build a document from a JSON object, the wire form of a PATCH request.
    ///
    /// Non-object values and non-scalar members are rejected as malformed
    /// input; unknown field names are kept here and filtered out during
    /// resolution.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            StoreError::Build("patch document must be a JSON object".to_string())
        })?;

        let mut doc = PatchDocument::new();
        for (field, v) in map {
            doc = doc.set(field.clone(), SqlValue::from_json(v)?);
        }
        Ok(doc)
    }

    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.fields.iter().find(|(f, _)| f == field).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Result of resolving a patch document against a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOutcome {
    /// An UPDATE touching exactly the requested columns.
    Statement(Statement),
    /// The document named no writable columns; nothing should be executed
    /// and zero rows reported changed.
    NoOp,
}

/// Resolve a patch document into an UPDATE statement.
///
/// Algorithm: translate document fields to columns through the schema,
/// keeping only non-key columns actually present in the document (schema
/// order, for deterministic SQL). The WHERE clause is built from the
/// primary-key value(s) extracted from the document; a document lacking any
/// key value is malformed. Unknown fields are ignored. An empty intersection
/// yields [`PatchOutcome::NoOp`] rather than a syntactically empty UPDATE.
pub fn resolve_patch(schema: &Schema, doc: &PatchDocument) -> Result<PatchOutcome> {
    let mut key_values: Vec<(&str, SqlValue)> = Vec::new();
    for col in schema.key_columns() {
        match doc.get(col.field) {
            Some(value) if !value.is_null() => key_values.push((col.column, value.clone())),
            _ => {
                return Err(StoreError::Build(format!(
                    "patch of {} is missing primary-key field {}",
                    schema.table(),
                    col.field
                )));
            }
        }
    }

    let mut assignments: Vec<String> = Vec::new();
    let mut args: Vec<SqlValue> = Vec::new();
    let mut n = 0;

    for col in schema.value_columns() {
        if let Some(value) = doc.get(col.field) {
            n += 1;
            assignments.push(format!("{} = ?{n}", col.column));
            args.push(value.clone());
        }
    }

    if assignments.is_empty() {
        return Ok(PatchOutcome::NoOp);
    }

    let mut conditions: Vec<String> = Vec::new();
    for (column, value) in key_values {
        n += 1;
        conditions.push(format!("{column} = ?{n}"));
        args.push(value);
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        schema.table(),
        assignments.join(", "),
        conditions.join(" AND ")
    );

    Ok(PatchOutcome::Statement(Statement { sql, args }))
}
