//! Static schema descriptors
//!
//! A [`Schema`] is the derived table/column/key mapping for one entity type:
//! table name plus an ordered list of columns carrying the external (wire)
//! field name, the storage column name, and the primary-key flag. Schemas are
//! declared once per entity, validated at construction, and shared as
//! `'static` values across all requests (typically behind
//! `once_cell::sync::Lazy`). Derivation is deterministic and side-effect-free,
//! so repeated construction always yields an identical descriptor.

use sqlx::sqlite::SqliteRow;

use crate::error::{Result, StoreError};
use crate::orm::value::Row;

/// Column definition: wire-name ↔ column-name mapping plus DDL metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Field name as seen in the external representation (e.g. "productName")
    pub field: &'static str,
    /// Column name in the database
    pub column: &'static str,
    /// SQLite column type (TEXT, INTEGER, REAL, BLOB)
    pub sql_type: &'static str,
    /// Whether the column can be NULL
    pub nullable: bool,
    /// Whether this column is part of the primary key
    pub primary_key: bool,
}

impl ColumnDef {
    /// Generate the column definition SQL.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.column, self.sql_type);

        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }

        if !self.nullable && !self.primary_key {
            sql.push_str(" NOT NULL");
        }

        sql
    }
}

/// Derived schema for one entity type.
///
/// Invariant: holds at least one primary-key column. Key columns are excluded
/// from UPDATE/PATCH value lists and used in their WHERE clauses instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    table: &'static str,
    columns: Vec<ColumnDef>,
}

impl Schema {
    /// Start declaring a schema for the given table.
    pub fn builder(table: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            table,
            columns: Vec::new(),
        }
    }

    /// The SQL table name.
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// All column definitions, in declaration order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Primary-key columns, in declaration order.
    pub fn key_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Non-key columns, in declaration order.
    pub fn value_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| !c.primary_key)
    }

    /// Resolve an external field name to its column definition.
    pub fn column_for_field(&self, field: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Generate CREATE TABLE IF NOT EXISTS DDL for this schema.
    pub fn create_table_sql(&self) -> String {
        let column_defs: Vec<String> = self.columns.iter().map(|c| c.to_sql()).collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            self.table,
            column_defs.join(",\n  ")
        )
    }

    /// Build a SELECT covering every column.
    pub fn select_sql(&self) -> String {
        let columns: Vec<&str> = self.columns.iter().map(|c| c.column).collect();
        format!("SELECT {} FROM {}", columns.join(", "), self.table)
    }
}

/// Declarative builder for a [`Schema`], validated on `build`.
pub struct SchemaBuilder {
    table: &'static str,
    columns: Vec<ColumnDef>,
}

impl SchemaBuilder {
    /// Declare a primary-key column.
    pub fn primary_key(
        mut self,
        field: &'static str,
        column: &'static str,
        sql_type: &'static str,
    ) -> Self {
        self.columns.push(ColumnDef {
            field,
            column,
            sql_type,
            nullable: false,
            primary_key: true,
        });
        self
    }

    /// Declare a NOT NULL value column.
    pub fn column(
        mut self,
        field: &'static str,
        column: &'static str,
        sql_type: &'static str,
    ) -> Self {
        self.columns.push(ColumnDef {
            field,
            column,
            sql_type,
            nullable: false,
            primary_key: false,
        });
        self
    }

    /// Declare a nullable value column.
    pub fn nullable(
        mut self,
        field: &'static str,
        column: &'static str,
        sql_type: &'static str,
    ) -> Self {
        self.columns.push(ColumnDef {
            field,
            column,
            sql_type,
            nullable: true,
            primary_key: false,
        });
        self
    }

    /// Finalize the schema.
    ///
    /// Fails with [`StoreError::Schema`] if no primary key was declared or a
    /// column name is duplicated. This is a startup-time failure: schemas
    /// should be built once and cached, never per request.
    pub fn build(self) -> Result<Schema> {
        if !self.columns.iter().any(|c| c.primary_key) {
            return Err(StoreError::Schema(format!(
                "table {} declares no primary-key column",
                self.table
            )));
        }

        for (i, col) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.column == col.column) {
                return Err(StoreError::Schema(format!(
                    "table {} declares column {} twice",
                    self.table, col.column
                )));
            }
        }

        Ok(Schema {
            table: self.table,
            columns: self.columns,
        })
    }
}

/// An entity type bound to a static schema, able to render itself as an
/// ordered column/value row for the statement builders.
pub trait Entity {
    /// The cached, shared schema for this entity type.
    fn schema() -> &'static Schema;

    /// Extract this instance's column values, in schema order.
    fn to_row(&self) -> Row;
}

/// Decode a database row back into an entity.
pub trait FromSqlRow: Sized {
    fn from_row(row: &SqliteRow) -> std::result::Result<Self, sqlx::Error>;
}
