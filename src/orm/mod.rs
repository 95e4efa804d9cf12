//! Statement-construction engine
//!
//! Everything needed to turn a static entity schema into parameterized SQL:
//! schema descriptors, value binding, INSERT/UPDATE/DELETE builders, patch
//! resolution, and the select/filter query builder.

pub mod patch;
pub mod query;
pub mod schema;
pub mod statement;
pub mod value;

pub use patch::{PatchDocument, PatchOutcome, resolve_patch};
pub use query::{Filter, Page, SelectQuery, SortDirection};
pub use schema::{ColumnDef, Entity, FromSqlRow, Schema, SchemaBuilder};
pub use statement::{Statement, build_delete, build_insert, build_update, execute};
pub use value::{Row, SqlValue};
