//! Error taxonomy for the persistence layer
//!
//! Four failure classes with different handling policies:
//! - [`StoreError::Schema`]: entity shape can't be reflected. Fatal at
//!   startup, never per-request.
//! - [`StoreError::Build`]: malformed input to a statement builder. A
//!   request-level failure; nothing is executed.
//! - [`StoreError::Execution`]: the database rejected a statement. Propagated
//!   unchanged to the transaction owner, which rolls back.
//! - [`StoreError::NotFound`]: a load matched zero rows. Absence, not failure.

use thiserror::Error;

/// Errors produced by schema reflection, statement building, and execution.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity shape cannot be turned into a schema (e.g. no primary key)
    #[error("schema error: {0}")]
    Schema(String),

    /// Malformed builder input (e.g. patch document missing its primary key)
    #[error("statement build error: {0}")]
    Build(String),

    /// The database rejected a statement or the connection failed
    #[error("execution error: {0}")]
    Execution(#[from] sqlx::Error),

    /// A point lookup matched zero rows
    #[error("not found")]
    NotFound,
}

impl StoreError {
    /// True for the logical "zero rows" outcome, so callers can translate it
    /// to an absence response instead of a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
