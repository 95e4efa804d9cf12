//! storekeeper: a relational persistence layer
//!
//! Maps statically declared entity schemas onto SQL tables and generates the
//! parameterized CRUD statements (insert, full update, partial patch, delete)
//! and search filters a thin handler layer needs. The crate covers statement
//! construction, patch semantics, atomic multi-table ("composite") writes,
//! and explicit transaction ownership; it assumes a live database handle is
//! supplied externally and is neither an ORM, a migration tool, nor a pool
//! manager.
//!
//! Layering, bottom up:
//! - [`orm`]: schema descriptors, value binding, statement builders, patch
//!   resolution, and the select/filter query builder.
//! - [`db`]: the pool wrapper and per-aggregate repositories; repository
//!   operations execute against a caller-supplied connection or transaction.
//! - [`service`]: use-case entry points that own transaction begin/commit/
//!   rollback, exactly once per logical write.

pub mod config;
pub mod db;
pub mod error;
pub mod orm;
pub mod service;

pub use config::Config;
pub use db::Database;
pub use error::{Result, StoreError};

/// Initialize tracing with console output and env-based filtering.
///
/// Intended for binaries and integration tests; library code only emits
/// events and never installs a subscriber.
pub fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storekeeper=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
