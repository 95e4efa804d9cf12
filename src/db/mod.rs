//! Database connection and repositories

pub mod products;

pub use products::{
    Product, ProductDetails, ProductFilter, ProductGeneral, ProductPatch, ProductRepository,
    STATUS_AVAILABLE, STATUS_NOT_AVAILABLE,
};

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::config::Config;
use crate::error::Result;
use crate::orm::statement::{Statement, execute};

use products::{PRODUCT_DETAILS_SCHEMA, PRODUCT_SCHEMA};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new database connection pool
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new().connect(url).await?;
        Ok(Self { pool })
    }

    /// Create a new database connection pool sized per configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a product repository
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new()
    }

    /// Provision the tables for every registered schema from their DDL.
    /// Idempotent; intended for embedded deployments and tests.
    pub async fn ensure_schema(&self) -> Result<()> {
        for schema in [&*PRODUCT_SCHEMA, &*PRODUCT_DETAILS_SCHEMA] {
            let stmt = Statement {
                sql: schema.create_table_sql(),
                args: Vec::new(),
            };
            execute(&stmt, &self.pool).await?;
        }
        Ok(())
    }
}
