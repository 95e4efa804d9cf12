//! Product service: transaction ownership
//!
//! The service layer is the sole owner of transaction lifecycles. Each write
//! use-case begins exactly one transaction, hands the open handle down to the
//! repository, and issues exactly one terminal commit or rollback. Repository
//! errors propagate unchanged; a failed sub-write never leaves committed
//! state behind.

use crate::db::{Database, Product, ProductFilter, ProductGeneral, ProductRepository};
use crate::error::{Result, StoreError};
use crate::orm::{Page, PatchDocument};

pub struct ProductService {
    db: Database,
    repository: ProductRepository,
}

impl ProductService {
    pub fn new(db: Database) -> Self {
        let repository = db.products();
        Self { db, repository }
    }

    /// Load one aggregate by id. Absence surfaces as
    /// [`StoreError::NotFound`], distinguishable from a database failure.
    pub async fn load(&self, id: &str) -> Result<Product> {
        let mut conn = self.db.pool().acquire().await?;
        self.repository.load(&mut conn, id).await
    }

    /// Create the aggregate inside one transaction.
    pub async fn create(&self, product: &mut Product) -> Result<u64> {
        if product.general.id.is_empty() {
            return Err(StoreError::Build("product request has no id".to_string()));
        }

        let mut tx = self.db.pool().begin().await?;
        match self.repository.create(&mut tx, product).await {
            Ok(rows_affected) => {
                tx.commit().await?;
                Ok(rows_affected)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed after create error");
                }
                Err(e)
            }
        }
    }

    /// Replace the aggregate inside one transaction.
    pub async fn update(&self, product: &mut Product) -> Result<u64> {
        let mut tx = self.db.pool().begin().await?;
        match self.repository.update(&mut tx, product).await {
            Ok(rows_affected) => {
                tx.commit().await?;
                Ok(rows_affected)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed after update error");
                }
                Err(e)
            }
        }
    }

    /// Apply a partial update to the general record inside one transaction.
    /// A document naming no writable fields reports zero rows changed.
    pub async fn patch(&self, doc: &PatchDocument) -> Result<u64> {
        let mut tx = self.db.pool().begin().await?;
        match self.repository.patch(&mut tx, doc).await {
            Ok(rows_affected) => {
                tx.commit().await?;
                Ok(rows_affected)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed after patch error");
                }
                Err(e)
            }
        }
    }

    /// Delete the aggregate inside one transaction. A missing id reports
    /// zero rows affected, not an error.
    pub async fn delete(&self, id: &str) -> Result<u64> {
        let mut tx = self.db.pool().begin().await?;
        match self.repository.delete(&mut tx, id).await {
            Ok(rows_affected) => {
                tx.commit().await?;
                Ok(rows_affected)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed after delete error");
                }
                Err(e)
            }
        }
    }

    /// Filtered search over general records, read directly from the pool.
    pub async fn search(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Page<ProductGeneral>> {
        self.repository
            .search(self.db.pool(), filter, limit, offset)
            .await
    }
}
