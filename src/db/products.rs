//! Product repository: composite two-table aggregate
//!
//! A product spans two tables sharing one key: `products` holds the general
//! record (and the primary key), `product_details` holds an optional detail
//! record keyed by the same value. Writes sequence the per-table statements
//! inside the caller's transaction: general before details on create/update,
//! details before general on delete. Every operation takes the live
//! connection or transaction explicitly; the repository never opens one.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sqlx::{Row as _, SqliteConnection, SqlitePool};
use sqlx::sqlite::SqliteRow;

use crate::error::{Result, StoreError};
use crate::orm::{
    Entity, Filter, FromSqlRow, Page, PatchDocument, PatchOutcome, Row, Schema, SelectQuery,
    SortDirection, SqlValue, build_delete, build_insert, build_update, execute, resolve_patch,
};

/// Status derived from the detail record's stock level.
pub const STATUS_AVAILABLE: &str = "available";
pub const STATUS_NOT_AVAILABLE: &str = "not available";

/// Schema for the general table. Built once, shared across all requests.
pub static PRODUCT_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("products")
        .primary_key("id", "id", "TEXT")
        .column("productName", "productName", "TEXT")
        .nullable("description", "description", "TEXT")
        .column("price", "price", "TEXT")
        .column("status", "status", "TEXT")
        .build()
        .expect("product schema")
});

/// Schema for the detail table, keyed by the product id.
pub static PRODUCT_DETAILS_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("product_details")
        .primary_key("productID", "productID", "TEXT")
        .nullable("supplier", "supplier", "TEXT")
        .nullable("storage", "storage", "TEXT")
        .column("inStockAmount", "inStockAmount", "INTEGER")
        .build()
        .expect("product details schema")
});

/// General product record (one row in `products`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductGeneral {
    pub id: String,
    #[serde(rename = "productName")]
    pub product_name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    #[serde(default)]
    pub status: String,
}

/// Detail product record (at most one row in `product_details`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    #[serde(rename = "productID", default)]
    pub product_id: String,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub storage: String,
    #[serde(rename = "inStockAmount", default)]
    pub in_stock_amount: i64,
}

impl ProductDetails {
    /// An all-default detail record means "not provided": it is skipped on
    /// write rather than stored as a row of empty values. The key field is
    /// not consulted, since the coordinator stamps it from the general id.
    pub fn is_blank(&self) -> bool {
        self.supplier.is_empty() && self.storage.is_empty() && self.in_stock_amount == 0
    }
}

/// The composite product aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub general: ProductGeneral,
    #[serde(default)]
    pub details: ProductDetails,
}

impl Product {
    /// Derive the status field from the detail record's stock level.
    ///
    /// Runs once per write, before any statement is built, and mutates only
    /// the in-memory aggregate.
    fn derive_status(&mut self) {
        self.general.status = if self.details.in_stock_amount > 0 {
            STATUS_AVAILABLE.to_string()
        } else {
            STATUS_NOT_AVAILABLE.to_string()
        };
    }
}

impl Entity for ProductGeneral {
    fn schema() -> &'static Schema {
        &PRODUCT_SCHEMA
    }

    fn to_row(&self) -> Row {
        Row::new()
            .push("id", self.id.as_str())
            .push("productName", self.product_name.as_str())
            .push("description", self.description.as_str())
            .push("price", self.price.as_str())
            .push("status", self.status.as_str())
    }
}

impl FromSqlRow for ProductGeneral {
    fn from_row(row: &SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            product_name: row.try_get("productName")?,
            description: row.try_get::<Option<String>, _>("description")?.unwrap_or_default(),
            price: row.try_get("price")?,
            status: row.try_get("status")?,
        })
    }
}

impl Entity for ProductDetails {
    fn schema() -> &'static Schema {
        &PRODUCT_DETAILS_SCHEMA
    }

    fn to_row(&self) -> Row {
        Row::new()
            .push("productID", self.product_id.as_str())
            .push("supplier", self.supplier.as_str())
            .push("storage", self.storage.as_str())
            .push("inStockAmount", self.in_stock_amount)
    }
}

impl FromSqlRow for ProductDetails {
    fn from_row(row: &SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            product_id: row.try_get("productID")?,
            supplier: row.try_get::<Option<String>, _>("supplier")?.unwrap_or_default(),
            storage: row.try_get::<Option<String>, _>("storage")?.unwrap_or_default(),
            in_stock_amount: row.try_get("inStockAmount")?,
        })
    }
}

/// Typed partial update for the general record.
///
/// A `None` field means "leave unchanged"; only `Some` fields reach the
/// resolved UPDATE's column list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub id: String,
    #[serde(rename = "productName")]
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub status: Option<String>,
}

impl ProductPatch {
    /// Lower the typed patch into a field document for the resolver.
    pub fn into_document(self) -> PatchDocument {
        let mut doc = PatchDocument::new().set("id", self.id);
        if let Some(v) = self.product_name {
            doc = doc.set("productName", v);
        }
        if let Some(v) = self.description {
            doc = doc.set("description", v);
        }
        if let Some(v) = self.price {
            doc = doc.set("price", v);
        }
        if let Some(v) = self.status {
            doc = doc.set("status", v);
        }
        doc
    }
}

/// Search filter over the general table.
///
/// Translated to SQL conditions by the query builder; the match style per
/// field follows the entity declaration (id equality, name/description
/// prefix, status equality).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub id: Option<String>,
    #[serde(rename = "productName")]
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl Filter for ProductFilter {
    fn to_sql_conditions(&self) -> (Vec<String>, Vec<SqlValue>) {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(ref id) = self.id {
            conditions.push("id = ?".to_string());
            values.push(SqlValue::Text(id.clone()));
        }
        if let Some(ref name) = self.product_name {
            conditions.push("productName LIKE ?".to_string());
            values.push(SqlValue::Text(format!("{name}%")));
        }
        if let Some(ref description) = self.description {
            conditions.push("description LIKE ?".to_string());
            values.push(SqlValue::Text(format!("{description}%")));
        }
        if let Some(ref status) = self.status {
            conditions.push("status = ?".to_string());
            values.push(SqlValue::Text(status.clone()));
        }

        (conditions, values)
    }

    fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.product_name.is_none()
            && self.description.is_none()
            && self.status.is_none()
    }
}

/// Coordinates multi-table writes for the product aggregate.
///
/// All write operations run against the connection handle the caller passes
/// in; the caller (the service layer) owns begin/commit/rollback. The first
/// failing sub-statement short-circuits the rest and propagates unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductRepository;

impl ProductRepository {
    pub fn new() -> Self {
        Self
    }

    /// Load the aggregate: general row plus detail row, both point lookups.
    ///
    /// An absent general row means the aggregate does not exist and is
    /// reported as [`StoreError::NotFound`]; an absent detail row is a
    /// default detail record, not an error.
    pub async fn load(&self, conn: &mut SqliteConnection, id: &str) -> Result<Product> {
        let general: Option<ProductGeneral> = SelectQuery::new(&PRODUCT_SCHEMA)
            .where_clause("id = ?", id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(general) = general else {
            return Err(StoreError::NotFound);
        };

        let details: Option<ProductDetails> = SelectQuery::new(&PRODUCT_DETAILS_SCHEMA)
            .where_clause("productID = ?", id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(Product {
            general,
            details: details.unwrap_or_default(),
        })
    }

    /// Insert the aggregate: general row first, then the detail row unless
    /// the detail record is blank. Returns the summed rows-affected count.
    pub async fn create(&self, conn: &mut SqliteConnection, product: &mut Product) -> Result<u64> {
        product.derive_status();
        let mut rows_affected = 0u64;

        let general = build_insert(&PRODUCT_SCHEMA, &product.general.to_row())?;
        rows_affected += execute(&general, &mut *conn).await?.rows_affected();

        if !product.details.is_blank() {
            product.details.product_id = product.general.id.clone();
            let details = build_insert(&PRODUCT_DETAILS_SCHEMA, &product.details.to_row())?;
            rows_affected += execute(&details, &mut *conn).await?.rows_affected();
        }

        Ok(rows_affected)
    }

    /// Full update of the aggregate, same sequencing and skip rule as
    /// [`ProductRepository::create`].
    pub async fn update(&self, conn: &mut SqliteConnection, product: &mut Product) -> Result<u64> {
        product.derive_status();
        let mut rows_affected = 0u64;

        let general = build_update(&PRODUCT_SCHEMA, &product.general.to_row())?;
        rows_affected += execute(&general, &mut *conn).await?.rows_affected();

        if !product.details.is_blank() {
            product.details.product_id = product.general.id.clone();
            let details = build_update(&PRODUCT_DETAILS_SCHEMA, &product.details.to_row())?;
            rows_affected += execute(&details, &mut *conn).await?.rows_affected();
        }

        Ok(rows_affected)
    }

    /// Partial update of the general table only.
    ///
    /// A document that names no writable columns resolves to a no-op: zero
    /// rows reported, no SQL executed.
    pub async fn patch(&self, conn: &mut SqliteConnection, doc: &PatchDocument) -> Result<u64> {
        match resolve_patch(&PRODUCT_SCHEMA, doc)? {
            PatchOutcome::NoOp => Ok(0),
            PatchOutcome::Statement(stmt) => {
                Ok(execute(&stmt, conn).await?.rows_affected())
            }
        }
    }

    /// Delete the aggregate: detail row before general row, respecting the
    /// referential dependency. Deleting a missing id reports zero rows.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: &str) -> Result<u64> {
        let mut rows_affected = 0u64;

        let details = build_delete(&PRODUCT_DETAILS_SCHEMA, &[SqlValue::from(id)])?;
        rows_affected += execute(&details, &mut *conn).await?.rows_affected();

        let general = build_delete(&PRODUCT_SCHEMA, &[SqlValue::from(id)])?;
        rows_affected += execute(&general, &mut *conn).await?.rows_affected();

        Ok(rows_affected)
    }

    /// Filtered page over the general table.
    pub async fn search(
        &self,
        pool: &SqlitePool,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Page<ProductGeneral>> {
        SelectQuery::new(&PRODUCT_SCHEMA)
            .filter(filter)
            .order_by("productName", SortDirection::Asc)
            .limit(limit)
            .offset(offset)
            .fetch_page(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schemas_are_idempotent() {
        let rebuilt = Schema::builder("products")
            .primary_key("id", "id", "TEXT")
            .column("productName", "productName", "TEXT")
            .nullable("description", "description", "TEXT")
            .column("price", "price", "TEXT")
            .column("status", "status", "TEXT")
            .build()
            .unwrap();
        assert_eq!(*PRODUCT_SCHEMA, rebuilt);
    }

    #[test]
    fn test_blank_details_detection() {
        assert!(ProductDetails::default().is_blank());

        let with_key_only = ProductDetails {
            product_id: "p1".to_string(),
            ..Default::default()
        };
        assert!(with_key_only.is_blank());

        let stocked = ProductDetails {
            in_stock_amount: 3,
            ..Default::default()
        };
        assert!(!stocked.is_blank());
    }

    #[test]
    fn test_status_derivation() {
        let mut product = Product {
            general: ProductGeneral {
                id: "p1".to_string(),
                ..Default::default()
            },
            details: ProductDetails {
                in_stock_amount: 5,
                ..Default::default()
            },
        };
        product.derive_status();
        assert_eq!(product.general.status, STATUS_AVAILABLE);

        product.details.in_stock_amount = 0;
        product.derive_status();
        assert_eq!(product.general.status, STATUS_NOT_AVAILABLE);
    }

    #[test]
    fn test_typed_patch_lowers_only_present_fields() {
        let patch = ProductPatch {
            id: "p1".to_string(),
            price: Some("9.99".to_string()),
            ..Default::default()
        };
        let doc = patch.into_document();
        assert_eq!(doc.len(), 2);
        assert!(doc.get("productName").is_none());
        assert_eq!(doc.get("price"), Some(&SqlValue::Text("9.99".into())));
    }

    #[test]
    fn test_filter_conditions() {
        let filter = ProductFilter {
            product_name: Some("Wid".to_string()),
            status: Some(STATUS_AVAILABLE.to_string()),
            ..Default::default()
        };
        let (conditions, values) = filter.to_sql_conditions();
        assert_eq!(conditions, vec!["productName LIKE ?", "status = ?"]);
        assert_eq!(
            values,
            vec![
                SqlValue::Text("Wid%".into()),
                SqlValue::Text(STATUS_AVAILABLE.into())
            ]
        );
        assert!(!filter.is_empty());
        assert!(ProductFilter::default().is_empty());
    }

    #[test]
    fn test_wire_names_on_aggregate() {
        let json = serde_json::json!({
            "general": {
                "id": "p1",
                "productName": "Widget",
                "price": "5.00"
            },
            "details": {
                "inStockAmount": 5
            }
        });
        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.general.product_name, "Widget");
        assert_eq!(product.details.in_stock_amount, 5);
        assert!(product.general.status.is_empty());
    }
}
