//! Integration tests for the product persistence layer
//!
//! These tests run against a real SQLite database (a temp file, so every
//! pool connection sees the same data) and verify:
//! - insert/update/load round-trips
//! - patch semantics (absence preserves value, key-only patch is a no-op)
//! - composite-write coordination (status derivation, skip-empty details)
//! - all-or-nothing transactions (rollback leaves no visible state)

use storekeeper::db::{
    Database, Product, ProductDetails, ProductFilter, ProductGeneral, ProductPatch,
    STATUS_AVAILABLE, STATUS_NOT_AVAILABLE,
};
use storekeeper::error::StoreError;
use storekeeper::orm::PatchDocument;
use storekeeper::service::ProductService;
use storekeeper::{Config, init_tracing};

async fn test_service() -> (ProductService, Database, tempfile::TempPath) {
    init_tracing();

    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.into_temp_path();
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    db.ensure_schema().await.unwrap();

    let service = ProductService::new(db.clone());
    (service, db, path)
}

fn widget(id: &str, stock: i64) -> Product {
    Product {
        general: ProductGeneral {
            id: id.to_string(),
            product_name: "Widget".to_string(),
            description: "A widget".to_string(),
            price: "5.00".to_string(),
            status: String::new(),
        },
        details: ProductDetails {
            product_id: String::new(),
            supplier: "Acme".to_string(),
            storage: "Shelf 3".to_string(),
            in_stock_amount: stock,
        },
    }
}

// ============================================================================
// Round-trip Tests
// ============================================================================

#[tokio::test]
async fn test_insert_update_load_round_trip() {
    let (service, _db, _path) = test_service().await;

    let mut product = widget("p1", 5);
    assert_eq!(service.create(&mut product).await.unwrap(), 2);

    let mut updated = widget("p1", 7);
    updated.general.product_name = "Widget Mk2".to_string();
    updated.general.price = "6.50".to_string();
    assert_eq!(service.update(&mut updated).await.unwrap(), 2);

    let loaded = service.load("p1").await.unwrap();
    assert_eq!(loaded, updated);
    assert_eq!(loaded.general.product_name, "Widget Mk2");
    assert_eq!(loaded.details.in_stock_amount, 7);
}

#[tokio::test]
async fn test_load_missing_id_is_not_found() {
    let (service, _db, _path) = test_service().await;

    let err = service.load("nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_create_without_id_is_rejected() {
    let (service, _db, _path) = test_service().await;

    let mut product = widget("", 5);
    let err = service.create(&mut product).await.unwrap_err();
    assert!(matches!(err, StoreError::Build(_)));
}

// ============================================================================
// Patch Semantics
// ============================================================================

#[tokio::test]
async fn test_patch_changes_only_requested_fields() {
    let (service, _db, _path) = test_service().await;

    let mut product = widget("p1", 5);
    service.create(&mut product).await.unwrap();

    let doc = PatchDocument::from_json(&serde_json::json!({
        "id": "p1",
        "price": "9.99"
    }))
    .unwrap();
    assert_eq!(service.patch(&doc).await.unwrap(), 1);

    let loaded = service.load("p1").await.unwrap();
    assert_eq!(loaded.general.price, "9.99");
    // Absent fields keep their stored values
    assert_eq!(loaded.general.product_name, "Widget");
    assert_eq!(loaded.general.status, STATUS_AVAILABLE);
}

#[tokio::test]
async fn test_key_only_patch_is_noop() {
    let (service, _db, _path) = test_service().await;

    let mut product = widget("p1", 5);
    service.create(&mut product).await.unwrap();

    let doc = PatchDocument::new().set("id", "p1");
    assert_eq!(service.patch(&doc).await.unwrap(), 0);

    let loaded = service.load("p1").await.unwrap();
    assert_eq!(loaded.general.price, "5.00");
}

#[tokio::test]
async fn test_typed_patch_document() {
    let (service, _db, _path) = test_service().await;

    let mut product = widget("p1", 5);
    service.create(&mut product).await.unwrap();

    let patch = ProductPatch {
        id: "p1".to_string(),
        description: Some("Refreshed copy".to_string()),
        ..Default::default()
    };
    assert_eq!(service.patch(&patch.into_document()).await.unwrap(), 1);

    let loaded = service.load("p1").await.unwrap();
    assert_eq!(loaded.general.description, "Refreshed copy");
    assert_eq!(loaded.general.product_name, "Widget");
}

#[tokio::test]
async fn test_patch_without_key_is_rejected() {
    let (service, _db, _path) = test_service().await;

    let doc = PatchDocument::new().set("price", "9.99");
    let err = service.patch(&doc).await.unwrap_err();
    assert!(matches!(err, StoreError::Build(_)));
}

// ============================================================================
// Composite Write Coordination
// ============================================================================

#[tokio::test]
async fn test_create_derives_available_status() {
    let (service, _db, _path) = test_service().await;

    let mut product = widget("p1", 5);
    service.create(&mut product).await.unwrap();

    let loaded = service.load("p1").await.unwrap();
    assert_eq!(loaded.general.status, STATUS_AVAILABLE);
    assert_eq!(loaded.details.in_stock_amount, 5);
}

#[tokio::test]
async fn test_create_derives_not_available_status() {
    let (service, _db, _path) = test_service().await;

    // Keep a non-default detail field so the detail row is still written
    let mut product = widget("p1", 0);
    service.create(&mut product).await.unwrap();

    let loaded = service.load("p1").await.unwrap();
    assert_eq!(loaded.general.status, STATUS_NOT_AVAILABLE);
}

#[tokio::test]
async fn test_blank_details_writes_general_row_only() {
    let (service, db, _path) = test_service().await;

    let mut product = widget("p1", 0);
    product.details = ProductDetails::default();
    assert_eq!(service.create(&mut product).await.unwrap(), 1);

    let detail_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_details")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(detail_rows, 0);

    let loaded = service.load("p1").await.unwrap();
    assert_eq!(loaded.general.status, STATUS_NOT_AVAILABLE);
    assert_eq!(loaded.details, ProductDetails::default());
}

#[tokio::test]
async fn test_detail_row_is_keyed_by_general_id() {
    let (service, db, _path) = test_service().await;

    let mut product = widget("p1", 5);
    service.create(&mut product).await.unwrap();

    let key: String = sqlx::query_scalar("SELECT productID FROM product_details")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(key, "p1");
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_removes_both_rows() {
    let (service, _db, _path) = test_service().await;

    let mut product = widget("p1", 5);
    service.create(&mut product).await.unwrap();

    assert_eq!(service.delete("p1").await.unwrap(), 2);
    assert!(service.load("p1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_missing_id_reports_zero_rows() {
    let (service, _db, _path) = test_service().await;

    assert_eq!(service.delete("nope").await.unwrap(), 0);
}

// ============================================================================
// Transaction Atomicity
// ============================================================================

#[tokio::test]
async fn test_failed_detail_write_rolls_back_general_row() {
    let (service, db, _path) = test_service().await;

    // A pre-existing detail row with the same key makes the detail insert
    // fail after the general insert succeeded.
    sqlx::query("INSERT INTO product_details (productID, inStockAmount) VALUES ('p1', 1)")
        .execute(db.pool())
        .await
        .unwrap();

    let mut product = widget("p1", 5);
    let err = service.create(&mut product).await.unwrap_err();
    assert!(matches!(err, StoreError::Execution(_)));

    // The general row must not be visible after rollback
    assert!(service.load("p1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_concurrent_patches_to_distinct_keys() {
    let (service, db, _path) = test_service().await;

    let mut p1 = widget("p1", 5);
    let mut p2 = widget("p2", 5);
    service.create(&mut p1).await.unwrap();
    service.create(&mut p2).await.unwrap();

    let service2 = ProductService::new(db.clone());
    let doc1 = PatchDocument::new().set("id", "p1").set("price", "1.11");
    let doc2 = PatchDocument::new().set("id", "p2").set("price", "2.22");

    let (r1, r2) = tokio::join!(service.patch(&doc1), service2.patch(&doc2));
    assert_eq!(r1.unwrap(), 1);
    assert_eq!(r2.unwrap(), 1);

    assert_eq!(service.load("p1").await.unwrap().general.price, "1.11");
    assert_eq!(service.load("p2").await.unwrap().general.price, "2.22");
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_by_name_prefix() {
    let (service, _db, _path) = test_service().await;

    for (id, name) in [("p1", "Widget"), ("p2", "Widget Pro"), ("p3", "Gadget")] {
        let mut product = widget(id, 1);
        product.general.product_name = name.to_string();
        service.create(&mut product).await.unwrap();
    }

    let filter = ProductFilter {
        product_name: Some("Widget".to_string()),
        ..Default::default()
    };
    let page = service.search(&filter, 10, 0).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 2);
    assert!(page.items.iter().all(|p| p.product_name.starts_with("Widget")));
}

#[tokio::test]
async fn test_search_pagination_reports_full_total() {
    let (service, _db, _path) = test_service().await;

    for i in 0..5 {
        let mut product = widget(&format!("p{i}"), 1);
        service.create(&mut product).await.unwrap();
    }

    let page = service
        .search(&ProductFilter::default(), 2, 0)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 5);
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_connect_from_config() {
    let config = Config::from_env().unwrap();
    let db = Database::from_config(&config).await.unwrap();
    db.ensure_schema().await.unwrap();
}
