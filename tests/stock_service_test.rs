mod common;

use assert_matches::assert_matches;
use catalog_api::errors::ServiceError;
use catalog_api::services::products::{CreateProductInput, ProductService};
use catalog_api::services::stock::{StockOperation, StockService};
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn seed(quantity: i32) -> (ProductService, StockService, Uuid) {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let stock = StockService::new(db);

    let created = products
        .create(CreateProductInput {
            name: "Widget".to_string(),
            description: None,
            sku: "W-1".to_string(),
            price: dec!(9.99),
            category: "Tools".to_string(),
            quantity: Some(quantity),
            image_url: None,
        })
        .await
        .expect("seed product");

    (products, stock, created.id)
}

#[tokio::test]
async fn subtract_within_balance_succeeds() {
    let (_, stock, id) = seed(5).await;

    let updated = stock
        .set_stock(id, 3, StockOperation::Subtract)
        .await
        .expect("subtract");

    assert_eq!(updated.quantity, 2);
    assert!(updated.in_stock);
}

#[tokio::test]
async fn subtract_beyond_balance_is_rejected_in_full() {
    let (products, stock, id) = seed(5).await;

    let err = stock
        .set_stock(id, 10, StockOperation::Subtract)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Validation { .. });

    // Nothing was applied
    let current = products.get(id).await.expect("get");
    assert_eq!(current.quantity, 5);
    assert!(current.in_stock);
}

#[tokio::test]
async fn subtract_to_zero_clears_in_stock() {
    let (_, stock, id) = seed(5).await;

    let updated = stock
        .set_stock(id, 5, StockOperation::Subtract)
        .await
        .expect("subtract");

    assert_eq!(updated.quantity, 0);
    assert!(!updated.in_stock);
}

#[tokio::test]
async fn add_raises_quantity_and_availability() {
    let (_, stock, id) = seed(0).await;

    let updated = stock
        .set_stock(id, 4, StockOperation::Add)
        .await
        .expect("add");

    assert_eq!(updated.quantity, 4);
    assert!(updated.in_stock);
}

#[tokio::test]
async fn set_is_idempotent() {
    let (_, stock, id) = seed(5).await;

    let first = stock
        .set_stock(id, 7, StockOperation::Set)
        .await
        .expect("first set");
    let second = stock
        .set_stock(id, 7, StockOperation::Set)
        .await
        .expect("second set");

    assert_eq!(first.quantity, 7);
    assert_eq!(second.quantity, 7);
    assert_eq!(first.in_stock, second.in_stock);
}

#[tokio::test]
async fn set_to_zero_clears_in_stock() {
    let (_, stock, id) = seed(5).await;

    let updated = stock
        .set_stock(id, 0, StockOperation::Set)
        .await
        .expect("set");

    assert_eq!(updated.quantity, 0);
    assert!(!updated.in_stock);
}

#[tokio::test]
async fn negative_quantity_is_rejected() {
    let (_, stock, id) = seed(5).await;

    for operation in [
        StockOperation::Set,
        StockOperation::Add,
        StockOperation::Subtract,
    ] {
        let err = stock.set_stock(id, -1, operation).await.unwrap_err();
        assert_matches!(err, ServiceError::Validation { .. });
    }
}

#[tokio::test]
async fn stock_update_on_missing_product_is_not_found() {
    let (_, stock, _) = seed(5).await;

    let err = stock
        .set_stock(Uuid::new_v4(), 1, StockOperation::Set)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn reserve_decrements_stock() {
    let (products, stock, id) = seed(5).await;

    let reserved = stock.reserve_stock(id, 3).await.expect("reserve");
    assert!(reserved);

    let current = products.get(id).await.expect("get");
    assert_eq!(current.quantity, 2);
    assert!(current.in_stock);
}

#[tokio::test]
async fn reserve_beyond_balance_is_a_soft_failure() {
    let (products, stock, id) = seed(2).await;

    let reserved = stock.reserve_stock(id, 3).await.expect("reserve");
    assert!(!reserved);

    // The balance is untouched
    let current = products.get(id).await.expect("get");
    assert_eq!(current.quantity, 2);
}

#[tokio::test]
async fn reserve_missing_product_is_not_found() {
    let (_, stock, _) = seed(2).await;

    let err = stock.reserve_stock(Uuid::new_v4(), 1).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn reserve_rejects_non_positive_quantity() {
    let (_, stock, id) = seed(2).await;

    assert_matches!(
        stock.reserve_stock(id, 0).await.unwrap_err(),
        ServiceError::Validation { .. }
    );
    assert_matches!(
        stock.reserve_stock(id, -4).await.unwrap_err(),
        ServiceError::Validation { .. }
    );
}

#[tokio::test]
async fn reserving_the_last_unit_clears_in_stock() {
    let (products, stock, id) = seed(1).await;

    let reserved = stock.reserve_stock(id, 1).await.expect("reserve");
    assert!(reserved);

    let current = products.get(id).await.expect("get");
    assert_eq!(current.quantity, 0);
    assert!(!current.in_stock);
}
