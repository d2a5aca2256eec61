mod common;

use assert_matches::assert_matches;
use catalog_api::errors::ServiceError;
use catalog_api::queries::product_queries::{ProductListQuery, SortBy, SortOrder};
use catalog_api::services::products::{CreateProductInput, ProductService, UpdateProductInput};
use rust_decimal_macros::dec;

fn widget(sku: &str, quantity: i32) -> CreateProductInput {
    CreateProductInput {
        name: "Widget".to_string(),
        description: Some("A fine widget".to_string()),
        sku: sku.to_string(),
        price: dec!(9.99),
        category: "Tools".to_string(),
        quantity: Some(quantity),
        image_url: None,
    }
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let svc = ProductService::new(common::test_db().await);

    let created = svc.create(widget("W-1", 5)).await.expect("create");
    assert_eq!(created.sku, "W-1");
    assert_eq!(created.quantity, 5);
    assert!(created.in_stock);
    assert_eq!(created.price, dec!(9.99));

    let fetched = svc.get(created.id).await.expect("get");
    assert_eq!(created, fetched);
}

#[tokio::test]
async fn create_defaults_quantity_to_zero() {
    let svc = ProductService::new(common::test_db().await);

    let mut input = widget("W-1", 0);
    input.quantity = None;
    let created = svc.create(input).await.expect("create");

    assert_eq!(created.quantity, 0);
    assert!(!created.in_stock);
}

#[tokio::test]
async fn create_trims_and_normalizes_strings() {
    let svc = ProductService::new(common::test_db().await);

    let mut input = widget("  W-1  ", 1);
    input.name = "  Widget  ".to_string();
    input.description = Some("   ".to_string());
    let created = svc.create(input).await.expect("create");

    assert_eq!(created.name, "Widget");
    assert_eq!(created.sku, "W-1");
    assert_eq!(created.description, None);
}

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
    let svc = ProductService::new(common::test_db().await);

    svc.create(widget("W-1", 5)).await.expect("first create");

    let mut second = widget("W-1", 2);
    second.name = "Another widget".to_string();
    let err = svc.create(second).await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn create_rejects_invalid_input() {
    let svc = ProductService::new(common::test_db().await);

    let mut blank_name = widget("W-1", 0);
    blank_name.name = "   ".to_string();
    assert_matches!(
        svc.create(blank_name).await.unwrap_err(),
        ServiceError::Validation { .. }
    );

    let mut free = widget("W-2", 0);
    free.price = dec!(0);
    assert_matches!(
        svc.create(free).await.unwrap_err(),
        ServiceError::Validation { .. }
    );

    let mut negative = widget("W-3", 0);
    negative.quantity = Some(-1);
    assert_matches!(
        svc.create(negative).await.unwrap_err(),
        ServiceError::Validation { .. }
    );
}

#[tokio::test]
async fn get_by_sku_finds_and_misses() {
    let svc = ProductService::new(common::test_db().await);

    let created = svc.create(widget("W-1", 5)).await.expect("create");
    let fetched = svc.get_by_sku("W-1").await.expect("get_by_sku");
    assert_eq!(fetched.id, created.id);

    assert_matches!(
        svc.get_by_sku("MISSING").await.unwrap_err(),
        ServiceError::NotFound(_)
    );
}

#[tokio::test]
async fn update_applies_only_present_fields() {
    let svc = ProductService::new(common::test_db().await);

    let created = svc.create(widget("W-1", 5)).await.expect("create");

    let updated = svc
        .update(
            created.id,
            UpdateProductInput {
                name: Some("Premium Widget".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.name, "Premium Widget");
    assert_eq!(updated.sku, created.sku);
    assert_eq!(updated.price, created.price);
    assert_eq!(updated.quantity, created.quantity);
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn update_quantity_recomputes_in_stock() {
    let svc = ProductService::new(common::test_db().await);

    let created = svc.create(widget("W-1", 5)).await.expect("create");

    let updated = svc
        .update(
            created.id,
            UpdateProductInput {
                quantity: Some(0),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.quantity, 0);
    assert!(!updated.in_stock);
}

#[tokio::test]
async fn update_to_taken_sku_is_a_conflict() {
    let svc = ProductService::new(common::test_db().await);

    svc.create(widget("W-1", 5)).await.expect("first");
    let second = svc.create(widget("W-2", 5)).await.expect("second");

    let err = svc
        .update(
            second.id,
            UpdateProductInput {
                sku: Some("W-1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // Re-writing its own SKU is not a conflict
    svc.update(
        second.id,
        UpdateProductInput {
            sku: Some("W-2".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("same-sku update");
}

#[tokio::test]
async fn update_rejects_non_positive_price() {
    let svc = ProductService::new(common::test_db().await);

    let created = svc.create(widget("W-1", 5)).await.expect("create");
    let err = svc
        .update(
            created.id,
            UpdateProductInput {
                price: Some(dec!(-2.00)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Validation { .. });
}

#[tokio::test]
async fn update_missing_product_is_not_found() {
    let svc = ProductService::new(common::test_db().await);

    let err = svc
        .update(uuid::Uuid::new_v4(), UpdateProductInput::default())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn second_delete_reports_not_found() {
    let svc = ProductService::new(common::test_db().await);

    let created = svc.create(widget("W-1", 5)).await.expect("create");
    svc.delete(created.id).await.expect("first delete");

    assert_matches!(
        svc.delete(created.id).await.unwrap_err(),
        ServiceError::NotFound(_)
    );
    assert_matches!(
        svc.get(created.id).await.unwrap_err(),
        ServiceError::NotFound(_)
    );
}

#[tokio::test]
async fn deleted_sku_can_be_reused() {
    let svc = ProductService::new(common::test_db().await);

    let created = svc.create(widget("W-1", 5)).await.expect("create");
    svc.delete(created.id).await.expect("delete");

    // Hard delete frees the SKU for new products
    svc.create(widget("W-1", 2)).await.expect("recreate");
}

#[tokio::test]
async fn low_stock_orders_by_quantity_ascending() {
    let svc = ProductService::new(common::test_db().await);

    for (sku, quantity) in [("W-1", 5), ("W-2", 1), ("W-3", 10)] {
        svc.create(widget(sku, quantity)).await.expect("create");
    }

    let low = svc.find_low_stock(5).await.expect("low stock");
    let quantities: Vec<i32> = low.iter().map(|p| p.quantity).collect();
    assert_eq!(quantities, vec![1, 5]);
}

#[tokio::test]
async fn search_matches_all_fields_case_insensitively() {
    let svc = ProductService::new(common::test_db().await);

    let mut hammer = widget("HAM-1", 3);
    hammer.name = "Hammer".to_string();
    hammer.description = Some("Drives nails".to_string());
    svc.create(hammer).await.expect("create hammer");

    let mut saw = widget("SAW-9", 3);
    saw.name = "Saw".to_string();
    saw.description = Some("Cuts wood".to_string());
    saw.category = "Cutting".to_string();
    svc.create(saw).await.expect("create saw");

    // name, case-insensitive
    let by_name = svc.search("hAmMeR").await.expect("search");
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].sku, "HAM-1");

    // description
    let by_description = svc.search("nails").await.expect("search");
    assert_eq!(by_description.len(), 1);

    // sku
    let by_sku = svc.search("saw-9").await.expect("search");
    assert_eq!(by_sku.len(), 1);

    // category
    let by_category = svc.search("cutting").await.expect("search");
    assert_eq!(by_category.len(), 1);

    assert_matches!(
        svc.search("   ").await.unwrap_err(),
        ServiceError::Validation { .. }
    );
}

#[tokio::test]
async fn find_by_category_is_exact() {
    let svc = ProductService::new(common::test_db().await);

    svc.create(widget("W-1", 5)).await.expect("create");
    let mut other = widget("W-2", 5);
    other.category = "Toolsmith".to_string();
    svc.create(other).await.expect("create");

    let tools = svc.find_by_category("Tools").await.expect("category");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].sku, "W-1");
}

#[tokio::test]
async fn list_paginates_with_consistent_metadata() {
    let svc = ProductService::new(common::test_db().await);

    for i in 0..25 {
        svc.create(widget(&format!("W-{:02}", i), i))
            .await
            .expect("create");
    }

    let query = ProductListQuery {
        page: Some(2),
        limit: Some(10),
        ..Default::default()
    };
    let (products, meta) = svc.list(&query, 20, 100).await.expect("list");

    assert_eq!(products.len(), 10);
    assert_eq!(meta.page, 2);
    assert_eq!(meta.limit, 10);
    assert_eq!(meta.total, 25);
    assert_eq!(meta.total_pages, 3);
    assert!(meta.has_next);
    assert!(meta.has_prev);
}

#[tokio::test]
async fn list_page_beyond_end_is_empty_not_an_error() {
    let svc = ProductService::new(common::test_db().await);

    svc.create(widget("W-1", 1)).await.expect("create");

    let query = ProductListQuery {
        page: Some(9),
        limit: Some(10),
        ..Default::default()
    };
    let (products, meta) = svc.list(&query, 20, 100).await.expect("list");

    assert!(products.is_empty());
    assert_eq!(meta.total, 1);
    assert!(!meta.has_next);
}

#[tokio::test]
async fn list_filters_by_price_range_and_sorts() {
    let svc = ProductService::new(common::test_db().await);

    for (sku, price) in [
        ("W-1", dec!(5.00)),
        ("W-2", dec!(15.00)),
        ("W-3", dec!(25.00)),
    ] {
        let mut input = widget(sku, 1);
        input.price = price;
        svc.create(input).await.expect("create");
    }

    let query = ProductListQuery {
        min_price: Some(dec!(10.00)),
        max_price: Some(dec!(30.00)),
        sort_by: Some(SortBy::Price),
        sort_order: Some(SortOrder::Asc),
        ..Default::default()
    };
    let (products, meta) = svc.list(&query, 20, 100).await.expect("list");

    let skus: Vec<&str> = products.iter().map(|p| p.sku.as_str()).collect();
    assert_eq!(skus, vec!["W-2", "W-3"]);
    assert_eq!(meta.total, 2);
}

#[tokio::test]
async fn list_rejects_out_of_range_paging() {
    let svc = ProductService::new(common::test_db().await);

    let zero_page = ProductListQuery {
        page: Some(0),
        ..Default::default()
    };
    assert_matches!(
        svc.list(&zero_page, 20, 100).await.unwrap_err(),
        ServiceError::Validation { .. }
    );

    let oversized = ProductListQuery {
        limit: Some(101),
        ..Default::default()
    };
    assert_matches!(
        svc.list(&oversized, 20, 100).await.unwrap_err(),
        ServiceError::Validation { .. }
    );
}
