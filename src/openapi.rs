use utoipa::OpenApi;

use crate::errors::ErrorResponse;
use crate::handlers::health::{ComponentHealth, ComponentStatus, HealthResponse};
use crate::handlers::products::{
    CreateProductRequest, ProductResponse, ReserveStockRequest, StockUpdateRequest,
    UpdateProductRequest,
};
use crate::queries::product_queries::{PageMeta, SortBy, SortOrder};
use crate::services::stock::StockOperation;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        description = "Product catalog and inventory management API: CRUD, search, filtering, pagination, and stock operations for products consumed by a storefront frontend."
    ),
    paths(
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::get_product_by_sku,
        crate::handlers::products::get_products_by_category,
        crate::handlers::products::search_products,
        crate::handlers::products::low_stock_products,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::update_stock,
        crate::handlers::products::reserve_stock,
        crate::handlers::health::health_check,
    ),
    components(schemas(
        CreateProductRequest,
        UpdateProductRequest,
        StockUpdateRequest,
        ReserveStockRequest,
        ProductResponse,
        PageMeta,
        SortBy,
        SortOrder,
        StockOperation,
        ErrorResponse,
        HealthResponse,
        ComponentHealth,
        ComponentStatus,
    )),
    tags(
        (name = "products", description = "Product catalog and stock management"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
