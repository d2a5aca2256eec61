use axum::{
    extract::{Json, Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::entities::product;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, no_content_response, paginated_response, success_response, validate_input,
    ApiResponse,
};
use crate::queries::product_queries::ProductListQuery;
use crate::services::products::{CreateProductInput, UpdateProductInput};
use crate::services::stock::StockOperation;
use crate::AppState;

const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

/// Creates the router for product endpoints
pub fn products_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/low-stock", get(low_stock_products))
        .route("/sku/:sku", get(get_product_by_sku))
        .route("/category/:category", get(get_products_by_category))
        .route(
            "/:id",
            get(get_product)
                .put(update_product)
                .patch(update_product)
                .delete(delete_product),
        )
        .route("/:id/stock", post(update_stock).patch(update_stock))
        .route("/:id/reserve", post(reserve_stock))
}

fn validate_price_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("price_not_positive");
        err.message = Some("price must be greater than zero".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[validate(length(max = 2000, message = "description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[validate(custom = "validate_price_positive")]
    #[schema(value_type = f64, example = 9.99)]
    pub price: Decimal,
    #[validate(length(
        min = 1,
        max = 100,
        message = "sku must be between 1 and 100 characters"
    ))]
    pub sku: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "category must be between 1 and 100 characters"
    ))]
    pub category: String,
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: Option<i32>,
    #[validate(url(message = "imageUrl must be a valid URL"))]
    pub image_url: Option<String>,
}

/// Partial update payload. Unknown fields, including `inStock`, are ignored:
/// availability is derived from `quantity` and cannot be set by callers.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "name must be between 1 and 255 characters"
    ))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[validate(custom = "validate_price_positive")]
    #[schema(value_type = f64, example = 19.99)]
    pub price: Option<Decimal>,
    #[validate(length(
        min = 1,
        max = 100,
        message = "sku must be between 1 and 100 characters"
    ))]
    pub sku: Option<String>,
    #[validate(length(
        min = 1,
        max = 100,
        message = "category must be between 1 and 100 characters"
    ))]
    pub category: Option<String>,
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: Option<i32>,
    #[validate(url(message = "imageUrl must be a valid URL"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StockUpdateRequest {
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: i32,
    pub operation: StockOperation,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReserveStockRequest {
    #[validate(range(min = 1, message = "quantity must be a positive integer"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Search term matched against name, description, SKU, and category
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockParams {
    /// Inclusive quantity threshold; defaults to 10
    pub threshold: Option<i32>,
}

/// Product representation returned to API callers.
///
/// `price` is carried as a fixed-precision decimal internally and becomes a
/// plain JSON number only here, at the boundary.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    #[schema(example = 9.99)]
    pub price: f64,
    pub category: String,
    pub in_stock: bool,
    pub quantity: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            sku: model.sku,
            price: model.price.to_f64().unwrap_or_default(),
            category: model.category,
            in_stock: model.in_stock,
            quantity: model.quantity,
            image_url: model.image_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn to_responses(products: Vec<product::Model>) -> Vec<ProductResponse> {
    products.into_iter().map(Into::into).collect()
}

/// List products with filtering, sorting, and pagination
#[utoipa::path(
    get,
    path = "/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Page of products with pagination metadata"),
        (status = 400, description = "Invalid paging or filter parameters", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (products, meta) = state
        .products
        .list(
            &query,
            state.config.default_page_size,
            state.config.max_page_size,
        )
        .await?;
    Ok(paginated_response(to_responses(products), meta))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let input = CreateProductInput {
        name: payload.name,
        description: payload.description,
        sku: payload.sku,
        price: payload.price,
        category: payload.category,
        quantity: payload.quantity,
        image_url: payload.image_url,
    };

    let created = state.products.create(input).await?;
    Ok(created_response(ProductResponse::from(created)))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product returned", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.products.get(id).await?;
    Ok(success_response(ProductResponse::from(product)))
}

/// Get a product by SKU
#[utoipa::path(
    get,
    path = "/products/sku/{sku}",
    params(("sku" = String, Path, description = "Stock-keeping unit")),
    responses(
        (status = 200, description = "Product returned", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product_by_sku(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.products.get_by_sku(&sku).await?;
    Ok(success_response(ProductResponse::from(product)))
}

/// List products in a category
#[utoipa::path(
    get,
    path = "/products/category/{category}",
    params(("category" = String, Path, description = "Category name, matched exactly")),
    responses((status = 200, description = "Products in the category")),
    tag = "products"
)]
pub async fn get_products_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.products.find_by_category(&category).await?;
    Ok(success_response(to_responses(products)))
}

/// Search products by term
#[utoipa::path(
    get,
    path = "/products/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching products"),
        (status = 400, description = "Missing or blank search term", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let term = params.q.unwrap_or_default();
    let products = state.products.search(&term).await?;
    Ok(success_response(to_responses(products)))
}

/// List products at or below a stock threshold
#[utoipa::path(
    get,
    path = "/products/low-stock",
    params(LowStockParams),
    responses((status = 200, description = "Products with low stock, lowest first")),
    tag = "products"
)]
pub async fn low_stock_products(
    State(state): State<AppState>,
    Query(params): Query<LowStockParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let threshold = params.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    let products = state.products.find_low_stock(threshold).await?;
    Ok(success_response(to_responses(products)))
}

/// Partially update a product
#[utoipa::path(
    patch,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let input = UpdateProductInput {
        name: payload.name,
        description: payload.description,
        sku: payload.sku,
        price: payload.price,
        category: payload.category,
        quantity: payload.quantity,
        image_url: payload.image_url,
    };

    let updated = state.products.update(id, input).await?;
    Ok(success_response(ProductResponse::from(updated)))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.products.delete(id).await?;
    Ok(no_content_response())
}

/// Set, add, or subtract stock
#[utoipa::path(
    post,
    path = "/products/{id}/stock",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = StockUpdateRequest,
    responses(
        (status = 200, description = "Stock updated", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Resulting quantity would be negative", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockUpdateRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let updated = state
        .stock
        .set_stock(id, payload.quantity, payload.operation)
        .await?;
    Ok(success_response(ProductResponse::from(updated)))
}

/// Reserve stock for fulfillment
///
/// Insufficient stock is a normal business outcome: the response is a 200
/// with `success: false`, not an error status.
#[utoipa::path(
    post,
    path = "/products/{id}/reserve",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = ReserveStockRequest,
    responses(
        (status = 200, description = "Reservation applied or declined", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn reserve_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReserveStockRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;

    let reserved = state.stock.reserve_stock(id, payload.quantity).await?;
    if reserved {
        let product = state.products.get(id).await?;
        Ok(success_response(ProductResponse::from(product)))
    } else {
        Ok((
            axum::http::StatusCode::OK,
            Json(ApiResponse::<ProductResponse>::failure("Insufficient stock")),
        )
            .into_response())
    }
}
