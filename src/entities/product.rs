use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Product entity
///
/// `in_stock` is derived state: it always equals `quantity > 0` and is
/// recomputed by every mutation that touches `quantity`. Callers cannot set
/// it directly.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key, generated at creation, never reused
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Product name
    #[validate(length(
        min = 1,
        max = 255,
        message = "Product name must be between 1 and 255 characters"
    ))]
    pub name: String,

    /// Product description
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,

    /// SKU (Stock Keeping Unit), unique across all products
    #[sea_orm(unique)]
    #[validate(length(
        min = 1,
        max = 100,
        message = "SKU must be between 1 and 100 characters"
    ))]
    pub sku: String,

    /// Unit price, always positive, two fractional digits
    pub price: Decimal,

    /// Free-form category label
    #[validate(length(
        min = 1,
        max = 100,
        message = "Category must be between 1 and 100 characters"
    ))]
    pub category: String,

    /// Derived availability flag, always `quantity > 0`
    pub in_stock: bool,

    /// Authoritative stock count, never negative
    pub quantity: i32,

    /// URL to the primary product image
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,

    /// Creation timestamp, set once
    pub created_at: DateTime<Utc>,

    /// Last update timestamp, refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
