use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::product::{self, Entity as Product};
use crate::errors::ServiceError;
use crate::queries::product_queries::{substring_match, PageMeta, ProductListQuery, MAX_PAGE_SIZE};

/// Service for managing the product catalog
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

/// Input for creating a product
#[derive(Debug, Clone, Default)]
pub struct CreateProductInput {
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub price: Decimal,
    pub category: String,
    pub quantity: Option<i32>,
    pub image_url: Option<String>,
}

/// Partial update input; absent fields leave the current value untouched.
/// There is deliberately no `in_stock` field: availability is derived from
/// `quantity` and cannot be set by callers.
#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub quantity: Option<i32>,
    pub image_url: Option<String>,
}

impl ProductService {
    /// Creates a new product service instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new product
    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateProductInput) -> Result<product::Model, ServiceError> {
        let name = required_trimmed(&input.name, "name")?;
        let sku = required_trimmed(&input.sku, "sku")?;
        let category = required_trimmed(&input.category, "category")?;
        let price = positive_price(input.price)?;
        let quantity = input.quantity.unwrap_or(0);
        if quantity < 0 {
            return Err(ServiceError::validation("quantity cannot be negative"));
        }

        self.ensure_unique_sku(&sku, None).await?;

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(normalize_optional(input.description)),
            sku: Set(sku),
            price: Set(price),
            category: Set(category),
            in_stock: Set(quantity > 0),
            quantity: Set(quantity),
            image_url: Set(normalize_optional(input.image_url)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // The unique index on sku is the final authority; an insert that
        // races past the pre-check comes back as Conflict via the DbErr
        // classifier.
        let created = model.insert(&*self.db).await?;

        info!(product_id = %created.id, sku = %created.sku, "Product created");
        Ok(created)
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with ID {} not found", id)))
    }

    /// Get a product by SKU
    #[instrument(skip(self))]
    pub async fn get_by_sku(&self, sku: &str) -> Result<product::Model, ServiceError> {
        Product::find()
            .filter(product::Column::Sku.eq(sku))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with SKU '{}' not found", sku)))
    }

    /// List products with filtering, sorting, and pagination.
    ///
    /// The count and the page fetch share one filter condition so the
    /// metadata always matches the page contents. An empty result set is a
    /// success, not an error.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        query: &ProductListQuery,
        default_limit: u64,
        max_limit: u64,
    ) -> Result<(Vec<product::Model>, PageMeta), ServiceError> {
        let page = query.page_request(default_limit, max_limit)?;
        let select = query.select()?;

        let total = select.clone().count(&*self.db).await?;
        let products = select
            .limit(page.limit)
            .offset(page.offset())
            .all(&*self.db)
            .await?;

        Ok((products, PageMeta::new(page.page, page.limit, total)))
    }

    /// Partially update a product
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let current = self.get(id).await?;

        if let Some(sku) = input.sku.as_deref() {
            let sku = sku.trim();
            if sku.is_empty() {
                return Err(ServiceError::validation("sku cannot be blank"));
            }
            if sku != current.sku {
                self.ensure_unique_sku(sku, Some(id)).await?;
            }
        }

        let mut active: product::ActiveModel = current.into();

        if let Some(name) = input.name {
            active.name = Set(required_trimmed(&name, "name")?);
        }
        if let Some(description) = input.description {
            active.description = Set(normalize_optional(Some(description)));
        }
        if let Some(sku) = input.sku {
            active.sku = Set(sku.trim().to_string());
        }
        if let Some(price) = input.price {
            active.price = Set(positive_price(price)?);
        }
        if let Some(category) = input.category {
            active.category = Set(required_trimmed(&category, "category")?);
        }
        if let Some(quantity) = input.quantity {
            if quantity < 0 {
                return Err(ServiceError::validation("quantity cannot be negative"));
            }
            // in_stock is derived from quantity, never taken from the caller
            active.quantity = Set(quantity);
            active.in_stock = Set(quantity > 0);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(normalize_optional(Some(image_url)));
        }

        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;

        info!(product_id = %updated.id, "Product updated");
        Ok(updated)
    }

    /// Delete a product (hard delete). A repeat delete reports NotFound.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Product::delete_by_id(id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product with ID {} not found",
                id
            )));
        }

        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// All products in an exact category, newest first
    #[instrument(skip(self))]
    pub async fn find_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(ServiceError::validation("category cannot be blank"));
        }

        Ok(Product::find()
            .filter(product::Column::Category.eq(category))
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Case-insensitive substring search over name, description, SKU, and
    /// category, newest first, bounded by the maximum page size.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<product::Model>, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ServiceError::validation("search term cannot be blank"));
        }

        Ok(Product::find()
            .filter(substring_match(term))
            .order_by_desc(product::Column::CreatedAt)
            .limit(MAX_PAGE_SIZE)
            .all(&*self.db)
            .await?)
    }

    /// Products at or below the given stock threshold, lowest first
    #[instrument(skip(self))]
    pub async fn find_low_stock(&self, threshold: i32) -> Result<Vec<product::Model>, ServiceError> {
        if threshold < 0 {
            return Err(ServiceError::validation("threshold cannot be negative"));
        }

        Ok(Product::find()
            .filter(product::Column::Quantity.lte(threshold))
            .order_by_asc(product::Column::Quantity)
            .all(&*self.db)
            .await?)
    }

    async fn ensure_unique_sku(
        &self,
        sku: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = Product::find().filter(product::Column::Sku.eq(sku));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product with SKU '{}' already exists",
                sku
            )));
        }

        Ok(())
    }
}

fn required_trimmed(value: &str, field: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!(
            "{} cannot be blank",
            field
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn positive_price(price: Decimal) -> Result<Decimal, ServiceError> {
    if price <= Decimal::ZERO {
        return Err(ServiceError::validation(
            "price must be greater than zero",
        ));
    }
    Ok(price.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn required_trimmed_rejects_whitespace() {
        assert!(required_trimmed("  ", "name").is_err());
        assert_eq!(required_trimmed(" Widget ", "name").unwrap(), "Widget");
    }

    #[test]
    fn normalize_optional_drops_blank_values() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(None), None);
        assert_eq!(
            normalize_optional(Some(" trimmed ".into())),
            Some("trimmed".into())
        );
    }

    #[test]
    fn price_must_be_positive() {
        assert!(positive_price(dec!(0)).is_err());
        assert!(positive_price(dec!(-1.50)).is_err());
        assert_eq!(positive_price(dec!(9.99)).unwrap(), dec!(9.99));
    }

    #[test]
    fn price_is_quantized_to_cents() {
        assert_eq!(positive_price(dec!(9.999)).unwrap(), dec!(10.00));
        assert_eq!(positive_price(dec!(9.991)).unwrap(), dec!(9.99));
    }
}
