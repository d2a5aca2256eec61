//! Query composition for product listing.
//!
//! Translates untrusted `page/limit/filter/sort` parameters into a bounded
//! sea-orm select plus pagination metadata. Out-of-range paging values are
//! rejected, never clamped, so callers always get the result-set size they
//! asked for. The same filter condition feeds both the count query and the
//! page fetch, keeping totals consistent with page contents.

use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder, Select};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::product::{self, Entity as Product};
use crate::errors::ServiceError;

/// Page size used when the caller does not pass `limit`
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// Hard ceiling for `limit`
pub const MAX_PAGE_SIZE: u64 = 100;

/// Sortable product columns; anything else is rejected at deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Name,
    Price,
    #[default]
    CreatedAt,
    UpdatedAt,
    Category,
    Quantity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Raw list parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// 1-based page number
    pub page: Option<i64>,
    /// Items per page, between 1 and 100
    pub limit: Option<i64>,
    /// Exact category match
    pub category: Option<String>,
    /// Case-insensitive substring match over name, description, SKU, and category
    pub search: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound
    pub max_price: Option<Decimal>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
}

/// Validated paging window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination metadata computed from a total count.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        // An empty result set has no pages at all
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: total > 0 && page > 1,
        }
    }
}

impl ProductListQuery {
    /// Validates and normalizes the paging window. Values outside the
    /// allowed ranges are rejected rather than clamped.
    pub fn page_request(
        &self,
        default_limit: u64,
        max_limit: u64,
    ) -> Result<PageRequest, ServiceError> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(ServiceError::validation(
                "page must be a positive integer",
            ));
        }

        let limit = self.limit.unwrap_or(default_limit as i64);
        if limit < 1 || limit as u64 > max_limit {
            return Err(ServiceError::validation(format!(
                "limit must be between 1 and {}",
                max_limit
            )));
        }

        Ok(PageRequest {
            page: page as u64,
            limit: limit as u64,
        })
    }

    /// Builds the shared filter condition for both the count and fetch queries.
    pub fn filter_condition(&self) -> Result<Condition, ServiceError> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(ServiceError::validation(
                    "minPrice cannot be greater than maxPrice",
                ));
            }
        }

        let mut condition = Condition::all();

        if let Some(category) = self.category.as_deref().map(str::trim) {
            if !category.is_empty() {
                condition = condition.add(product::Column::Category.eq(category));
            }
        }

        if let Some(term) = self.search.as_deref().map(str::trim) {
            if !term.is_empty() {
                condition = condition.add(substring_match(term));
            }
        }

        if let Some(min) = self.min_price {
            condition = condition.add(product::Column::Price.gte(min));
        }

        if let Some(max) = self.max_price {
            condition = condition.add(product::Column::Price.lte(max));
        }

        Ok(condition)
    }

    pub fn order_by(&self) -> (product::Column, Order) {
        let column = match self.sort_by.unwrap_or_default() {
            SortBy::Name => product::Column::Name,
            SortBy::Price => product::Column::Price,
            SortBy::CreatedAt => product::Column::CreatedAt,
            SortBy::UpdatedAt => product::Column::UpdatedAt,
            SortBy::Category => product::Column::Category,
            SortBy::Quantity => product::Column::Quantity,
        };
        let order = match self.sort_order.unwrap_or_default() {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        (column, order)
    }

    /// Composes the filtered, sorted select. Paging is applied by the caller
    /// after the count query has run on the same condition.
    pub fn select(&self) -> Result<Select<Product>, ServiceError> {
        let condition = self.filter_condition()?;
        let (column, order) = self.order_by();
        Ok(Product::find().filter(condition).order_by(column, order))
    }
}

/// Case-insensitive substring match over the standardized search fields,
/// OR-combined. `LOWER(col) LIKE '%term%'` behaves identically on Postgres
/// and SQLite, unlike a bare `LIKE`.
pub fn substring_match(term: &str) -> Condition {
    let pattern = format!("%{}%", term.trim().to_lowercase());
    Condition::any()
        .add(contains_ci(product::Column::Name, &pattern))
        .add(contains_ci(product::Column::Description, &pattern))
        .add(contains_ci(product::Column::Sku, &pattern))
        .add(contains_ci(product::Column::Category, &pattern))
}

fn contains_ci(column: product::Column, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(pattern)
}
