//! Stock mutation service.
//!
//! Every write is a single conditional UPDATE against the products table, so
//! the availability check and the new quantity are applied atomically and
//! concurrent mutations on one product are linearizable, even across
//! multiple service instances sharing the database. `in_stock` is recomputed
//! inside the same statement as `quantity`; the two can never diverge.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::product::{self, Entity as Product};
use crate::errors::ServiceError;

/// How a stock mutation combines with the current count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    Set,
    Add,
    Subtract,
}

/// Service for stock-quantity management
#[derive(Clone)]
pub struct StockService {
    db: Arc<DatabaseConnection>,
}

impl StockService {
    /// Creates a new stock service instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Applies a stock mutation and returns the updated product.
    ///
    /// A subtract that would push the count below zero is rejected in full
    /// with nothing applied.
    #[instrument(skip(self))]
    pub async fn set_stock(
        &self,
        id: Uuid,
        quantity: i32,
        operation: StockOperation,
    ) -> Result<product::Model, ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::validation("quantity cannot be negative"));
        }

        match operation {
            StockOperation::Set => {
                let rows = self.write_absolute(id, quantity).await?;
                if rows == 0 {
                    return Err(not_found(id));
                }
            }
            StockOperation::Add => {
                let rows = self.add_guarded(id, quantity).await?;
                if rows == 0 {
                    return Err(not_found(id));
                }
            }
            StockOperation::Subtract => {
                let rows = self.subtract_guarded(id, quantity).await?;
                if rows == 0 {
                    // Zero rows is either a missing product or insufficient
                    // stock; only an existence check can tell them apart.
                    let current = self.require(id).await?;
                    return Err(ServiceError::validation(format!(
                        "Cannot subtract {} from current stock of {}",
                        quantity, current.quantity
                    )));
                }
            }
        }

        let updated = self.require(id).await?;
        info!(
            product_id = %id,
            quantity = updated.quantity,
            in_stock = updated.in_stock,
            ?operation,
            "Stock updated"
        );
        Ok(updated)
    }

    /// Attempts to reserve `quantity` units of stock.
    ///
    /// Insufficient stock is a normal business outcome, reported as
    /// `Ok(false)` with nothing applied; only a missing product is an error.
    /// The availability check and the decrement are one statement, so N
    /// concurrent reservations against K available units yield exactly K
    /// successes.
    #[instrument(skip(self))]
    pub async fn reserve_stock(&self, id: Uuid, quantity: i32) -> Result<bool, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::validation(
                "reservation quantity must be a positive integer",
            ));
        }

        let rows = self.subtract_guarded(id, quantity).await?;
        if rows > 0 {
            info!(product_id = %id, quantity, "Stock reserved");
            return Ok(true);
        }

        // Distinguish a missing product from an insufficient balance
        self.require(id).await?;
        info!(product_id = %id, quantity, "Reservation declined, insufficient stock");
        Ok(false)
    }

    /// `UPDATE products SET quantity = ?, in_stock = ?, updated_at = ?
    ///  WHERE id = ?`
    async fn write_absolute(&self, id: Uuid, quantity: i32) -> Result<u64, ServiceError> {
        let result = Product::update_many()
            .col_expr(product::Column::Quantity, Expr::value(quantity))
            .col_expr(product::Column::InStock, Expr::value(quantity > 0))
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// `UPDATE products SET quantity = quantity + n,
    ///  in_stock = quantity + n > 0, updated_at = ? WHERE id = ?`
    async fn add_guarded(&self, id: Uuid, amount: i32) -> Result<u64, ServiceError> {
        let result = Product::update_many()
            .col_expr(
                product::Column::Quantity,
                Expr::col(product::Column::Quantity).add(amount),
            )
            .col_expr(
                product::Column::InStock,
                Expr::expr(Expr::col(product::Column::Quantity).add(amount)).gt(0),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// `UPDATE products SET quantity = quantity - n,
    ///  in_stock = quantity - n > 0, updated_at = ?
    ///  WHERE id = ? AND quantity >= n`
    async fn subtract_guarded(&self, id: Uuid, amount: i32) -> Result<u64, ServiceError> {
        let result = Product::update_many()
            .col_expr(
                product::Column::Quantity,
                Expr::col(product::Column::Quantity).sub(amount),
            )
            .col_expr(
                product::Column::InStock,
                Expr::expr(Expr::col(product::Column::Quantity).sub(amount)).gt(0),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(id))
            .filter(product::Column::Quantity.gte(amount))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn require(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Product with ID {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_deserializes_lowercase() {
        assert_eq!(
            serde_json::from_str::<StockOperation>("\"set\"").unwrap(),
            StockOperation::Set
        );
        assert_eq!(
            serde_json::from_str::<StockOperation>("\"add\"").unwrap(),
            StockOperation::Add
        );
        assert_eq!(
            serde_json::from_str::<StockOperation>("\"subtract\"").unwrap(),
            StockOperation::Subtract
        );
        assert!(serde_json::from_str::<StockOperation>("\"increase\"").is_err());
    }
}
