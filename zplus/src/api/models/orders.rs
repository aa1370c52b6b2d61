//! API request/response models for orders.

use crate::api::models::pagination::Pagination;
use crate::db::models::orders::{OrderDBResponse, OrderItemDBResponse, OrderStatus, PaymentStatus};
use crate::errors::{Error, Result};
use crate::types::{OrderId, ProductId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    #[schema(value_type = String, format = "uuid")]
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderCreate {
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OrderCreate {
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::BadRequest {
                message: "order must contain at least one item".to_string(),
            });
        }
        if let Some(item) = self.items.iter().find(|item| item.quantity < 1) {
            return Err(Error::BadRequest {
                message: format!("quantity for product {} must be at least 1", item.product_id),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListOrdersQuery {
    /// Admin listing only
    pub order_status: Option<OrderStatus>,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderStatusUpdate {
    pub order_status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl From<OrderItemDBResponse> for OrderItemResponse {
    fn from(db: OrderItemDBResponse) -> Self {
        Self {
            id: db.id,
            product_id: db.product_id,
            product_name: db.product_name,
            price: db.price,
            quantity: db.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: OrderId,
    pub order_number: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub payment_method: Option<String>,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemResponse>>,
}

impl From<OrderDBResponse> for OrderResponse {
    fn from(db: OrderDBResponse) -> Self {
        Self {
            id: db.id,
            order_number: db.order_number,
            user_id: db.user_id,
            total_amount: db.total_amount,
            discount_amount: db.discount_amount,
            final_amount: db.final_amount,
            payment_method: db.payment_method,
            payment_status: db.payment_status,
            order_status: db.order_status,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
            items: None,
        }
    }
}

impl OrderResponse {
    pub fn with_items(mut self, items: Vec<OrderItemDBResponse>) -> Self {
        self.items = Some(items.into_iter().map(Into::into).collect());
        self
    }
}

/// Outcome of paying an order from the wallet
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub order: OrderResponse,
    pub wallet_balance: Decimal,
    pub points_earned: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_validation() {
        let empty = OrderCreate { items: vec![], notes: None };
        assert!(empty.validate().is_err());

        let zero = OrderCreate {
            items: vec![OrderItemRequest {
                product_id: Uuid::new_v4(),
                quantity: 0,
            }],
            notes: None,
        };
        assert_eq!(zero.validate().unwrap_err().code(), "VALIDATION_ERROR");
    }
}
