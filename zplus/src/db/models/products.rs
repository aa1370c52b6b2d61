//! Database models for the software catalog.

use crate::types::{ProductCategoryId, ProductId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Every editable column of a product; used for both create and full update
#[derive(Debug, Clone, Default)]
pub struct ProductDBRequest {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub featured_image: Option<String>,
    pub gallery_images: Vec<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub version: Option<String>,
    pub requirements: Option<String>,
    pub features: Vec<String>,
    pub category_id: Option<ProductCategoryId>,
    pub download_url: Option<String>,
    pub file_size: Option<i64>,
    pub is_active: bool,
    pub is_featured: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductDBResponse {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub featured_image: Option<String>,
    pub gallery_images: Vec<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub version: Option<String>,
    pub requirements: Option<String>,
    pub features: Vec<String>,
    pub category_id: Option<ProductCategoryId>,
    pub download_url: Option<String>,
    pub file_size: Option<i64>,
    pub download_count: i64,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductDBResponse {
    /// What a buyer pays per unit
    pub fn effective_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }
}

#[derive(Debug, Clone)]
pub struct ProductCategoryCreateDBRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<ProductCategoryId>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductCategoryDBResponse {
    pub id: ProductCategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<ProductCategoryId>,
    pub created_at: DateTime<Utc>,
}
