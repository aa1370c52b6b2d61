//! API request/response models for software products and their categories.

use crate::api::models::pagination::Pagination;
use crate::api::models::validation::{validate_max, validate_required, validate_slug};
use crate::db::models::products::{ProductCategoryCreateDBRequest, ProductCategoryDBResponse, ProductDBRequest, ProductDBResponse};
use crate::errors::{Error, Result};
use crate::types::{ProductCategoryId, ProductId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListProductsQuery {
    /// Category slug
    pub category: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<bool>)]
    pub featured: Option<bool>,
    /// Case-insensitive match on name or description
    pub search: Option<String>,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// Create or replace a product
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductRequest {
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub gallery_images: Vec<String>,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<ProductCategoryId>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
}

fn default_true() -> bool {
    true
}

impl ProductRequest {
    pub fn validate(&self) -> Result<()> {
        validate_required("name", &self.name, 255)?;
        validate_slug(&self.slug, 255)?;
        validate_required("description", &self.description, usize::MAX)?;
        if let Some(short) = &self.short_description {
            validate_max("short_description", short, 500)?;
        }
        if self.price.is_sign_negative() {
            return Err(Error::BadRequest {
                message: "price must not be negative".to_string(),
            });
        }
        if let Some(discount) = self.discount_price
            && (discount.is_sign_negative() || discount > self.price)
        {
            return Err(Error::BadRequest {
                message: "discount_price must be between 0 and price".to_string(),
            });
        }
        if self.file_size.is_some_and(|size| size < 0) {
            return Err(Error::BadRequest {
                message: "file_size must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

impl From<ProductRequest> for ProductDBRequest {
    fn from(request: ProductRequest) -> Self {
        Self {
            name: request.name,
            slug: request.slug,
            description: request.description,
            short_description: request.short_description,
            featured_image: request.featured_image,
            gallery_images: request.gallery_images,
            price: request.price,
            discount_price: request.discount_price,
            version: request.version,
            requirements: request.requirements,
            features: request.features,
            category_id: request.category_id,
            download_url: request.download_url,
            file_size: request.file_size,
            is_active: request.is_active,
            is_featured: request.is_featured,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    #[schema(value_type = String, format = "uuid")]
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
    #[schema(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<ProductCategoryId>,
    pub download_url: Option<String>,
    pub file_size: Option<i64>,
    pub download_count: i64,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductDBResponse> for ProductResponse {
    fn from(db: ProductDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            description: db.description,
            short_description: db.short_description,
            featured_image: db.featured_image,
            gallery_images: db.gallery_images,
            price: db.price,
            discount_price: db.discount_price,
            version: db.version,
            requirements: db.requirements,
            features: db.features,
            category_id: db.category_id,
            download_url: db.download_url,
            file_size: db.file_size,
            download_count: db.download_count,
            is_active: db.is_active,
            is_featured: db.is_featured,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductCategoryCreate {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub parent_id: Option<ProductCategoryId>,
}

impl ProductCategoryCreate {
    pub fn validate(&self) -> Result<()> {
        validate_required("name", &self.name, 100)?;
        validate_slug(&self.slug, 100)
    }
}

impl From<ProductCategoryCreate> for ProductCategoryCreateDBRequest {
    fn from(create: ProductCategoryCreate) -> Self {
        Self {
            name: create.name,
            slug: create.slug,
            description: create.description,
            parent_id: create.parent_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductCategoryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProductCategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub parent_id: Option<ProductCategoryId>,
    pub created_at: DateTime<Utc>,
}

impl From<ProductCategoryDBResponse> for ProductCategoryResponse {
    fn from(db: ProductCategoryDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            description: db.description,
            parent_id: db.parent_id,
            created_at: db.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(price: &str, discount: Option<&str>) -> ProductRequest {
        serde_json::from_value(json!({
            "name": "Invoice Pro",
            "slug": "invoice-pro",
            "description": "Invoicing for small teams",
            "price": price,
            "discount_price": discount,
        }))
        .unwrap()
    }

    #[test]
    fn test_new_products_are_active_by_default() {
        let request = product("100000", None);
        assert!(request.is_active);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_price_rules() {
        assert!(product("-1", None).validate().is_err());
        assert!(product("100", Some("150")).validate().is_err());
        assert!(product("100", Some("80")).validate().is_ok());
    }
}
