//! Database repository for product categories.

use crate::db::{
    errors::Result,
    models::products::{ProductCategoryCreateDBRequest, ProductCategoryDBResponse},
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct ProductCategories<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ProductCategories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    pub async fn create(&mut self, request: &ProductCategoryCreateDBRequest) -> Result<ProductCategoryDBResponse> {
        let category = sqlx::query_as::<_, ProductCategoryDBResponse>(
            "INSERT INTO product_categories (id, name, slug, description, parent_id) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(request.parent_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(category)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<ProductCategoryDBResponse>> {
        let categories = sqlx::query_as::<_, ProductCategoryDBResponse>("SELECT * FROM product_categories ORDER BY name, slug")
            .fetch_all(&mut *self.db)
            .await?;
        Ok(categories)
    }
}
