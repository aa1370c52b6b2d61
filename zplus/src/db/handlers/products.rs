//! Database repository for software products.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::products::{ProductDBRequest, ProductDBResponse},
};
use crate::types::{ProductId, abbrev_uuid};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub skip: i64,
    pub limit: i64,
    pub active_only: bool,
    /// Only products in the category with this slug
    pub category_slug: Option<String>,
    pub featured: Option<bool>,
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }

    /// The public catalog: active products only
    pub fn active(skip: i64, limit: i64) -> Self {
        Self {
            active_only: true,
            ..Self::new(skip, limit)
        }
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, sqlx::Postgres>) {
        if self.active_only {
            query.push(" AND is_active");
        }
        if let Some(slug) = &self.category_slug {
            query.push(" AND category_id IN (SELECT id FROM product_categories WHERE slug = ");
            query.push_bind(slug.clone());
            query.push(")");
        }
        if let Some(featured) = self.featured {
            query.push(" AND is_featured = ");
            query.push_bind(featured);
        }
        if let Some(search) = &self.search {
            let pattern = format!("%{search}%");
            query.push(" AND (name ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR description ILIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
    }
}

pub struct Products<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Products<'c> {
    type CreateRequest = ProductDBRequest;
    type UpdateRequest = ProductDBRequest;
    type Response = ProductDBResponse;
    type Id = ProductId;
    type Filter = ProductFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let product = sqlx::query_as::<_, ProductDBResponse>(
            r#"
            INSERT INTO software_products (
                id, name, slug, description, short_description, featured_image, gallery_images, price, discount_price,
                version, requirements, features, category_id, download_url, file_size, is_active, is_featured
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.short_description)
        .bind(&request.featured_image)
        .bind(&request.gallery_images)
        .bind(request.price)
        .bind(request.discount_price)
        .bind(&request.version)
        .bind(&request.requirements)
        .bind(&request.features)
        .bind(request.category_id)
        .bind(&request.download_url)
        .bind(request.file_size)
        .bind(request.is_active)
        .bind(request.is_featured)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let product = sqlx::query_as::<_, ProductDBResponse>("SELECT * FROM software_products WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(product)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM software_products WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let products = query.build_query_as::<ProductDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(products)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM software_products WHERE 1=1");
        filter.push_conditions(&mut query);
        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM software_products WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, ProductDBResponse>(
            r#"
            UPDATE software_products SET
                name = $2, slug = $3, description = $4, short_description = $5, featured_image = $6,
                gallery_images = $7, price = $8, discount_price = $9, version = $10, requirements = $11,
                features = $12, category_id = $13, download_url = $14, file_size = $15, is_active = $16,
                is_featured = $17, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.short_description)
        .bind(&request.featured_image)
        .bind(&request.gallery_images)
        .bind(request.price)
        .bind(request.discount_price)
        .bind(&request.version)
        .bind(&request.requirements)
        .bind(&request.features)
        .bind(request.category_id)
        .bind(&request.download_url)
        .bind(request.file_size)
        .bind(request.is_active)
        .bind(request.is_featured)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}

impl<'c> Products<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Look up a product by slug; `active_only` hides retired products from the public catalog
    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str, active_only: bool) -> Result<Option<ProductDBResponse>> {
        let product =
            sqlx::query_as::<_, ProductDBResponse>("SELECT * FROM software_products WHERE slug = $1 AND (is_active OR NOT $2)")
                .bind(slug)
                .bind(active_only)
                .fetch_optional(&mut *self.db)
                .await?;
        Ok(product)
    }
}
