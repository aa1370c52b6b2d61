//! Database repository for blog categories.

use crate::db::{
    errors::Result,
    models::blog::{BlogCategoryCreateDBRequest, BlogCategoryDBResponse},
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct BlogCategories<'c> {
    db: &'c mut PgConnection,
}

impl<'c> BlogCategories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    pub async fn create(&mut self, request: &BlogCategoryCreateDBRequest) -> Result<BlogCategoryDBResponse> {
        let category = sqlx::query_as::<_, BlogCategoryDBResponse>(
            "INSERT INTO blog_categories (id, name, slug, description) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(category)
    }

    /// Every category, alphabetical
    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<BlogCategoryDBResponse>> {
        let categories = sqlx::query_as::<_, BlogCategoryDBResponse>("SELECT * FROM blog_categories ORDER BY name, slug")
            .fetch_all(&mut *self.db)
            .await?;
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_is_alphabetical_and_slugs_unique(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = BlogCategories::new(&mut conn);

        for (name, slug) in [("Zig", "zig"), ("Go", "go"), ("Rust", "rust")] {
            repo.create(&BlogCategoryCreateDBRequest {
                name: name.to_string(),
                slug: slug.to_string(),
                description: None,
            })
            .await
            .unwrap();
        }

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Go", "Rust", "Zig"]);

        let err = repo
            .create(&BlogCategoryCreateDBRequest {
                name: "Rust again".to_string(),
                slug: "rust".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }
}
