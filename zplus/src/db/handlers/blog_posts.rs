//! Database repository for blog posts.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::blog::{BlogCategoryDBResponse, BlogPostCreateDBRequest, BlogPostDBResponse, BlogPostUpdateDBRequest, PostStatus},
};
use crate::types::{CategoryId, PostId, abbrev_uuid};
use sqlx::{Connection, PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const SELECT_POST: &str = r#"
    SELECT p.*, u.username AS author_username, u.full_name AS author_full_name
    FROM blog_posts p
    LEFT JOIN users u ON u.id = p.author_id
"#;

/// Filter for listing blog posts
#[derive(Debug, Clone, Default)]
pub struct BlogPostFilter {
    pub skip: i64,
    pub limit: i64,
    pub status: Option<PostStatus>,
    /// Only posts linked to the category with this slug
    pub category_slug: Option<String>,
    pub featured: Option<bool>,
    /// Case-insensitive substring of title or content
    pub search: Option<String>,
}

impl BlogPostFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }

    /// The public listing: published posts only
    pub fn published(skip: i64, limit: i64) -> Self {
        Self {
            status: Some(PostStatus::Published),
            ..Self::new(skip, limit)
        }
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, sqlx::Postgres>) {
        if let Some(status) = self.status {
            query.push(" AND p.status = ");
            query.push_bind(status);
        }
        if let Some(slug) = &self.category_slug {
            query.push(
                " AND p.id IN (SELECT bpc.post_id FROM blog_post_categories bpc JOIN blog_categories bc ON bc.id = bpc.category_id WHERE bc.slug = ",
            );
            query.push_bind(slug.clone());
            query.push(")");
        }
        if let Some(featured) = self.featured {
            query.push(" AND p.is_featured = ");
            query.push_bind(featured);
        }
        if let Some(search) = &self.search {
            let pattern = format!("%{search}%");
            query.push(" AND (p.title ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR p.content ILIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
    }

    fn push_order(&self, query: &mut QueryBuilder<'_, sqlx::Postgres>) {
        if self.status == Some(PostStatus::Published) {
            query.push(" ORDER BY p.published_at DESC, p.created_at DESC");
        } else {
            query.push(" ORDER BY p.created_at DESC");
        }
    }
}

pub struct BlogPosts<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for BlogPosts<'c> {
    type CreateRequest = BlogPostCreateDBRequest;
    type UpdateRequest = BlogPostUpdateDBRequest;
    type Response = BlogPostDBResponse;
    type Id = PostId;
    type Filter = BlogPostFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO blog_posts (id, title, slug, content, excerpt, featured_image, author_id, status, is_featured, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, CASE WHEN $8 = 'published' THEN NOW() END)
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.content)
        .bind(&request.excerpt)
        .bind(&request.featured_image)
        .bind(request.author_id)
        .bind(request.status)
        .bind(request.is_featured)
        .execute(&mut *tx)
        .await?;

        Self::replace_categories(&mut tx, id, &request.category_ids).await?;
        let post = Self::fetch(&mut tx, id).await?.ok_or(DbError::NotFound)?;

        tx.commit().await?;
        Ok(post)
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Self::fetch(&mut *self.db, id).await
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(SELECT_POST);
        query.push(" WHERE 1=1");
        filter.push_conditions(&mut query);
        filter.push_order(&mut query);
        query.push(" LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let posts = query.build_query_as::<BlogPostDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(posts)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM blog_posts p WHERE 1=1");
        filter.push_conditions(&mut query);
        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `published_at` is stamped the first time a post becomes published and never moves after.
    #[instrument(skip(self, request), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE blog_posts SET
                title = $2,
                slug = $3,
                content = $4,
                excerpt = $5,
                featured_image = $6,
                status = $7,
                is_featured = $8,
                published_at = CASE WHEN $7 = 'published' AND published_at IS NULL THEN NOW() ELSE published_at END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.content)
        .bind(&request.excerpt)
        .bind(&request.featured_image)
        .bind(request.status)
        .bind(request.is_featured)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        if let Some(category_ids) = &request.category_ids {
            Self::replace_categories(&mut tx, id, category_ids).await?;
        }

        let post = Self::fetch(&mut tx, id).await?.ok_or(DbError::NotFound)?;
        tx.commit().await?;
        Ok(post)
    }
}

impl<'c> BlogPosts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    async fn fetch(conn: &mut PgConnection, id: PostId) -> Result<Option<BlogPostDBResponse>> {
        let post = sqlx::query_as::<_, BlogPostDBResponse>(&format!("{SELECT_POST} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(post)
    }

    async fn replace_categories(conn: &mut PgConnection, post_id: PostId, category_ids: &[CategoryId]) -> Result<()> {
        sqlx::query("DELETE FROM blog_post_categories WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *conn)
            .await?;

        if !category_ids.is_empty() {
            sqlx::query(
                "INSERT INTO blog_post_categories (post_id, category_id) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(category_ids)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Look up a post by slug regardless of status
    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<BlogPostDBResponse>> {
        let post = sqlx::query_as::<_, BlogPostDBResponse>(&format!("{SELECT_POST} WHERE p.slug = $1"))
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(post)
    }

    /// Public read of a published post. Counts as a view.
    #[instrument(skip(self), err)]
    pub async fn view_published(&mut self, slug: &str) -> Result<Option<BlogPostDBResponse>> {
        let id: Option<PostId> = sqlx::query_scalar(
            "UPDATE blog_posts SET view_count = view_count + 1 WHERE slug = $1 AND status = 'published' RETURNING id",
        )
        .bind(slug)
        .fetch_optional(&mut *self.db)
        .await?;

        match id {
            Some(id) => Self::fetch(&mut *self.db, id).await,
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&post_id)), err)]
    pub async fn categories_for(&mut self, post_id: PostId) -> Result<Vec<BlogCategoryDBResponse>> {
        let categories = sqlx::query_as::<_, BlogCategoryDBResponse>(
            r#"
            SELECT bc.* FROM blog_categories bc
            JOIN blog_post_categories bpc ON bpc.category_id = bc.id
            WHERE bpc.post_id = $1
            ORDER BY bc.name
            "#,
        )
        .bind(post_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::blog_categories::BlogCategories;
    use crate::db::models::blog::BlogCategoryCreateDBRequest;
    use crate::test_utils::create_test_user;
    use sqlx::PgPool;

    fn post(slug: &str, status: PostStatus) -> BlogPostCreateDBRequest {
        BlogPostCreateDBRequest {
            title: format!("Post {slug}"),
            slug: slug.to_string(),
            content: "Some content about Rust".to_string(),
            excerpt: None,
            featured_image: None,
            author_id: None,
            status,
            is_featured: false,
            category_ids: vec![],
        }
    }

    fn edit(existing: &BlogPostDBResponse, status: PostStatus) -> BlogPostUpdateDBRequest {
        BlogPostUpdateDBRequest {
            title: existing.title.clone(),
            slug: existing.slug.clone(),
            content: existing.content.clone(),
            excerpt: existing.excerpt.clone(),
            featured_image: existing.featured_image.clone(),
            status,
            is_featured: existing.is_featured,
            category_ids: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_published_stamps_published_at(pool: PgPool) {
        let author = create_test_user(&pool, "writer").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = BlogPosts::new(&mut conn);

        let mut request = post("hello", PostStatus::Published);
        request.author_id = Some(author.id);
        let created = repo.create(&request).await.unwrap();

        assert!(created.published_at.is_some());
        assert_eq!(created.author_username.as_deref(), Some(author.username.as_str()));

        let draft = repo.create(&post("draft", PostStatus::Draft)).await.unwrap();
        assert!(draft.published_at.is_none());
        assert!(draft.author_username.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_published_at_is_set_once(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = BlogPosts::new(&mut conn);

        let draft = repo.create(&post("evolving", PostStatus::Draft)).await.unwrap();
        let published = repo.update(draft.id, &edit(&draft, PostStatus::Published)).await.unwrap();
        let first_published_at = published.published_at.unwrap();

        let resaved = repo.update(draft.id, &edit(&published, PostStatus::Published)).await.unwrap();
        assert_eq!(resaved.published_at, Some(first_published_at));

        let archived = repo.update(draft.id, &edit(&resaved, PostStatus::Archived)).await.unwrap();
        let republished = repo.update(draft.id, &edit(&archived, PostStatus::Published)).await.unwrap();
        assert_eq!(republished.published_at, Some(first_published_at));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_missing_post(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = BlogPosts::new(&mut conn);

        let created = repo.create(&post("exists", PostStatus::Draft)).await.unwrap();
        let result = repo.update(Uuid::new_v4(), &edit(&created, PostStatus::Draft)).await;
        assert!(matches!(result, Err(DbError::NotFound)));
        assert!(!repo.delete(Uuid::new_v4()).await.unwrap());
        assert!(repo.delete(created.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_slug(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = BlogPosts::new(&mut conn);

        repo.create(&post("taken", PostStatus::Draft)).await.unwrap();
        let err = repo.create(&post("taken", PostStatus::Draft)).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_public_filters(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let rust = BlogCategories::new(&mut conn)
            .create(&BlogCategoryCreateDBRequest {
                name: "Rust".to_string(),
                slug: "rust".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let mut repo = BlogPosts::new(&mut conn);
        let mut tagged = post("tagged", PostStatus::Published);
        tagged.category_ids = vec![rust.id];
        tagged.is_featured = true;
        repo.create(&tagged).await.unwrap();

        let mut other = post("other", PostStatus::Published);
        other.title = "Gardening notes".to_string();
        other.content = "Tomatoes".to_string();
        repo.create(&other).await.unwrap();
        repo.create(&post("hidden", PostStatus::Draft)).await.unwrap();

        assert_eq!(repo.count(&BlogPostFilter::published(0, 10)).await.unwrap(), 2);
        assert_eq!(repo.count(&BlogPostFilter::new(0, 10)).await.unwrap(), 3);

        let by_category = BlogPostFilter {
            category_slug: Some("rust".to_string()),
            ..BlogPostFilter::published(0, 10)
        };
        let posts = repo.list(&by_category).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "tagged");

        let featured = BlogPostFilter {
            featured: Some(true),
            ..BlogPostFilter::published(0, 10)
        };
        assert_eq!(repo.count(&featured).await.unwrap(), 1);

        let search = BlogPostFilter {
            search: Some("TOMATO".to_string()),
            ..BlogPostFilter::published(0, 10)
        };
        let posts = repo.list(&search).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "other");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_view_published_counts_views_and_hides_drafts(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = BlogPosts::new(&mut conn);

        repo.create(&post("public", PostStatus::Published)).await.unwrap();
        repo.create(&post("secret", PostStatus::Draft)).await.unwrap();

        repo.view_published("public").await.unwrap().unwrap();
        let viewed = repo.view_published("public").await.unwrap().unwrap();
        assert_eq!(viewed.view_count, 2);

        assert!(repo.view_published("secret").await.unwrap().is_none());
        assert!(repo.get_by_slug("secret").await.unwrap().is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_replaces_category_links(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut categories = BlogCategories::new(&mut conn);
        let mut created_categories = Vec::new();
        for slug in ["a", "b"] {
            let category = categories
                .create(&BlogCategoryCreateDBRequest {
                    name: slug.to_uppercase(),
                    slug: slug.to_string(),
                    description: None,
                })
                .await
                .unwrap();
            created_categories.push(category);
        }
        let (a, b) = (&created_categories[0], &created_categories[1]);

        let mut repo = BlogPosts::new(&mut conn);
        let mut request = post("linked", PostStatus::Draft);
        request.category_ids = vec![a.id];
        let created = repo.create(&request).await.unwrap();
        assert_eq!(repo.categories_for(created.id).await.unwrap().len(), 1);

        let mut update = edit(&created, PostStatus::Draft);
        update.category_ids = Some(vec![b.id]);
        repo.update(created.id, &update).await.unwrap();

        let linked = repo.categories_for(created.id).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].slug, "b");
    }
}
