//! API request/response models for blog posts and categories.

use crate::api::models::pagination::Pagination;
use crate::api::models::validation::{validate_max, validate_required, validate_slug};
use crate::db::models::blog::{
    BlogCategoryCreateDBRequest, BlogCategoryDBResponse, BlogPostCreateDBRequest, BlogPostDBResponse, BlogPostUpdateDBRequest,
    PostStatus,
};
use crate::errors::Result;
use crate::types::{CategoryId, PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Query for the public post listing
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListPostsQuery {
    /// Category slug
    pub category: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<bool>)]
    pub featured: Option<bool>,
    /// Case-insensitive match on title or content
    pub search: Option<String>,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// Query for the admin post listing, which sees every status
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AdminListPostsQuery {
    pub status: Option<PostStatus>,
    pub search: Option<String>,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogPostCreate {
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub category_ids: Vec<CategoryId>,
}

impl BlogPostCreate {
    pub fn validate(&self) -> Result<()> {
        validate_post_fields(&self.title, &self.slug, &self.content, self.excerpt.as_deref())
    }

    pub fn into_db(self, author_id: UserId) -> BlogPostCreateDBRequest {
        BlogPostCreateDBRequest {
            title: self.title,
            slug: self.slug,
            content: self.content,
            excerpt: self.excerpt,
            featured_image: self.featured_image,
            author_id: Some(author_id),
            status: self.status,
            is_featured: self.is_featured,
            category_ids: self.category_ids,
        }
    }
}

/// Full replacement of a post. Omitting `category_ids` keeps the current categories.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogPostUpdate {
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    pub status: PostStatus,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    #[schema(value_type = Option<Vec<String>>)]
    pub category_ids: Option<Vec<CategoryId>>,
}

impl BlogPostUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_post_fields(&self.title, &self.slug, &self.content, self.excerpt.as_deref())
    }
}

impl From<BlogPostUpdate> for BlogPostUpdateDBRequest {
    fn from(update: BlogPostUpdate) -> Self {
        Self {
            title: update.title,
            slug: update.slug,
            content: update.content,
            excerpt: update.excerpt,
            featured_image: update.featured_image,
            status: update.status,
            is_featured: update.is_featured,
            category_ids: update.category_ids,
        }
    }
}

fn validate_post_fields(title: &str, slug: &str, content: &str, excerpt: Option<&str>) -> Result<()> {
    validate_required("title", title, 255)?;
    validate_slug(slug, 255)?;
    validate_required("content", content, usize::MAX)?;
    if let Some(excerpt) = excerpt {
        validate_max("excerpt", excerpt, 500)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorSummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogPostResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub is_featured: bool,
    pub view_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: Option<AuthorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<BlogCategoryResponse>>,
}

impl From<BlogPostDBResponse> for BlogPostResponse {
    fn from(db: BlogPostDBResponse) -> Self {
        let author = match (db.author_id, db.author_username) {
            (Some(id), Some(username)) => Some(AuthorSummary {
                id,
                username,
                full_name: db.author_full_name,
            }),
            _ => None,
        };
        Self {
            id: db.id,
            title: db.title,
            slug: db.slug,
            content: db.content,
            excerpt: db.excerpt,
            featured_image: db.featured_image,
            status: db.status,
            is_featured: db.is_featured,
            view_count: db.view_count,
            published_at: db.published_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
            author,
            categories: None,
        }
    }
}

impl BlogPostResponse {
    pub fn with_categories(mut self, categories: Vec<BlogCategoryDBResponse>) -> Self {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogCategoryCreate {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl BlogCategoryCreate {
    pub fn validate(&self) -> Result<()> {
        validate_required("name", &self.name, 100)?;
        validate_slug(&self.slug, 100)
    }
}

impl From<BlogCategoryCreate> for BlogCategoryCreateDBRequest {
    fn from(create: BlogCategoryCreate) -> Self {
        Self {
            name: create.name,
            slug: create.slug,
            description: create.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogCategoryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BlogCategoryDBResponse> for BlogCategoryResponse {
    fn from(db: BlogCategoryDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            description: db.description,
            created_at: db.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults() {
        let create: BlogPostCreate =
            serde_json::from_value(serde_json::json!({"title": "Hello", "slug": "hello", "content": "World"})).unwrap();
        assert_eq!(create.status, PostStatus::Draft);
        assert!(!create.is_featured);
        assert!(create.category_ids.is_empty());
        assert!(create.validate().is_ok());
    }

    #[test]
    fn test_create_validation() {
        let create: BlogPostCreate = serde_json::from_value(serde_json::json!({
            "title": "x".repeat(256),
            "slug": "hello",
            "content": "World"
        }))
        .unwrap();
        assert!(create.validate().is_err());

        let create = BlogPostCreate {
            title: "ok".to_string(),
            slug: "Not A Slug".to_string(),
            ..create
        };
        assert!(create.validate().is_err());
    }
}
