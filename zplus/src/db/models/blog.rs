//! Database models for blog posts and categories.

use crate::types::{CategoryId, PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Publication state of a post, stored as TEXT
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema, Default)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Private,
    Archived,
}

#[derive(Debug, Clone)]
pub struct BlogPostCreateDBRequest {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author_id: Option<UserId>,
    pub status: PostStatus,
    pub is_featured: bool,
    pub category_ids: Vec<CategoryId>,
}

/// Full replacement of a post's editable fields. `category_ids: None` keeps the current links.
#[derive(Debug, Clone)]
pub struct BlogPostUpdateDBRequest {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub is_featured: bool,
    pub category_ids: Option<Vec<CategoryId>>,
}

/// A `blog_posts` row joined with its author's display fields
#[derive(Debug, Clone, FromRow)]
pub struct BlogPostDBResponse {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author_id: Option<UserId>,
    pub status: PostStatus,
    pub is_featured: bool,
    pub view_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_username: Option<String>,
    pub author_full_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BlogCategoryCreateDBRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BlogCategoryDBResponse {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
