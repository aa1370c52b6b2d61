//! Database models for portfolio projects.

use crate::types::ProjectId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema, Default)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Development,
    Completed,
    Maintenance,
}

/// Every editable column of a project; used for both create and full update
#[derive(Debug, Clone, Default)]
pub struct ProjectDBRequest {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub featured_image: Option<String>,
    pub gallery_images: Vec<String>,
    pub technologies: Vec<String>,
    pub project_url: Option<String>,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_featured: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProjectDBResponse {
    pub id: ProjectId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub featured_image: Option<String>,
    pub gallery_images: Vec<String>,
    pub technologies: Vec<String>,
    pub project_url: Option<String>,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_featured: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
