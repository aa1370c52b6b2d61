//! API request/response models for portfolio projects.

use crate::api::models::pagination::Pagination;
use crate::api::models::validation::{validate_max, validate_required, validate_slug};
use crate::db::models::projects::{ProjectDBRequest, ProjectDBResponse, ProjectStatus};
use crate::errors::{Error, Result};
use crate::types::ProjectId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListProjectsQuery {
    pub status: Option<ProjectStatus>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[param(value_type = Option<bool>)]
    pub featured: Option<bool>,
    /// Case-insensitive match on name or description
    pub search: Option<String>,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// Create or replace a project
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectRequest {
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub gallery_images: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub project_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub sort_order: i32,
}

impl ProjectRequest {
    pub fn validate(&self) -> Result<()> {
        validate_required("name", &self.name, 255)?;
        validate_slug(&self.slug, 255)?;
        validate_required("description", &self.description, usize::MAX)?;
        if let Some(short) = &self.short_description {
            validate_max("short_description", short, 500)?;
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end < start
        {
            return Err(Error::BadRequest {
                message: "end_date must not be before start_date".to_string(),
            });
        }
        Ok(())
    }
}

impl From<ProjectRequest> for ProjectDBRequest {
    fn from(request: ProjectRequest) -> Self {
        Self {
            name: request.name,
            slug: request.slug,
            description: request.description,
            short_description: request.short_description,
            featured_image: request.featured_image,
            gallery_images: request.gallery_images,
            technologies: request.technologies,
            project_url: request.project_url,
            github_url: request.github_url,
            demo_url: request.demo_url,
            status: request.status,
            start_date: request.start_date,
            end_date: request.end_date,
            is_featured: request.is_featured,
            sort_order: request.sort_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    #[schema(value_type = String, format = "uuid")]
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

impl From<ProjectDBResponse> for ProjectResponse {
    fn from(db: ProjectDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            description: db.description,
            short_description: db.short_description,
            featured_image: db.featured_image,
            gallery_images: db.gallery_images,
            technologies: db.technologies,
            project_url: db.project_url,
            github_url: db.github_url,
            demo_url: db.demo_url,
            status: db.status,
            start_date: db.start_date,
            end_date: db.end_date,
            is_featured: db.is_featured,
            sort_order: db.sort_order,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
