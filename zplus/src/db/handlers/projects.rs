//! Database repository for projects.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::projects::{ProjectDBRequest, ProjectDBResponse, ProjectStatus},
};
use crate::types::{ProjectId, abbrev_uuid};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

/// Sort used by listings: `Curated` is the public portfolio order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectOrder {
    #[default]
    Curated,
    Newest,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub skip: i64,
    pub limit: i64,
    pub status: Option<ProjectStatus>,
    pub featured: Option<bool>,
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    pub order: ProjectOrder,
}

impl ProjectFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, sqlx::Postgres>) {
        if let Some(status) = self.status {
            query.push(" AND status = ");
            query.push_bind(status);
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

pub struct Projects<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Projects<'c> {
    type CreateRequest = ProjectDBRequest;
    type UpdateRequest = ProjectDBRequest;
    type Response = ProjectDBResponse;
    type Id = ProjectId;
    type Filter = ProjectFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let project = sqlx::query_as::<_, ProjectDBResponse>(
            r#"
            INSERT INTO projects (
                id, name, slug, description, short_description, featured_image, gallery_images, technologies,
                project_url, github_url, demo_url, status, start_date, end_date, is_featured, sort_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
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
        .bind(&request.technologies)
        .bind(&request.project_url)
        .bind(&request.github_url)
        .bind(&request.demo_url)
        .bind(request.status)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.is_featured)
        .bind(request.sort_order)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(project)
    }

    #[instrument(skip(self), fields(project_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let project = sqlx::query_as::<_, ProjectDBResponse>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(project)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM projects WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(match filter.order {
            ProjectOrder::Curated => " ORDER BY sort_order ASC, created_at DESC",
            ProjectOrder::Newest => " ORDER BY created_at DESC",
        });
        query.push(" LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let projects = query.build_query_as::<ProjectDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(projects)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM projects WHERE 1=1");
        filter.push_conditions(&mut query);
        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), fields(project_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(project_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, ProjectDBResponse>(
            r#"
            UPDATE projects SET
                name = $2, slug = $3, description = $4, short_description = $5, featured_image = $6,
                gallery_images = $7, technologies = $8, project_url = $9, github_url = $10, demo_url = $11,
                status = $12, start_date = $13, end_date = $14, is_featured = $15, sort_order = $16,
                updated_at = NOW()
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
        .bind(&request.technologies)
        .bind(&request.project_url)
        .bind(&request.github_url)
        .bind(&request.demo_url)
        .bind(request.status)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.is_featured)
        .bind(request.sort_order)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}

impl<'c> Projects<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<ProjectDBResponse>> {
        let project = sqlx::query_as::<_, ProjectDBResponse>("SELECT * FROM projects WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(project)
    }
}
