use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        envelope::ApiResponse,
        pagination::PaginatedResponse,
        projects::{ListProjectsQuery, ProjectRequest, ProjectResponse},
    },
    auth::current_user::AdminUser,
    db::{
        errors::DbError,
        handlers::{
            Projects, Repository,
            projects::{ProjectFilter, ProjectOrder},
        },
    },
    errors::{Error, Result},
    types::ProjectId,
};

fn project_not_found(id: impl ToString) -> Error {
    Error::NotFound {
        resource: "Project".to_string(),
        id: id.to_string(),
    }
}

async fn list_with_filter(state: &AppState, filter: ProjectFilter, page: i64) -> Result<PaginatedResponse<ProjectResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Projects::new(&mut conn);
    let projects = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    let items = projects.into_iter().map(ProjectResponse::from).collect();
    Ok(PaginatedResponse::new(items, page, filter.limit, total))
}

/// Portfolio projects in curated order
#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    params(ListProjectsQuery),
    responses(
        (status = 200, description = "Projects retrieved successfully", body = PaginatedResponse<ProjectResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<ProjectResponse>>>> {
    let filter = ProjectFilter {
        status: query.status,
        featured: query.featured,
        search: query.search,
        order: ProjectOrder::Curated,
        ..ProjectFilter::new(query.pagination.skip(), query.pagination.limit())
    };
    let page = list_with_filter(&state, filter, query.pagination.page()).await?;
    Ok(Json(ApiResponse::success("Projects retrieved successfully", page)))
}

#[utoipa::path(
    get,
    path = "/projects/{slug}",
    tag = "projects",
    params(("slug" = String, Path, description = "Project slug")),
    responses(
        (status = 200, description = "Project retrieved successfully", body = ProjectResponse),
        (status = 404, description = "Project not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_project(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<ApiResponse<ProjectResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let project = Projects::new(&mut conn)
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| project_not_found(&slug))?;
    Ok(Json(ApiResponse::success("Project retrieved successfully", ProjectResponse::from(project))))
}

/// Every project, newest first
#[utoipa::path(
    get,
    path = "/admin/projects",
    tag = "admin",
    params(ListProjectsQuery),
    responses(
        (status = 200, description = "Admin projects retrieved successfully", body = PaginatedResponse<ProjectResponse>),
        (status = 403, description = "Admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
    _: AdminUser,
) -> Result<Json<ApiResponse<PaginatedResponse<ProjectResponse>>>> {
    let filter = ProjectFilter {
        status: query.status,
        featured: query.featured,
        search: query.search,
        order: ProjectOrder::Newest,
        ..ProjectFilter::new(query.pagination.skip(), query.pagination.limit())
    };
    let page = list_with_filter(&state, filter, query.pagination.page()).await?;
    Ok(Json(ApiResponse::success("Admin projects retrieved successfully", page)))
}

#[utoipa::path(
    post,
    path = "/admin/projects",
    request_body = ProjectRequest,
    tag = "admin",
    responses(
        (status = 201, description = "Project created successfully", body = ProjectResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Slug already in use"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_project(
    State(state): State<AppState>,
    _: AdminUser,
    Json(request): Json<ProjectRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProjectResponse>>)> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let project = Projects::new(&mut conn).create(&request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Project created successfully", ProjectResponse::from(project))),
    ))
}

#[utoipa::path(
    put,
    path = "/admin/projects/{id}",
    request_body = ProjectRequest,
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project updated successfully", body = ProjectResponse),
        (status = 404, description = "Project not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    _: AdminUser,
    Json(request): Json<ProjectRequest>,
) -> Result<Json<ApiResponse<ProjectResponse>>> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let project = Projects::new(&mut conn).update(id, &request.into()).await.map_err(|e| match e {
        DbError::NotFound => project_not_found(id),
        other => other.into(),
    })?;
    Ok(Json(ApiResponse::success("Project updated successfully", ProjectResponse::from(project))))
}

#[utoipa::path(
    delete,
    path = "/admin/projects/{id}",
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted successfully"),
        (status = 404, description = "Project not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_project(State(state): State<AppState>, Path(id): Path<ProjectId>, _: AdminUser) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Projects::new(&mut conn).delete(id).await? {
        return Err(project_not_found(id));
    }
    Ok(Json(ApiResponse::message("Project deleted successfully")))
}
