//! Admin management of connected WordPress sites plus the inbound webhook.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        envelope::ApiResponse,
        pagination::PaginatedResponse,
        wordpress::{ListSyncLogsQuery, SyncLogResponse, WebhookPayload, WordPressSiteCreate, WordPressSiteResponse},
    },
    auth::current_user::AdminUser,
    db::{
        handlers::{SyncLogs, WordPressSites},
        models::wordpress::WordPressSiteCreateDBRequest,
    },
    errors::{Error, Result},
    sync::wordpress::{PushResult, SiteConnection, SyncSummary, default_author, load_site, pull_posts, push_post},
    types::{PostId, SiteId},
};

#[utoipa::path(
    get,
    path = "/admin/wordpress/sites",
    tag = "wordpress",
    responses(
        (status = 200, description = "WordPress sites retrieved successfully", body = Vec<WordPressSiteResponse>),
        (status = 403, description = "Admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_sites(State(state): State<AppState>, _: AdminUser) -> Result<Json<ApiResponse<Vec<WordPressSiteResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let sites = WordPressSites::new(&mut conn).list_active().await?;
    Ok(Json(ApiResponse::success(
        "WordPress sites retrieved successfully",
        sites.into_iter().map(WordPressSiteResponse::from).collect(),
    )))
}

/// Registers a site after a successful test request against its REST API
#[utoipa::path(
    post,
    path = "/admin/wordpress/sites",
    request_body = WordPressSiteCreate,
    tag = "wordpress",
    responses(
        (status = 201, description = "WordPress site created successfully", body = WordPressSiteResponse),
        (status = 400, description = "Invalid input or the site could not be reached"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_site(
    State(state): State<AppState>,
    _: AdminUser,
    Json(request): Json<WordPressSiteCreate>,
) -> Result<(StatusCode, Json<ApiResponse<WordPressSiteResponse>>)> {
    request.validate()?;
    let db_request = WordPressSiteCreateDBRequest::from(request);

    state
        .wordpress
        .test_connection(&SiteConnection {
            api_endpoint: db_request.api_endpoint.clone(),
            username: db_request.username.clone(),
            password: db_request.application_password.clone(),
        })
        .await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let site = WordPressSites::new(&mut conn).create(&db_request).await?;
    info!("Connected WordPress site {}", site.name);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("WordPress site created successfully", WordPressSiteResponse::from(site))),
    ))
}

#[utoipa::path(
    post,
    path = "/admin/wordpress/sites/{id}/test",
    tag = "wordpress",
    params(("id" = uuid::Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "WordPress connection successful"),
        (status = 400, description = "The site could not be reached"),
        (status = 404, description = "Site not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn test_site(State(state): State<AppState>, Path(id): Path<SiteId>, _: AdminUser) -> Result<Json<ApiResponse<()>>> {
    let site = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        load_site(&mut conn, id).await?
    };
    state.wordpress.test_connection(&SiteConnection::from(&site)).await?;
    Ok(Json(ApiResponse::message("WordPress connection successful")))
}

/// Pulls every remote post into the local blog
#[utoipa::path(
    post,
    path = "/admin/wordpress/sites/{id}/sync",
    tag = "wordpress",
    params(("id" = uuid::Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "WordPress content synchronized successfully", body = SyncSummary),
        (status = 404, description = "Site not found"),
        (status = 502, description = "The site's post listing could not be fetched"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn sync_site(State(state): State<AppState>, Path(id): Path<SiteId>, _: AdminUser) -> Result<Json<ApiResponse<SyncSummary>>> {
    let (site, author_id) = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let site = load_site(&mut conn, id).await?;
        let author_id = default_author(&mut conn, &state.config).await?;
        (site, author_id)
    };

    let summary = pull_posts(&state.db, &state.wordpress, &site, author_id).await?;
    Ok(Json(ApiResponse::success("WordPress content synchronized successfully", summary)))
}

#[utoipa::path(
    post,
    path = "/admin/wordpress/sites/{id}/push/{post_id}",
    tag = "wordpress",
    params(
        ("id" = uuid::Uuid, Path, description = "Site ID"),
        ("post_id" = uuid::Uuid, Path, description = "Local blog post ID"),
    ),
    responses(
        (status = 200, description = "Post published to WordPress successfully", body = PushResult),
        (status = 404, description = "Site or post not found"),
        (status = 502, description = "The site rejected the post"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn push_to_site(
    State(state): State<AppState>,
    Path((id, post_id)): Path<(SiteId, PostId)>,
    _: AdminUser,
) -> Result<Json<ApiResponse<PushResult>>> {
    let site = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        load_site(&mut conn, id).await?
    };
    let result = push_post(&state.db, &state.wordpress, &site, post_id).await?;
    Ok(Json(ApiResponse::success("Post published to WordPress successfully", result)))
}

#[utoipa::path(
    get,
    path = "/admin/wordpress/sites/{id}/logs",
    tag = "wordpress",
    params(("id" = uuid::Uuid, Path, description = "Site ID"), ListSyncLogsQuery),
    responses(
        (status = 200, description = "Sync logs retrieved successfully", body = PaginatedResponse<SyncLogResponse>),
        (status = 404, description = "Site not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_sync_logs(
    State(state): State<AppState>,
    Path(id): Path<SiteId>,
    Query(query): Query<ListSyncLogsQuery>,
    _: AdminUser,
) -> Result<Json<ApiResponse<PaginatedResponse<SyncLogResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    load_site(&mut conn, id).await?;

    let mut logs = SyncLogs::new(&mut conn);
    let entries = logs.list(id, query.pagination.skip(), query.pagination.limit()).await?;
    let total = logs.count(id).await?;

    let page = PaginatedResponse::new(
        entries.into_iter().map(SyncLogResponse::from).collect(),
        query.pagination.page(),
        query.pagination.limit(),
        total,
    );
    Ok(Json(ApiResponse::success("Sync logs retrieved successfully", page)))
}

/// Notifications from WordPress are acknowledged but not acted on
#[utoipa::path(
    post,
    path = "/wordpress/webhook",
    request_body = WebhookPayload,
    tag = "wordpress",
    responses(
        (status = 200, description = "Webhook acknowledged"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn webhook(Json(payload): Json<WebhookPayload>) -> Json<ApiResponse<()>> {
    info!(action = %payload.action, post_id = ?payload.post_id, "WordPress webhook received");
    Json(ApiResponse::message(payload.acknowledgement()))
}
