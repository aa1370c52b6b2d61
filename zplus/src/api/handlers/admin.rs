//! Admin sign-in, dashboard aggregates and user management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    AppState,
    api::{
        handlers::auth::{authenticate_credentials, hash_password, issue_session},
        models::{
            admin::{ActivityItem, DashboardStats},
            auth::{AuthResponse, LoginRequest},
            envelope::ApiResponse,
            pagination::PaginatedResponse,
            users::{AdminUserCreate, AdminUserUpdate, ListUsersQuery, Role, RoleUpdate, UserResponse},
        },
    },
    auth::current_user::AdminUser,
    db::{
        errors::DbError,
        handlers::{Dashboard, Repository, Users, users::UserFilter},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    types::UserId,
};

const RECENT_ACTIVITY_LIMIT: i64 = 10;

fn user_not_found(id: UserId) -> Error {
    Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    }
}

/// Sign in to the admin console
#[utoipa::path(
    post,
    path = "/admin/auth/login",
    request_body = LoginRequest,
    tag = "admin",
    responses(
        (status = 200, description = "Admin login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account is not an administrator"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn admin_login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<ApiResponse<AuthResponse>>> {
    let user = authenticate_credentials(&state, &request.email, &request.password).await?;
    if !user.is_admin() {
        return Err(Error::PermissionDenied {
            message: "Admin access required".to_string(),
        });
    }
    let auth = issue_session(&state, user).await?;
    Ok(Json(ApiResponse::success("Admin login successful", auth)))
}

#[utoipa::path(
    get,
    path = "/admin/dashboard/stats",
    tag = "admin",
    responses(
        (status = 200, description = "Dashboard stats retrieved successfully", body = DashboardStats),
        (status = 403, description = "Admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn dashboard_stats(State(state): State<AppState>, _: AdminUser) -> Result<Json<ApiResponse<DashboardStats>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let counts = Dashboard::new(&mut conn).counts().await?;
    Ok(Json(ApiResponse::success(
        "Dashboard stats retrieved successfully",
        DashboardStats::from(counts),
    )))
}

/// The most recent orders, registrations and blog posts, merged newest first
#[utoipa::path(
    get,
    path = "/admin/dashboard/activity",
    tag = "admin",
    responses(
        (status = 200, description = "Recent activity retrieved successfully", body = Vec<ActivityItem>),
        (status = 403, description = "Admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn recent_activity(State(state): State<AppState>, _: AdminUser) -> Result<Json<ApiResponse<Vec<ActivityItem>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let activity = Dashboard::new(&mut conn).recent_activity(RECENT_ACTIVITY_LIMIT).await?;
    Ok(Json(ApiResponse::success(
        "Recent activity retrieved successfully",
        activity.into_iter().map(ActivityItem::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Page of users, newest first", body = PaginatedResponse<UserResponse>),
        (status = 403, description = "Admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
    _: AdminUser,
) -> Result<Json<ApiResponse<PaginatedResponse<UserResponse>>>> {
    let (page, limit) = (query.pagination.page(), query.pagination.limit());
    let mut filter = UserFilter::new(query.pagination.skip(), limit);
    if let Some(role) = query.role {
        filter = filter.with_role(role);
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);
    let users = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    let items = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(ApiResponse::success(
        "Users retrieved successfully",
        PaginatedResponse::new(items, page, limit, total),
    )))
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<UserId>, _: AdminUser) -> Result<Json<ApiResponse<UserResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_by_id(id).await?.ok_or_else(|| user_not_found(id))?;
    Ok(Json(ApiResponse::success("User retrieved successfully", UserResponse::from(user))))
}

/// Create an account with an explicit role
#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = AdminUserCreate,
    tag = "admin",
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or username already taken"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<AdminUserCreate>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    request.validate(&state.config.auth.password)?;
    let password_hash = hash_password(&request.password, &state.config).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email,
            password_hash,
            role: request.role.unwrap_or(Role::User),
            full_name: Some(request.full_name),
            phone: request.phone,
        })
        .await?;

    info!("Admin {} created user {} with role {}", admin.id, user.id, user.role.as_str());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User created successfully", UserResponse::from(user))),
    ))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    request_body = AdminUserUpdate,
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    _: AdminUser,
    Json(request): Json<AdminUserUpdate>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .update(
            id,
            &UserUpdateDBRequest {
                full_name: request.full_name,
                phone: request.phone,
                avatar_url: request.avatar_url,
                is_active: request.is_active,
                password_hash: None,
            },
        )
        .await
        .map_err(|e| match e {
            DbError::NotFound => user_not_found(id),
            other => other.into(),
        })?;
    Ok(Json(ApiResponse::success("User updated successfully", UserResponse::from(user))))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<UserId>, AdminUser(admin): AdminUser) -> Result<Json<ApiResponse<()>>> {
    if admin.id == id {
        return Err(Error::BadRequest {
            message: "Administrators cannot delete their own account".to_string(),
        });
    }
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Users::new(&mut conn).delete(id).await? {
        return Err(user_not_found(id));
    }
    Ok(Json(ApiResponse::message("User deleted successfully")))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    request_body = RoleUpdate,
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    _: AdminUser,
    Json(request): Json<RoleUpdate>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).update_role(id, &request.role).await.map_err(|e| match e {
        DbError::NotFound => user_not_found(id),
        other => other.into(),
    })?;
    Ok(Json(ApiResponse::success("User role updated successfully", UserResponse::from(user))))
}
