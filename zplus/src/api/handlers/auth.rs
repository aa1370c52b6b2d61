use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use tracing::info;

use crate::{
    AppState,
    api::models::{
        auth::{
            AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, RegisterRequest,
            ResetPasswordRequest,
        },
        envelope::ApiResponse,
        users::{CurrentUser, ProfileUpdate, Role, UserResponse, validate_password},
    },
    auth::{
        current_user::bearer_token,
        password::{self, Argon2Params},
        session,
    },
    config::Config,
    db::{
        handlers::{PasswordResets, Repository, Sessions, Users},
        models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
    errors::{Error, Result},
};

/// Hash on the blocking pool; Argon2 would otherwise stall the runtime
pub(crate) async fn hash_password(password: &str, config: &Config) -> Result<String> {
    let password = password.to_string();
    let params = Argon2Params::from(&config.auth.password);
    tokio::task::spawn_blocking(move || password::hash_password(&password, params))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

pub(crate) async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
}

/// Check an email/password pair.
///
/// Unknown email, deactivated account and wrong password are distinct errors here but all render
/// as `AUTH_INVALID`, so callers cannot tell which one happened.
pub(crate) async fn authenticate_credentials(state: &AppState, email: &str, password: &str) -> Result<UserDBResponse> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_user_by_email(email.trim())
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if !user.is_active {
        return Err(Error::Deactivated);
    }
    if !verify_password(password, &user.password_hash).await? {
        return Err(Error::InvalidCredentials);
    }
    Ok(user)
}

/// Sign a token for `user` and record it as a session
pub(crate) async fn issue_session(state: &AppState, user: UserDBResponse) -> Result<AuthResponse> {
    let token = session::create_session_token(&CurrentUser::from(&user), &state.config)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Sessions::new(&mut conn).record(user.id, &token.token, token.expires_at).await?;

    Ok(AuthResponse {
        token: token.token,
        expires_at: token.expires_at,
        user: UserResponse::from(user),
    })
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "auth",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Registration is disabled"),
        (status = 409, description = "Email or username already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    if !state.config.auth.allow_registration {
        return Err(Error::PermissionDenied {
            message: "Registration is disabled".to_string(),
        });
    }
    request.validate(&state.config.auth.password)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    // Friendlier messages than the constraint names; the constraints still catch races
    if users.get_user_by_email(&request.email).await?.is_some() {
        return Err(Error::AlreadyExists {
            message: "An account with this email address already exists".to_string(),
        });
    }
    if users.get_user_by_username(&request.username).await?.is_some() {
        return Err(Error::AlreadyExists {
            message: "This username is already taken".to_string(),
        });
    }

    let password_hash = hash_password(&request.password, &state.config).await?;
    let user = users
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email,
            password_hash,
            role: Role::User,
            full_name: Some(request.full_name),
            phone: request.phone,
        })
        .await?;
    drop(conn);

    info!("Registered user {}", user.id);
    let auth = issue_session(&state, user).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success("User registered successfully", auth))))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<ApiResponse<AuthResponse>>> {
    let user = authenticate_credentials(&state, &request.email, &request.password).await?;
    let auth = issue_session(&state, user).await?;
    Ok(Json(ApiResponse::success("Login successful", auth)))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, current_user: CurrentUser) -> Result<Json<ApiResponse<()>>> {
    let token = bearer_token(&headers)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Sessions::new(&mut conn).revoke(current_user.id, token).await?;
    Ok(Json(ApiResponse::message("Logout successful")))
}

/// The signed-in user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account no longer exists"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ApiResponse<UserResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: current_user.id.to_string(),
        })?;
    Ok(Json(ApiResponse::success("User profile retrieved successfully", UserResponse::from(user))))
}

/// Edit the signed-in user's profile
#[utoipa::path(
    put,
    path = "/auth/profile",
    request_body = ProfileUpdate,
    tag = "auth",
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ProfileUpdate>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                full_name: request.full_name,
                phone: request.phone,
                avatar_url: request.avatar_url,
                ..Default::default()
            },
        )
        .await?;
    Ok(Json(ApiResponse::success("Profile updated successfully", UserResponse::from(user))))
}

/// Change the signed-in user's password
#[utoipa::path(
    post,
    path = "/auth/change-password",
    request_body = ChangePasswordRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "New password is invalid"),
        (status = 401, description = "Current password is wrong"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>> {
    let password_config = &state.config.auth.password;
    validate_password(&request.new_password, password_config.min_length, password_config.max_length)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);
    let user = users.get_by_id(current_user.id).await?.ok_or(Error::InvalidCredentials)?;
    if !verify_password(&request.current_password, &user.password_hash).await? {
        return Err(Error::InvalidCredentials);
    }

    let password_hash = hash_password(&request.new_password, &state.config).await?;
    users
        .update(
            user.id,
            &UserUpdateDBRequest {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;
    Ok(Json(ApiResponse::message("Password changed successfully")))
}

/// Request a password reset.
///
/// Always succeeds so the endpoint cannot be used to discover accounts.
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Reset requested", body = ForgotPasswordResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<ForgotPasswordResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_user_by_email(request.email.trim()).await?;

    let mut response = ForgotPasswordResponse::default();
    if let Some(user) = user.filter(|u| u.is_active) {
        let token = password::generate_reset_token();
        let expires_at = Utc::now() + state.config.auth.password_reset_token_duration;
        PasswordResets::new(&mut conn)
            .create(user.id, &password::hash_reset_token(&token), expires_at)
            .await?;
        info!("Password reset token issued for user {}", user.id);

        if state.config.env != "production" {
            response.reset_token = Some(token);
        }
    }

    Ok(Json(ApiResponse::success("Password reset email sent", response)))
}

/// Set a new password using a reset token
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Password reset successful"),
        (status = 400, description = "New password is invalid"),
        (status = 401, description = "Token unknown, used or expired"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>> {
    let password_config = &state.config.auth.password;
    validate_password(&request.new_password, password_config.min_length, password_config.max_length)?;
    let password_hash = hash_password(&request.new_password, &state.config).await?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let token = PasswordResets::new(&mut tx)
        .consume(&password::hash_reset_token(request.token.trim()))
        .await?
        .ok_or_else(|| Error::InvalidToken {
            message: "Invalid or expired reset token".to_string(),
        })?;

    Users::new(&mut tx)
        .update(
            token.user_id,
            &UserUpdateDBRequest {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;
    PasswordResets::new(&mut tx).invalidate_for_user(token.user_id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(ApiResponse::message("Password reset successful")))
}

#[cfg(test)]
mod tests {
    use crate::api::models::auth::AuthResponse;
    use crate::api::models::envelope::ApiResponse;
    use crate::test_utils::{bearer, create_test_app, create_test_user};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_then_login(pool: PgPool) {
        let (server, _) = create_test_app(pool).await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": "newcomer",
                "email": "newcomer@example.com",
                "password": "hunter22",
                "full_name": "New Comer"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: ApiResponse<AuthResponse> = response.json();
        assert!(body.success);
        assert_eq!(body.message, "User registered successfully");
        let registered = body.data.unwrap();
        assert_eq!(registered.user.role, crate::api::models::users::Role::User);

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({"email": "newcomer@example.com", "password": "hunter22"}))
            .await;
        response.assert_status_ok();
        let body: ApiResponse<AuthResponse> = response.json();
        let token = body.data.unwrap().token;

        let me = server.get("/api/v1/auth/me").add_header("authorization", bearer(&token)).await;
        me.assert_status_ok();
        let body: serde_json::Value = me.json();
        assert_eq!(body["data"]["email"], "newcomer@example.com");
        assert!(body["data"].get("password_hash").is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_duplicate_email(pool: PgPool) {
        let (server, _) = create_test_app(pool.clone()).await;
        let existing = create_test_user(&pool, "taken").await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": "someone-else",
                "email": existing.email,
                "password": "hunter22",
                "full_name": "Someone Else"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "ALREADY_EXISTS");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_duplicate_username(pool: PgPool) {
        let (server, _) = create_test_app(pool.clone()).await;
        let existing = create_test_user(&pool, "taken").await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": existing.username,
                "email": "fresh@example.com",
                "password": "hunter22",
                "full_name": "Fresh Face"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "ALREADY_EXISTS");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_failures_look_identical(pool: PgPool) {
        let (server, _) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "careful").await;

        let wrong_password = server
            .post("/api/v1/auth/login")
            .json(&json!({"email": user.email, "password": "not-the-password"}))
            .await;
        let unknown_email = server
            .post("/api/v1/auth/login")
            .json(&json!({"email": "nobody@example.com", "password": "whatever"}))
            .await;

        wrong_password.assert_status_unauthorized();
        unknown_email.assert_status_unauthorized();
        let a: serde_json::Value = wrong_password.json();
        let b: serde_json::Value = unknown_email.json();
        assert_eq!(a, b);
        assert_eq!(a["error"]["code"], "AUTH_INVALID");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bearer_header_errors(pool: PgPool) {
        let (server, _) = create_test_app(pool).await;

        let missing = server.get("/api/v1/auth/me").await;
        missing.assert_status_unauthorized();
        let body: serde_json::Value = missing.json();
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

        let malformed = server.get("/api/v1/auth/me").add_header("authorization", "Token abc").await;
        malformed.assert_status_unauthorized();
        let body: serde_json::Value = malformed.json();
        assert_eq!(body["error"]["code"], "AUTH_INVALID");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_logout_removes_session(pool: PgPool) {
        let (server, _) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "leaving").await;

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({"email": user.email, "password": crate::test_utils::TEST_PASSWORD}))
            .await;
        let token = response.json::<ApiResponse<AuthResponse>>().data.unwrap().token;

        let sessions = || async {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_sessions")
                .fetch_one(&pool)
                .await
                .unwrap()
        };
        assert_eq!(sessions().await, 1);

        server
            .post("/api/v1/auth/logout")
            .add_header("authorization", bearer(&token))
            .await
            .assert_status_ok();
        assert_eq!(sessions().await, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_change_password_requires_current(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "rotating").await;
        let token = crate::test_utils::token_for(&user, &config);

        let wrong = server
            .post("/api/v1/auth/change-password")
            .add_header("authorization", bearer(&token))
            .json(&json!({"current_password": "guess", "new_password": "brand-new-pass"}))
            .await;
        wrong.assert_status_unauthorized();

        server
            .post("/api/v1/auth/change-password")
            .add_header("authorization", bearer(&token))
            .json(&json!({"current_password": crate::test_utils::TEST_PASSWORD, "new_password": "brand-new-pass"}))
            .await
            .assert_status_ok();

        server
            .post("/api/v1/auth/login")
            .json(&json!({"email": user.email, "password": "brand-new-pass"}))
            .await
            .assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_password_reset_flow(pool: PgPool) {
        let (server, _) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "forgetful").await;

        let unknown = server
            .post("/api/v1/auth/forgot-password")
            .json(&json!({"email": "ghost@example.com"}))
            .await;
        unknown.assert_status_ok();
        let body: serde_json::Value = unknown.json();
        assert!(body["data"].get("reset_token").is_none());

        let response = server
            .post("/api/v1/auth/forgot-password")
            .json(&json!({"email": user.email}))
            .await;
        let body: serde_json::Value = response.json();
        let token = body["data"]["reset_token"].as_str().unwrap().to_string();

        server
            .post("/api/v1/auth/reset-password")
            .json(&json!({"token": token, "new_password": "recovered-pass"}))
            .await
            .assert_status_ok();

        let reused = server
            .post("/api/v1/auth/reset-password")
            .json(&json!({"token": token, "new_password": "another-pass"}))
            .await;
        reused.assert_status_unauthorized();

        server
            .post("/api/v1/auth/login")
            .json(&json!({"email": user.email, "password": "recovered-pass"}))
            .await
            .assert_status_ok();
    }
}
