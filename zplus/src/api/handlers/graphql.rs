//! A small GraphQL-shaped endpoint over the user directory.
//!
//! Three operations are recognised from the query text: the `createUser` mutation, the admin-only
//! `users` query and `me`. Failures use GraphQL's `{errors: [{message}]}` body rather than the
//! REST envelope, with the HTTP status the equivalent REST call would return.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{debug, info};

use crate::{
    AppState,
    api::{
        handlers::auth::hash_password,
        models::{
            graphql::{GraphQLOperation, GraphQLRequest, GraphQLResponse, GraphQLUser},
            users::{Role, UserResponse, validate_email, validate_password, validate_username},
        },
    },
    auth::current_user::{AdminUser, authenticate},
    db::{
        handlers::{Repository, Users, users::UserFilter},
        models::users::UserCreateDBRequest,
    },
    errors::{Error, Result},
};

/// Upper bound on accounts returned by the `users` query
const USERS_QUERY_LIMIT: i64 = 100;

type GraphQLResult = (StatusCode, Json<GraphQLResponse>);

fn failure(status: StatusCode, message: impl Into<String>) -> GraphQLResult {
    (status, Json(GraphQLResponse::error(message)))
}

impl From<Error> for GraphQLResponse {
    fn from(e: Error) -> Self {
        GraphQLResponse::error(e.user_message())
    }
}

#[utoipa::path(
    post,
    path = "/graphql",
    request_body = GraphQLRequest,
    tag = "graphql",
    responses(
        (status = 200, description = "Operation result under `data`", body = GraphQLResponse),
        (status = 400, description = "Malformed body, missing variables or unsupported query", body = GraphQLResponse),
        (status = 401, description = "The operation needs a bearer token", body = GraphQLResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn graphql(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> GraphQLResult {
    let request: GraphQLRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!("Rejected GraphQL body: {}", e);
            return failure(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    let outcome = match request.operation() {
        Some(GraphQLOperation::CreateUser) => create_user(&state, &request).await,
        Some(GraphQLOperation::Users) => users(&state, &headers).await,
        Some(GraphQLOperation::Me) => me(&state, &headers).await,
        None => {
            return failure(StatusCode::BAD_REQUEST, format!("Unsupported query: {}", request.query));
        }
    };

    match outcome {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            debug!("GraphQL operation failed: {}", e);
            (e.status_code(), Json(GraphQLResponse::from(e)))
        }
    }
}

async fn create_user(state: &AppState, request: &GraphQLRequest) -> Result<GraphQLResponse> {
    let (Some(email), Some(username), Some(password)) = (
        request.variable("email"),
        request.variable("username"),
        request.variable("password"),
    ) else {
        return Err(Error::BadRequest {
            message: "Missing required variables: email, username, password".to_string(),
        });
    };

    validate_email(email)?;
    validate_username(username)?;
    let rules = &state.config.auth.password;
    validate_password(password, rules.min_length, rules.max_length)?;

    let password_hash = hash_password(password, &state.config).await?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role: Role::User,
            full_name: request.variable("fullName").map(str::to_string),
            phone: None,
        })
        .await?;

    info!("Created user {} through GraphQL", user.id);
    Ok(GraphQLResponse::data("createUser", GraphQLUser::from(UserResponse::from(user))))
}

async fn users(state: &AppState, headers: &HeaderMap) -> Result<GraphQLResponse> {
    AdminUser::require(authenticate(headers, &state.config)?)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let users = Users::new(&mut conn).list(&UserFilter::new(0, USERS_QUERY_LIMIT)).await?;
    let users: Vec<GraphQLUser> = users.into_iter().map(|u| GraphQLUser::from(UserResponse::from(u))).collect();
    Ok(GraphQLResponse::data("users", users))
}

async fn me(state: &AppState, headers: &HeaderMap) -> Result<GraphQLResponse> {
    let current = authenticate(headers, &state.config)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_by_id(current.id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: current.id.to_string(),
    })?;
    Ok(GraphQLResponse::data("me", GraphQLUser::from(UserResponse::from(user))))
}
