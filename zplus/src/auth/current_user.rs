//! Extractors for the authenticated principal.
//!
//! Handlers take [`CurrentUser`] when any signed-in account will do and [`AdminUser`] when the
//! route is restricted to administrators. Both read `Authorization: Bearer <jwt>`.

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    config::Config,
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::{instrument, trace};

/// The raw bearer token of a request.
///
/// A missing header is [`Error::Unauthenticated`]; a header that is not `Bearer <token>` is
/// [`Error::InvalidToken`].
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(Error::Unauthenticated { message: None })?;

    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::InvalidToken {
            message: "Invalid authorization header format".to_string(),
        })
}

/// Resolve the caller from request headers
pub fn authenticate(headers: &HeaderMap, config: &Config) -> Result<CurrentUser> {
    let token = bearer_token(headers)?;
    session::verify_session_token(token, config)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = authenticate(&parts.headers, &state.config)?;
        trace!("Authenticated user {}", user.id);
        Ok(user)
    }
}

/// A caller holding the `admin` role
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl AdminUser {
    pub fn require(user: CurrentUser) -> Result<Self> {
        if user.is_admin() {
            Ok(Self(user))
        } else {
            Err(Error::PermissionDenied {
                message: "Admin role required to access this resource".to_string(),
            })
        }
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        Self::require(user)
    }
}
