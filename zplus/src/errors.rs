use crate::api::models::envelope::ApiResponse;
use crate::db::errors::DbError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// A bearer token was supplied but is malformed, expired or forged
    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    /// Email/password pair did not match an account
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account exists but has been deactivated
    #[error("Account is deactivated")]
    Deactivated,

    /// Caller is authenticated but lacks the required role
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Entity with the same natural key already exists
    #[error("Already exists: {message}")]
    AlreadyExists { message: String },

    /// A remote site could not be reached or rejected our credentials
    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    /// A remote site rejected content we pushed to it
    #[error("Sync error: {message}")]
    SyncError { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } | Error::InvalidToken { .. } | Error::InvalidCredentials | Error::Deactivated => {
                StatusCode::UNAUTHORIZED
            }
            Error::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } | Error::ConnectionError { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::AlreadyExists { .. } => StatusCode::CONFLICT,
            Error::SyncError { .. } => StatusCode::BAD_GATEWAY,
            Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
                DbError::NotPending { .. } => StatusCode::CONFLICT,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Machine-readable code placed in the response envelope
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthenticated { .. } => "AUTH_REQUIRED",
            Error::InvalidToken { .. } | Error::InvalidCredentials | Error::Deactivated => "AUTH_INVALID",
            Error::PermissionDenied { .. } => "PERMISSION_DENIED",
            Error::BadRequest { .. } => "VALIDATION_ERROR",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::AlreadyExists { .. } => "ALREADY_EXISTS",
            Error::ConnectionError { .. } => "CONNECTION_ERROR",
            Error::SyncError { .. } => "SYNC_ERROR",
            Error::Internal { .. } | Error::Other(_) => "INTERNAL_ERROR",
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "NOT_FOUND",
                DbError::UniqueViolation { .. } => "ALREADY_EXISTS",
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => "VALIDATION_ERROR",
                DbError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
                DbError::NotPending { .. } => "NOT_PENDING",
                DbError::Other(_) => "INTERNAL_ERROR",
            },
        }
    }

    /// Short headline for the envelope `message` field
    pub fn summary(&self) -> &'static str {
        match self.code() {
            "AUTH_REQUIRED" => "Authentication required",
            "AUTH_INVALID" => "Invalid credentials",
            "PERMISSION_DENIED" => "Permission denied",
            "VALIDATION_ERROR" => "Validation failed",
            "NOT_FOUND" => "Resource not found",
            "ALREADY_EXISTS" => "Resource already exists",
            "CONNECTION_ERROR" => "Failed to connect to remote site",
            "SYNC_ERROR" => "Synchronization failed",
            "INSUFFICIENT_FUNDS" => "Insufficient wallet balance",
            "NOT_PENDING" => "Transaction is not pending",
            _ => "Internal server error",
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authorization header required".to_string()),
            Error::InvalidToken { message } => message.clone(),
            Error::InvalidCredentials | Error::Deactivated => "Invalid email or password".to_string(),
            Error::PermissionDenied { message } => message.clone(),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::AlreadyExists { message } => message.clone(),
            Error::ConnectionError { message } => message.clone(),
            Error::SyncError { message } => message.clone(),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(c)) if c.contains("email") => "An account with this email address already exists".to_string(),
                    (Some("users"), Some(c)) if c.contains("username") => "This username is already taken".to_string(),
                    (Some(table), Some(c)) if c.contains("slug") => {
                        format!("A {} with this slug already exists", entity_name(table))
                    }
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::InsufficientFunds { balance, required } => {
                    format!("Wallet balance {balance} is less than the required amount {required}")
                }
                DbError::NotPending { status } => format!("Transaction is already {status}"),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
        }
    }
}

fn entity_name(table: &str) -> &str {
    match table {
        "blog_posts" => "blog post",
        "blog_categories" => "blog category",
        "projects" => "project",
        "software_products" => "product",
        "product_categories" => "product category",
        other => other,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) | Error::AlreadyExists { .. } => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::ConnectionError { .. } | Error::SyncError { .. } => {
                tracing::warn!("Remote site error: {}", self);
            }
            Error::Unauthenticated { .. }
            | Error::InvalidToken { .. }
            | Error::InvalidCredentials
            | Error::Deactivated
            | Error::PermissionDenied { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = ApiResponse::<()>::failure(self.summary(), self.code(), self.user_message());
        (self.status_code(), Json(body)).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_ledger_errors_map_to_envelope_codes() {
        let err = Error::Database(DbError::InsufficientFunds {
            balance: Decimal::new(500, 0),
            required: Decimal::new(1000, 0),
        });
        assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");

        let err = Error::Database(DbError::NotPending {
            status: "completed".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "NOT_PENDING");
        assert_eq!(err.user_message(), "Transaction is already completed");
    }

    #[test]
    fn test_auth_failures_share_a_message() {
        // Unknown email, deactivated account and wrong password must look the same to callers
        assert_eq!(Error::InvalidCredentials.user_message(), Error::Deactivated.user_message());
        assert_eq!(Error::InvalidCredentials.code(), "AUTH_INVALID");
        assert_eq!(Error::Unauthenticated { message: None }.code(), "AUTH_REQUIRED");
    }

    #[test]
    fn test_slug_violation_message() {
        let err = Error::Database(DbError::UniqueViolation {
            constraint: Some("projects_slug_unique".to_string()),
            table: Some("projects".to_string()),
            message: "duplicate key".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "A project with this slug already exists");
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let err = Error::Other(anyhow::anyhow!("connection refused to 10.0.0.3"));
        assert_eq!(err.user_message(), "Internal server error");
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
