//! Database models for remote WordPress sites and the sync log.

use crate::types::{PostId, RemotePostId, SiteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct WordPressSiteCreateDBRequest {
    pub name: String,
    pub url: String,
    pub api_endpoint: String,
    pub username: Option<String>,
    pub application_password: Option<String>,
    pub is_active: bool,
}

/// A `wordpress_sites` row. Carries the application password; never serialize this directly.
#[derive(Debug, Clone, FromRow)]
pub struct WordPressSiteDBResponse {
    pub id: SiteId,
    pub name: String,
    pub url: String,
    pub api_endpoint: String,
    pub username: Option<String>,
    pub application_password: Option<String>,
    pub is_active: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WordPressSiteDBResponse {
    /// Basic-auth pair, present only when both halves are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.application_password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Failed,
}

/// What a sync log entry describes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    PostCreate,
    PostUpdate,
    PostSync,
}

#[derive(Debug, Clone)]
pub struct SyncLogCreateDBRequest {
    pub site_id: SiteId,
    pub sync_type: SyncType,
    pub local_content_id: Option<PostId>,
    pub remote_content_id: Option<RemotePostId>,
    pub status: SyncStatus,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SyncLogDBResponse {
    pub id: Uuid,
    pub site_id: SiteId,
    pub sync_type: SyncType,
    pub local_content_id: Option<PostId>,
    pub remote_content_id: Option<RemotePostId>,
    pub status: SyncStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}
