//! API request/response models for WordPress site management and webhooks.

use crate::api::models::pagination::Pagination;
use crate::api::models::validation::validate_required;
use crate::db::models::wordpress::{
    SyncLogDBResponse, SyncStatus, SyncType, WordPressSiteCreateDBRequest, WordPressSiteDBResponse,
};
use crate::errors::{Error, Result};
use crate::types::{PostId, RemotePostId, SiteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WordPressSiteCreate {
    pub name: String,
    pub url: String,
    /// REST base, e.g. `https://example.com/wp-json/wp/v2`
    pub api_endpoint: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub application_password: Option<String>,
}

impl WordPressSiteCreate {
    pub fn validate(&self) -> Result<()> {
        validate_required("name", &self.name, 255)?;
        for (field, value) in [("url", &self.url), ("api_endpoint", &self.api_endpoint)] {
            validate_required(field, value, 500)?;
            let parsed = url::Url::parse(value).map_err(|_| Error::BadRequest {
                message: format!("{field} must be a valid URL"),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::BadRequest {
                    message: format!("{field} must use http or https"),
                });
            }
        }
        Ok(())
    }
}

impl From<WordPressSiteCreate> for WordPressSiteCreateDBRequest {
    fn from(create: WordPressSiteCreate) -> Self {
        Self {
            name: create.name,
            url: create.url,
            api_endpoint: create.api_endpoint.trim_end_matches('/').to_string(),
            username: create.username,
            application_password: create.application_password,
            is_active: true,
        }
    }
}

/// A configured site. The application password is never returned.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WordPressSiteResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SiteId,
    pub name: String,
    pub url: String,
    pub api_endpoint: String,
    pub username: Option<String>,
    pub has_credentials: bool,
    pub is_active: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WordPressSiteDBResponse> for WordPressSiteResponse {
    fn from(db: WordPressSiteDBResponse) -> Self {
        Self {
            has_credentials: db.credentials().is_some(),
            id: db.id,
            name: db.name,
            url: db.url,
            api_endpoint: db.api_endpoint,
            username: db.username,
            is_active: db.is_active,
            last_sync_at: db.last_sync_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncLogResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    pub sync_type: SyncType,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub local_content_id: Option<PostId>,
    pub remote_content_id: Option<RemotePostId>,
    pub status: SyncStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<SyncLogDBResponse> for SyncLogResponse {
    fn from(db: SyncLogDBResponse) -> Self {
        Self {
            id: db.id,
            sync_type: db.sync_type,
            local_content_id: db.local_content_id,
            remote_content_id: db.remote_content_id,
            status: db.status,
            error_message: db.error_message,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListSyncLogsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// Notification sent by a WordPress site
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookPayload {
    pub action: String,
    #[serde(default)]
    pub post_id: Option<RemotePostId>,
    #[serde(default)]
    pub post: Option<serde_json::Value>,
}

impl WebhookPayload {
    /// Acknowledgement for the action. Nothing is processed yet.
    pub fn acknowledgement(&self) -> &'static str {
        match self.action.as_str() {
            "post_updated" | "post_published" => "Webhook received and queued for processing",
            "post_deleted" => "Post deletion webhook received",
            _ => "Webhook received but action not supported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_validation() {
        let create = WordPressSiteCreate {
            name: "Blog".to_string(),
            url: "https://blog.example.com".to_string(),
            api_endpoint: "https://blog.example.com/wp-json/wp/v2/".to_string(),
            username: None,
            application_password: None,
        };
        assert!(create.validate().is_ok());
        assert_eq!(
            WordPressSiteCreateDBRequest::from(create.clone()).api_endpoint,
            "https://blog.example.com/wp-json/wp/v2"
        );

        let ftp = WordPressSiteCreate {
            api_endpoint: "ftp://blog.example.com".to_string(),
            ..create
        };
        assert!(ftp.validate().is_err());
    }

    #[test]
    fn test_webhook_acknowledgements() {
        let payload = |action: &str| WebhookPayload {
            action: action.to_string(),
            post_id: Some(1),
            post: None,
        };
        assert_eq!(payload("post_published").acknowledgement(), "Webhook received and queued for processing");
        assert_eq!(payload("post_deleted").acknowledgement(), "Post deletion webhook received");
        assert_eq!(payload("comment_added").acknowledgement(), "Webhook received but action not supported");
    }
}
