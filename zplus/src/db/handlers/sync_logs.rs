//! Database repository for the append-only content sync log.

use crate::db::{
    errors::Result,
    models::wordpress::{SyncLogCreateDBRequest, SyncLogDBResponse},
};
use crate::types::{SiteId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct SyncLogs<'c> {
    db: &'c mut PgConnection,
}

impl<'c> SyncLogs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(site_id = %abbrev_uuid(&request.site_id), status = ?request.status), err)]
    pub async fn record(&mut self, request: &SyncLogCreateDBRequest) -> Result<SyncLogDBResponse> {
        let entry = sqlx::query_as::<_, SyncLogDBResponse>(
            r#"
            INSERT INTO content_sync_logs (id, site_id, sync_type, local_content_id, remote_content_id, status, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.site_id)
        .bind(request.sync_type)
        .bind(request.local_content_id)
        .bind(request.remote_content_id)
        .bind(request.status)
        .bind(&request.error_message)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(entry)
    }

    /// A site's log, newest first
    #[instrument(skip(self), fields(site_id = %abbrev_uuid(&site_id)), err)]
    pub async fn list(&mut self, site_id: SiteId, skip: i64, limit: i64) -> Result<Vec<SyncLogDBResponse>> {
        let entries = sqlx::query_as::<_, SyncLogDBResponse>(
            "SELECT * FROM content_sync_logs WHERE site_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(site_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(entries)
    }

    #[instrument(skip(self), fields(site_id = %abbrev_uuid(&site_id)), err)]
    pub async fn count(&mut self, site_id: SiteId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_sync_logs WHERE site_id = $1")
            .bind(site_id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(count)
    }
}
