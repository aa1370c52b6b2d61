//! Database repository for issued login sessions.

use crate::db::{errors::Result, models::sessions::SessionDBResponse};
use crate::types::{UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct Sessions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Sessions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Record a token handed out at login or registration
    #[instrument(skip(self, token), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn record(&mut self, user_id: UserId, token: &str, expires_at: DateTime<Utc>) -> Result<SessionDBResponse> {
        let session = sqlx::query_as::<_, SessionDBResponse>(
            "INSERT INTO user_sessions (id, user_id, token, expires_at) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(session)
    }

    /// Drop the caller's session rows for this token. Returns how many were removed.
    #[instrument(skip(self, token), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn revoke(&mut self, user_id: UserId, token: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn count_active(&mut self, user_id: UserId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_sessions WHERE user_id = $1 AND expires_at > NOW()")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(count)
    }
}
