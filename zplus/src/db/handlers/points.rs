//! Database repository for loyalty points.

use crate::db::{
    errors::Result,
    models::points::{PointTransactionDBResponse, PointTransactionType, PointsDBResponse},
};
use crate::types::{UserId, abbrev_uuid};
use chrono::{Duration, Utc};
use sqlx::{Connection, PgConnection};
use tracing::instrument;
use uuid::Uuid;

pub struct Points<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Points<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_or_create(&mut self, user_id: UserId) -> Result<PointsDBResponse> {
        Self::ensure_account(&mut *self.db, user_id).await
    }

    async fn ensure_account(conn: &mut PgConnection, user_id: UserId) -> Result<PointsDBResponse> {
        sqlx::query(
            "INSERT INTO customer_points (id, user_id) VALUES ($1, $2) ON CONFLICT ON CONSTRAINT customer_points_user_unique DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        let account = sqlx::query_as::<_, PointsDBResponse>("SELECT * FROM customer_points WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(account)
    }

    /// Credit earned points. The ledger row expires `validity` after now.
    #[instrument(skip(self, reason), fields(user_id = %abbrev_uuid(&user_id), points), err)]
    pub async fn award(
        &mut self,
        user_id: UserId,
        points: i64,
        reason: &str,
        reference_id: Option<&str>,
        validity: std::time::Duration,
    ) -> Result<PointTransactionDBResponse> {
        let mut tx = self.db.begin().await?;
        Self::ensure_account(&mut tx, user_id).await?;

        sqlx::query(
            r#"
            UPDATE customer_points
            SET total_points = total_points + $2, available_points = available_points + $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(points)
        .execute(&mut *tx)
        .await?;

        let expires_at = Utc::now() + Duration::from_std(validity).unwrap_or_else(|_| Duration::days(365));
        let transaction = sqlx::query_as::<_, PointTransactionDBResponse>(
            r#"
            INSERT INTO point_transactions (id, user_id, points, transaction_type, reason, reference_id, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(points)
        .bind(PointTransactionType::Earned)
        .bind(reason)
        .bind(reference_id)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(transaction)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_transactions(&mut self, user_id: UserId, skip: i64, limit: i64) -> Result<Vec<PointTransactionDBResponse>> {
        let transactions = sqlx::query_as::<_, PointTransactionDBResponse>(
            "SELECT * FROM point_transactions WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(transactions)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn count_transactions(&mut self, user_id: UserId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM point_transactions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(count)
    }
}
