//! Database repository for password reset tokens.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{errors::Result, models::password_reset_tokens::PasswordResetToken},
    types::{UserId, abbrev_uuid},
};

pub struct PasswordResets<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PasswordResets<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Store a new token digest, invalidating any earlier unused tokens for the user
    #[instrument(skip(self, token_hash), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn create(&mut self, user_id: UserId, token_hash: &str, expires_at: DateTime<Utc>) -> Result<PasswordResetToken> {
        self.invalidate_for_user(user_id).await?;

        let token = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(token)
    }

    /// Atomically consume a token: returns it only if it was unused and unexpired
    #[instrument(skip(self, token_hash), err)]
    pub async fn consume(&mut self, token_hash: &str) -> Result<Option<PasswordResetToken>> {
        let token = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            UPDATE password_reset_tokens
            SET used_at = NOW()
            WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW()
            RETURNING *
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(token)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn invalidate_for_user(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("UPDATE password_reset_tokens SET used_at = NOW() WHERE user_id = $1 AND used_at IS NULL")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_user;
    use chrono::Duration;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_token_is_single_use(pool: PgPool) {
        let user = create_test_user(&pool, "resetter").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = PasswordResets::new(&mut conn);

        repo.create(user.id, "digest-1", Utc::now() + Duration::hours(1)).await.unwrap();

        let consumed = repo.consume("digest-1").await.unwrap().unwrap();
        assert_eq!(consumed.user_id, user.id);
        assert!(consumed.used_at.is_some());
        assert!(repo.consume("digest-1").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_expired_and_superseded_tokens_rejected(pool: PgPool) {
        let user = create_test_user(&pool, "resetter2").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = PasswordResets::new(&mut conn);

        repo.create(user.id, "expired", Utc::now() - Duration::minutes(1)).await.unwrap();
        assert!(repo.consume("expired").await.unwrap().is_none());

        repo.create(user.id, "first", Utc::now() + Duration::hours(1)).await.unwrap();
        repo.create(user.id, "second", Utc::now() + Duration::hours(1)).await.unwrap();
        assert!(repo.consume("first").await.unwrap().is_none());
        assert!(repo.consume("second").await.unwrap().is_some());
    }
}
