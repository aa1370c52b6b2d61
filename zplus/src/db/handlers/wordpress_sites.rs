//! Database repository for configured WordPress sites.

use crate::db::{
    errors::{DbError, Result},
    models::wordpress::{WordPressSiteCreateDBRequest, WordPressSiteDBResponse},
};
use crate::types::{SiteId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct WordPressSites<'c> {
    db: &'c mut PgConnection,
}

impl<'c> WordPressSites<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    pub async fn create(&mut self, request: &WordPressSiteCreateDBRequest) -> Result<WordPressSiteDBResponse> {
        let site = sqlx::query_as::<_, WordPressSiteDBResponse>(
            r#"
            INSERT INTO wordpress_sites (id, name, url, api_endpoint, username, application_password, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.url)
        .bind(&request.api_endpoint)
        .bind(&request.username)
        .bind(&request.application_password)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(site)
    }

    #[instrument(skip(self), fields(site_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: SiteId) -> Result<Option<WordPressSiteDBResponse>> {
        let site = sqlx::query_as::<_, WordPressSiteDBResponse>("SELECT * FROM wordpress_sites WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(site)
    }

    /// Active sites, by name
    #[instrument(skip(self), err)]
    pub async fn list_active(&mut self) -> Result<Vec<WordPressSiteDBResponse>> {
        let sites = sqlx::query_as::<_, WordPressSiteDBResponse>("SELECT * FROM wordpress_sites WHERE is_active ORDER BY name")
            .fetch_all(&mut *self.db)
            .await?;
        Ok(sites)
    }

    #[instrument(skip(self), fields(site_id = %abbrev_uuid(&id)), err)]
    pub async fn touch_last_sync(&mut self, id: SiteId) -> Result<WordPressSiteDBResponse> {
        sqlx::query_as::<_, WordPressSiteDBResponse>(
            "UPDATE wordpress_sites SET last_sync_at = NOW(), updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn site(name: &str, is_active: bool) -> WordPressSiteCreateDBRequest {
        WordPressSiteCreateDBRequest {
            name: name.to_string(),
            url: format!("https://{name}.example.com"),
            api_endpoint: format!("https://{name}.example.com/wp-json/wp/v2"),
            username: Some("editor".to_string()),
            application_password: Some("abcd efgh".to_string()),
            is_active,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_active_sites_by_name(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = WordPressSites::new(&mut conn);

        repo.create(&site("zeta", true)).await.unwrap();
        repo.create(&site("alpha", true)).await.unwrap();
        repo.create(&site("retired", false)).await.unwrap();

        let names: Vec<_> = repo.list_active().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_touch_last_sync(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = WordPressSites::new(&mut conn);

        let created = repo.create(&site("blog", true)).await.unwrap();
        assert!(created.last_sync_at.is_none());
        assert_eq!(created.credentials(), Some(("editor", "abcd efgh")));

        let touched = repo.touch_last_sync(created.id).await.unwrap();
        assert!(touched.last_sync_at.is_some());
        assert!(matches!(repo.touch_last_sync(Uuid::new_v4()).await, Err(DbError::NotFound)));
    }
}
