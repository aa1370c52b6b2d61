//! Content synchronization with remote WordPress sites over the WP REST API.
//!
//! Pulls are best effort: every remote post is upserted on its own and its outcome is appended to
//! `content_sync_logs`, so one bad post never aborts the rest of the batch. Pushes create a single
//! remote post and are logged the same way.

use crate::config::{Config, WordPressConfig};
use crate::db::handlers::{BlogPosts, SyncLogs, Users, WordPressSites, repository::Repository};
use crate::db::models::blog::{BlogPostCreateDBRequest, BlogPostDBResponse, BlogPostUpdateDBRequest, PostStatus};
use crate::db::models::wordpress::{SyncLogCreateDBRequest, SyncStatus, SyncType, WordPressSiteDBResponse};
use crate::errors::{Error, Result};
use crate::types::{PostId, RemotePostId, SiteId, UserId, abbrev_uuid};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;
use utoipa::ToSchema;

/// Page size used when pulling posts. WordPress caps `per_page` at 100.
const PULL_PAGE_SIZE: u32 = 100;

/// Where and how to reach one site's REST API
#[derive(Debug, Clone)]
pub struct SiteConnection {
    pub api_endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl From<&WordPressSiteDBResponse> for SiteConnection {
    fn from(site: &WordPressSiteDBResponse) -> Self {
        Self {
            api_endpoint: site.api_endpoint.clone(),
            username: site.username.clone(),
            password: site.application_password.clone(),
        }
    }
}

/// A `{rendered}` field as WordPress returns it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

/// The subset of a remote post we read
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePost {
    pub id: RemotePostId,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub content: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl RemotePost {
    /// Remote `publish` is our `published`; drafts, pending and future posts all land as drafts
    pub fn local_status(&self) -> PostStatus {
        if self.status == "publish" {
            PostStatus::Published
        } else {
            PostStatus::Draft
        }
    }

    /// Remote slug, or a stable stand-in for posts that have none yet
    pub fn local_slug(&self) -> String {
        if self.slug.is_empty() {
            format!("wp-{}", self.id)
        } else {
            self.slug.clone()
        }
    }

    fn local_excerpt(&self) -> Option<String> {
        Some(self.excerpt.rendered.trim())
            .filter(|e| !e.is_empty())
            .map(str::to_string)
    }
}

/// Body of a remote post creation
#[derive(Debug, Clone, Serialize)]
pub struct RemotePostCreate {
    pub title: String,
    pub content: String,
    pub status: &'static str,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl From<&BlogPostDBResponse> for RemotePostCreate {
    fn from(post: &BlogPostDBResponse) -> Self {
        let status = match post.status {
            PostStatus::Published => "publish",
            PostStatus::Private => "private",
            PostStatus::Draft | PostStatus::Archived => "draft",
        };
        Self {
            title: post.title.clone(),
            content: post.content.clone(),
            status,
            slug: post.slug.clone(),
            excerpt: post.excerpt.clone(),
        }
    }
}

/// Outcome counts of a pull
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SyncSummary {
    /// Remote posts seen
    pub total: usize,
    /// Posts created or updated locally
    pub succeeded: usize,
    /// Posts that could not be stored
    pub failed: usize,
}

/// Result of pushing a local post
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PushResult {
    #[schema(value_type = String, format = "uuid")]
    pub local_id: PostId,
    pub remote_id: RemotePostId,
    pub link: Option<String>,
}

/// Shared HTTP client for WordPress calls. Timeouts are applied per request.
#[derive(Debug, Clone)]
pub struct WordPressClient {
    http: Client,
    test_timeout: Duration,
    request_timeout: Duration,
}

impl WordPressClient {
    pub fn new(config: &WordPressConfig) -> anyhow::Result<Self> {
        // reqwest is built without a bundled provider; a second install is a harmless no-op
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        let http = Client::builder()
            .user_agent(concat!("zplus/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            test_timeout: config.test_timeout,
            request_timeout: config.request_timeout,
        })
    }

    fn authorize(request: RequestBuilder, site: &SiteConnection) -> RequestBuilder {
        match (&site.username, &site.password) {
            (Some(user), Some(password)) => request.basic_auth(user, Some(password)),
            _ => request,
        }
    }

    /// Check the endpoint answers a one-post listing with 200
    #[instrument(skip(self, site), fields(endpoint = %site.api_endpoint))]
    pub async fn test_connection(&self, site: &SiteConnection) -> Result<()> {
        let url = posts_url(&site.api_endpoint, Some(1)).map_err(|message| Error::ConnectionError { message })?;
        let response = Self::authorize(self.http.get(url), site)
            .timeout(self.test_timeout)
            .send()
            .await
            .map_err(|e| Error::ConnectionError {
                message: format!("Failed to connect to WordPress site: {e}"),
            })?;

        if response.status() != StatusCode::OK {
            return Err(Error::ConnectionError {
                message: format!("WordPress site returned status {}", response.status().as_u16()),
            });
        }
        Ok(())
    }

    #[instrument(skip(self, site), fields(endpoint = %site.api_endpoint))]
    pub async fn fetch_posts(&self, site: &SiteConnection) -> Result<Vec<RemotePost>> {
        let url = posts_url(&site.api_endpoint, Some(PULL_PAGE_SIZE)).map_err(|message| Error::SyncError { message })?;
        let response = Self::authorize(self.http.get(url), site)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Error::SyncError {
                message: format!("Failed to fetch posts: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("WordPress posts listing failed with {}: {}", status, body);
            return Err(Error::SyncError {
                message: format!("WordPress site returned status {}", status.as_u16()),
            });
        }

        response.json::<Vec<RemotePost>>().await.map_err(|e| Error::SyncError {
            message: format!("Failed to decode posts: {e}"),
        })
    }

    /// Create a post remotely. Anything but 201 Created is a failure.
    #[instrument(skip(self, site, post), fields(endpoint = %site.api_endpoint, slug = %post.slug))]
    pub async fn create_post(&self, site: &SiteConnection, post: &RemotePostCreate) -> Result<RemotePost> {
        let url = posts_url(&site.api_endpoint, None).map_err(|message| Error::SyncError { message })?;
        let response = Self::authorize(self.http.post(url), site)
            .timeout(self.request_timeout)
            .json(post)
            .send()
            .await
            .map_err(|e| Error::SyncError {
                message: format!("Failed to push post: {e}"),
            })?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            debug!("WordPress rejected post: {}", body);
            return Err(Error::SyncError {
                message: format!("WordPress site returned status {}", status.as_u16()),
            });
        }

        response.json::<RemotePost>().await.map_err(|e| Error::SyncError {
            message: format!("Failed to decode created post: {e}"),
        })
    }
}

/// `{endpoint}/posts`, optionally with `per_page`. Joining needs a trailing slash on the base or
/// its last segment is replaced.
fn posts_url(endpoint: &str, per_page: Option<u32>) -> std::result::Result<Url, String> {
    let mut base = Url::parse(endpoint).map_err(|e| format!("Invalid API endpoint {endpoint}: {e}"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut url = base.join("posts").map_err(|e| format!("Invalid API endpoint {endpoint}: {e}"))?;
    if let Some(per_page) = per_page {
        url.query_pairs_mut().append_pair("per_page", &per_page.to_string());
    }
    Ok(url)
}

/// Author for posts created by a pull: the configured account, else the oldest active admin
pub async fn default_author(conn: &mut PgConnection, config: &Config) -> Result<Option<UserId>> {
    let mut users = Users::new(conn);
    if let Some(email) = &config.wordpress.default_author_email {
        if let Some(user) = users.get_user_by_email(email).await? {
            return Ok(Some(user.id));
        }
        warn!("Configured WordPress author {} does not exist, falling back to an admin", email);
    }
    Ok(users.first_admin().await?.map(|u| u.id))
}

/// Create or update the local post matching the remote slug
async fn upsert_post(
    conn: &mut PgConnection,
    remote: &RemotePost,
    author_id: Option<UserId>,
) -> crate::db::errors::Result<(SyncType, BlogPostDBResponse)> {
    let mut posts = BlogPosts::new(conn);
    let slug = remote.local_slug();

    match posts.get_by_slug(&slug).await? {
        Some(existing) => {
            let updated = posts
                .update(
                    existing.id,
                    &BlogPostUpdateDBRequest {
                        title: remote.title.rendered.clone(),
                        slug,
                        content: remote.content.rendered.clone(),
                        excerpt: remote.local_excerpt(),
                        featured_image: existing.featured_image.clone(),
                        status: remote.local_status(),
                        is_featured: existing.is_featured,
                        category_ids: None,
                    },
                )
                .await?;
            Ok((SyncType::PostUpdate, updated))
        }
        None => {
            let created = posts
                .create(&BlogPostCreateDBRequest {
                    title: remote.title.rendered.clone(),
                    slug,
                    content: remote.content.rendered.clone(),
                    excerpt: remote.local_excerpt(),
                    featured_image: None,
                    author_id,
                    status: remote.local_status(),
                    is_featured: false,
                    category_ids: Vec::new(),
                })
                .await?;
            Ok((SyncType::PostCreate, created))
        }
    }
}

/// Pull every post from `site` into the local blog.
///
/// The fetch itself failing is an error; per-post failures are only counted and logged.
/// `last_sync_at` is stamped once the loop finishes, whatever the outcomes.
#[instrument(skip_all, fields(site_id = %abbrev_uuid(&site.id)), err)]
pub async fn pull_posts(
    db: &PgPool,
    client: &WordPressClient,
    site: &WordPressSiteDBResponse,
    author_id: Option<UserId>,
) -> Result<SyncSummary> {
    let remote_posts = client.fetch_posts(&SiteConnection::from(site)).await?;
    let mut conn = db.acquire().await.map_err(crate::db::errors::DbError::from)?;
    let mut summary = SyncSummary {
        total: remote_posts.len(),
        ..Default::default()
    };

    for remote in &remote_posts {
        let entry = match upsert_post(&mut conn, remote, author_id).await {
            Ok((sync_type, local)) => {
                summary.succeeded += 1;
                SyncLogCreateDBRequest {
                    site_id: site.id,
                    sync_type,
                    local_content_id: Some(local.id),
                    remote_content_id: Some(remote.id),
                    status: SyncStatus::Success,
                    error_message: None,
                }
            }
            Err(e) => {
                summary.failed += 1;
                warn!("Failed to store remote post {}: {}", remote.id, e);
                SyncLogCreateDBRequest {
                    site_id: site.id,
                    sync_type: SyncType::PostSync,
                    local_content_id: None,
                    remote_content_id: Some(remote.id),
                    status: SyncStatus::Failed,
                    error_message: Some(e.to_string()),
                }
            }
        };
        if let Err(e) = SyncLogs::new(&mut conn).record(&entry).await {
            warn!("Failed to log sync outcome for remote post {}: {}", remote.id, e);
        }
    }

    WordPressSites::new(&mut conn).touch_last_sync(site.id).await?;
    info!(
        "Pulled {} posts from {}: {} stored, {} failed",
        summary.total, site.name, summary.succeeded, summary.failed
    );
    Ok(summary)
}

/// Publish one local post to `site` as a new remote post
#[instrument(skip(db, client, site), fields(site_id = %abbrev_uuid(&site.id), post_id = %abbrev_uuid(&post_id)), err)]
pub async fn push_post(db: &PgPool, client: &WordPressClient, site: &WordPressSiteDBResponse, post_id: PostId) -> Result<PushResult> {
    let mut conn = db.acquire().await.map_err(crate::db::errors::DbError::from)?;
    let post = BlogPosts::new(&mut conn)
        .get_by_id(post_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Blog post".to_string(),
            id: post_id.to_string(),
        })?;

    let outcome = client
        .create_post(&SiteConnection::from(site), &RemotePostCreate::from(&post))
        .await;

    let entry = SyncLogCreateDBRequest {
        site_id: site.id,
        sync_type: SyncType::PostCreate,
        local_content_id: Some(post.id),
        remote_content_id: outcome.as_ref().ok().map(|remote| remote.id),
        status: if outcome.is_ok() { SyncStatus::Success } else { SyncStatus::Failed },
        error_message: outcome.as_ref().err().map(|e| e.user_message()),
    };
    SyncLogs::new(&mut conn).record(&entry).await?;

    let remote = outcome?;
    Ok(PushResult {
        local_id: post.id,
        remote_id: remote.id,
        link: remote.link,
    })
}

/// Load an active or inactive site, mapping absence to a 404
pub async fn load_site(conn: &mut PgConnection, site_id: SiteId) -> Result<WordPressSiteDBResponse> {
    WordPressSites::new(conn).get_by_id(site_id).await?.ok_or_else(|| Error::NotFound {
        resource: "WordPress site".to_string(),
        id: site_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::wordpress::WordPressSiteCreateDBRequest;
    use crate::test_utils::create_test_admin;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> WordPressClient {
        WordPressClient::new(&WordPressConfig::default()).unwrap()
    }

    fn remote(id: i64, title: &str, slug: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": {"rendered": title},
            "content": {"rendered": format!("<p>{title}</p>")},
            "excerpt": {"rendered": ""},
            "status": status,
            "slug": slug,
        })
    }

    async fn create_site(pool: &PgPool, endpoint: String) -> WordPressSiteDBResponse {
        let mut conn = pool.acquire().await.unwrap();
        WordPressSites::new(&mut conn)
            .create(&WordPressSiteCreateDBRequest {
                name: "Company blog".to_string(),
                url: "https://blog.example.com".to_string(),
                api_endpoint: endpoint,
                username: Some("editor".to_string()),
                application_password: Some("app pass".to_string()),
                is_active: true,
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_posts_url_keeps_base_path() {
        let url = posts_url("https://example.com/wp-json/wp/v2", Some(1)).unwrap();
        assert_eq!(url.as_str(), "https://example.com/wp-json/wp/v2/posts?per_page=1");

        let url = posts_url("https://example.com/wp-json/wp/v2/", None).unwrap();
        assert_eq!(url.as_str(), "https://example.com/wp-json/wp/v2/posts");

        assert!(posts_url("not a url", None).is_err());
    }

    #[test]
    fn test_status_mapping() {
        let post: RemotePost = serde_json::from_value(remote(1, "t", "", "future")).unwrap();
        assert_eq!(post.local_status(), PostStatus::Draft);
        assert_eq!(post.local_slug(), "wp-1");
        assert_eq!(post.local_excerpt(), None);

        let post: RemotePost = serde_json::from_value(remote(2, "t", "hello", "publish")).unwrap();
        assert_eq!(post.local_status(), PostStatus::Published);
        assert_eq!(post.local_slug(), "hello");
    }

    #[tokio::test]
    async fn test_connection_uses_basic_auth() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .and(query_param("per_page", "1"))
            .and(basic_auth("editor", "app pass"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let site = SiteConnection {
            api_endpoint: format!("{}/wp-json/wp/v2", mock_server.uri()),
            username: Some("editor".to_string()),
            password: Some("app pass".to_string()),
        };
        client().test_connection(&site).await.unwrap();

        let wrong = SiteConnection {
            password: Some("nope".to_string()),
            ..site
        };
        let err = client().test_connection(&wrong).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionError { .. }));
    }

    #[tokio::test]
    async fn test_connection_unreachable() {
        let site = SiteConnection {
            api_endpoint: "http://127.0.0.1:9/wp-json/wp/v2".to_string(),
            username: None,
            password: None,
        };
        let err = client().test_connection(&site).await.unwrap_err();
        assert_eq!(err.code(), "CONNECTION_ERROR");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_pull_tolerates_failed_posts(pool: PgPool) {
        let admin = create_test_admin(&pool, "author").await;
        let mock_server = MockServer::start().await;
        let too_long = "x".repeat(300);
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                remote(1, "First", "first", "publish"),
                remote(2, &too_long, "second", "publish"),
                remote(3, "Third", "third", "draft"),
                remote(4, &too_long, "fourth", "publish"),
                remote(5, "Fifth", "fifth", "pending"),
            ])))
            .mount(&mock_server)
            .await;

        let site = create_site(&pool, format!("{}/wp-json/wp/v2", mock_server.uri())).await;
        let summary = pull_posts(&pool, &client(), &site, Some(admin.id)).await.unwrap();
        assert_eq!(
            summary,
            SyncSummary {
                total: 5,
                succeeded: 3,
                failed: 2
            }
        );

        let mut conn = pool.acquire().await.unwrap();
        let logs = SyncLogs::new(&mut conn).list(site.id, 0, 20).await.unwrap();
        assert_eq!(logs.len(), 5);
        assert_eq!(logs.iter().filter(|l| l.status == SyncStatus::Success).count(), 3);
        let failed: Vec<_> = logs.iter().filter(|l| l.status == SyncStatus::Failed).collect();
        assert_eq!(failed.len(), 2);
        assert!(failed.iter().all(|l| l.sync_type == SyncType::PostSync && l.error_message.is_some()));

        let site = WordPressSites::new(&mut conn).get_by_id(site.id).await.unwrap().unwrap();
        assert!(site.last_sync_at.is_some());

        let first = BlogPosts::new(&mut conn).get_by_slug("first").await.unwrap().unwrap();
        assert_eq!(first.status, PostStatus::Published);
        assert_eq!(first.author_id, Some(admin.id));
        let fifth = BlogPosts::new(&mut conn).get_by_slug("fifth").await.unwrap().unwrap();
        assert_eq!(fifth.status, PostStatus::Draft);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_pull_continues_when_logging_fails(pool: PgPool) {
        let admin = create_test_admin(&pool, "author").await;
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                remote(1, "First", "first", "publish"),
                remote(2, "Second", "second", "publish"),
            ])))
            .mount(&mock_server)
            .await;

        let site = create_site(&pool, format!("{}/wp-json/wp/v2", mock_server.uri())).await;
        sqlx::query("DROP TABLE content_sync_logs").execute(&pool).await.unwrap();

        let summary = pull_posts(&pool, &client(), &site, Some(admin.id)).await.unwrap();
        assert_eq!(
            summary,
            SyncSummary {
                total: 2,
                succeeded: 2,
                failed: 0
            }
        );

        let mut conn = pool.acquire().await.unwrap();
        assert!(BlogPosts::new(&mut conn).get_by_slug("second").await.unwrap().is_some());
        let site = WordPressSites::new(&mut conn).get_by_id(site.id).await.unwrap().unwrap();
        assert!(site.last_sync_at.is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_pull_updates_existing_slug(pool: PgPool) {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([remote(9, "Renamed", "kept", "publish")])))
            .mount(&mock_server)
            .await;

        let mut conn = pool.acquire().await.unwrap();
        let existing = BlogPosts::new(&mut conn)
            .create(&BlogPostCreateDBRequest {
                title: "Original".to_string(),
                slug: "kept".to_string(),
                content: "old".to_string(),
                excerpt: None,
                featured_image: Some("/uploads/images/cover.png".to_string()),
                author_id: None,
                status: PostStatus::Draft,
                is_featured: true,
                category_ids: vec![],
            })
            .await
            .unwrap();

        let site = create_site(&pool, format!("{}/v2", mock_server.uri())).await;
        let summary = pull_posts(&pool, &client(), &site, None).await.unwrap();
        assert_eq!(summary.succeeded, 1);

        let post = BlogPosts::new(&mut conn).get_by_slug("kept").await.unwrap().unwrap();
        assert_eq!(post.id, existing.id);
        assert_eq!(post.title, "Renamed");
        assert_eq!(post.status, PostStatus::Published);
        assert!(post.is_featured);
        assert_eq!(post.featured_image.as_deref(), Some("/uploads/images/cover.png"));

        let logs = SyncLogs::new(&mut conn).list(site.id, 0, 10).await.unwrap();
        assert_eq!(logs[0].sync_type, SyncType::PostUpdate);
        assert_eq!(logs[0].local_content_id, Some(existing.id));
        assert_eq!(logs[0].remote_content_id, Some(9));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_pull_fetch_failure_is_sync_error(pool: PgPool) {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let site = create_site(&pool, mock_server.uri()).await;
        let err = pull_posts(&pool, &client(), &site, None).await.unwrap_err();
        assert!(matches!(err, Error::SyncError { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_push_logs_both_outcomes(pool: PgPool) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ok/posts"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 77,
                "slug": "launch",
                "status": "publish",
                "link": "https://blog.example.com/launch"
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/denied/posts"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let mut conn = pool.acquire().await.unwrap();
        let post = BlogPosts::new(&mut conn)
            .create(&BlogPostCreateDBRequest {
                title: "Launch".to_string(),
                slug: "launch".to_string(),
                content: "We are live".to_string(),
                excerpt: Some("Live".to_string()),
                featured_image: None,
                author_id: None,
                status: PostStatus::Published,
                is_featured: false,
                category_ids: vec![],
            })
            .await
            .unwrap();

        let ok_site = create_site(&pool, format!("{}/ok", mock_server.uri())).await;
        let pushed = push_post(&pool, &client(), &ok_site, post.id).await.unwrap();
        assert_eq!(pushed.remote_id, 77);
        assert_eq!(pushed.link.as_deref(), Some("https://blog.example.com/launch"));

        let denied_site = create_site(&pool, format!("{}/denied", mock_server.uri())).await;
        let err = push_post(&pool, &client(), &denied_site, post.id).await.unwrap_err();
        assert_eq!(err.code(), "SYNC_ERROR");

        let ok_logs = SyncLogs::new(&mut conn).list(ok_site.id, 0, 10).await.unwrap();
        assert_eq!(ok_logs[0].status, SyncStatus::Success);
        assert_eq!(ok_logs[0].remote_content_id, Some(77));
        let denied_logs = SyncLogs::new(&mut conn).list(denied_site.id, 0, 10).await.unwrap();
        assert_eq!(denied_logs[0].status, SyncStatus::Failed);
        assert_eq!(denied_logs[0].sync_type, SyncType::PostCreate);

        let requests = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["status"], "publish");
        assert_eq!(body["excerpt"], "Live");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_push_missing_post(pool: PgPool) {
        let site = create_site(&pool, "http://127.0.0.1:9".to_string()).await;
        let err = push_post(&pool, &client(), &site, uuid::Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
