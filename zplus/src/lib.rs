//! # zplus: web backend for the ZPlus site
//!
//! `zplus` serves the ZPlus company website and its admin console: user accounts, a blog, a
//! project portfolio, a software catalog with orders, a wallet ledger with loyalty points, file
//! uploads, and two-way content sync with WordPress sites.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for all persistence. Redis is an optional read cache; when it is missing or
//! down, reads go straight to the database.
//!
//! ### Request Flow
//!
//! REST requests under `/api/v1/*` pass through CORS and tracing layers and reach a handler in
//! [`api::handlers`]. Handlers that need a caller take the [`auth::current_user`] extractors,
//! which verify the `Authorization: Bearer <jwt>` header; admin routes additionally require the
//! `admin` role. Handlers work through the repositories in [`db::handlers`], which wrap a pooled
//! connection or an open transaction, and answer with the `{success, message, data?, error?}`
//! envelope. Errors are typed ([`errors::Error`]) and rendered into the same envelope.
//!
//! Money moves only through [`db::handlers::Wallets`]: every balance change is a ledger row
//! written in the same transaction as the balance update, so balances always equal the sum of
//! completed entries.
//!
//! ### Core Components
//!
//! - [`api`]: handlers and request/response models
//! - [`auth`]: password hashing, JWT sessions and extractors
//! - [`db`]: repositories and database rows
//! - [`sync`]: the WordPress REST client and pull/push logic
//! - [`payments`]: deposit callback signatures
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use zplus::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = zplus::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     zplus::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations run automatically on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! zplus::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod payments;
pub mod storage;
pub mod sync;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::handlers,
    api::models::users::Role,
    auth::password::{self, Argon2Params},
    cache::Cache,
    config::CorsOrigin,
    db::handlers::{Repository, Users},
    db::models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    openapi::ApiDoc,
    sync::wordpress::WordPressClient,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue},
    routing::{get, post, put},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{OrderId, PostId, ProductId, SiteId, UserId};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file and environment
/// - `cache`: Redis read cache, `None` when not configured or unreachable at startup
/// - `wordpress`: Shared HTTP client for WordPress sites
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .wordpress(client)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub cache: Option<Cache>,
    pub wordpress: WordPressClient,
}

/// Get the zplus database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user, or reset its password and role if the account exists.
///
/// The username is the local part of `email`. Runs at startup when `admin_password` is set.
#[instrument(skip_all, fields(email = %email))]
pub async fn create_initial_admin_user(email: &str, password: &str, params: Argon2Params, db: &PgPool) -> anyhow::Result<UserId> {
    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password, params)).await??;

    let mut tx = db.begin().await?;
    let mut users = Users::new(&mut tx);

    if let Some(existing) = users.get_user_by_email(email).await? {
        users
            .update(
                existing.id,
                &UserUpdateDBRequest {
                    password_hash: Some(password_hash),
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .await?;
        if existing.role != Role::Admin {
            users.update_role(existing.id, &Role::Admin).await?;
        }
        tx.commit().await?;
        debug!("Initial admin user already exists, password refreshed");
        return Ok(existing.id);
    }

    let username = email.split('@').next().filter(|name| !name.is_empty()).unwrap_or("admin");
    let created = users
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role: Role::Admin,
            full_name: Some("Administrator".to_string()),
            phone: None,
        })
        .await?;

    tx.commit().await?;
    info!("Created initial admin user {}", created.id);
    Ok(created.id)
}

/// Connect to PostgreSQL, retrying while the server comes up
async fn connect_with_retry(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.database.pool;
    let mut options = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));
    if settings.idle_timeout_secs > 0 {
        options = options.idle_timeout(Duration::from_secs(settings.idle_timeout_secs));
    }
    if settings.max_lifetime_secs > 0 {
        options = options.max_lifetime(Duration::from_secs(settings.max_lifetime_secs));
    }

    let url = config.database.connection_url();
    let attempts = config.database.connect_attempts.max(1);
    let mut attempt = 1;
    loop {
        match options.clone().connect(&url).await {
            Ok(pool) => {
                info!("Connected to database");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                warn!(
                    "Database connection attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt, attempts, e, config.database.connect_retry_delay
                );
                attempt += 1;
                tokio::time::sleep(config.database.connect_retry_delay).await;
            }
            Err(e) => return Err(anyhow::anyhow!("Failed to connect to database after {attempts} attempts: {e}")),
        }
    }
}

/// Run migrations and bootstrap the admin account
async fn setup_database(config: &Config, pool: &PgPool) -> anyhow::Result<()> {
    migrator().run(pool).await?;

    if let Some(password) = config.admin_password.as_deref() {
        create_initial_admin_user(&config.admin_email, password, Argon2Params::from(&config.auth.password), pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;
    }
    Ok(())
}

/// Connect the cache when configured. A cache that cannot be reached is skipped.
async fn setup_cache(config: &Config) -> Option<Cache> {
    let url = config.cache.redis_url()?;
    match Cache::connect(&url, config.cache.ttl).await {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!("Redis cache unavailable, continuing without it: {}", e);
            None
        }
    }
}

/// Create CORS layer from configuration.
///
/// A wildcard entry allows any origin and never sends credentials; browsers refuse the
/// combination anyway.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;
    let wildcard = cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard));

    let mut cors = CorsLayer::new()
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers(vec![http::header::LOCATION]);

    if wildcard {
        cors = cors.allow_origin(AllowOrigin::any());
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        cors = cors
            .allow_origin(origins)
            .allow_credentials(cors_config.allow_credentials);
    }

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// - `/api/v1/*`: the REST API, public, user and admin routes
/// - `/health`, `/graphql`, `/uploads/{category}/{file_name}`
/// - `/docs` (Scalar) and `/api-docs/openapi.json`
/// - CORS and tracing layers around everything
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Multipart bodies carry up to `max_files_per_request` files plus form overhead
    let uploads = &state.config.uploads;
    let upload_limit = (uploads.max_file_size as usize)
        .saturating_mul(uploads.max_files_per_request)
        .saturating_add(64 * 1024);

    let upload_routes = Router::new()
        .route("/upload/image", post(handlers::uploads::upload_image))
        .route("/upload/file", post(handlers::uploads::upload_file))
        .route("/upload/multiple", post(handlers::uploads::upload_multiple))
        .layer(DefaultBodyLimit::max(upload_limit));

    let admin_routes = Router::new()
        .route("/auth/login", post(handlers::admin::admin_login))
        .route("/dashboard/stats", get(handlers::admin::dashboard_stats))
        .route("/dashboard/activity", get(handlers::admin::recent_activity))
        // Users
        .route("/users", get(handlers::admin::list_users).post(handlers::admin::create_user))
        .route(
            "/users/{id}",
            get(handlers::admin::get_user)
                .put(handlers::admin::update_user)
                .delete(handlers::admin::delete_user),
        )
        .route("/users/{id}/role", put(handlers::admin::update_user_role))
        // Blog
        .route(
            "/blog/posts",
            get(handlers::blog::admin_list_posts).post(handlers::blog::create_post),
        )
        .route(
            "/blog/posts/{id}",
            get(handlers::blog::admin_get_post)
                .put(handlers::blog::update_post)
                .delete(handlers::blog::delete_post),
        )
        .route("/blog/categories", post(handlers::blog::create_category))
        // Projects
        .route(
            "/projects",
            get(handlers::projects::admin_list_projects).post(handlers::projects::create_project),
        )
        .route(
            "/projects/{id}",
            put(handlers::projects::update_project).delete(handlers::projects::delete_project),
        )
        // Products
        .route(
            "/products",
            get(handlers::products::admin_list_products).post(handlers::products::create_product),
        )
        .route("/products/categories", post(handlers::products::create_category))
        .route(
            "/products/{id}",
            put(handlers::products::update_product).delete(handlers::products::delete_product),
        )
        // Orders
        .route("/orders", get(handlers::orders::admin_list_orders))
        .route("/orders/{id}/status", put(handlers::orders::update_order_status))
        // WordPress
        .route(
            "/wordpress/sites",
            get(handlers::wordpress::list_sites).post(handlers::wordpress::create_site),
        )
        .route("/wordpress/sites/{id}/test", post(handlers::wordpress::test_site))
        .route("/wordpress/sites/{id}/sync", post(handlers::wordpress::sync_site))
        .route("/wordpress/sites/{id}/push/{post_id}", post(handlers::wordpress::push_to_site))
        .route("/wordpress/sites/{id}/logs", get(handlers::wordpress::list_sync_logs));

    let api_routes = Router::new()
        // Authentication
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/profile", put(handlers::auth::update_profile))
        .route("/auth/change-password", post(handlers::auth::change_password))
        .route("/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        // Published content
        .route("/blog/posts", get(handlers::blog::list_posts))
        .route("/blog/posts/{slug}", get(handlers::blog::get_post))
        .route("/blog/categories", get(handlers::blog::list_categories))
        .route("/projects", get(handlers::projects::list_projects))
        .route("/projects/{slug}", get(handlers::projects::get_project))
        .route("/products", get(handlers::products::list_products))
        .route("/products/categories", get(handlers::products::list_categories))
        .route("/products/{slug}", get(handlers::products::get_product))
        // Wallet and points
        .route("/wallet", get(handlers::wallet::get_wallet))
        .route("/wallet/transactions", get(handlers::wallet::list_transactions))
        .route("/wallet/deposit", post(handlers::wallet::create_deposit))
        .route("/wallet/deposit/callback", post(handlers::wallet::deposit_callback))
        .route("/points", get(handlers::wallet::get_points))
        // Orders
        .route("/orders", get(handlers::orders::list_my_orders).post(handlers::orders::create_order))
        .route("/orders/{id}", get(handlers::orders::get_order))
        .route("/orders/{id}/pay", post(handlers::orders::pay_order))
        // Webhook from WordPress sites (external, no auth)
        .route("/wordpress/webhook", post(handlers::wordpress::webhook))
        .merge(upload_routes)
        .nest("/admin", admin_routes);

    let router = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/graphql", post(handlers::graphql::graphql))
        .route("/uploads/{category}/{file_name}", get(handlers::uploads::serve_upload))
        .route("/api-docs/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .nest("/api/v1", api_routes)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let router = router.layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_request(DefaultOnRequest::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(create_cors_layer(&state.config)?),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database (with retries), runs migrations,
///    bootstraps the admin account and connects the optional cache
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal resolves, in-flight requests finish and the pool
///    is closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application on an existing pool, or connect one from config when `None`
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting zplus ({}) on {}", config.env, config.bind_address());

        let pool = match pool {
            Some(pool) => pool,
            None => connect_with_retry(&config).await?,
        };
        setup_database(&config, &pool).await?;

        tokio::fs::create_dir_all(&config.uploads.dir).await?;

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .maybe_cache(setup_cache(&config).await)
            .wordpress(WordPressClient::new(&config.wordpress)?)
            .build();

        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "zplus listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
