//! Shared helpers for the crate's unit and HTTP tests.

use crate::{
    api::models::users::{CurrentUser, Role},
    auth::{
        password::{self, Argon2Params},
        session,
    },
    config::{Config, PasswordConfig, UploadsConfig},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
};
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

/// Password given to every user created by [`create_test_user`] and [`create_test_admin`]
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Build an app on `pool` with [`create_test_config`]; the config is returned for minting tokens.
pub async fn create_test_app(pool: PgPool) -> (TestServer, Config) {
    let config = create_test_config();
    let server = create_test_app_with_config(pool, config.clone()).await;
    (server, config)
}

pub async fn create_test_app_with_config(pool: PgPool, config: Config) -> TestServer {
    crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application")
        .into_test_server()
}

pub fn create_test_config() -> Config {
    // Each config gets its own upload root so parallel tests never see each other's files
    let upload_dir = std::env::temp_dir().join(format!("zplus-test-uploads-{}", Uuid::new_v4()));

    let mut config = Config {
        secret_key: Some("test-secret-key-for-jwt-signing".to_string()),
        admin_password: None,
        uploads: UploadsConfig {
            dir: upload_dir,
            max_file_size: 1024 * 1024,
            max_files_per_request: 3,
        },
        ..Default::default()
    };
    config.env = "development".to_string();
    config.cache.url = None;
    config.cache.host = None;
    config.auth.password = PasswordConfig {
        argon2_memory_kib: 128,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..Default::default()
    };
    config
}

async fn insert_user(pool: &PgPool, name: &str, role: Role) -> UserDBResponse {
    let params = Argon2Params::from(&create_test_config().auth.password);
    let password_hash = password::hash_password(TEST_PASSWORD, params).expect("Failed to hash password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash,
            role,
            full_name: Some(format!("Test {name}")),
            phone: None,
        })
        .await
        .expect("Failed to create test user")
}

/// Create an active user named `name` with email `{name}@example.com`
pub async fn create_test_user(pool: &PgPool, name: &str) -> UserDBResponse {
    insert_user(pool, name, Role::User).await
}

pub async fn create_test_admin(pool: &PgPool, name: &str) -> UserDBResponse {
    insert_user(pool, name, Role::Admin).await
}

/// Mint a session token for `user` signed with `config`'s secret
pub fn token_for(user: &UserDBResponse, config: &Config) -> String {
    session::create_session_token(&CurrentUser::from(user), config)
        .expect("Failed to create session token")
        .token
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
