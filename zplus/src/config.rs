//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `ZPLUS_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `ZPLUS_` override YAML values
//! 3. **Deployment variables** - `DATABASE_URL`, `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`,
//!    `DB_NAME`, `REDIS_HOST`, `REDIS_PORT`, `REDIS_PASSWORD`, `PORT` and `ENV` are accepted
//!    unprefixed so existing container setups keep working
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `ZPLUS_DATABASE__POOL__MAX_CONNECTIONS=50` sets `database.pool.max_connections`.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use zplus::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}", config.bind_address());
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port`, `env`
//! - **Database**: `database.url` or the discrete `database.host`/`port`/`user`/`password`/`name`,
//!   plus `database.pool` and connection retry settings
//! - **Admin User**: `admin_email`, `admin_password` - created on first startup
//! - **Security**: `secret_key`, `auth.security` (JWT expiry, CORS)
//! - **Cache**: `cache.url` or `cache.host` - optional Redis read cache
//! - **Uploads**: `uploads.dir`, `uploads.max_file_size`, `uploads.max_files_per_request`
//! - **Wallet**: `wallet.min_deposit`, `wallet.points_unit`
//! - **Payments**: `payments.callback_secret` - HMAC key for deposit callbacks
//! - **WordPress**: request timeouts and the default author for pulled posts

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ZPLUS_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Unprefixed environment variables accepted for container deployments, with the config key each
/// one sets.
const DEPLOYMENT_ENV_VARS: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("DB_HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("DB_USER", "database.user"),
    ("DB_PASSWORD", "database.password"),
    ("DB_NAME", "database.name"),
    ("REDIS_HOST", "cache.host"),
    ("REDIS_PORT", "cache.port"),
    ("REDIS_PASSWORD", "cache.password"),
    ("PORT", "port"),
    ("ENV", "env"),
];

/// Main application configuration.
///
/// All fields have defaults defined in the `Default` implementation, so an empty file plus
/// `secret_key` is a runnable configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Deployment environment name ("development", "production", ...)
    pub env: String,
    /// PostgreSQL connection settings
    pub database: DatabaseConfig,
    /// Email address for the initial admin user (created on first startup)
    pub admin_email: String,
    /// Password for the initial admin user
    pub admin_password: Option<String>,
    /// Secret key for JWT signing (required)
    pub secret_key: Option<String>,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Optional Redis read cache
    pub cache: CacheConfig,
    /// File upload storage and limits
    pub uploads: UploadsConfig,
    /// Wallet and loyalty points rules
    pub wallet: WalletConfig,
    /// Payment gateway callback settings
    pub payments: PaymentsConfig,
    /// WordPress synchronization settings
    pub wordpress: WordPressConfig,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// Connection pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Time before idle connections are closed (seconds, 0 = never)
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a connection (seconds, 0 = never)
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 25,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 300,
        }
    }
}

/// PostgreSQL connection settings.
///
/// `url` wins when set; otherwise the URL is assembled from the discrete fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub name: String,
    /// Passed through as the `sslmode` query parameter
    pub ssl_mode: String,
    pub pool: PoolSettings,
    /// How many times to try connecting at startup before giving up
    pub connect_attempts: u32,
    /// Delay between startup connection attempts
    #[serde(with = "humantime_serde")]
    pub connect_retry_delay: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: None,
            name: "zplus_web".to_string(),
            ssl_mode: "disable".to_string(),
            pool: PoolSettings::default(),
            connect_attempts: 5,
            connect_retry_delay: Duration::from_secs(2),
        }
    }
}

impl DatabaseConfig {
    /// The connection string handed to sqlx
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let credentials = match &self.password {
            Some(password) => format!("{}:{}", self.user, password),
            None => self.user.clone(),
        };
        format!(
            "postgres://{}@{}:{}/{}?sslmode={}",
            credentials, self.host, self.port, self.name, self.ssl_mode
        )
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Allow new users to self-register
    pub allow_registration: bool,
    /// Password validation rules
    pub password: PasswordConfig,
    /// Security settings (JWT, CORS)
    pub security: SecurityConfig,
    /// How long password reset tokens are valid
    #[serde(with = "humantime_serde")]
    pub password_reset_token_duration: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allow_registration: true,
            password: PasswordConfig::default(),
            security: SecurityConfig::default(),
            password_reset_token_duration: Duration::from_secs(60 * 60),
        }
    }
}

/// Password validation rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
    /// Argon2 memory cost in KiB
    pub argon2_memory_kib: u32,
    /// Argon2 iterations
    pub argon2_iterations: u32,
    /// Argon2 parallelism
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 128,
            argon2_memory_kib: 19456, // 19 MB
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

/// Security configuration for JWT and CORS.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// JWT token expiry duration
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_expiry: Duration::from_secs(24 * 60 * 60),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            allow_credentials: false,
            max_age: Some(3600),
        }
    }
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://zplus.vn`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// Redis cache configuration. The cache is disabled unless `url` or `host` is set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Time-to-live for cached reads
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: None,
            port: 6379,
            password: None,
            ttl: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    /// Connection URL for the redis client, `None` when caching is disabled
    pub fn redis_url(&self) -> Option<String> {
        if let Some(url) = &self.url {
            return Some(url.clone());
        }
        let host = self.host.as_ref().filter(|h| !h.is_empty())?;
        Some(match &self.password {
            Some(password) if !password.is_empty() => format!("redis://:{}@{}:{}/", password, host, self.port),
            _ => format!("redis://{}:{}/", host, self.port),
        })
    }
}

/// File upload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Root directory; files land in `images/`, `files/` and `products/` below it
    pub dir: PathBuf,
    /// Maximum size of a single uploaded file in bytes
    pub max_file_size: u64,
    /// Maximum number of files accepted by the multi-file endpoint
    pub max_files_per_request: usize,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./uploads"),
            max_file_size: 10 * 1024 * 1024,
            max_files_per_request: 10,
        }
    }
}

/// Wallet and loyalty points rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalletConfig {
    /// Smallest accepted deposit amount
    pub min_deposit: u64,
    /// Amount spent per loyalty point awarded
    pub points_unit: u64,
    /// How long earned points stay valid
    #[serde(with = "humantime_serde")]
    pub points_validity: Duration,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            min_deposit: 1000,
            points_unit: 1000,
            points_validity: Duration::from_secs(365 * 24 * 60 * 60),
        }
    }
}

/// Payment gateway callback settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaymentsConfig {
    /// When set, deposit callbacks must carry a hex HMAC-SHA256 signature made with this key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_secret: Option<String>,
}

/// WordPress synchronization settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WordPressConfig {
    /// Timeout for connection tests
    #[serde(with = "humantime_serde")]
    pub test_timeout: Duration,
    /// Timeout for pull and push requests
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Author assigned to posts created by a pull. Falls back to the oldest admin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_author_email: Option<String>,
}

impl Default for WordPressConfig {
    fn default() -> Self {
        Self {
            test_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            default_author_email: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            env: "development".to_string(),
            database: DatabaseConfig::default(),
            admin_email: "admin@zplus.vn".to_string(),
            admin_password: None,
            secret_key: None,
            auth: AuthConfig::default(),
            cache: CacheConfig::default(),
            uploads: UploadsConfig::default(),
            wallet: WalletConfig::default(),
            payments: PaymentsConfig::default(),
            wordpress: WordPressConfig::default(),
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.secret_key.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Internal {
                operation: "Config validation: secret_key is not configured. \
                     Please set ZPLUS_SECRET_KEY environment variable or add secret_key to config file."
                    .to_string(),
            });
        }

        let password = &self.auth.password;
        if password.min_length > password.max_length {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: Invalid password configuration: min_length ({}) cannot be greater than max_length ({})",
                    password.min_length, password.max_length
                ),
            });
        }

        if password.min_length < 1 {
            return Err(Error::Internal {
                operation: "Config validation: Invalid password configuration: min_length must be at least 1".to_string(),
            });
        }

        if self.auth.security.jwt_expiry.as_secs() < 300 {
            return Err(Error::Internal {
                operation: "Config validation: JWT expiry duration is too short (minimum 5 minutes)".to_string(),
            });
        }

        if self.auth.security.jwt_expiry.as_secs() > 86400 * 30 {
            return Err(Error::Internal {
                operation: "Config validation: JWT expiry duration is too long (maximum 30 days)".to_string(),
            });
        }

        if self.uploads.max_file_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: uploads.max_file_size cannot be 0".to_string(),
            });
        }

        if self.uploads.max_files_per_request == 0 {
            return Err(Error::Internal {
                operation: "Config validation: uploads.max_files_per_request cannot be 0".to_string(),
            });
        }

        if self.wallet.points_unit == 0 {
            return Err(Error::Internal {
                operation: "Config validation: wallet.points_unit cannot be 0".to_string(),
            });
        }

        if self.auth.security.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        let has_wildcard = self
            .auth
            .security
            .cors
            .allowed_origins
            .iter()
            .any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.auth.security.cors.allow_credentials {
            return Err(Error::Internal {
                operation: "Config validation: CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins."
                    .to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        let names: Vec<&str> = DEPLOYMENT_ENV_VARS.iter().map(|(name, _)| *name).collect();
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Prefixed environment variables override specific values
            .merge(Env::prefixed("ZPLUS_").ignore(&["config"]).split("__"))
            // Unprefixed deployment variables, mapped onto their nested keys
            .merge(Env::raw().only(&names).map(|key| {
                DEPLOYMENT_ENV_VARS
                    .iter()
                    .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
                    .map(|(_, target)| (*target).into())
                    .unwrap_or_else(|| key.as_str().into())
            }))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}
