//! Optional Redis read cache.
//!
//! The cache only ever holds disposable copies of database reads. Every failure is logged and
//! treated as a miss, so a Redis outage slows requests down but never fails them.

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, info, warn};

const KEY_PREFIX: &str = "zplus";

/// Key of the cached public blog category list
pub const BLOG_CATEGORIES_KEY: &str = "blog:categories";

#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
    ttl: Duration,
}

impl Cache {
    pub async fn connect(url: &str, ttl: Duration) -> anyhow::Result<Self> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Connected to Redis cache");
        Ok(Self { conn, ttl })
    }

    fn key(name: &str) -> String {
        format!("{KEY_PREFIX}:{name}")
    }

    pub async fn get_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = match conn.get(Self::key(name)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cache read for {} failed: {}", name, e);
                return None;
            }
        };

        match serde_json::from_str(&raw?) {
            Ok(value) => {
                debug!("Cache hit for {}", name);
                Some(value)
            }
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", name, e);
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, name: &str, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode cache entry {}: {}", name, e);
                return;
            }
        };
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<()> = conn.set_ex(Self::key(name), payload, self.ttl.as_secs().max(1)).await;
        if let Err(e) = result {
            warn!("Cache write for {} failed: {}", name, e);
        }
    }

    pub async fn invalidate(&self, name: &str) {
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<()> = conn.del(Self::key(name)).await;
        if let Err(e) = result {
            warn!("Cache invalidation for {} failed: {}", name, e);
        }
    }

    /// Whether Redis answers a PING
    pub async fn ping(&self) -> bool {
        let mut conn = self.conn.clone();
        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced() {
        assert_eq!(Cache::key(BLOG_CATEGORIES_KEY), "zplus:blog:categories");
    }
}
