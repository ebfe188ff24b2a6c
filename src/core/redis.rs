use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError, Script};
use tokio::sync::RwLock;

use crate::core::metrics;

const WINDOW_SCRIPT: &str = r#"
    local current = redis.call("INCR", KEYS[1])
    if current == 1 then
        redis.call("EXPIRE", KEYS[1], ARGV[1])
    end
    return current
"#;

/// Fixed-window limit applied per subject (usually a normalised email).
#[derive(Debug, Clone, Copy)]
pub(crate) struct RateLimit {
    pub(crate) scope: &'static str,
    pub(crate) max_attempts: u64,
    pub(crate) window_seconds: u64,
}

impl RateLimit {
    pub(crate) fn key_for(&self, subject: &str) -> String {
        format!("rl:{}:{}", self.scope, subject.trim().to_lowercase())
    }
}

#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let manager = ConnectionManager::new(Client::open(self.url.as_str())?).await?;
        self.manager.write().await.replace(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        if self.manager.write().await.take().is_some() {
            tracing::info!("redis disconnected");
        }
    }

    async fn connection(&self) -> Option<ConnectionManager> {
        self.manager.read().await.clone()
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let Some(mut conn) = self.connection().await else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    /// Counts one attempt for `subject` and reports whether it is still
    /// within `limit`. Without a connection every attempt is allowed.
    pub(crate) async fn allow(&self, limit: RateLimit, subject: &str) -> Result<bool, RedisError> {
        let Some(mut conn) = self.connection().await else {
            return Ok(true);
        };

        let attempts: u64 = Script::new(WINDOW_SCRIPT)
            .key(limit.key_for(subject))
            .arg(limit.window_seconds)
            .invoke_async(&mut conn)
            .await?;

        let allowed = attempts <= limit.max_attempts;
        if !allowed {
            metrics::record_rate_limited(limit.scope);
        }
        Ok(allowed)
    }
}
