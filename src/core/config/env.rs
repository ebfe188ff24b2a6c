use std::env;
use std::str::FromStr;

use time::Duration;

use super::types::ConfigError;

const FALLBACK_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:3000"];

/// Trimmed value of `key`; blank counts as unset.
pub(super) fn var(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(super) fn text(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| default.to_string())
}

pub(super) fn flag(key: &str) -> bool {
    var(key).is_some_and(|value| {
        matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
    })
}

pub(super) fn number<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match var(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

pub(super) fn minutes(key: &'static str, default: i64) -> Result<Duration, ConfigError> {
    let value = number(key, default)?;
    if value <= 0 {
        return Err(ConfigError::NonPositiveMinutes { key });
    }
    Ok(Duration::minutes(value))
}

/// Accepts either a JSON array or a comma separated list.
pub(super) fn origins(raw: Option<String>) -> Result<Vec<String>, ConfigError> {
    let parsed = match raw {
        Some(raw) if raw.starts_with('[') => serde_json::from_str::<Vec<String>>(&raw)
            .map_err(|_| ConfigError::Invalid { key: "BACKEND_CORS_ORIGINS", value: raw })?,
        Some(raw) => {
            raw.split(',').map(str::trim).filter(|o| !o.is_empty()).map(String::from).collect()
        }
        None => Vec::new(),
    };

    if parsed.is_empty() {
        return Ok(FALLBACK_ORIGINS.iter().map(|origin| origin.to_string()).collect());
    }
    Ok(parsed)
}

pub(super) fn postgres_url() -> String {
    format!(
        "postgresql://{}:{}@{}:{}/{}",
        text("POSTGRES_USER", "exam_portal"),
        text("POSTGRES_PASSWORD", ""),
        text("POSTGRES_SERVER", "localhost"),
        text("POSTGRES_PORT", "5432"),
        text("POSTGRES_DB", "exam_portal"),
    )
}

pub(super) fn redis_url() -> Result<String, ConfigError> {
    let host = text("REDIS_HOST", "localhost");
    let port: u16 = number("REDIS_PORT", 6379)?;
    let db: u16 = number("REDIS_DB", 0)?;

    Ok(match var("REDIS_PASSWORD") {
        Some(password) => format!("redis://:{password}@{host}:{port}/{db}"),
        None => format!("redis://{host}:{port}/{db}"),
    })
}
