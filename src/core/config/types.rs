use jsonwebtoken::Algorithm;
use thiserror::Error;
use time::Duration;

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(super) listen: ListenSettings,
    pub(super) runtime: RuntimeSettings,
    pub(super) api: ApiSettings,
    pub(super) auth: AuthSettings,
    pub(super) cors_origins: Vec<String>,
    pub(super) database: DatabaseSettings,
    pub(super) redis: RedisSettings,
    pub(super) admin: BootstrapAdmin,
    pub(super) telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub(crate) struct ListenSettings {
    pub(crate) host: String,
    pub(crate) port: u16,
}

impl ListenSettings {
    pub(crate) fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ApiSettings {
    pub(crate) project_name: String,
    pub(crate) prefix: String,
    /// Origin used when building links sent out of band (password reset).
    pub(crate) public_base_url: String,
}

#[derive(Debug, Clone)]
pub(crate) struct AuthSettings {
    pub(crate) secret_key: String,
    pub(crate) algorithm: Algorithm,
    pub(crate) access_token_ttl: Duration,
    pub(crate) reset_token_ttl: Duration,
}

/// Connection target for Postgres. `url` is already resolved from either
/// `DATABASE_URL` or the individual `POSTGRES_*` parts.
#[derive(Debug, Clone)]
pub(crate) struct DatabaseSettings {
    pub(crate) url: String,
    pub(crate) explicit_url: bool,
    pub(crate) has_password: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RedisSettings {
    pub(crate) url: String,
}

/// Account ensured on startup so a fresh deployment has someone who can
/// approve teachers.
#[derive(Debug, Clone)]
pub(crate) struct BootstrapAdmin {
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) fullname: String,
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_filter: String,
    pub(crate) json_logs: bool,
    pub(crate) prometheus_enabled: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RuntimeSettings {
    pub(crate) environment: Environment,
    pub(crate) strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }

    pub(super) fn from_name(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("production" | "prod") => Self::Production,
            Some("test" | "testing") => Self::Test,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("{key} must be a positive number of minutes")]
    NonPositiveMinutes { key: &'static str },
    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("{0} must be set when strict configuration is enabled")]
    MissingSecret(&'static str),
}
