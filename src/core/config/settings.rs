use jsonwebtoken::Algorithm;

use super::env;
use super::secret;
use super::types::{
    ApiSettings, AuthSettings, BootstrapAdmin, ConfigError, DatabaseSettings, Environment,
    ListenSettings, RedisSettings, RuntimeSettings, Settings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let environment = Environment::from_name(
            env::var("EXAM_PORTAL_ENV").or_else(|| env::var("ENVIRONMENT")).as_deref(),
        );
        let strict =
            environment == Environment::Production || env::flag("EXAM_PORTAL_STRICT_CONFIG");
        let runtime = RuntimeSettings { environment, strict };

        let settings = Self {
            listen: ListenSettings {
                host: env::text("EXAM_PORTAL_HOST", "0.0.0.0"),
                port: env::number("EXAM_PORTAL_PORT", 8000)?,
            },
            runtime,
            api: load_api()?,
            auth: load_auth()?,
            cors_origins: env::origins(env::var("BACKEND_CORS_ORIGINS"))?,
            database: load_database(),
            redis: RedisSettings { url: env::redis_url()? },
            admin: BootstrapAdmin {
                email: env::text("FIRST_ADMIN_EMAIL", "admin@example.com").to_lowercase(),
                password: env::text("FIRST_ADMIN_PASSWORD", ""),
                fullname: env::text("FIRST_ADMIN_NAME", "Administrator"),
            },
            telemetry: TelemetrySettings {
                log_filter: env::text("EXAM_PORTAL_LOG_LEVEL", "info"),
                json_logs: env::flag("EXAM_PORTAL_LOG_JSON"),
                prometheus_enabled: env::flag("PROMETHEUS_ENABLED"),
            },
        };

        if settings.runtime.strict {
            settings.require_secrets()?;
        }
        Ok(settings)
    }

    pub(crate) fn listen(&self) -> &ListenSettings {
        &self.listen
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn auth(&self) -> &AuthSettings {
        &self.auth
    }

    pub(crate) fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn admin(&self) -> &BootstrapAdmin {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn require_secrets(&self) -> Result<(), ConfigError> {
        if !self.database.explicit_url && !self.database.has_password {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.admin.password.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_ADMIN_PASSWORD"));
        }
        Ok(())
    }
}

fn load_api() -> Result<ApiSettings, ConfigError> {
    let prefix = env::text("API_V1_STR", "/api/v1");
    if !prefix.starts_with('/') {
        return Err(ConfigError::Invalid { key: "API_V1_STR", value: prefix });
    }

    Ok(ApiSettings {
        project_name: env::text("PROJECT_NAME", "Exam Portal API"),
        prefix,
        public_base_url: env::text("PUBLIC_BASE_URL", "http://localhost:8000")
            .trim_end_matches('/')
            .to_string(),
    })
}

fn load_auth() -> Result<AuthSettings, ConfigError> {
    let algorithm = match env::text("ALGORITHM", "HS256").as_str() {
        "HS256" => Algorithm::HS256,
        "HS384" => Algorithm::HS384,
        "HS512" => Algorithm::HS512,
        other => return Err(ConfigError::UnsupportedAlgorithm(other.to_string())),
    };

    Ok(AuthSettings {
        secret_key: env::var("SECRET_KEY").unwrap_or_else(secret::persisted_key),
        algorithm,
        access_token_ttl: env::minutes("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
        reset_token_ttl: env::minutes("PASSWORD_RESET_EXPIRE_MINUTES", 60)?,
    })
}

fn load_database() -> DatabaseSettings {
    let has_password = env::var("POSTGRES_PASSWORD").is_some();
    match env::var("DATABASE_URL") {
        Some(url) => DatabaseSettings { url, explicit_url: true, has_password },
        None => DatabaseSettings { url: env::postgres_url(), explicit_url: false, has_password },
    }
}
