use std::sync::Arc;

use sqlx::PgPool;
use time::OffsetDateTime;

use crate::core::time::{Clock, SystemClock};
use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::notifier::{LogNotifier, ResetNotifier};

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn ResetNotifier>,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool, redis: RedisHandle) -> Self {
        Self::with_parts(settings, db, redis, Arc::new(SystemClock), Arc::new(LogNotifier))
    }

    pub(crate) fn with_parts(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, redis, clock, notifier }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    pub(crate) fn now(&self) -> OffsetDateTime {
        self.inner.clock.now()
    }

    pub(crate) fn notifier(&self) -> &dyn ResetNotifier {
        self.inner.notifier.as_ref()
    }
}
