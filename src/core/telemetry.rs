use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let telemetry = settings.telemetry();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&telemetry.log_filter))?;

    let subscriber =
        fmt().with_env_filter(filter).with_target(false).with_span_events(FmtSpan::CLOSE);
    let installed = if telemetry.json_logs {
        subscriber.json().flatten_event(true).try_init()
    } else {
        subscriber.compact().try_init()
    };
    installed.map_err(|err| anyhow::anyhow!("tracing subscriber: {err}"))?;

    tracing::debug!(
        environment = settings.runtime().environment.as_str(),
        json_logs = telemetry.json_logs,
        "logging ready"
    );
    Ok(())
}
