use std::sync::OnceLock;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static EXPORTER: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder once. Without it the macros below are
/// no-ops.
pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if settings.telemetry().prometheus_enabled && EXPORTER.get().is_none() {
        let handle = PrometheusBuilder::new().install_recorder()?;
        EXPORTER.get_or_init(|| handle);
    }
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    EXPORTER.get().map(PrometheusHandle::render)
}

pub(crate) fn record_http(status: u16, latency: Duration) {
    let status = status.to_string();
    metrics::counter!("http_requests_total", "status" => status.clone()).increment(1);
    metrics::histogram!("http_request_duration_seconds", "status" => status)
        .record(latency.as_secs_f64());
}

pub(crate) fn record_login(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    metrics::counter!("auth_logins_total", "outcome" => outcome).increment(1);
}

pub(crate) fn record_rate_limited(scope: &'static str) {
    metrics::counter!("rate_limited_total", "scope" => scope).increment(1);
}

pub(crate) fn record_exam_started() {
    metrics::counter!("exam_sessions_started_total").increment(1);
}

pub(crate) fn record_answer_saved() {
    metrics::counter!("exam_answers_saved_total").increment(1);
}

pub(crate) fn record_submission(exam_id: &str, score: f64) {
    metrics::counter!("exam_submissions_total").increment(1);
    metrics::histogram!("exam_submission_score").record(score);
    tracing::debug!(exam_id, score, "submission recorded");
}
