use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_login(outcome: &'static str) {
    metrics::counter!("student_logins_total", "outcome" => outcome).increment(1);
}

pub(crate) fn record_submission(score: i32, total_points: i32) {
    metrics::counter!("exam_submissions_total").increment(1);
    if total_points > 0 {
        metrics::histogram!("exam_score_ratio").record(f64::from(score) / f64::from(total_points));
    }
}
