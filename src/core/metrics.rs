use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::TelemetrySettings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) const EXAMS_COMPOSED: &str = "exams_composed_total";
pub(crate) const EXAM_COMPOSITION_FAILURES: &str = "exam_composition_failures_total";
pub(crate) const COMPOSED_QUESTIONS: &str = "exam_composed_questions";

pub(crate) fn init(telemetry: &TelemetrySettings) -> anyhow::Result<()> {
    if !telemetry.prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
