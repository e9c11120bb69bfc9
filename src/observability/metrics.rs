//! Metric names and per-stage recording helpers.
//!
//! Recording goes through the `metrics` facade, so library code works with no
//! recorder installed. The binary installs a Prometheus recorder via [`init`]
//! and can dump the rendered exposition text with [`render`].

use std::fmt;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// All metric names emitted by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Load
    LoadRecordsRead,
    LoadRecordsRejected,
    LoadFailures,

    // Normalize
    NormalizeRecordsKept,
    NormalizeRecordsDropped,
    NormalizeBatchSize,

    // Matcher
    MatcherPairsScored,
    MatcherRelationshipsFound,

    // Report
    ReportArtifactsWritten,
    ReportArtifactWriteErrors,
    ReportRowsWritten,

    // Quality check
    QualityCheckArtifacts,

    // Runs
    RunsTotal,
    RunsFailed,
    StageDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::LoadRecordsRead => "insights_load_records_read_total",
            MetricName::LoadRecordsRejected => "insights_load_records_rejected_total",
            MetricName::LoadFailures => "insights_load_failures_total",
            MetricName::NormalizeRecordsKept => "insights_normalize_records_kept_total",
            MetricName::NormalizeRecordsDropped => "insights_normalize_records_dropped_total",
            MetricName::NormalizeBatchSize => "insights_normalize_batch_size",
            MetricName::MatcherPairsScored => "insights_matcher_pairs_scored_total",
            MetricName::MatcherRelationshipsFound => "insights_matcher_relationships_found",
            MetricName::ReportArtifactsWritten => "insights_report_artifacts_written_total",
            MetricName::ReportArtifactWriteErrors => "insights_report_artifact_write_errors_total",
            MetricName::ReportRowsWritten => "insights_report_rows_written_total",
            MetricName::QualityCheckArtifacts => "insights_quality_check_artifacts_total",
            MetricName::RunsTotal => "insights_runs_total",
            MetricName::RunsFailed => "insights_runs_failed_total",
            MetricName::StageDuration => "insights_stage_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it twice is a no-op.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics recorder installed");
    Ok(())
}

/// Prometheus exposition text, if a recorder was installed
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod load {
    use super::MetricName;

    pub fn records_read(source: &str, count: usize) {
        ::metrics::counter!(
            MetricName::LoadRecordsRead.as_str(),
            "source" => source.to_string()
        )
        .increment(count as u64);
    }

    pub fn records_rejected(source: &str, count: usize) {
        ::metrics::counter!(
            MetricName::LoadRecordsRejected.as_str(),
            "source" => source.to_string()
        )
        .increment(count as u64);
    }

    pub fn failure(source: &str) {
        ::metrics::counter!(
            MetricName::LoadFailures.as_str(),
            "source" => source.to_string()
        )
        .increment(1);
    }
}

pub mod normalize {
    use super::MetricName;

    pub fn record_dropped(source: &str) {
        ::metrics::counter!(
            MetricName::NormalizeRecordsDropped.as_str(),
            "source" => source.to_string()
        )
        .increment(1);
    }

    pub fn batch_processed(source: &str, batch_size: usize, kept: usize) {
        ::metrics::histogram!(
            MetricName::NormalizeBatchSize.as_str(),
            "source" => source.to_string()
        )
        .record(batch_size as f64);
        ::metrics::counter!(
            MetricName::NormalizeRecordsKept.as_str(),
            "source" => source.to_string()
        )
        .increment(kept as u64);
    }
}

pub mod matcher {
    use super::MetricName;

    pub fn pairs_scored(pairs: usize) {
        ::metrics::counter!(MetricName::MatcherPairsScored.as_str()).increment(pairs as u64);
    }

    pub fn relationships_found(count: usize) {
        ::metrics::gauge!(MetricName::MatcherRelationshipsFound.as_str()).set(count as f64);
    }
}

pub mod report {
    use super::MetricName;

    pub fn artifact_written(artifact: &str, rows: usize) {
        ::metrics::counter!(
            MetricName::ReportArtifactsWritten.as_str(),
            "artifact" => artifact.to_string()
        )
        .increment(1);
        ::metrics::counter!(
            MetricName::ReportRowsWritten.as_str(),
            "artifact" => artifact.to_string()
        )
        .increment(rows as u64);
    }

    pub fn artifact_write_error(artifact: &str) {
        ::metrics::counter!(
            MetricName::ReportArtifactWriteErrors.as_str(),
            "artifact" => artifact.to_string()
        )
        .increment(1);
    }
}

pub mod quality_check {
    use super::MetricName;

    pub fn artifact_classified(label: &str) {
        ::metrics::counter!(
            MetricName::QualityCheckArtifacts.as_str(),
            "result" => label.to_string()
        )
        .increment(1);
    }
}

pub mod run {
    use super::MetricName;

    pub fn started() {
        ::metrics::counter!(MetricName::RunsTotal.as_str()).increment(1);
    }

    pub fn failed(reason: &str) {
        ::metrics::counter!(
            MetricName::RunsFailed.as_str(),
            "reason" => reason.to_string()
        )
        .increment(1);
    }

    pub fn stage_duration(stage: &'static str, secs: f64) {
        ::metrics::histogram!(MetricName::StageDuration.as_str(), "stage" => stage).record(secs);
    }
}
