use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::app::ports::{ArtifactRecord, RawSourcePort, ReportOutputPort};
use crate::config::Config;
use crate::constants::{GITHUB_SOURCE, KAGGLE_SOURCE};
use crate::domain::RecordIssue;
use crate::error::{InsightsError, Result};
use crate::infra::csv_output_adapter::CsvReportWriter;
use crate::infra::json_source_adapter::JsonFileSource;
use crate::observability::metrics;
use crate::pipeline::clock::{Clock, SystemClock};
use crate::pipeline::processing::aggregate::build_reports;
use crate::pipeline::processing::matcher::{match_relationships, MatchConfig};
use crate::pipeline::processing::normalize::{normalize_datasets, normalize_repositories};

/// Row counts reported for a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunCounts {
    pub raw_repositories: usize,
    pub raw_datasets: usize,
    pub repositories: usize,
    pub datasets: usize,
    pub relationships: usize,
    pub dropped_repositories: usize,
    pub dropped_datasets: usize,
}

/// Outcome of one pipeline execution
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub success: bool,
    pub output_location: PathBuf,
    pub reference_date: NaiveDate,
    pub counts: RunCounts,
    pub artifacts: Vec<ArtifactRecord>,
    /// Artifacts whose write failed, with the reason
    pub failed_artifacts: Vec<String>,
    /// Records dropped while loading or normalizing
    pub dropped: Vec<RecordIssue>,
    /// Why the run failed, when it did
    pub cause: Option<String>,
}

/// Knobs for the matching and report stages
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub match_config: MatchConfig,
    pub top_n: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            top_n: crate::constants::DEFAULT_TOP_N,
        }
    }
}

/// Sequences load → normalize → match → aggregate → persist.
///
/// Every call is a full batch recomputation. The orchestrator does not guard
/// against concurrent invocations; the scheduler is expected to serialize them.
pub struct PipelineOrchestrator {
    source: Box<dyn RawSourcePort>,
    output: Box<dyn ReportOutputPort>,
    clock: Box<dyn Clock>,
    settings: PipelineSettings,
}

impl PipelineOrchestrator {
    pub fn new(
        source: Box<dyn RawSourcePort>,
        output: Box<dyn ReportOutputPort>,
        clock: Box<dyn Clock>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            output,
            clock,
            settings,
        }
    }

    /// File-backed orchestrator using the configured paths and the system clock
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Box::new(JsonFileSource::new(
                &config.sources.repositories_path,
                &config.sources.datasets_path,
            )),
            Box::new(CsvReportWriter::new(&config.output.directory)),
            Box::new(SystemClock),
            PipelineSettings {
                match_config: config.match_config(),
                top_n: config.report.top_n,
            },
        )
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run the pipeline once. Never panics on bad input; failures come back
    /// as `success == false` with a cause.
    pub fn run(&self) -> RunResult {
        let run_id = Uuid::new_v4();
        // sampled once; every record in this run shares it
        let reference_date = self.clock.today();
        metrics::run::started();

        let mut result = RunResult {
            run_id,
            success: false,
            output_location: self.output.location(),
            reference_date,
            counts: RunCounts::default(),
            artifacts: Vec::new(),
            failed_artifacts: Vec::new(),
            dropped: Vec::new(),
            cause: None,
        };

        match self.execute(run_id, reference_date, &mut result) {
            Ok(()) if result.failed_artifacts.is_empty() => {
                result.success = true;
                info!(
                    %run_id,
                    repositories = result.counts.repositories,
                    datasets = result.counts.datasets,
                    relationships = result.counts.relationships,
                    dropped = result.dropped.len(),
                    "Pipeline run succeeded"
                );
            }
            Ok(()) => {
                let cause = format!(
                    "{} artifact(s) could not be written: {}",
                    result.failed_artifacts.len(),
                    result.failed_artifacts.join("; ")
                );
                error!(%run_id, "Pipeline run failed: {}", cause);
                metrics::run::failed("artifact_write");
                result.cause = Some(cause);
            }
            Err(e) => {
                error!(%run_id, fatal = e.is_fatal(), "Pipeline run failed: {}", e);
                metrics::run::failed(failure_kind(&e));
                result.cause = Some(e.to_string());
            }
        }

        result
    }

    #[instrument(skip_all, fields(run_id = %run_id, reference_date = %reference_date))]
    fn execute(
        &self,
        run_id: Uuid,
        reference_date: NaiveDate,
        result: &mut RunResult,
    ) -> Result<()> {
        info!("Starting pipeline run");

        // both sides are attempted so a failed run names every missing source
        let (raw_repositories, raw_datasets) = timed("load", || {
            match (self.source.load_repositories(), self.source.load_datasets()) {
                (Ok(repositories), Ok(datasets)) => Ok((repositories, datasets)),
                (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
                (Err(repositories), Err(datasets)) => {
                    Err(InsightsError::Preconditions(vec![repositories, datasets]))
                }
            }
        })?;
        result.counts.raw_repositories = raw_repositories.raw_count;
        result.counts.raw_datasets = raw_datasets.raw_count;
        result.dropped.extend(raw_repositories.rejected.iter().cloned());
        result.dropped.extend(raw_datasets.rejected.iter().cloned());

        let (repositories, datasets) = timed("normalize", || {
            (
                normalize_repositories(&raw_repositories.records, reference_date),
                normalize_datasets(&raw_datasets.records, reference_date),
            )
        });
        result.dropped.extend(repositories.dropped.iter().cloned());
        result.dropped.extend(datasets.dropped.iter().cloned());
        result.counts.repositories = repositories.records.len();
        result.counts.datasets = datasets.records.len();
        result.counts.dropped_repositories =
            raw_repositories.rejected.len() + repositories.dropped.len();
        result.counts.dropped_datasets = raw_datasets.rejected.len() + datasets.dropped.len();

        if repositories.records.is_empty() {
            return Err(InsightsError::SourceEmpty {
                source_name: GITHUB_SOURCE.to_string(),
            });
        }
        if datasets.records.is_empty() {
            return Err(InsightsError::SourceEmpty {
                source_name: KAGGLE_SOURCE.to_string(),
            });
        }
        if !result.dropped.is_empty() {
            warn!(dropped = result.dropped.len(), "Continuing with records dropped");
        }

        let relationships = timed("match", || {
            match_relationships(
                &repositories.records,
                &datasets.records,
                self.settings.match_config,
            )
        });
        result.counts.relationships = relationships.len();

        let reports = timed("aggregate", || {
            build_reports(
                &repositories.records,
                &datasets.records,
                &relationships,
                reference_date,
                self.settings.top_n,
            )
        });

        timed("persist", || {
            // every artifact is attempted even after a failure
            for table in reports.to_tables() {
                match self.output.write_table(&table) {
                    Ok(artifact) => {
                        metrics::report::artifact_written(&artifact.name, artifact.rows);
                        result.artifacts.push(artifact);
                    }
                    Err(e) => {
                        error!(artifact = %table.name, "Artifact write failed: {}", e);
                        metrics::report::artifact_write_error(&table.name);
                        result.failed_artifacts.push(e.to_string());
                    }
                }
            }
        });

        Ok(())
    }
}

fn failure_kind(error: &InsightsError) -> &'static str {
    if !error.is_fatal() {
        return "other";
    }
    match error {
        InsightsError::SourceEmpty { .. } => "source_empty",
        InsightsError::Config(_) => "config",
        _ => "source_missing",
    }
}

fn timed<T>(stage: &'static str, f: impl FnOnce() -> T) -> T {
    let started = Instant::now();
    let value = f();
    metrics::run::stage_duration(stage, started.elapsed().as_secs_f64());
    value
}
