use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use data_insights::config::{Config, DEFAULT_CONFIG_PATH};
use data_insights::observability::{init_logging, metrics};
use data_insights::pipeline::processing::quality_gate::{
    check_directory, QualityClassification,
};
use data_insights::pipeline::{FixedClock, PipelineOrchestrator, RunResult};

#[derive(Parser)]
#[command(name = "data_insights")]
#[command(about = "Match GitHub repositories with Kaggle datasets and build ranked reports")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full batch: load, normalize, match, aggregate, persist
    Run {
        /// Reference date for recency fields (YYYY-MM-DD); defaults to today (UTC)
        #[arg(long)]
        reference_date: Option<NaiveDate>,
        /// Do not run the artifact quality check afterwards
        #[arg(long)]
        skip_quality_check: bool,
        /// Print the run result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the quality check over already written artifacts
    Check {
        /// Artifact directory; defaults to the configured output directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path, true),
        None => Config::load_from(Path::new(DEFAULT_CONFIG_PATH), false),
    };
    config.context("Failed to load configuration")
}

fn print_run_summary(result: &RunResult) {
    if result.success {
        println!("✅ Pipeline run {} succeeded", result.run_id);
    } else {
        println!("❌ Pipeline run {} failed", result.run_id);
        if let Some(cause) = &result.cause {
            println!("   Cause: {}", cause);
        }
    }
    println!("   Reference date: {}", result.reference_date);
    println!("   Output: {}", result.output_location.display());
    println!(
        "   Repositories: {} ({} raw, {} dropped)",
        result.counts.repositories,
        result.counts.raw_repositories,
        result.counts.dropped_repositories
    );
    println!(
        "   Datasets: {} ({} raw, {} dropped)",
        result.counts.datasets,
        result.counts.raw_datasets,
        result.counts.dropped_datasets
    );
    println!("   Relationships: {}", result.counts.relationships);

    for artifact in &result.artifacts {
        println!(
            "   📄 {} ({} rows) {}",
            artifact.path.display(),
            artifact.rows,
            artifact.sha256
        );
    }
    if !result.dropped.is_empty() {
        println!("\n⚠️  Dropped records:");
        for issue in &result.dropped {
            println!("   - [{}] {}: {}", issue.source_name, issue.key, issue.reason);
        }
    }
}

fn print_quality(results: &BTreeMap<String, QualityClassification>) {
    println!("\n🔍 Quality check ({} artifacts):", results.len());
    for (name, classification) in results {
        println!("   {}: {}", name, classification);
    }
}

fn run_quality_check(
    dir: &Path,
    config: &Config,
) -> anyhow::Result<BTreeMap<String, QualityClassification>> {
    check_directory(dir, &config.quality_config())
        .with_context(|| format!("Quality check could not list {}", dir.display()))
}

fn write_metrics_file(config: &Config) {
    let Some(path) = &config.observability.metrics_file else {
        return;
    };
    let Some(text) = metrics::render() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Err(e) = fs::write(path, text) {
        warn!("Failed to write metrics file {}: {}", path.display(), e);
    }
}

fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let _guard = init_logging(&config.logging.directory, &config.logging.file_name);
    if let Err(e) = metrics::init() {
        warn!("Metrics disabled: {}", e);
    }

    let exit = match cli.command {
        Commands::Run {
            reference_date,
            skip_quality_check,
            json,
        } => {
            if !json {
                println!("🚀 Running data insights pipeline...");
            }
            let mut orchestrator = PipelineOrchestrator::from_config(&config);
            if let Some(date) = reference_date {
                info!(%date, "Using pinned reference date");
                orchestrator = orchestrator.with_clock(Box::new(FixedClock(date)));
            }

            let result = orchestrator.run();
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_run_summary(&result);
            }

            if result.success && !skip_quality_check {
                let checks = run_quality_check(&result.output_location, &config)?;
                if json {
                    info!(?checks, "Quality check finished");
                } else {
                    print_quality(&checks);
                }
            }

            if result.success {
                ExitCode::SUCCESS
            } else {
                error!("Run failed: {}", result.cause.as_deref().unwrap_or("unknown"));
                ExitCode::FAILURE
            }
        }
        Commands::Check { dir } => {
            let dir = dir.unwrap_or_else(|| config.output.directory.clone());
            let results = run_quality_check(&dir, &config)?;
            print_quality(&results);

            let failing = results
                .values()
                .filter(|c| {
                    matches!(
                        c,
                        QualityClassification::Fail | QualityClassification::Error { .. }
                    )
                })
                .count();
            if failing == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    };

    write_metrics_file(&config);
    Ok(exit)
}
