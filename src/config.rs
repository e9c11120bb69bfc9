use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::{DEFAULT_MIN_SIMILARITY, DEFAULT_MISSING_WARNING_PCT, DEFAULT_TOP_N};
use crate::error::{InsightsError, Result};
use crate::pipeline::processing::matcher::MatchConfig;
use crate::pipeline::processing::quality_gate::QualityCheckConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub output: OutputConfig,
    pub matching: MatchingConfig,
    pub report: ReportConfig,
    pub quality: QualityConfig,
    pub logging: LoggingConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub repositories_path: PathBuf,
    pub datasets_path: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            repositories_path: PathBuf::from("data/raw/github_repos.json"),
            datasets_path: PathBuf::from("data/raw/kaggle_datasets.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data/processed"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub min_similarity: f64,
    pub parallel: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_similarity: DEFAULT_MIN_SIMILARITY,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub missing_warning_pct: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            missing_warning_pct: DEFAULT_MISSING_WARNING_PCT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "data_insights.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Where to dump Prometheus exposition text after a CLI run
    pub metrics_file: Option<PathBuf>,
}

impl Config {
    /// Load from `path`, then apply environment overrides. A missing file
    /// yields the defaults unless `required`.
    pub fn load_from(path: &Path, required: bool) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                InsightsError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml(&content)?
        } else if required {
            return Err(InsightsError::Config(format!(
                "Config file '{}' not found",
                path.display()
            )));
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(path) = env::var("INSIGHTS_RAW_REPOS") {
            self.sources.repositories_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("INSIGHTS_RAW_DATASETS") {
            self.sources.datasets_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var("INSIGHTS_OUTPUT_DIR") {
            self.output.directory = PathBuf::from(dir);
        }
        if let Ok(value) = env::var("INSIGHTS_MIN_SIMILARITY") {
            self.matching.min_similarity = value.trim().parse().map_err(|_| {
                InsightsError::Config(format!(
                    "INSIGHTS_MIN_SIMILARITY is not a number: '{}'",
                    value
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let min = self.matching.min_similarity;
        if !(0.0..1.0).contains(&min) {
            return Err(InsightsError::Config(format!(
                "matching.min_similarity must be in [0, 1), got {}",
                min
            )));
        }
        if self.report.top_n == 0 {
            return Err(InsightsError::Config(
                "report.top_n must be greater than zero".to_string(),
            ));
        }
        let pct = self.quality.missing_warning_pct;
        if !(0.0..=100.0).contains(&pct) {
            return Err(InsightsError::Config(format!(
                "quality.missing_warning_pct must be in [0, 100], got {}",
                pct
            )));
        }
        Ok(())
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            min_similarity: self.matching.min_similarity,
            parallel: self.matching.parallel,
        }
    }

    pub fn quality_config(&self) -> QualityCheckConfig {
        QualityCheckConfig {
            missing_warning_pct: self.quality.missing_warning_pct,
        }
    }
}
