use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::constants::DEFAULT_MISSING_WARNING_PCT;
use crate::error::{InsightsError, Result};
use crate::observability::metrics;

/// Quality verdict for one persisted artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QualityClassification {
    /// Missing values at or below the warning threshold
    Pass { missing_pct: f64 },
    /// Missing values above the warning threshold
    Warning { missing_pct: f64 },
    /// Artifact has no data rows
    Fail,
    /// Artifact could not be read or parsed
    Error { reason: String },
}

impl QualityClassification {
    pub fn label(&self) -> &'static str {
        match self {
            QualityClassification::Pass { .. } => "PASS",
            QualityClassification::Warning { .. } => "WARNING",
            QualityClassification::Fail => "FAIL",
            QualityClassification::Error { .. } => "ERROR",
        }
    }
}

impl fmt::Display for QualityClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityClassification::Pass { missing_pct } => {
                write!(f, "PASS: Missing values ({:.2}%)", missing_pct)
            }
            QualityClassification::Warning { missing_pct } => {
                write!(f, "WARNING: High missing values ({:.2}%)", missing_pct)
            }
            QualityClassification::Fail => write!(f, "FAIL: Empty artifact"),
            QualityClassification::Error { reason } => write!(f, "ERROR: {}", reason),
        }
    }
}

/// Thresholds for the artifact check
#[derive(Debug, Clone, Copy)]
pub struct QualityCheckConfig {
    /// Missing-value percentage above which an artifact is a warning
    pub missing_warning_pct: f64,
}

impl Default for QualityCheckConfig {
    fn default() -> Self {
        Self {
            missing_warning_pct: DEFAULT_MISSING_WARNING_PCT,
        }
    }
}

/// Cell statistics of one tabular artifact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableProfile {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
}

impl TableProfile {
    pub fn missing_pct(&self) -> f64 {
        let cells = self.rows * self.columns;
        if cells == 0 {
            return 0.0;
        }
        self.missing_cells as f64 * 100.0 / cells as f64
    }
}

pub fn classify(profile: &TableProfile, config: &QualityCheckConfig) -> QualityClassification {
    if profile.rows == 0 {
        return QualityClassification::Fail;
    }
    let missing_pct = profile.missing_pct();
    if missing_pct > config.missing_warning_pct {
        QualityClassification::Warning { missing_pct }
    } else {
        QualityClassification::Pass { missing_pct }
    }
}

/// Reads a CSV artifact and counts its rows and empty cells. Ragged rows are
/// rejected by the reader.
pub fn profile_csv(path: &Path) -> Result<TableProfile> {
    let artifact = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| InsightsError::QualityCheck {
            artifact: artifact.clone(),
            reason: e.to_string(),
        })?;

    let columns = reader
        .headers()
        .map_err(|e| InsightsError::QualityCheck {
            artifact: artifact.clone(),
            reason: e.to_string(),
        })?
        .len();
    if columns == 0 {
        return Err(InsightsError::QualityCheck {
            artifact,
            reason: "no header row".to_string(),
        });
    }

    let mut profile = TableProfile {
        rows: 0,
        columns,
        missing_cells: 0,
    };
    for record in reader.records() {
        let record = record.map_err(|e| InsightsError::QualityCheck {
            artifact: artifact.clone(),
            reason: e.to_string(),
        })?;
        profile.rows += 1;
        profile.missing_cells += record.iter().filter(|cell| cell.trim().is_empty()).count();
    }
    Ok(profile)
}

/// Classifies one artifact; read failures become [`QualityClassification::Error`].
pub fn check_artifact(path: &Path, config: &QualityCheckConfig) -> QualityClassification {
    match profile_csv(path) {
        Ok(profile) => classify(&profile, config),
        Err(e) => {
            warn!(artifact = %path.display(), "Quality check could not read artifact: {}", e);
            let reason = match e {
                InsightsError::QualityCheck { reason, .. } => reason,
                other => other.to_string(),
            };
            QualityClassification::Error { reason }
        }
    }
}

/// Checks every `*.csv` file in `dir`, keyed by file name.
#[instrument(skip(config), fields(dir = %dir.display()))]
pub fn check_directory(
    dir: &Path,
    config: &QualityCheckConfig,
) -> Result<BTreeMap<String, QualityClassification>> {
    let mut results = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let classification = check_artifact(&path, config);
        metrics::quality_check::artifact_classified(classification.label());
        info!(artifact = %name, result = %classification, "Quality checked artifact");
        results.insert(name, classification);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_classify_thresholds() {
        let config = QualityCheckConfig::default();
        let profile = |missing| TableProfile { rows: 10, columns: 10, missing_cells: missing };

        assert_eq!(
            classify(&profile(20), &config),
            QualityClassification::Pass { missing_pct: 20.0 }
        );
        assert_eq!(
            classify(&profile(21), &config),
            QualityClassification::Warning { missing_pct: 21.0 }
        );
        assert_eq!(
            classify(&TableProfile { rows: 0, columns: 4, missing_cells: 0 }, &config),
            QualityClassification::Fail
        );
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(
            QualityClassification::Pass { missing_pct: 3.5714 }.to_string(),
            "PASS: Missing values (3.57%)"
        );
        assert_eq!(
            QualityClassification::Warning { missing_pct: 25.0 }.to_string(),
            "WARNING: High missing values (25.00%)"
        );
        assert_eq!(QualityClassification::Fail.to_string(), "FAIL: Empty artifact");
    }

    #[test]
    fn test_check_directory_classifies_each_csv() {
        let dir = tempdir().unwrap();
        write(dir.path(), "good.csv", "a,b\n1,2\n3,4\n");
        write(dir.path(), "sparse.csv", "a,b\n1,\n,\n");
        write(dir.path(), "empty.csv", "a,b\n");
        write(dir.path(), "ragged.csv", "a,b\n1,2,3\n");
        write(dir.path(), "notes.txt", "ignored");

        let results = check_directory(dir.path(), &QualityCheckConfig::default()).unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results["good.csv"], QualityClassification::Pass { missing_pct: 0.0 });
        assert_eq!(results["sparse.csv"], QualityClassification::Warning { missing_pct: 75.0 });
        assert_eq!(results["empty.csv"], QualityClassification::Fail);
        assert_eq!(results["ragged.csv"].label(), "ERROR");
    }

    #[test]
    fn test_blank_file_is_error() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "blank.csv", "");
        assert_eq!(check_artifact(&path, &QualityCheckConfig::default()).label(), "ERROR");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(check_directory(&missing, &QualityCheckConfig::default()).is_err());
    }
}
