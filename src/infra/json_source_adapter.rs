use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::app::ports::{LoadedCollection, RawSourcePort};
use crate::constants::{GITHUB_SOURCE, KAGGLE_SOURCE};
use crate::domain::{RawDatasetRecord, RawRepositoryRecord, RecordIssue};
use crate::error::{InsightsError, Result};
use crate::observability::metrics;

/// Reads the JSON arrays the collectors persist to disk
pub struct JsonFileSource {
    repositories_path: PathBuf,
    datasets_path: PathBuf,
}

impl JsonFileSource {
    pub fn new(repositories_path: impl Into<PathBuf>, datasets_path: impl Into<PathBuf>) -> Self {
        Self {
            repositories_path: repositories_path.into(),
            datasets_path: datasets_path.into(),
        }
    }
}

impl RawSourcePort for JsonFileSource {
    fn load_repositories(&self) -> Result<LoadedCollection<RawRepositoryRecord>> {
        load_collection(GITHUB_SOURCE, &self.repositories_path, "full_name")
    }

    fn load_datasets(&self) -> Result<LoadedCollection<RawDatasetRecord>> {
        load_collection(KAGGLE_SOURCE, &self.datasets_path, "ref")
    }
}

/// Reads one collection file. The file as a whole must be a readable JSON
/// array; individual entries that do not fit the record shape are rejected.
fn load_collection<T: DeserializeOwned>(
    source: &str,
    path: &Path,
    key_field: &str,
) -> Result<LoadedCollection<T>> {
    let missing = |reason: String| {
        metrics::load::failure(source);
        InsightsError::SourceMissing {
            source_name: source.to_string(),
            path: path.to_path_buf(),
            reason,
        }
    };

    let content = fs::read_to_string(path).map_err(|e| missing(e.to_string()))?;
    let entries: Vec<Value> =
        serde_json::from_str(&content).map_err(|e| missing(format!("not a JSON array: {}", e)))?;

    let raw_count = entries.len();
    let mut records = Vec::with_capacity(raw_count);
    let mut rejected = Vec::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let key = entry
            .get(key_field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", index));

        match serde_json::from_value::<T>(entry) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(source, key = %key, "Rejecting malformed record: {}", e);
                rejected.push(RecordIssue {
                    source_name: source.to_string(),
                    key,
                    reason: e.to_string(),
                });
            }
        }
    }

    metrics::load::records_read(source, raw_count);
    metrics::load::records_rejected(source, rejected.len());
    info!(
        source,
        path = %path.display(),
        read = raw_count,
        rejected = rejected.len(),
        "Loaded raw collection"
    );

    Ok(LoadedCollection {
        records,
        raw_count,
        rejected,
    })
}
