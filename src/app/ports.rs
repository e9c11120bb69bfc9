use std::path::PathBuf;

use serde::Serialize;

use crate::domain::{RawDatasetRecord, RawRepositoryRecord, RecordIssue};
use crate::error::Result;
use crate::pipeline::processing::aggregate::ReportTable;

/// One raw collection as read from the collectors' output.
#[derive(Debug, Clone)]
pub struct LoadedCollection<T> {
    pub records: Vec<T>,
    /// Number of entries in the persisted collection, including rejected ones
    pub raw_count: usize,
    /// Entries that could not be decoded into the record shape
    pub rejected: Vec<RecordIssue>,
}

impl<T> LoadedCollection<T> {
    pub fn from_records(records: Vec<T>) -> Self {
        Self {
            raw_count: records.len(),
            records,
            rejected: Vec::new(),
        }
    }
}

// Load-side port
pub trait RawSourcePort: Send + Sync {
    fn load_repositories(&self) -> Result<LoadedCollection<RawRepositoryRecord>>;
    fn load_datasets(&self) -> Result<LoadedCollection<RawDatasetRecord>>;
}

/// A persisted report artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactRecord {
    pub name: String,
    pub path: PathBuf,
    pub rows: usize,
    /// Hex SHA-256 of the written bytes
    pub sha256: String,
}

// Output-side port
pub trait ReportOutputPort: Send + Sync {
    fn write_table(&self, table: &ReportTable) -> Result<ArtifactRecord>;

    /// Where artifacts end up; reported back to the caller of a run
    fn location(&self) -> PathBuf;
}
