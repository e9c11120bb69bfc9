use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::info;

use crate::app::ports::{ArtifactRecord, ReportOutputPort};
use crate::error::{InsightsError, Result};
use crate::pipeline::processing::aggregate::ReportTable;

/// Writes each report table to `<dir>/<name>.csv`
pub struct CsvReportWriter {
    dir: PathBuf,
}

impl CsvReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

/// Header row plus records, rendered to UTF-8 CSV bytes.
pub fn render_csv(table: &ReportTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| InsightsError::Io(e.into_error()))
}

fn write_bytes(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, bytes)
}

impl ReportOutputPort for CsvReportWriter {
    fn write_table(&self, table: &ReportTable) -> Result<ArtifactRecord> {
        let failed = |reason: String| InsightsError::ArtifactWriteFailed {
            artifact: table.name.clone(),
            reason,
        };

        let bytes = render_csv(table).map_err(|e| failed(e.to_string()))?;
        let path = self.artifact_path(&table.name);
        write_bytes(&path, &bytes).map_err(|e| failed(e.to_string()))?;

        info!(
            artifact = %table.name,
            path = %path.display(),
            rows = table.row_count(),
            "Wrote artifact"
        );

        Ok(ArtifactRecord {
            name: table.name.clone(),
            path,
            rows: table.row_count(),
            sha256: hex::encode(Sha256::digest(&bytes)),
        })
    }

    fn location(&self) -> PathBuf {
        self.dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table(rows: Vec<Vec<&str>>) -> ReportTable {
        ReportTable {
            name: "sample".to_string(),
            columns: vec!["name".to_string(), "notes".to_string()],
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        }
    }

    #[test]
    fn test_render_quotes_embedded_commas_and_quotes() {
        let bytes = render_csv(&table(vec![vec!["a, b", "say \"hi\""]])).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "name,notes\n\"a, b\",\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_empty_table_still_has_header() {
        let bytes = render_csv(&table(vec![])).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "name,notes\n");
    }

    #[test]
    fn test_write_table_creates_directory_and_digest() {
        let dir = tempdir().unwrap();
        let writer = CsvReportWriter::new(dir.path().join("processed"));

        let record = writer.write_table(&table(vec![vec!["x", "y"]])).unwrap();

        assert_eq!(record.rows, 1);
        assert_eq!(record.path, dir.path().join("processed").join("sample.csv"));
        let written = fs::read(&record.path).unwrap();
        assert_eq!(record.sha256, hex::encode(Sha256::digest(&written)));
        assert_eq!(writer.location(), dir.path().join("processed"));
    }

    #[test]
    fn test_unwritable_location_is_artifact_write_failure() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        let writer = CsvReportWriter::new(&blocker);

        let err = writer.write_table(&table(vec![])).unwrap_err();
        assert!(matches!(
            err,
            InsightsError::ArtifactWriteFailed { ref artifact, .. } if artifact == "sample"
        ));
    }
}
