use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error(
        "missing source data: {source_name} could not be read from {}: {reason}",
        .path.display()
    )]
    SourceMissing {
        source_name: String,
        path: PathBuf,
        reason: String,
    },

    #[error("missing source data: {source_name} contains no usable records")]
    SourceEmpty { source_name: String },

    #[error("invalid {source_name} record '{key}': {reason}")]
    RecordInvalid {
        source_name: String,
        key: String,
        reason: String,
    },

    #[error("failed to write artifact '{artifact}': {reason}")]
    ArtifactWriteFailed { artifact: String, reason: String },

    #[error("quality check could not read '{artifact}': {reason}")]
    QualityCheck { artifact: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Several preconditions failed at once, e.g. both raw sources missing
    #[error("{}", join_causes(.0))]
    Preconditions(Vec<InsightsError>),
}

fn join_causes(causes: &[InsightsError]) -> String {
    causes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl InsightsError {
    /// Fatal errors abort a run; everything else is counted and the run continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            InsightsError::SourceMissing { .. }
                | InsightsError::SourceEmpty { .. }
                | InsightsError::Config(_)
                | InsightsError::Preconditions(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, InsightsError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(source: &str) -> InsightsError {
        InsightsError::SourceMissing {
            source_name: source.to_string(),
            path: PathBuf::from(format!("data/raw/{}.json", source)),
            reason: "No such file or directory".to_string(),
        }
    }

    #[test]
    fn test_preconditions_message_lists_every_cause() {
        let err = InsightsError::Preconditions(vec![missing("github"), missing("kaggle")]);
        let message = err.to_string();

        assert!(message.contains("github could not be read"), "{}", message);
        assert!(message.contains("kaggle could not be read"), "{}", message);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_plumbing_errors_are_not_fatal() {
        let err = InsightsError::Io(std::io::Error::other("disk"));
        assert!(!err.is_fatal());
        assert!(missing("github").is_fatal());
    }
}
