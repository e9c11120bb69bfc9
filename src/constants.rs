/// Source names used in logs, errors and record issues
pub const GITHUB_SOURCE: &str = "github";
pub const KAGGLE_SOURCE: &str = "kaggle";

// `data_source` labels stamped onto every report row
pub const GITHUB_LABEL: &str = "github";
pub const KAGGLE_LABEL: &str = "kaggle";
pub const RELATIONSHIP_LABEL: &str = "relationship";
pub const METRICS_LABEL: &str = "metrics";

// Artifact names; the CSV adapter appends the `.csv` extension
pub const TOP_GITHUB_ARTIFACT: &str = "top_github_repos";
pub const TOP_KAGGLE_ARTIFACT: &str = "top_kaggle_datasets";
pub const RELATIONSHIPS_ARTIFACT: &str = "dataset_repo_relationships";
pub const METRICS_ARTIFACT: &str = "metrics";

pub const DEFAULT_TOP_N: usize = 50;
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.1;
pub const DEFAULT_MISSING_WARNING_PCT: f64 = 20.0;

/// README-derived keywords kept per repository
pub const README_KEYWORD_LIMIT: usize = 10;
/// Topics kept in `main_topics`
pub const MAIN_TOPIC_LIMIT: usize = 5;

/// Calendar date format used for `processed_date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";
