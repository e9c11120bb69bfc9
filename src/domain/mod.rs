use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Repository record as persisted by the GitHub collector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRepositoryRecord {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    pub stars: u64,
    pub forks: u64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
    #[serde(default)]
    pub primary_language: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: BTreeMap<String, u64>,
    #[serde(default)]
    pub readme_content: Option<String>,
    #[serde(default)]
    pub owner_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_archived: bool,
}

/// Dataset record as persisted by the Kaggle collector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDatasetRecord {
    #[serde(rename = "ref")]
    pub dataset_ref: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub total_bytes: Option<u64>,
    pub download_count: u64,
    pub view_count: u64,
    pub vote_count: u64,
    pub last_updated: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub license_name: Option<String>,
    #[serde(default)]
    pub file_count: Option<u64>,
}

/// Collectors write `null` for empty collections as often as they omit them.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRepository {
    pub repo_name: String,
    pub repo_full_name: String,
    pub description: String,
    pub repo_url: String,
    pub repo_stars: u64,
    pub repo_forks: u64,
    pub created_at: String,
    pub updated_at: String,
    pub days_since_update: i64,
    pub primary_language: String,
    pub language_percentages: String,
    pub main_topics: String,
    pub readme_keywords: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDataset {
    pub dataset_ref: String,
    pub dataset_title: String,
    pub dataset_url: String,
    pub dataset_description: String,
    pub size: String,
    pub download_count: u64,
    pub view_count: u64,
    pub vote_count: u64,
    pub popularity_score: f64,
    pub last_updated: String,
    pub days_since_update: i64,
    pub dataset_tags: String,
    /// Original tag collection; `dataset_tags` is only its display form.
    pub tags: Vec<String>,
    pub owner_name: String,
    pub license_name: String,
}

/// A probable link between one repository and one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub repo_name: String,
    pub repo_url: String,
    pub dataset_title: String,
    pub dataset_url: String,
    pub similarity_score: f64,
    pub common_keywords: String,
}

/// Single-row run summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_github_repos: usize,
    pub total_kaggle_datasets: usize,
    pub total_relationships_found: usize,
    pub avg_github_stars: Option<f64>,
    pub avg_kaggle_downloads: Option<f64>,
    pub top_github_language: String,
    pub top_kaggle_tag: String,
    pub processed_date: String,
}

/// A record that was dropped during loading or normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordIssue {
    pub source_name: String,
    pub key: String,
    pub reason: String,
}
