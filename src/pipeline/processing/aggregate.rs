//! Top-N slices, run summary metrics and their tabular rendering.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::constants::{
    DATE_FORMAT, GITHUB_LABEL, KAGGLE_LABEL, METRICS_ARTIFACT, METRICS_LABEL,
    RELATIONSHIPS_ARTIFACT, RELATIONSHIP_LABEL, TOP_GITHUB_ARTIFACT, TOP_KAGGLE_ARTIFACT,
};
use crate::domain::{Metrics, NormalizedDataset, NormalizedRepository, Relationship};

/// The four report slices of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Reports {
    pub top_repositories: Vec<NormalizedRepository>,
    pub top_datasets: Vec<NormalizedDataset>,
    pub top_relationships: Vec<Relationship>,
    pub metrics: Metrics,
}

#[instrument(skip_all, fields(top_n = top_n))]
pub fn build_reports(
    repositories: &[NormalizedRepository],
    datasets: &[NormalizedDataset],
    relationships: &[Relationship],
    reference_date: NaiveDate,
    top_n: usize,
) -> Reports {
    let mut top_repositories = repositories.to_vec();
    top_repositories.sort_by(|a, b| b.repo_stars.cmp(&a.repo_stars));
    top_repositories.truncate(top_n);

    let mut top_datasets = datasets.to_vec();
    top_datasets.sort_by(|a, b| b.popularity_score.total_cmp(&a.popularity_score));
    top_datasets.truncate(top_n);

    let top_relationships: Vec<Relationship> =
        relationships.iter().take(top_n).cloned().collect();

    let metrics = summarize(repositories, datasets, relationships, reference_date);
    debug!(?metrics, "Built run summary");

    Reports {
        top_repositories,
        top_datasets,
        top_relationships,
        metrics,
    }
}

pub fn summarize(
    repositories: &[NormalizedRepository],
    datasets: &[NormalizedDataset],
    relationships: &[Relationship],
    reference_date: NaiveDate,
) -> Metrics {
    Metrics {
        total_github_repos: repositories.len(),
        total_kaggle_datasets: datasets.len(),
        total_relationships_found: relationships.len(),
        avg_github_stars: mean(repositories.iter().map(|r| r.repo_stars as f64)),
        avg_kaggle_downloads: mean(datasets.iter().map(|d| d.download_count as f64)),
        top_github_language: mode(
            repositories
                .iter()
                .map(|r| r.primary_language.as_str())
                .filter(|lang| !lang.is_empty()),
        )
        .unwrap_or_default()
        .to_string(),
        top_kaggle_tag: mode(
            datasets
                .iter()
                .flat_map(|d| d.tags.iter().map(|t| t.trim()))
                .filter(|tag| !tag.is_empty()),
        )
        .unwrap_or_default()
        .to_string(),
        processed_date: reference_date.format(DATE_FORMAT).to_string(),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Most frequent value; ties go to the value seen first.
pub fn mode<T: Eq + Hash + Copy>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: HashMap<T, (usize, usize)> = HashMap::new();
    for (position, value) in values.enumerate() {
        counts.entry(value).or_insert((0, position)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (ca, fa)), (_, (cb, fb))| ca.cmp(cb).then(fb.cmp(fa)))
        .map(|(value, _)| value)
}

/// A named table ready to be persisted: header row plus string cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A row type with a fixed column layout
pub trait ReportRow {
    const COLUMNS: &'static [&'static str];

    fn cells(&self, data_source: &str) -> Vec<String>;
}

impl ReportTable {
    pub fn from_rows<R: ReportRow>(name: &str, rows: &[R], data_source: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: R::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows.iter().map(|r| r.cells(data_source)).collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

fn optional_float(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl ReportRow for NormalizedRepository {
    const COLUMNS: &'static [&'static str] = &[
        "repo_name",
        "repo_full_name",
        "description",
        "repo_url",
        "repo_stars",
        "repo_forks",
        "created_at",
        "updated_at",
        "days_since_update",
        "primary_language",
        "language_percentages",
        "main_topics",
        "readme_keywords",
        "data_source",
    ];

    fn cells(&self, data_source: &str) -> Vec<String> {
        vec![
            self.repo_name.clone(),
            self.repo_full_name.clone(),
            self.description.clone(),
            self.repo_url.clone(),
            self.repo_stars.to_string(),
            self.repo_forks.to_string(),
            self.created_at.clone(),
            self.updated_at.clone(),
            self.days_since_update.to_string(),
            self.primary_language.clone(),
            self.language_percentages.clone(),
            self.main_topics.clone(),
            self.readme_keywords.clone(),
            data_source.to_string(),
        ]
    }
}

impl ReportRow for NormalizedDataset {
    const COLUMNS: &'static [&'static str] = &[
        "dataset_ref",
        "dataset_title",
        "dataset_url",
        "dataset_description",
        "size",
        "download_count",
        "view_count",
        "vote_count",
        "popularity_score",
        "last_updated",
        "days_since_update",
        "dataset_tags",
        "owner_name",
        "license_name",
        "data_source",
    ];

    fn cells(&self, data_source: &str) -> Vec<String> {
        vec![
            self.dataset_ref.clone(),
            self.dataset_title.clone(),
            self.dataset_url.clone(),
            self.dataset_description.clone(),
            self.size.clone(),
            self.download_count.to_string(),
            self.view_count.to_string(),
            self.vote_count.to_string(),
            self.popularity_score.to_string(),
            self.last_updated.clone(),
            self.days_since_update.to_string(),
            self.dataset_tags.clone(),
            self.owner_name.clone(),
            self.license_name.clone(),
            data_source.to_string(),
        ]
    }
}

impl ReportRow for Relationship {
    const COLUMNS: &'static [&'static str] = &[
        "repo_name",
        "repo_url",
        "dataset_title",
        "dataset_url",
        "similarity_score",
        "common_keywords",
        "data_source",
    ];

    fn cells(&self, data_source: &str) -> Vec<String> {
        vec![
            self.repo_name.clone(),
            self.repo_url.clone(),
            self.dataset_title.clone(),
            self.dataset_url.clone(),
            self.similarity_score.to_string(),
            self.common_keywords.clone(),
            data_source.to_string(),
        ]
    }
}

impl ReportRow for Metrics {
    const COLUMNS: &'static [&'static str] = &[
        "total_github_repos",
        "total_kaggle_datasets",
        "total_relationships_found",
        "avg_github_stars",
        "avg_kaggle_downloads",
        "top_github_language",
        "top_kaggle_tag",
        "processed_date",
        "data_source",
    ];

    fn cells(&self, data_source: &str) -> Vec<String> {
        vec![
            self.total_github_repos.to_string(),
            self.total_kaggle_datasets.to_string(),
            self.total_relationships_found.to_string(),
            optional_float(self.avg_github_stars),
            optional_float(self.avg_kaggle_downloads),
            self.top_github_language.clone(),
            self.top_kaggle_tag.clone(),
            self.processed_date.clone(),
            data_source.to_string(),
        ]
    }
}

impl Reports {
    /// Render the slices as the four artifact tables, in write order.
    pub fn to_tables(&self) -> Vec<ReportTable> {
        vec![
            ReportTable::from_rows(TOP_GITHUB_ARTIFACT, &self.top_repositories, GITHUB_LABEL),
            ReportTable::from_rows(TOP_KAGGLE_ARTIFACT, &self.top_datasets, KAGGLE_LABEL),
            ReportTable::from_rows(
                RELATIONSHIPS_ARTIFACT,
                &self.top_relationships,
                RELATIONSHIP_LABEL,
            ),
            ReportTable::from_rows(
                METRICS_ARTIFACT,
                std::slice::from_ref(&self.metrics),
                METRICS_LABEL,
            ),
        ]
    }
}
