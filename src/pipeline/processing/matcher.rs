use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::constants::DEFAULT_MIN_SIMILARITY;
use crate::domain::{NormalizedDataset, NormalizedRepository, Relationship};
use crate::observability::metrics;
use crate::pipeline::processing::keywords::extract_match_keywords;

/// Matching parameters
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    /// Pairs must score strictly above this value
    pub min_similarity: f64,
    /// Score repositories on the rayon pool
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_similarity: DEFAULT_MIN_SIMILARITY,
            parallel: true,
        }
    }
}

/// Keyword set built from a repository's name, description, topics and README keywords
pub fn repository_keywords(repo: &NormalizedRepository) -> BTreeSet<String> {
    extract_match_keywords(&format!(
        "{} {} {} {}",
        repo.repo_name, repo.description, repo.main_topics, repo.readme_keywords
    ))
}

/// Keyword set built from a dataset's title, description and tags
pub fn dataset_keywords(dataset: &NormalizedDataset) -> BTreeSet<String> {
    extract_match_keywords(&format!(
        "{} {} {}",
        dataset.dataset_title, dataset.dataset_description, dataset.dataset_tags
    ))
}

/// Shared keywords divided by the size of the larger set (floored at 1).
pub fn similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> (f64, BTreeSet<String>) {
    let common: BTreeSet<String> = a.intersection(b).cloned().collect();
    let denominator = a.len().max(b.len()).max(1);
    (common.len() as f64 / denominator as f64, common)
}

pub fn passes_threshold(score: f64, min_similarity: f64) -> bool {
    score > min_similarity
}

/// Scores every repository against every dataset and returns the pairs above
/// the threshold, best first. Equal scores keep repository-major,
/// dataset-minor generation order.
#[instrument(skip_all, fields(repositories = repositories.len(), datasets = datasets.len()))]
pub fn match_relationships(
    repositories: &[NormalizedRepository],
    datasets: &[NormalizedDataset],
    config: MatchConfig,
) -> Vec<Relationship> {
    if repositories.is_empty() || datasets.is_empty() {
        debug!("One side is empty; no pairs to score");
        return Vec::new();
    }

    let dataset_sets: Vec<BTreeSet<String>> = datasets.iter().map(dataset_keywords).collect();

    let score_repository = |repo: &NormalizedRepository| -> Vec<Relationship> {
        let repo_set = repository_keywords(repo);
        datasets
            .iter()
            .zip(&dataset_sets)
            .filter_map(|(dataset, dataset_set)| {
                let (score, common) = similarity(&repo_set, dataset_set);
                if !passes_threshold(score, config.min_similarity) {
                    return None;
                }
                Some(Relationship {
                    repo_name: repo.repo_name.clone(),
                    repo_url: repo.repo_url.clone(),
                    dataset_title: dataset.dataset_title.clone(),
                    dataset_url: dataset.dataset_url.clone(),
                    similarity_score: score,
                    common_keywords: common.into_iter().collect::<Vec<_>>().join(", "),
                })
            })
            .collect()
    };

    // Both branches yield per-repository groups in input order, so the
    // merged list is identical regardless of parallelism.
    let groups: Vec<Vec<Relationship>> = if config.parallel {
        repositories.par_iter().map(score_repository).collect()
    } else {
        repositories.iter().map(score_repository).collect()
    };

    let mut relationships: Vec<Relationship> = groups.into_iter().flatten().collect();
    relationships.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));

    let pairs = repositories.len() * datasets.len();
    metrics::matcher::pairs_scored(pairs);
    metrics::matcher::relationships_found(relationships.len());
    info!(pairs, kept = relationships.len(), "Scored repository/dataset pairs");

    relationships
}
