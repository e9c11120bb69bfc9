use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, warn};

use crate::constants::{GITHUB_SOURCE, KAGGLE_SOURCE, MAIN_TOPIC_LIMIT, README_KEYWORD_LIMIT};
use crate::domain::{
    NormalizedDataset, NormalizedRepository, RawDatasetRecord, RawRepositoryRecord, RecordIssue,
};
use crate::error::{InsightsError, Result};
use crate::observability::metrics;
use crate::pipeline::processing::keywords::extract_keywords;

/// Weights of the popularity blend: downloads, views, votes.
pub const POPULARITY_WEIGHTS: (f64, f64, f64) = (0.5, 0.3, 0.2);

/// Output of normalizing one raw collection. Records that failed derivation
/// are reported in `dropped` instead of aborting the batch.
#[derive(Debug, Clone)]
pub struct NormalizedBatch<T> {
    pub records: Vec<T>,
    pub dropped: Vec<RecordIssue>,
}

impl<T> Default for NormalizedBatch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            dropped: Vec::new(),
        }
    }
}

/// Trait for converting one raw collector record into its canonical row
pub trait Normalizer {
    type Raw;
    type Output;

    /// Source name reported on dropped records
    fn source_name(&self) -> &'static str;

    /// Identifier used in logs when a record is dropped
    fn record_key(&self, raw: &Self::Raw) -> String;

    fn normalize(&self, raw: &Self::Raw) -> Result<Self::Output>;

    /// Normalize a whole collection, dropping records that fail with a warning.
    fn normalize_all(&self, raw: &[Self::Raw]) -> NormalizedBatch<Self::Output> {
        let mut batch = NormalizedBatch::default();

        for record in raw {
            match self.normalize(record) {
                Ok(row) => batch.records.push(row),
                Err(e) => {
                    let key = self.record_key(record);
                    warn!(source = self.source_name(), key = %key, "Dropping record: {}", e);
                    metrics::normalize::record_dropped(self.source_name());
                    batch.dropped.push(RecordIssue {
                        source_name: self.source_name().to_string(),
                        key,
                        reason: e.to_string(),
                    });
                }
            }
        }

        metrics::normalize::batch_processed(self.source_name(), raw.len(), batch.records.len());
        debug!(
            source = self.source_name(),
            kept = batch.records.len(),
            dropped = batch.dropped.len(),
            "Normalized batch"
        );
        batch
    }
}

/// Normalizes GitHub repository records against a fixed reference date
pub struct RepositoryNormalizer {
    pub reference_date: NaiveDate,
}

impl Normalizer for RepositoryNormalizer {
    type Raw = RawRepositoryRecord;
    type Output = NormalizedRepository;

    fn source_name(&self) -> &'static str {
        GITHUB_SOURCE
    }

    fn record_key(&self, raw: &RawRepositoryRecord) -> String {
        raw.full_name.clone()
    }

    fn normalize(&self, raw: &RawRepositoryRecord) -> Result<NormalizedRepository> {
        let updated = parse_record_date(&raw.updated_at)
            .ok_or_else(|| invalid(GITHUB_SOURCE, &raw.full_name, "updated_at", &raw.updated_at))?;

        let readme = raw.readme_content.as_deref().unwrap_or_default();

        Ok(NormalizedRepository {
            repo_name: raw.name.clone(),
            repo_full_name: raw.full_name.clone(),
            description: raw.description.clone().unwrap_or_default(),
            repo_url: raw.url.clone(),
            repo_stars: raw.stars,
            repo_forks: raw.forks,
            created_at: raw.created_at.clone(),
            updated_at: raw.updated_at.clone(),
            days_since_update: days_between(updated, self.reference_date),
            primary_language: raw.primary_language.clone().unwrap_or_default(),
            language_percentages: language_percentages(&raw.languages),
            main_topics: main_topics(&raw.topics),
            readme_keywords: extract_keywords(readme, README_KEYWORD_LIMIT).join(", "),
        })
    }
}

/// Normalizes Kaggle dataset records against a fixed reference date
pub struct DatasetNormalizer {
    pub reference_date: NaiveDate,
}

impl Normalizer for DatasetNormalizer {
    type Raw = RawDatasetRecord;
    type Output = NormalizedDataset;

    fn source_name(&self) -> &'static str {
        KAGGLE_SOURCE
    }

    fn record_key(&self, raw: &RawDatasetRecord) -> String {
        raw.dataset_ref.clone()
    }

    fn normalize(&self, raw: &RawDatasetRecord) -> Result<NormalizedDataset> {
        let updated = parse_record_date(&raw.last_updated).ok_or_else(|| {
            invalid(KAGGLE_SOURCE, &raw.dataset_ref, "last_updated", &raw.last_updated)
        })?;

        Ok(NormalizedDataset {
            dataset_ref: raw.dataset_ref.clone(),
            dataset_title: raw.title.clone(),
            dataset_url: raw.url.clone(),
            dataset_description: raw.description.clone().unwrap_or_default(),
            size: raw.total_bytes.map(format_size).unwrap_or_default(),
            download_count: raw.download_count,
            view_count: raw.view_count,
            vote_count: raw.vote_count,
            popularity_score: popularity_score(raw.download_count, raw.view_count, raw.vote_count),
            last_updated: raw.last_updated.clone(),
            days_since_update: days_between(updated, self.reference_date),
            dataset_tags: raw.tags.join(", "),
            tags: raw.tags.clone(),
            owner_name: raw.owner_name.clone().unwrap_or_default(),
            license_name: raw.license_name.clone().unwrap_or_default(),
        })
    }
}

pub fn normalize_repositories(
    raw: &[RawRepositoryRecord],
    reference_date: NaiveDate,
) -> NormalizedBatch<NormalizedRepository> {
    RepositoryNormalizer { reference_date }.normalize_all(raw)
}

pub fn normalize_datasets(
    raw: &[RawDatasetRecord],
    reference_date: NaiveDate,
) -> NormalizedBatch<NormalizedDataset> {
    DatasetNormalizer { reference_date }.normalize_all(raw)
}

fn invalid(source: &str, key: &str, field: &str, value: &str) -> InsightsError {
    InsightsError::RecordInvalid {
        source_name: source.to_string(),
        key: key.to_string(),
        reason: format!("unparseable {} '{}'", field, value),
    }
}

/// Accepts the date shapes the collectors emit and keeps the calendar date.
/// Offset timestamps are converted to UTC first, matching the run clock.
pub fn parse_record_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
                .ok()
                .map(|dt| dt.date())
        })
}

/// Whole days from `date` to `reference`; negative for future dates.
pub fn days_between(date: NaiveDate, reference: NaiveDate) -> i64 {
    (reference - date).num_days()
}

/// `Python: 62.5%, Rust: 37.5%`, largest share first.
pub fn language_percentages(languages: &std::collections::BTreeMap<String, u64>) -> String {
    let total: u64 = languages.values().sum();
    if total == 0 {
        return String::new();
    }

    let mut shares: Vec<(&String, &u64)> = languages.iter().collect();
    // BTreeMap iteration is name-ordered, so the stable sort breaks ties by name
    shares.sort_by(|a, b| b.1.cmp(a.1));

    shares
        .into_iter()
        .map(|(lang, bytes)| format!("{}: {:.1}%", lang, *bytes as f64 / total as f64 * 100.0))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn main_topics(topics: &[String]) -> String {
    topics
        .iter()
        .take(MAIN_TOPIC_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn popularity_score(downloads: u64, views: u64, votes: u64) -> f64 {
    let (w_downloads, w_views, w_votes) = POPULARITY_WEIGHTS;
    downloads as f64 * w_downloads + views as f64 * w_views + votes as f64 * w_votes
}

/// Human-readable byte size: `512.00 B`, `1.50 KB`, ..., falling back to PB.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn raw_repo(name: &str, updated_at: &str) -> RawRepositoryRecord {
        RawRepositoryRecord {
            name: name.to_string(),
            full_name: format!("owner/{}", name),
            description: Some("data analysis toolkit".to_string()),
            url: format!("https://github.com/owner/{}", name),
            stars: 500,
            forks: 20,
            created_at: "2020-05-01".to_string(),
            updated_at: updated_at.to_string(),
            topics: vec!["data-science".to_string()],
            primary_language: Some("Python".to_string()),
            languages: BTreeMap::from([("Python".to_string(), 100)]),
            readme_content: Some("analysis toolkit for data science".to_string()),
            owner_type: Some("User".to_string()),
            is_archived: false,
        }
    }

    fn raw_dataset(dataset_ref: &str, downloads: u64) -> RawDatasetRecord {
        RawDatasetRecord {
            dataset_ref: dataset_ref.to_string(),
            title: "Analysis Dataset".to_string(),
            url: format!("https://www.kaggle.com/datasets/{}", dataset_ref),
            description: Some("dataset for data science analysis".to_string()),
            total_bytes: Some(1536),
            download_count: downloads,
            view_count: 500,
            vote_count: 50,
            last_updated: "2024-01-01".to_string(),
            tags: vec!["data-science".to_string(), "finance".to_string()],
            owner_name: Some("owner".to_string()),
            license_name: None,
            file_count: None,
        }
    }

    #[test]
    fn test_normalize_repository_derived_fields() {
        let batch = normalize_repositories(
            &[raw_repo("pandas-tools", "2024-01-01")],
            date(2024, 1, 31),
        );

        assert!(batch.dropped.is_empty());
        let repo = &batch.records[0];
        assert_eq!(repo.repo_name, "pandas-tools");
        assert_eq!(repo.days_since_update, 30);
        assert_eq!(repo.language_percentages, "Python: 100.0%");
        assert_eq!(repo.main_topics, "data-science");
        assert_eq!(repo.readme_keywords, "analysis, toolkit, data, science");
    }

    #[test]
    fn test_days_since_update_is_deterministic_for_fixed_reference() {
        let raw = vec![
            raw_repo("a", "2023-12-31T23:59:59Z"),
            raw_repo("b", "2023-12-31 08:00:00"),
        ];
        let first = normalize_repositories(&raw, date(2024, 1, 10));
        let second = normalize_repositories(&raw, date(2024, 1, 10));

        assert_eq!(first.records, second.records);
        assert!(first.records.iter().all(|r| r.days_since_update == 10));
    }

    #[test]
    fn test_invalid_date_drops_only_that_record() {
        let raw = vec![raw_repo("good", "2024-01-01"), raw_repo("bad", "yesterday-ish")];
        let batch = normalize_repositories(&raw, date(2024, 1, 2));

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].repo_name, "good");
        assert_eq!(batch.dropped.len(), 1);
        assert_eq!(batch.dropped[0].key, "owner/bad");
        assert_eq!(batch.dropped[0].source_name, GITHUB_SOURCE);
    }

    #[test]
    fn test_empty_collections_normalize_to_empty_tables() {
        let reference = date(2024, 1, 1);
        let repos = normalize_repositories(&[], reference);
        let datasets = normalize_datasets(&[], reference);
        assert!(repos.records.is_empty() && repos.dropped.is_empty());
        assert!(datasets.records.is_empty() && datasets.dropped.is_empty());
    }

    #[test]
    fn test_language_percentages_order_and_rounding() {
        let languages = BTreeMap::from([
            ("Rust".to_string(), 1),
            ("Python".to_string(), 2),
            ("C".to_string(), 1),
        ]);
        assert_eq!(
            language_percentages(&languages),
            "Python: 50.0%, C: 25.0%, Rust: 25.0%"
        );
        assert_eq!(language_percentages(&BTreeMap::new()), "");
        assert_eq!(
            language_percentages(&BTreeMap::from([("Go".to_string(), 0)])),
            ""
        );
    }

    #[test]
    fn test_main_topics_keeps_first_five() {
        let topics: Vec<String> = (1..=7).map(|i| format!("t{}", i)).collect();
        assert_eq!(main_topics(&topics), "t1, t2, t3, t4, t5");
        assert_eq!(main_topics(&[]), "");
    }

    #[test]
    fn test_normalize_dataset_derived_fields() {
        let batch = normalize_datasets(&[raw_dataset("ds1", 1000)], date(2024, 1, 11));
        let ds = &batch.records[0];

        assert!((ds.popularity_score - 660.0).abs() < 1e-9);
        assert_eq!(ds.days_since_update, 10);
        assert_eq!(ds.dataset_tags, "data-science, finance");
        assert_eq!(ds.tags.len(), 2);
        assert_eq!(ds.size, "1.50 KB");
        assert_eq!(ds.license_name, "");
    }

    #[test]
    fn test_popularity_score_is_linear_in_downloads() {
        let base = popularity_score(1000, 500, 50);
        let doubled = popularity_score(2000, 500, 50);
        assert!((doubled - base - 0.5 * 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1023), "1023.00 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(1u64 << 50), "1.00 PB");
    }

    #[test]
    fn test_parse_record_date_shapes() {
        let expected = Some(date(2024, 2, 29));
        assert_eq!(parse_record_date("2024-02-29"), expected);
        assert_eq!(parse_record_date("2024-02-29T10:11:12Z"), expected);
        assert_eq!(parse_record_date("2024-02-29T10:11:12.345"), expected);
        assert_eq!(parse_record_date("2024-02-29 10:11:12"), expected);
        assert_eq!(parse_record_date("29/02/2024"), None);
        assert_eq!(parse_record_date(""), None);
    }

    #[test]
    fn test_offset_timestamps_use_utc_calendar_date() {
        // 23:30 at UTC-5 is already the next day in UTC
        assert_eq!(
            parse_record_date("2024-01-01T23:30:00-05:00"),
            Some(date(2024, 1, 2))
        );
        assert_eq!(
            parse_record_date("2024-01-02T01:00:00+03:00"),
            Some(date(2024, 1, 1))
        );

        let batch = normalize_repositories(
            &[raw_repo("late", "2024-01-01T23:30:00-05:00")],
            date(2024, 1, 10),
        );
        assert_eq!(batch.records[0].days_since_update, 8);
    }
}
