//! Exporter trait and summary types
//!
//! This module defines the trait interface for export formats and the
//! summary derived from a finished crawl.

use crate::crawler::CrawlReport;
use crate::record::{RepositoryRecord, NO_DESCRIPTION};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during export operations
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// The exported document: `repositories: [...]`
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub repositories: &'a [RepositoryRecord],
}

/// Trait for export formats
///
/// An exporter writes the whole record set as one document. Field presence
/// is total: every record carries every key.
pub trait Exporter {
    /// Writes the document for `records` to `writer`
    fn export(&self, records: &[RepositoryRecord], writer: &mut dyn Write) -> ExportResult<()>;

    /// Conventional file extension, without the dot
    fn extension(&self) -> &'static str;
}

/// Summary statistics for a crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub seed: String,
    pub started_at: String,
    pub duration_seconds: f64,
    pub status: String,
    pub config_hash: Option<String>,

    // Overall statistics
    pub total_repositories: u64,
    pub pages_fetched: u64,
    pub listing_pages: u64,
    pub fetch_failures: u64,
    pub retries: u64,
    pub duplicates_dropped: u64,
    pub degraded_records: u64,
    pub abandoned: u64,

    // Data quality
    pub without_description: u64,
    pub without_languages: u64,
    pub without_date: u64,

    // Language breakdown (language -> repositories), most common first
    pub language_breakdown: Vec<(String, u64)>,
}

impl CrawlSummary {
    /// Creates a new empty crawl summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the summary of a finished crawl
    pub fn from_report(report: &CrawlReport) -> Self {
        let records = &report.records;
        let stats = &report.stats;

        let mut languages: HashMap<&str, u64> = HashMap::new();
        for record in records.iter().filter(|r| !r.has_no_languages()) {
            for lang in &record.languages {
                *languages.entry(lang.as_str()).or_insert(0) += 1;
            }
        }
        let mut language_breakdown: Vec<(String, u64)> = languages
            .into_iter()
            .map(|(lang, count)| (lang.to_string(), count))
            .collect();
        language_breakdown.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            seed: report.seed.clone(),
            started_at: report.started_at.to_rfc3339(),
            duration_seconds: report.elapsed.as_secs_f64(),
            status: report.outcome.as_str().to_string(),
            config_hash: None,
            total_repositories: records.len() as u64,
            pages_fetched: stats.pages_fetched.into(),
            listing_pages: stats.listing_pages.into(),
            fetch_failures: stats.fetch_failures.into(),
            retries: stats.retries.into(),
            duplicates_dropped: stats.duplicates_dropped.into(),
            degraded_records: stats.degraded_records.into(),
            abandoned: stats.abandoned.into(),
            without_description: records.iter().filter(|r| r.about == NO_DESCRIPTION).count()
                as u64,
            without_languages: records.iter().filter(|r| r.has_no_languages()).count() as u64,
            without_date: records
                .iter()
                .filter(|r| r.last_updated == crate::record::UNKNOWN_DATE)
                .count() as u64,
            language_breakdown,
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Returns the share of fetches that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages_fetched + self.fetch_failures;
        if attempted == 0 {
            return 0.0;
        }
        (self.pages_fetched as f64 / attempted as f64) * 100.0
    }
}
