use crate::record::RepositoryRecord;
use std::collections::HashSet;

/// Append-only collection of finished records, keyed by URL
///
/// Records keep discovery order. A second record for a URL already present
/// is logged and dropped.
#[derive(Debug, Default)]
pub struct Aggregator {
    records: Vec<RepositoryRecord>,
    urls: HashSet<String>,
    duplicates: u32,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record, returning false if its URL was already recorded
    pub fn insert(&mut self, record: RepositoryRecord) -> bool {
        if !self.urls.insert(record.url.clone()) {
            tracing::warn!("Duplicate record for {}, dropping", record.url);
            self.duplicates += 1;
            return false;
        }
        tracing::debug!("Recorded {}", record.url);
        self.records.push(record);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records rejected as duplicates
    pub fn duplicates(&self) -> u32 {
        self.duplicates
    }

    pub fn records(&self) -> &[RepositoryRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RepositoryRecord> {
        self.records
    }
}
