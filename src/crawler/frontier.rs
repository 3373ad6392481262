//! Crawl frontier
//!
//! A FIFO queue of tagged work items. Every URL is keyed by its normalized
//! form, and a key that is queued or was ever dequeued or claimed is never
//! accepted again, so no URL is fetched twice within a run.

use crate::record::{DetailFields, RepositoryStub};
use crate::state::PageState;
use crate::url::normalize_parsed;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use url::Url;

/// What a frontier URL is fetched for, and the context it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    /// A repository listing page; the seed is page 1
    Listing { page_number: u32 },

    /// A repository detail page for the carried stub
    Detail { stub: RepositoryStub },

    /// The commit history page, fetched when the detail page had no count
    Commits {
        stub: RepositoryStub,
        fields: DetailFields,
    },
}

/// Payload-free tag of a [`PageKind`], for logs and counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageTag {
    Listing,
    Detail,
    Commits,
}

impl PageKind {
    pub fn tag(&self) -> PageTag {
        match self {
            Self::Listing { .. } => PageTag::Listing,
            Self::Detail { .. } => PageTag::Detail,
            Self::Commits { .. } => PageTag::Commits,
        }
    }
}

impl fmt::Display for PageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Listing => "LISTING",
            Self::Detail => "DETAIL",
            Self::Commits => "COMMITS",
        };
        f.write_str(label)
    }
}

/// A queued unit of work
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    /// Normalized URL to fetch
    pub url: Url,

    pub kind: PageKind,

    pub state: PageState,
}

/// FIFO queue with deduplication over queued and visited URLs
#[derive(Debug, Default)]
pub struct Frontier {
    pending: VecDeque<FrontierEntry>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a URL for fetching
    ///
    /// # Returns
    ///
    /// `false` if the URL is already queued or visited (or cannot be
    /// normalized); the frontier is unchanged in that case.
    pub fn enqueue(&mut self, url: Url, kind: PageKind) -> bool {
        let Some(url) = normalize_parsed(url).ok() else {
            return false;
        };
        let key = url.as_str().to_string();

        if self.visited.contains(&key) || self.queued.contains(&key) {
            tracing::trace!("Frontier already knows {}", key);
            return false;
        }

        self.queued.insert(key);
        self.pending.push_back(FrontierEntry {
            url,
            kind,
            state: PageState::Pending,
        });
        true
    }

    /// Takes the oldest queued entry and marks its URL visited
    pub fn dequeue(&mut self) -> Option<FrontierEntry> {
        let entry = self.pending.pop_front()?;
        let key = entry.url.as_str().to_string();
        self.queued.remove(&key);
        self.visited.insert(key);
        Some(entry)
    }

    /// Claims a URL that will never be fetched, such as an empty repository
    ///
    /// Returns `false` if the URL was already queued or visited.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        let Some(key) = dedup_key(url) else {
            return false;
        };
        if self.queued.contains(&key) {
            return false;
        }
        self.visited.insert(key)
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        dedup_key(url).is_some_and(|key| self.visited.contains(&key))
    }

    /// True if the URL is queued or visited
    pub fn contains(&self, url: &Url) -> bool {
        dedup_key(url).is_some_and(|key| self.visited.contains(&key) || self.queued.contains(&key))
    }

    /// Number of entries waiting to be dequeued
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of distinct URLs dequeued or claimed so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Removes and returns every pending entry
    ///
    /// Used when a stop is requested: drained URLs stay known, so they are
    /// not re-queued for the rest of the run.
    pub fn drain_pending(&mut self) -> Vec<FrontierEntry> {
        let drained: Vec<FrontierEntry> = self.pending.drain(..).collect();
        for entry in &drained {
            let key = entry.url.as_str().to_string();
            self.queued.remove(&key);
            self.visited.insert(key);
        }
        drained
    }
}

fn dedup_key(url: &Url) -> Option<String> {
    normalize_parsed(url.clone())
        .ok()
        .map(|u| u.as_str().to_string())
}
