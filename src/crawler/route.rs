//! Page routing
//!
//! Turns a fetched (or failed) frontier entry into what the crawl should do
//! next: new frontier entries, finished records, or both. These functions
//! parse markup and build records but never touch crawl state; the
//! coordinator applies their output.

use crate::crawler::extract::{detect_empty_repository, extract_detail_fields, find_commit_count};
use crate::crawler::frontier::PageKind;
use crate::crawler::parser::parse_listing;
use crate::record::{self, DetailFields, RepositoryRecord, RepositoryStub};
use crate::url::commits_url;
use scraper::Html;
use url::Url;

/// A URL the coordinator should add to the frontier
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub url: Url,
    pub kind: PageKind,
}

/// Result of routing one page
#[derive(Debug, Clone)]
pub enum ParseOutput {
    /// The page contributed nothing further
    Nothing,

    /// More pages to fetch
    Enqueue(Vec<NewEntry>),

    /// Finished records
    Emit(Vec<RepositoryRecord>),

    /// A listing page can do both
    Both {
        enqueue: Vec<NewEntry>,
        emit: Vec<RepositoryRecord>,
    },
}

impl ParseOutput {
    pub fn from_parts(enqueue: Vec<NewEntry>, emit: Vec<RepositoryRecord>) -> Self {
        match (enqueue.is_empty(), emit.is_empty()) {
            (true, true) => Self::Nothing,
            (false, true) => Self::Enqueue(enqueue),
            (true, false) => Self::Emit(emit),
            (false, false) => Self::Both { enqueue, emit },
        }
    }

    pub fn emit(record: RepositoryRecord) -> Self {
        Self::Emit(vec![record])
    }

    pub fn into_parts(self) -> (Vec<NewEntry>, Vec<RepositoryRecord>) {
        match self {
            Self::Nothing => (Vec::new(), Vec::new()),
            Self::Enqueue(enqueue) => (enqueue, Vec::new()),
            Self::Emit(emit) => (Vec::new(), emit),
            Self::Both { enqueue, emit } => (enqueue, emit),
        }
    }
}

/// Routes a listing page
///
/// Stubs already marked empty are finished on the spot; every other stub
/// becomes a DETAIL entry. The next-page link is followed unless the page
/// cap has been reached.
pub fn route_listing(
    body: &str,
    page_url: &Url,
    page_number: u32,
    max_pages: Option<u32>,
) -> ParseOutput {
    let document = Html::parse_document(body);
    let listing = parse_listing(&document, page_url);

    tracing::debug!(
        "Listing page {} ({}) has {} repositories",
        page_number,
        page_url,
        listing.stubs.len()
    );
    if listing.no_public_repositories {
        tracing::info!("{} has no public repositories", page_url);
    }

    let mut enqueue = Vec::with_capacity(listing.stubs.len() + 1);
    let mut emit = Vec::new();

    for stub in listing.stubs {
        if stub.is_empty {
            tracing::debug!("{} is empty, skipping its detail page", stub.url);
            emit.push(record::build_empty(&stub));
            continue;
        }
        match Url::parse(&stub.url) {
            Ok(url) => enqueue.push(NewEntry {
                url,
                kind: PageKind::Detail { stub },
            }),
            Err(e) => {
                tracing::warn!("Unusable repository URL {}: {}", stub.url, e);
                emit.push(record::build_degraded(&stub));
            }
        }
    }

    match listing.next_page {
        Some(next) if max_pages.map_or(true, |cap| page_number < cap) => {
            enqueue.push(NewEntry {
                url: next,
                kind: PageKind::Listing {
                    page_number: page_number + 1,
                },
            });
        }
        Some(next) => {
            tracing::info!("Page cap of {} reached, not following {}", page_number, next);
        }
        None => tracing::debug!("No next page after page {}", page_number),
    }

    ParseOutput::from_parts(enqueue, emit)
}

/// Routes a repository detail page
///
/// When the page shows no commit count and `follow_commits` is set, the
/// commits page is queued with the fields gathered so far.
pub fn route_detail(body: &str, stub: RepositoryStub, follow_commits: bool) -> ParseOutput {
    let document = Html::parse_document(body);

    if detect_empty_repository(&document) {
        tracing::debug!("{} is an empty repository", stub.url);
        return ParseOutput::emit(record::build_empty(&stub));
    }

    let fields = extract_detail_fields(&document);

    if fields.commits.is_none() && follow_commits {
        if let Ok(repo_url) = Url::parse(&stub.url) {
            return ParseOutput::Enqueue(vec![NewEntry {
                url: commits_url(&repo_url),
                kind: PageKind::Commits { stub, fields },
            }]);
        }
    }

    ParseOutput::emit(record::build(&stub, fields))
}

/// Routes a commit history page, completing the record
pub fn route_commits(body: &str, stub: &RepositoryStub, mut fields: DetailFields) -> ParseOutput {
    let document = Html::parse_document(body);
    fields.commits = find_commit_count(&document);
    ParseOutput::emit(record::build(stub, fields))
}

/// Routes an entry whose fetch failed for good
///
/// Repositories are never dropped: a failed DETAIL yields a degraded record
/// and a failed COMMITS keeps the detail fields. A failed LISTING ends its
/// pagination branch.
pub fn route_failure(kind: PageKind) -> ParseOutput {
    match kind {
        PageKind::Listing { .. } => ParseOutput::Nothing,
        PageKind::Detail { stub } => ParseOutput::emit(record::build_degraded(&stub)),
        PageKind::Commits { stub, fields } => ParseOutput::emit(record::build(&stub, fields)),
    }
}
