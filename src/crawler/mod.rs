//! Crawler module for repository listing crawls
//!
//! This module contains the core crawling logic, including:
//! - Field extraction through ordered selector strategies
//! - Listing page parsing and pagination
//! - HTTP fetching and retry policy
//! - The deduplicating frontier and per-host scheduling
//! - Overall crawl coordination

mod backoff;
mod coordinator;
mod extract;
mod fetcher;
mod frontier;
mod parser;
mod route;
mod scheduler;

pub use backoff::ExponentialBackoff;
pub use coordinator::{run_crawl, Coordinator, CrawlOutcome, CrawlReport, CrawlStats, StopHandle};
pub use extract::{
    detect_empty_repository, extract_commit_count, extract_description, extract_detail_fields,
    extract_languages, extract_last_updated, find_commit_count, language_from_label,
    parse_commit_text, parse_timestamp, ListStrategy, Strategy, COMMIT_STRATEGIES,
    DESCRIPTION_STRATEGIES, LANGUAGE_STRATEGIES, TIMESTAMP_STRATEGIES,
};
pub use fetcher::{
    build_http_client, FetchError, FetchErrorKind, FetchedPage, HttpFetcher, PageFetcher,
    RetryPolicy,
};
pub use frontier::{Frontier, FrontierEntry, PageKind, PageTag};
pub use parser::{parse_listing, resolve_link, ListingPage};
pub use route::{route_commits, route_detail, route_failure, route_listing, NewEntry, ParseOutput};
pub use scheduler::Scheduler;
