//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier and failing fast when the seed is unreachable
//! - Dispatching fetches with bounded concurrency and per-host spacing
//! - Routing fetched pages to the listing, detail or commits stage
//! - Retrying transient failures and degrading exhausted ones
//! - Honouring an external stop signal
//!
//! The coordinator is the only code that mutates the frontier, scheduler and
//! aggregator. Fetch tasks receive an owned entry and hand it back with the
//! result, so no crawl state is shared between tasks.

use crate::config::Config;
use crate::crawler::fetcher::{FetchError, FetchedPage, HttpFetcher, PageFetcher, RetryPolicy};
use crate::crawler::frontier::{Frontier, FrontierEntry, PageKind, PageTag};
use crate::crawler::route::{self, NewEntry, ParseOutput};
use crate::crawler::scheduler::Scheduler;
use crate::output::Aggregator;
use crate::record::RepositoryRecord;
use crate::state::{CrawlPhase, PageState};
use crate::url::resolve_seed;
use crate::ScoutError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;
use url::Url;

/// How a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The frontier was exhausted
    Completed,

    /// A stop was requested; the records are those finalized before it
    Stopped,
}

impl CrawlOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Stopped => "stopped",
        }
    }
}

/// Counters collected during a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Successful fetches of any kind
    pub pages_fetched: u32,

    /// Fetches that failed after retries were exhausted
    pub fetch_failures: u32,

    /// Attempts repeated after a transient failure
    pub retries: u32,

    /// Listing pages fetched successfully
    pub listing_pages: u32,

    /// Repository URLs discovered more than once and dropped
    pub duplicates_dropped: u32,

    /// Records built from a failed detail or commits fetch
    pub degraded_records: u32,

    /// Pending entries discarded because of a stop request
    pub abandoned: u32,
}

/// Everything a crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// The resolved seed listing URL
    pub seed: String,

    /// Finalized records, in discovery order
    pub records: Vec<RepositoryRecord>,

    pub outcome: CrawlOutcome,

    pub stats: CrawlStats,

    pub started_at: DateTime<Utc>,

    pub elapsed: Duration,
}

/// Requests a running crawl to stop
///
/// Cloneable and cheap; triggering it more than once is harmless.
#[derive(Debug, Clone)]
pub struct StopHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.sender.borrow()
    }
}

/// A fetch that has been handed to the fetcher
struct InFlight {
    entry: FrontierEntry,
    attempt: u32,
    result: Result<FetchedPage, FetchError>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    retry: RetryPolicy,
    timeout: Duration,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl Coordinator {
    /// Creates a coordinator around an arbitrary fetcher
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration
    /// * `fetcher` - The collaborator that retrieves page markup
    pub fn new(config: Config, fetcher: Arc<dyn PageFetcher>) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let retry = RetryPolicy::from_config(&config.crawler);
        let timeout = Duration::from_secs(config.crawler.timeout_secs.max(1));

        Self {
            config: Arc::new(config),
            fetcher,
            retry,
            timeout,
            stop_tx: Arc::new(stop_tx),
            stop_rx,
        }
    }

    /// Creates a coordinator that fetches over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ScoutError)` - The HTTP client could not be built
    pub fn from_config(config: Config) -> Result<Self, ScoutError> {
        let timeout = Duration::from_secs(config.crawler.timeout_secs.max(1));
        let fetcher = HttpFetcher::new(&config.user_agent, timeout)?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    /// Returns a handle that stops this coordinator's crawl
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            sender: Arc::clone(&self.stop_tx),
        }
    }

    /// Runs the crawl to completion or until stopped
    ///
    /// The seed listing is fetched first and on its own. If it cannot be
    /// fetched the crawl ends with [`ScoutError::SeedUnreachable`] before
    /// any other work. After that the crawl always yields a report.
    pub async fn run(&mut self) -> Result<CrawlReport, ScoutError> {
        let started_at = Utc::now();
        let start_time = Instant::now();
        let seed = resolve_seed(&self.config.seed)?;

        tracing::info!("Starting crawl of {}", seed);

        let mut run = CrawlRun::new(&self.config);
        if !run.frontier.enqueue(seed.clone(), PageKind::Listing { page_number: 1 }) {
            return Err(ScoutError::UrlError(crate::UrlError::Malformed(
                seed.to_string(),
            )));
        }

        let mut phase = CrawlPhase::Running;
        let mut stopping = false;
        let mut in_flight: JoinSet<InFlight> = JoinSet::new();
        let concurrency = self.config.crawler.concurrency.max(1) as usize;

        loop {
            if !stopping && *self.stop_rx.borrow_and_update() {
                stopping = true;
                phase = phase.advance(CrawlPhase::Draining);
                run.abandon_pending();
            }

            while !stopping && in_flight.len() < concurrency {
                let Some(entry) = run.frontier.dequeue() else {
                    break;
                };
                let entry = dispatch_state(entry)?;
                let slot = run.scheduler.reserve(&entry.url);
                self.spawn_fetch(&mut in_flight, entry, 0, slot);
            }

            if in_flight.is_empty() {
                if run.frontier.is_empty() || stopping {
                    break;
                }
                continue;
            }

            tokio::select! {
                joined = in_flight.join_next() => {
                    let Some(joined) = joined else { continue };
                    match joined {
                        Ok(done) => {
                            if let Some(retry) = self.handle_completion(&mut run, done, stopping)? {
                                let slot = run
                                    .scheduler
                                    .reserve_at(&retry.entry.url, Instant::now() + retry.backoff);
                                self.spawn_fetch(&mut in_flight, retry.entry, retry.attempt, slot);
                            }
                        }
                        Err(e) => {
                            tracing::error!("Fetch task failed: {}", e);
                            run.stats.fetch_failures += 1;
                        }
                    }
                }
                changed = self.stop_rx.changed(), if !stopping => {
                    if changed.is_err() || *self.stop_rx.borrow() {
                        tracing::info!(
                            "Stop requested, waiting for {} in-flight fetches",
                            in_flight.len()
                        );
                        stopping = true;
                        phase = phase.advance(CrawlPhase::Draining);
                        run.abandon_pending();
                    }
                }
            }
        }

        phase = phase.advance(CrawlPhase::Done);
        let outcome = if stopping {
            CrawlOutcome::Stopped
        } else {
            CrawlOutcome::Completed
        };

        run.stats.duplicates_dropped += run.aggregator.duplicates();
        let report = CrawlReport {
            seed: seed.to_string(),
            records: run.aggregator.into_records(),
            outcome,
            stats: run.stats,
            started_at,
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Crawl {} ({}): {} repositories, {} pages fetched, {} failures in {:?}",
            outcome.as_str(),
            phase,
            report.records.len(),
            report.stats.pages_fetched,
            report.stats.fetch_failures,
            report.elapsed
        );

        Ok(report)
    }

    fn spawn_fetch(
        &self,
        in_flight: &mut JoinSet<InFlight>,
        entry: FrontierEntry,
        attempt: u32,
        slot: Instant,
    ) {
        let fetcher = Arc::clone(&self.fetcher);
        let timeout = self.timeout;

        tracing::debug!(
            "Dispatching {} {} (attempt {})",
            entry.kind.tag(),
            entry.url,
            attempt + 1
        );

        in_flight.spawn(async move {
            tokio::time::sleep_until(tokio::time::Instant::from_std(slot)).await;

            // The attempt runs in its own task so a panicking fetcher still
            // hands the entry back
            let url = entry.url.clone();
            let mut attempt_task = JoinSet::new();
            attempt_task.spawn(async move {
                match tokio::time::timeout(timeout, fetcher.fetch(&url)).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::timeout(&url)),
                }
            });
            let result = match attempt_task.join_next().await {
                Some(Ok(result)) => result,
                Some(Err(e)) => Err(FetchError::aborted(&entry.url, e.to_string())),
                None => Err(FetchError::aborted(&entry.url, "fetch task missing")),
            };

            InFlight {
                entry,
                attempt,
                result,
            }
        });
    }

    /// Applies one finished fetch to the crawl state
    ///
    /// Returns a retry to schedule when the failure is transient and the
    /// policy allows another attempt.
    fn handle_completion(
        &self,
        run: &mut CrawlRun,
        done: InFlight,
        stopping: bool,
    ) -> Result<Option<Retry>, ScoutError> {
        let InFlight {
            mut entry,
            attempt,
            result,
        } = done;

        let output = match result {
            Ok(page) => {
                entry.state = entry.state.transition(PageState::Parsed)?;
                run.stats.pages_fetched += 1;
                self.route_page(run, entry, &page)
            }
            Err(error) => {
                if !stopping {
                    if let Some(backoff) = self.retry.next_delay(&error, attempt) {
                        tracing::debug!(
                            "Retrying {} in {:?} after {}",
                            entry.url,
                            backoff,
                            error
                        );
                        run.stats.retries += 1;
                        return Ok(Some(Retry {
                            entry,
                            attempt: attempt + 1,
                            backoff,
                        }));
                    }
                }

                // Only the seed is page 1; nothing else is in flight with it
                if entry.kind == (PageKind::Listing { page_number: 1 }) {
                    return Err(ScoutError::SeedUnreachable {
                        url: entry.url.to_string(),
                        source: error,
                    });
                }

                entry.state = entry.state.transition(PageState::FetchFailed)?;
                run.stats.fetch_failures += 1;
                match entry.kind.tag() {
                    PageTag::Listing => {
                        tracing::warn!("Listing page {} failed, pagination ends: {}", entry.url, error)
                    }
                    PageTag::Detail | PageTag::Commits => {
                        tracing::warn!("Degrading {} after failure: {}", entry.url, error);
                        run.stats.degraded_records += 1;
                    }
                }
                route::route_failure(entry.kind)
            }
        };

        run.apply(output, stopping);
        Ok(None)
    }

    fn route_page(&self, run: &mut CrawlRun, entry: FrontierEntry, page: &FetchedPage) -> ParseOutput {
        match entry.kind {
            PageKind::Listing { page_number } => {
                run.stats.listing_pages += 1;
                route::route_listing(
                    &page.body,
                    &entry.url,
                    page_number,
                    self.config.crawler.max_pages,
                )
            }
            PageKind::Detail { stub } => route::route_detail(
                &page.body,
                stub,
                self.config.crawler.follow_commits_page,
            ),
            PageKind::Commits { stub, fields } => route::route_commits(&page.body, &stub, fields),
        }
    }
}

/// A failed entry waiting for another attempt
struct Retry {
    entry: FrontierEntry,
    attempt: u32,
    backoff: Duration,
}

/// Mutable state of a single crawl run
struct CrawlRun {
    frontier: Frontier,
    scheduler: Scheduler,
    aggregator: Aggregator,
    stats: CrawlStats,
}

impl CrawlRun {
    fn new(config: &Config) -> Self {
        Self {
            frontier: Frontier::new(),
            scheduler: Scheduler::from_config(&config.crawler),
            aggregator: Aggregator::new(),
            stats: CrawlStats::default(),
        }
    }

    /// Applies routed output: queue new entries, then record finished ones
    ///
    /// Once stopping, nothing new is fetched. A repository waiting on its
    /// commits page is finished from the detail fields it carries, and any
    /// other new page counts as abandoned.
    fn apply(&mut self, output: ParseOutput, stopping: bool) {
        let (enqueue, mut emit) = output.into_parts();

        for NewEntry { url, kind } in enqueue {
            let tag = kind.tag();
            let shown = url.to_string();

            if stopping {
                if tag == PageTag::Commits {
                    tracing::debug!("Finishing {} without its commits page", shown);
                    let (_, settled) = route::route_failure(kind).into_parts();
                    emit.extend(settled);
                } else if self.frontier.mark_visited(&url) {
                    self.stats.abandoned += 1;
                } else if tag == PageTag::Detail {
                    tracing::warn!("Repository {} discovered twice, dropping", shown);
                    self.stats.duplicates_dropped += 1;
                }
                continue;
            }

            if !self.frontier.enqueue(url, kind) {
                if tag == PageTag::Detail {
                    tracing::warn!("Repository {} discovered twice, dropping", shown);
                    self.stats.duplicates_dropped += 1;
                } else {
                    tracing::debug!("Skipping already known {} {}", tag, shown);
                }
            }
        }

        for record in emit {
            if let Ok(url) = Url::parse(&record.url) {
                // Records finished without a fetch still claim their URL
                if !self.frontier.is_visited(&url) && !self.frontier.mark_visited(&url) {
                    tracing::warn!("Repository {} discovered twice, dropping", record.url);
                    self.stats.duplicates_dropped += 1;
                    continue;
                }
            }
            self.aggregator.insert(record);
        }
    }

    fn abandon_pending(&mut self) {
        let abandoned = self.frontier.drain_pending();
        if !abandoned.is_empty() {
            tracing::info!("Discarding {} pending frontier entries", abandoned.len());
        }
        self.stats.abandoned += abandoned.len() as u32;
    }
}

fn dispatch_state(mut entry: FrontierEntry) -> Result<FrontierEntry, ScoutError> {
    entry.state = entry.state.transition(PageState::Fetching)?;
    Ok(entry)
}

/// Runs a crawl over HTTP with the given configuration
///
/// # Example
///
/// ```no_run
/// use repo_scout::config::load_config;
/// use repo_scout::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_crawl(config).await?;
/// println!("{} repositories", report.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlReport, ScoutError> {
    let mut coordinator = Coordinator::from_config(config)?;
    coordinator.run().await
}
