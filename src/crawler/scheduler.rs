//! Scheduler for per-host rate limiting
//!
//! This module handles:
//! - Per-host request counting
//! - Reserving send slots spaced by the configured delay
//! - Retry slots that honour both the backoff and the host delay

use crate::config::CrawlerConfig;
use crate::state::HostState;
use crate::url::extract_host;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use url::Url;

/// Host key used for URLs without a host
const UNKNOWN_HOST: &str = "";

/// Scheduler hands out send slots per host
///
/// The scheduler is owned by the coordinator, which is the single mutator:
/// every fetch reserves its slot here before it is dispatched, so concurrent
/// fetches against one host still start at least `delay` apart.
#[derive(Debug)]
pub struct Scheduler {
    /// Per-host state tracking
    host_states: HashMap<String, HostState>,

    /// Minimum spacing between requests to one host
    delay: Duration,
}

impl Scheduler {
    /// Creates a new scheduler with the given per-host delay
    pub fn new(delay: Duration) -> Self {
        Self {
            host_states: HashMap::new(),
            delay,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(Duration::from_millis(config.request_delay_ms))
    }

    /// Reserves the next send slot for the URL's host
    ///
    /// # Returns
    ///
    /// The instant the fetch may start. It is `now` when the host is idle.
    pub fn reserve(&mut self, url: &Url) -> Instant {
        self.reserve_at(url, Instant::now())
    }

    /// Reserves a slot no earlier than `not_before`
    ///
    /// Used for retries: the slot respects the backoff as well as the
    /// host's politeness delay.
    pub fn reserve_at(&mut self, url: &Url, not_before: Instant) -> Instant {
        let host = host_key(url);
        let delay = self.delay;
        let state = self.host_states.entry(host.clone()).or_default();
        let slot = state.reserve(delay, not_before);

        tracing::trace!(
            "Reserved slot for {} on {} ({} requests so far)",
            url,
            host,
            state.request_count
        );
        slot
    }
}

#[cfg(test)]
impl Scheduler {
    /// Time until the host could accept another request, if it is busy
    fn time_until_ready(&self, url: &Url, now: Instant) -> Option<Duration> {
        self.host_states
            .get(&host_key(url))
            .and_then(|state| state.time_until_next_request(self.delay, now))
    }

    fn delay(&self) -> Duration {
        self.delay
    }

    fn get_host_state(&self, host: &str) -> Option<&HostState> {
        self.host_states.get(host)
    }

    /// Total requests reserved across all hosts
    fn total_requests(&self) -> u32 {
        self.host_states.values().map(|s| s.request_count).sum()
    }
}

fn host_key(url: &Url) -> String {
    extract_host(url).unwrap_or_else(|| UNKNOWN_HOST.to_string())
}
