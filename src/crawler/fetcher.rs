//! Page fetching
//!
//! This module defines the fetch contract the crawler consumes:
//! - `PageFetcher`: one attempt at retrieving a URL's markup
//! - `FetchError`: timeout, HTTP status or network failure
//! - `RetryPolicy`: which failures are retried, how often and how far apart
//!
//! `HttpFetcher` is the reqwest-backed implementation. Retries are scheduled
//! by the coordinator through the politeness scheduler so that a retried
//! request still honours the per-host delay.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::backoff::ExponentialBackoff;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Upper bound on a single retry backoff
const MAX_BACKOFF_MS: u64 = 30_000;

/// Markup retrieved for a URL
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,

    /// HTTP status code
    pub status: u16,

    /// Raw page markup
    pub body: String,
}

/// Classification of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// No response within the configured bound
    Timeout,

    /// The server answered with a non-success status
    Http,

    /// Connection, TLS, DNS or body read failure
    Network,

    /// The fetch task ended without producing a result
    Aborted,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Timeout => "timeout",
            Self::Http => "http error",
            Self::Network => "network error",
            Self::Aborted => "aborted fetch",
        };
        f.write_str(label)
    }
}

/// A failed fetch attempt
#[derive(Debug, Clone, Error)]
#[error("{kind} for {url}{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub status: Option<u16>,
    pub url: String,
    pub message: String,
}

impl FetchError {
    pub fn timeout(url: &Url) -> Self {
        Self {
            kind: FetchErrorKind::Timeout,
            status: None,
            url: url.to_string(),
            message: "request timed out".to_string(),
        }
    }

    pub fn http(url: &Url, status: u16) -> Self {
        Self {
            kind: FetchErrorKind::Http,
            status: Some(status),
            url: url.to_string(),
            message: StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("unexpected status")
                .to_string(),
        }
    }

    pub fn network(url: &Url, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Network,
            status: None,
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn aborted(url: &Url, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Aborted,
            status: None,
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Transient failures worth another attempt
    ///
    /// | Condition | Retried |
    /// |-----------|---------|
    /// | Timeout | yes |
    /// | Network error | yes |
    /// | HTTP 429 | yes |
    /// | HTTP 5xx | yes |
    /// | Other HTTP status | no |
    /// | Aborted fetch task | no |
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            FetchErrorKind::Timeout | FetchErrorKind::Network => true,
            FetchErrorKind::Http => matches!(self.status, Some(429) | Some(500..=599)),
            FetchErrorKind::Aborted => false,
        }
    }
}

/// The fetch collaborator consumed by the coordinator
///
/// Implementations perform a single attempt; retry scheduling is driven by
/// [`RetryPolicy`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: ExponentialBackoff,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff: ExponentialBackoff::new(base_ms, MAX_BACKOFF_MS),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.max_retries, config.retry_backoff_ms)
    }

    /// Returns the backoff before the next attempt, or None when exhausted
    ///
    /// `attempt` is the 0-based number of the attempt that just failed.
    pub fn next_delay(&self, error: &FetchError, attempt: u32) -> Option<Duration> {
        if !error.is_retryable() || attempt >= self.max_retries {
            return None;
        }
        Some(self.backoff.delay(attempt))
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use repo_scout::config::UserAgentConfig;
/// use repo_scout::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent, timeout)?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, &e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(FetchError::http(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(url, &e))?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

fn classify_reqwest_error(url: &Url, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else if error.is_connect() {
        FetchError::network(url, "connection refused")
    } else {
        FetchError::network(url, error.to_string())
    }
}
