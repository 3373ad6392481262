use serde::Deserialize;

/// Main configuration structure for repo-scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub seed: SeedConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds a configuration with default settings for the given seed target
    pub fn default_for(target: impl Into<String>) -> Self {
        Self {
            seed: SeedConfig {
                target: target.into(),
                base_url: default_base_url(),
            },
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Where the crawl starts
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// A username or an absolute listing URL
    pub target: String,

    /// Host used to resolve a bare username into a listing URL
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Number of fetches allowed in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Maximum number of listing pages to follow
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first failed attempt
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay of the exponential retry backoff (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Fetch the commits page when the detail page shows no commit count
    #[serde(rename = "follow-commits-page", default = "default_true")]
    pub follow_commits_page: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
            concurrency: default_concurrency(),
            max_pages: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            follow_commits_page: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "repo-scout".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the exported document
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Serialization format of the exported document
    #[serde(default)]
    pub format: ExportFormat,

    /// Optional path for a markdown crawl summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: ExportFormat::default(),
            summary_path: None,
        }
    }
}

/// Supported export document formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Yaml,
    Json,
}

fn default_base_url() -> String {
    "https://github.com".to_string()
}

fn default_request_delay_ms() -> u64 {
    1500
}

fn default_concurrency() -> u32 {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_output_path() -> String {
    "repositories.yaml".to_string()
}
