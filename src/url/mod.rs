//! URL handling module for repo-scout
//!
//! This module provides URL normalization (the frontier's dedup key), host
//! extraction for politeness bookkeeping, and resolution of the seed target
//! into a listing URL.

mod host;
mod normalize;

use crate::config::SeedConfig;
use crate::UrlError;
use url::Url;

// Re-export main functions
pub use host::{extract_host, is_same_host};
pub use normalize::{normalize_parsed, normalize_url};

/// Resolves the configured seed into the first listing page URL
///
/// A target containing `://` is taken as an absolute listing URL. Anything
/// else is treated as an account name and expanded to
/// `{base-url}/{name}?tab=repositories`.
///
/// # Examples
///
/// ```
/// use repo_scout::config::SeedConfig;
/// use repo_scout::url::resolve_seed;
///
/// let seed = SeedConfig {
///     target: "octocat".to_string(),
///     base_url: "https://github.com".to_string(),
/// };
/// let url = resolve_seed(&seed).unwrap();
/// assert_eq!(url.as_str(), "https://github.com/octocat?tab=repositories");
/// ```
pub fn resolve_seed(seed: &SeedConfig) -> Result<Url, UrlError> {
    let target = seed.target.trim();

    if target.contains("://") {
        return normalize_url(target);
    }

    let base = Url::parse(&seed.base_url).map_err(|e| UrlError::Parse(e.to_string()))?;
    let mut listing = base
        .join(&format!("/{}", target.trim_matches('/')))
        .map_err(|e| UrlError::Malformed(e.to_string()))?;
    listing.set_query(Some("tab=repositories"));

    normalize_parsed(listing)
}

/// Builds the commit history URL for a repository detail URL
pub fn commits_url(repository: &Url) -> Url {
    let mut url = repository.clone();
    let path = format!("{}/commits", repository.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(None);
    url
}
