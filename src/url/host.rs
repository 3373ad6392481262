use url::Url;

/// Extracts the politeness key for a URL: lowercase host plus explicit port
///
/// Two servers on the same machine but different ports are distinct hosts
/// for rate-limiting purposes.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use repo_scout::url::extract_host;
///
/// let url = Url::parse("https://GitHub.com/octocat").unwrap();
/// assert_eq!(extract_host(&url), Some("github.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/octocat").unwrap();
/// assert_eq!(extract_host(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns true if both URLs resolve to the same politeness key
pub fn is_same_host(a: &Url, b: &Url) -> bool {
    match (extract_host(a), extract_host(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
