use crate::config::types::{Config, CrawlerConfig, OutputConfig, SeedConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Largest worker count accepted; anything higher defeats the politeness delay
const MAX_CONCURRENCY: u32 = 8;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_seed_config(&config.seed)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the seed target and base URL
fn validate_seed_config(config: &SeedConfig) -> Result<(), ConfigError> {
    let target = config.target.trim();
    if target.is_empty() {
        return Err(ConfigError::Validation(
            "seed target cannot be empty".to_string(),
        ));
    }

    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if target.contains("://") {
        Url::parse(target).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", target, e))
        })?;
    } else if !is_valid_username(target) {
        return Err(ConfigError::Validation(format!(
            "seed target '{}' is neither a URL nor a valid username",
            target
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_delay_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request-delay-ms must be >= 100ms, got {}ms",
            config.request_delay_ms
        )));
    }

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1 when set".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.summary_path, Some(p) if p.is_empty()) {
        return Err(ConfigError::Validation(
            "summary-path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Account names: alphanumerics and single inner hyphens, at most 39 chars
fn is_valid_username(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 39
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(is_valid_username("octocat"));
        assert!(is_valid_username("dimas-fahrza"));
        assert!(is_valid_username("a1"));

        assert!(!is_valid_username(""));
        assert!(!is_valid_username("-leading"));
        assert!(!is_valid_username("trailing-"));
        assert!(!is_valid_username("double--hyphen"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username(&"x".repeat(40)));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_for("octocat");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_seed_url_accepted() {
        let config = Config::default_for("https://github.com/octocat?tab=repositories");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_delay_floor() {
        let mut config = Config::default_for("octocat");
        config.crawler.request_delay_ms = 50;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = Config::default_for("octocat");
        config.crawler.concurrency = 0;
        assert!(validate(&config).is_err());

        config.crawler.concurrency = 9;
        assert!(validate(&config).is_err());

        config.crawler.concurrency = 4;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_max_pages_rejected() {
        let mut config = Config::default_for("octocat");
        config.crawler.max_pages = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_crawler_name() {
        let mut config = Config::default_for("octocat");
        config.user_agent.crawler_name = "bad name!".to_string();
        assert!(validate(&config).is_err());
    }
}
