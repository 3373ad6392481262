//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing and repository pages and run
//! the full crawl cycle over HTTP, through to the exported document.

use repo_scout::config::{Config, ExportFormat, UserAgentConfig};
use repo_scout::crawler::{Coordinator, CrawlOutcome};
use repo_scout::output::write_export;
use repo_scout::ScoutError;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration seeded at page 1 of the mock listing
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default_for(format!("{}/octocat?page=1&tab=repositories", base_url));
    config.crawler.request_delay_ms = 10; // Very short for testing
    config.crawler.concurrency = 2;
    config.crawler.timeout_secs = 5;
    config.crawler.max_retries = 1;
    config.crawler.retry_backoff_ms = 10;
    config.user_agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: Some("https://example.com/bot".to_string()),
    };
    config
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn listing_page(repos: &[(&str, bool)], next_page: Option<u32>) -> ResponseTemplate {
    let mut body = String::from(r#"<html><body><div id="user-repositories-list"><ul>"#);
    for (name, empty) in repos {
        body.push_str(&format!(
            r#"<li itemprop="owns">
                 <h3><a itemprop="name codeRepository" href="/octocat/{0}">{0}</a></h3>
                 {1}
               </li>"#,
            name,
            if *empty {
                "<span>This repository is empty.</span>"
            } else {
                ""
            }
        ));
    }
    body.push_str("</ul></div>");
    if let Some(n) = next_page {
        body.push_str(&format!(
            r#"<a class="next_page" rel="next" href="/octocat?page={}&amp;tab=repositories">Next</a>"#,
            n
        ));
    }
    body.push_str("</body></html>");
    html(body)
}

fn detail_page(about: &str, labels: &[&str], commits: &str) -> ResponseTemplate {
    let bar: String = labels
        .iter()
        .map(|l| format!(r#"<span class="Progress-item" aria-label="{}"></span>"#, l))
        .collect();
    html(format!(
        r#"<html><body>
             <div class="BorderGrid-cell"><p class="f4 my-3">{}</p></div>
             <relative-time datetime="2024-05-06T07:08:09Z">May 6</relative-time>
             <div>{}</div>
             <a href="/octocat/repo/commits/main"><span><strong>{}</strong> Commits</span></a>
           </body></html>"#,
        about, bar, commits
    ))
}

async fn mount_listing(server: &MockServer, page: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/octocat"))
        .and(query_param("page", page))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_with_pagination() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_listing(
        &mock_server,
        "1",
        listing_page(&[("alpha", false), ("void", true)], Some(2)),
    )
    .await;
    mount_listing(&mock_server, "2", listing_page(&[("beta", false)], Some(3))).await;
    mount_listing(&mock_server, "3", listing_page(&[("gamma", false)], None)).await;

    Mock::given(method("GET"))
        .and(path("/octocat/alpha"))
        .respond_with(detail_page("First one", &["Python 72.3%", "Shell 27.7%"], "1,234"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/octocat/beta"))
        .respond_with(detail_page("Second one", &["Rust 100.0%"], "56"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/octocat/gamma"))
        .respond_with(detail_page("Third one", &["Go 100.0%"], "7"))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Empty repositories are finalized from the listing alone
    Mock::given(method("GET"))
        .and(path("/octocat/void"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let mut coordinator = Coordinator::from_config(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::Completed);
    assert_eq!(report.records.len(), 4);
    assert_eq!(report.stats.listing_pages, 3);

    let alpha = report
        .records
        .iter()
        .find(|r| r.name == "alpha")
        .expect("alpha exported");
    assert_eq!(alpha.about, "First one");
    assert_eq!(alpha.last_updated, "2024-05-06");
    assert_eq!(alpha.languages, vec!["Python", "Shell"]);
    assert_eq!(alpha.commits, "1234");

    let void = report
        .records
        .iter()
        .find(|r| r.name == "void")
        .expect("void exported");
    assert_eq!(void.about, "void");
    assert_eq!(void.languages, vec!["None"]);
    assert_eq!(void.commits, "0");
}

#[tokio::test]
async fn test_failing_detail_page_degrades_record() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_listing(
        &mock_server,
        "1",
        listing_page(&[("healthy", false), ("broken", false)], None),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/octocat/healthy"))
        .respond_with(detail_page("Fine", &["C 100.0%"], "3"))
        .mount(&mock_server)
        .await;

    // One attempt plus one retry
    Mock::given(method("GET"))
        .and(path("/octocat/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let mut coordinator = Coordinator::from_config(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.records.len(), 2);
    let broken = report
        .records
        .iter()
        .find(|r| r.name == "broken")
        .expect("broken exported");
    assert!(broken.url.ends_with("/octocat/broken"));
    assert_eq!(broken.about, "broken");
    assert_eq!(broken.languages, vec!["None"]);
    assert_eq!(broken.commits, "0");
    assert_eq!(report.stats.fetch_failures, 1);
    assert_eq!(report.stats.degraded_records, 1);
}

#[tokio::test]
async fn test_detail_timeout_degrades_record() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_listing(&mock_server, "1", listing_page(&[("slow", false)], None)).await;

    Mock::given(method("GET"))
        .and(path("/octocat/slow"))
        .respond_with(detail_page("Never seen", &[], "9").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url);
    config.crawler.timeout_secs = 1;
    config.crawler.max_retries = 0;

    let mut coordinator = Coordinator::from_config(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].name, "slow");
    assert_eq!(report.records[0].about, "slow");
    assert_eq!(report.records[0].commits, "0");
}

#[tokio::test]
async fn test_commits_page_followed_when_detail_has_no_count() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_listing(&mock_server, "1", listing_page(&[("quiet", false)], None)).await;

    Mock::given(method("GET"))
        .and(path("/octocat/quiet"))
        .respond_with(html(
            r#"<p itemprop="description">No counter on this page</p>"#.to_string(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/octocat/quiet/commits"))
        .respond_with(html(
            r#"<a href="/octocat/quiet/commits"><span>88 Commits</span></a>"#.to_string(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let mut coordinator = Coordinator::from_config(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.records[0].about, "No counter on this page");
    assert_eq!(report.records[0].commits, "88");
}

#[tokio::test]
async fn test_user_agent_header_sent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/octocat"))
        .and(header("user-agent", "TestBot/1.0.0 (+https://example.com/bot)"))
        .respond_with(listing_page(&[], None))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let mut coordinator = Coordinator::from_config(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert!(report.records.is_empty());
}

#[tokio::test]
async fn test_unreachable_seed_is_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/octocat"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let mut coordinator = Coordinator::from_config(config).expect("Failed to create coordinator");
    let result = coordinator.run().await;

    assert!(matches!(result, Err(ScoutError::SeedUnreachable { .. })));
}

#[tokio::test]
async fn test_zero_repository_account_exports_empty_document() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/octocat"))
        .respond_with(html(
            "<p>octocat doesn't have any public repositories yet.</p>".to_string(),
        ))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let mut coordinator = Coordinator::from_config(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");
    assert_eq!(report.outcome, CrawlOutcome::Completed);

    let export_path = temp_dir.path().join("repositories.yaml");
    write_export(&export_path, ExportFormat::Yaml, &report.records).expect("Export failed");

    let document: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
    assert_eq!(
        document["repositories"].as_sequence().map(|s| s.len()),
        Some(0)
    );
}

#[tokio::test]
async fn test_crawl_to_yaml_export() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    mount_listing(
        &mock_server,
        "1",
        listing_page(&[("one", false), ("two", false)], None),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/octocat/one"))
        .respond_with(detail_page("Uno", &["Python 72.3%", "Shell 27.7%"], "10"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/octocat/two"))
        .respond_with(html("<p>nothing useful</p>".to_string()))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url);
    config.crawler.follow_commits_page = false;
    let mut coordinator = Coordinator::from_config(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    let export_path = temp_dir.path().join("repositories.yaml");
    write_export(&export_path, ExportFormat::Yaml, &report.records).expect("Export failed");

    let document: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
    let repos = document["repositories"].as_sequence().expect("sequence");
    assert_eq!(repos.len(), 2);

    for repo in repos {
        for key in ["url", "name", "about", "last_updated", "languages", "commits"] {
            assert!(repo.get(key).is_some(), "missing {}", key);
        }
    }

    let two = repos
        .iter()
        .find(|r| r["name"].as_str() == Some("two"))
        .expect("two exported");
    assert_eq!(two["about"].as_str(), Some("two"));
    assert_eq!(two["last_updated"].as_str(), Some("unknown"));
    assert_eq!(two["languages"][0].as_str(), Some("None"));
    assert_eq!(two["commits"].as_str(), Some("0"));
}
