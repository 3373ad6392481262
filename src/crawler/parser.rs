//! Listing page parser
//!
//! This module turns a repository listing page into:
//! - One `RepositoryStub` per listed repository
//! - The next listing page URL, when a pagination link is present
//!
//! Listing layouts differ between site redesigns, so repository blocks are
//! located with an ordered list of block selectors; the first selector that
//! matches anything decides the layout for the whole page.

use crate::crawler::extract::{clean_text, parse_timestamp, selector};
use crate::record::RepositoryStub;
use crate::url::{is_same_host, normalize_parsed};
use scraper::{ElementRef, Html};
use url::Url;

/// Repository block selectors, one per known listing layout
const BLOCK_SELECTORS: &[&str] = &[
    "#user-repositories-list li",
    r#"li[itemprop="owns"]"#,
    r#"div[data-test-id="repository-list-item"]"#,
    r#"div[class*="repo-list"] div[class*="repo-list-item"]"#,
    "div.Box-row",
];

/// Repository link selectors inside a block
const LINK_SELECTORS: &[&str] = &[
    r#"a[itemprop="name codeRepository"]"#,
    r#"a[data-test-id="repository-link"]"#,
    "h3 a[href]",
];

/// Description selectors inside a block
const ABOUT_SELECTORS: &[&str] = &[
    r#"p[itemprop="description"]"#,
    r#"p[data-test-id="repository-description"]"#,
    "p.color-fg-muted.mb-0",
    "p.color-text-secondary.mb-0",
    "div.py-1 p",
    "p.wb-break-word",
];

/// Pagination link selectors
const NEXT_PAGE_SELECTORS: &[&str] = &["a.next_page[href]", r#"a[rel="next"][href]"#];

/// Everything a listing page contributes to the crawl
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Repositories found on this page, in page order
    pub stubs: Vec<RepositoryStub>,

    /// The following listing page, if any
    pub next_page: Option<Url>,

    /// The page states the account has no public repositories
    pub no_public_repositories: bool,
}

/// Parses a listing page
///
/// # Arguments
///
/// * `document` - The parsed listing page
/// * `page_url` - The URL the page was fetched from, for resolving links
///
/// # Example
///
/// ```
/// use repo_scout::crawler::parse_listing;
/// use scraper::Html;
/// use url::Url;
///
/// let html = Html::parse_document(r#"
///     <ul><li itemprop="owns">
///       <a itemprop="name codeRepository" href="/octocat/hello">hello</a>
///     </li></ul>
///     <a class="next_page" href="/octocat?page=2&tab=repositories">Next</a>"#);
/// let base = Url::parse("https://github.com/octocat?tab=repositories").unwrap();
/// let listing = parse_listing(&html, &base);
/// assert_eq!(listing.stubs[0].url, "https://github.com/octocat/hello");
/// assert!(listing.next_page.is_some());
/// ```
pub fn parse_listing(document: &Html, page_url: &Url) -> ListingPage {
    let blocks = find_repository_blocks(document);

    let stubs: Vec<RepositoryStub> = blocks
        .into_iter()
        .filter_map(|block| parse_block(block, page_url))
        .collect();

    let no_public_repositories = stubs.is_empty()
        && document
            .root_element()
            .text()
            .collect::<String>()
            .contains("doesn't have any public repositories");

    ListingPage {
        stubs,
        next_page: extract_next_page(document, page_url),
        no_public_repositories,
    }
}

fn find_repository_blocks(document: &Html) -> Vec<ElementRef<'_>> {
    for css in BLOCK_SELECTORS {
        let Some(sel) = selector(css) else { continue };
        let blocks: Vec<ElementRef> = document.select(&sel).collect();
        if !blocks.is_empty() {
            tracing::debug!("Found {} repository blocks with {:?}", blocks.len(), css);
            return blocks;
        }
    }
    Vec::new()
}

fn parse_block(block: ElementRef, page_url: &Url) -> Option<RepositoryStub> {
    let link = LINK_SELECTORS
        .iter()
        .filter_map(|css| selector(css))
        .find_map(|sel| {
            block
                .select(&sel)
                .find(|a| a.value().attr("href").is_some())
        })?;

    let href = link.value().attr("href")?;
    let Some(url) = resolve_link(href, page_url) else {
        tracing::debug!("Skipping repository block with unusable link {:?}", href);
        return None;
    };

    let about = ABOUT_SELECTORS
        .iter()
        .filter_map(|css| selector(css))
        .find_map(|sel| block.select(&sel).map(clean_text).find(|t| !t.is_empty()));

    let last_updated = selector("relative-time[datetime]").and_then(|sel| {
        block
            .select(&sel)
            .find_map(|el| el.value().attr("datetime"))
            .and_then(parse_timestamp)
    });

    let is_empty = block
        .text()
        .collect::<String>()
        .contains("This repository is empty");

    Some(RepositoryStub {
        url: url.to_string(),
        name: clean_text(link),
        about,
        last_updated,
        is_empty,
    })
}

fn extract_next_page(document: &Html, page_url: &Url) -> Option<Url> {
    NEXT_PAGE_SELECTORS
        .iter()
        .filter_map(|css| selector(css))
        .find_map(|sel| {
            document
                .select(&sel)
                .filter_map(|a| a.value().attr("href"))
                .find_map(|href| resolve_link(href, page_url))
        })
        .filter(|next| is_same_host(next, page_url))
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize_parsed(absolute).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://github.com/octocat?tab=repositories").unwrap()
    }

    fn parse(html: &str) -> ListingPage {
        parse_listing(&Html::parse_document(html), &base_url())
    }

    #[test]
    fn test_itemprop_layout() {
        let listing = parse(
            r#"<ul>
              <li itemprop="owns">
                <a itemprop="name codeRepository" href="/octocat/hello"> hello </a>
                <p itemprop="description">  Says hello  </p>
                <relative-time datetime="2024-02-10T08:00:00Z">Feb 10</relative-time>
              </li>
              <li itemprop="owns">
                <a itemprop="name codeRepository" href="/octocat/blank">blank</a>
              </li>
            </ul>"#,
        );

        assert_eq!(listing.stubs.len(), 2);
        let first = &listing.stubs[0];
        assert_eq!(first.url, "https://github.com/octocat/hello");
        assert_eq!(first.name, "hello");
        assert_eq!(first.about.as_deref(), Some("Says hello"));
        assert_eq!(first.last_updated.as_deref(), Some("2024-02-10"));
        assert!(!first.is_empty);

        let second = &listing.stubs[1];
        assert_eq!(second.about, None);
        assert_eq!(second.last_updated, None);
        assert!(listing.next_page.is_none());
    }

    #[test]
    fn test_user_repositories_list_layout() {
        let listing = parse(
            r#"<div id="user-repositories-list"><ul>
              <li><h3><a href="/octocat/spoon">spoon</a></h3>
                  <p class="color-fg-muted mb-0">Knife alternative</p></li>
            </ul></div>"#,
        );

        assert_eq!(listing.stubs.len(), 1);
        assert_eq!(listing.stubs[0].url, "https://github.com/octocat/spoon");
        assert_eq!(listing.stubs[0].about.as_deref(), Some("Knife alternative"));
    }

    #[test]
    fn test_empty_marker_in_listing() {
        let listing = parse(
            r#"<li itemprop="owns">
                 <a itemprop="name codeRepository" href="/octocat/void">void</a>
                 <span>This repository is empty.</span>
               </li>"#,
        );
        assert!(listing.stubs[0].is_empty);
    }

    #[test]
    fn test_block_without_link_skipped() {
        let listing = parse(
            r#"<li itemprop="owns"><span>orphan</span></li>
               <li itemprop="owns"><a itemprop="name codeRepository" href="/octocat/ok">ok</a></li>"#,
        );
        assert_eq!(listing.stubs.len(), 1);
        assert_eq!(listing.stubs[0].name, "ok");
    }

    #[test]
    fn test_next_page_resolved() {
        let listing = parse(r#"<a class="next_page" href="/octocat?page=2&amp;tab=repositories">Next</a>"#);
        assert_eq!(
            listing.next_page.unwrap().as_str(),
            "https://github.com/octocat?page=2&tab=repositories"
        );
    }

    #[test]
    fn test_rel_next_page() {
        let listing = parse(r#"<a rel="next" href="?page=3&amp;tab=repositories">Next</a>"#);
        assert_eq!(
            listing.next_page.unwrap().as_str(),
            "https://github.com/octocat?page=3&tab=repositories"
        );
    }

    #[test]
    fn test_offsite_next_page_ignored() {
        let listing = parse(r#"<a class="next_page" href="https://elsewhere.com/page/2">Next</a>"#);
        assert!(listing.next_page.is_none());
    }

    #[test]
    fn test_no_public_repositories_message() {
        let listing = parse("<p>octocat doesn't have any public repositories yet.</p>");
        assert!(listing.stubs.is_empty());
        assert!(listing.no_public_repositories);
    }

    #[test]
    fn test_resolve_link_filters() {
        let base = base_url();
        assert!(resolve_link("javascript:void(0)", &base).is_none());
        assert!(resolve_link("mailto:a@b.c", &base).is_none());
        assert!(resolve_link("#readme", &base).is_none());
        assert!(resolve_link("", &base).is_none());
        assert_eq!(
            resolve_link("/octocat/hello/", &base).unwrap().as_str(),
            "https://github.com/octocat/hello"
        );
    }
}
