//! Field extraction from repository pages
//!
//! The target markup is maintained by a third party and changes without
//! notice, so every field is read through an ordered table of named
//! strategies. The first strategy yielding a non-blank value wins; when all
//! of them miss, the field takes its documented default. Nothing in here
//! performs I/O or returns an error.

use crate::record::{DetailFields, UNKNOWN_DATE};
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// A named extraction strategy yielding at most one value
#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub run: fn(&Html) -> Option<String>,
}

/// A named extraction strategy yielding a list of values
#[derive(Clone, Copy)]
pub struct ListStrategy {
    pub name: &'static str,
    pub run: fn(&Html) -> Vec<String>,
}

/// Description lookups, newest layout last; structured markup first
pub const DESCRIPTION_STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "itemprop-description",
        run: |page| {
            first_text_or_content(page, r#"[itemprop="description"]"#)
        },
    },
    Strategy {
        name: "about-sidebar",
        run: |page| first_text(page, "p.f4.my-3"),
    },
    Strategy {
        name: "border-grid-cell",
        run: |page| first_text(page, "div.BorderGrid-cell p.f4"),
    },
    Strategy {
        name: "description-test-id",
        run: |page| first_text(page, r#"p[data-test-id="repository-description"]"#),
    },
    Strategy {
        name: "muted-paragraph",
        run: |page| first_text(page, "p.color-fg-muted.mb-0"),
    },
    Strategy {
        name: "secondary-paragraph",
        run: |page| first_text(page, "p.color-text-secondary.mb-0"),
    },
];

/// Machine-readable timestamp attributes, in lookup order
pub const TIMESTAMP_STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "relative-time",
        run: |page| first_attr(page, "relative-time[datetime]", "datetime"),
    },
    Strategy {
        name: "time-ago",
        run: |page| first_attr(page, "time-ago[datetime]", "datetime"),
    },
    Strategy {
        name: "local-time",
        run: |page| first_attr(page, "local-time[datetime]", "datetime"),
    },
];

/// Language lookups: breakdown widget labels, then itemprop, then filter links
pub const LANGUAGE_STRATEGIES: &[ListStrategy] = &[
    ListStrategy {
        name: "language-bar-labels",
        run: |page| {
            all_attrs(
                page,
                "span.Progress-item[aria-label], \
                 .repository-lang-stats-graph span.language-color[aria-label]",
                "aria-label",
            )
            .iter()
            .filter_map(|label| language_from_label(label))
            .collect()
        },
    },
    ListStrategy {
        name: "itemprop-language",
        run: |page| all_texts(page, r#"span[itemprop="programmingLanguage"]"#),
    },
    ListStrategy {
        name: "language-filter-links",
        run: language_filter_links,
    },
];

/// Commit count lookups; each returns the first candidate text carrying digits
pub const COMMIT_STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "commits-link",
        run: commits_link_text,
    },
    Strategy {
        name: "commits-test-id",
        run: |page| first_numeric_text(page, r#"strong[data-test-id="commits"]"#),
    },
    Strategy {
        name: "commits-tab",
        run: |page| first_numeric_text(page, "li.Commits .d-none.d-sm-inline"),
    },
];

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("digit pattern is valid"));

/// Extracts the repository description, if any strategy finds one
pub fn extract_description(page: &Html) -> Option<String> {
    first_match(page, DESCRIPTION_STRATEGIES, "description")
}

/// Extracts the last-update date as `YYYY-MM-DD`, or `"unknown"`
///
/// Timestamp markup is decorative; a missing or malformed value never fails
/// the record.
pub fn extract_last_updated(page: &Html) -> String {
    first_match(page, TIMESTAMP_STRATEGIES, "last_updated")
        .and_then(|raw| {
            let parsed = parse_timestamp(&raw);
            if parsed.is_none() {
                tracing::debug!("Malformed timestamp {:?}, using sentinel", raw);
            }
            parsed
        })
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// Extracts the repository's languages in first-seen order
///
/// Returns an empty list when no strategy finds anything; the record builder
/// substitutes the `"None"` sentinel.
pub fn extract_languages(page: &Html) -> Vec<String> {
    for strategy in LANGUAGE_STRATEGIES {
        let found = dedup_preserving_order((strategy.run)(page));
        if !found.is_empty() {
            tracing::trace!("languages matched by strategy {}", strategy.name);
            return found;
        }
    }
    Vec::new()
}

/// Finds the commit count, distinguishing "not shown" from zero
pub fn find_commit_count(page: &Html) -> Option<u64> {
    first_match(page, COMMIT_STRATEGIES, "commits").and_then(|text| parse_commit_text(&text))
}

/// Extracts the commit count, defaulting to 0 when none is shown
pub fn extract_commit_count(page: &Html) -> u64 {
    find_commit_count(page).unwrap_or(0)
}

/// Returns true if the page carries a "repository is empty" marker
///
/// An empty repository short-circuits all other extraction.
pub fn detect_empty_repository(page: &Html) -> bool {
    let marker_blocks = all_texts(page, ".blankslate, .BlankState");
    if marker_blocks.iter().any(|text| mentions_empty_repository(text)) {
        return true;
    }

    let body = page.root_element().text().collect::<String>();
    body.contains("This repository is empty")
}

/// Runs every detail-page extractor
pub fn extract_detail_fields(page: &Html) -> DetailFields {
    let last_updated = extract_last_updated(page);
    DetailFields {
        about: extract_description(page),
        last_updated: (last_updated != UNKNOWN_DATE).then_some(last_updated),
        languages: extract_languages(page),
        commits: find_commit_count(page),
    }
}

/// Parses an ISO-8601 timestamp to calendar-date precision
///
/// A trailing `Z` is normalized to `+00:00`. Bare dates are accepted as-is.
///
/// # Examples
///
/// ```
/// use repo_scout::crawler::parse_timestamp;
///
/// assert_eq!(parse_timestamp("2024-03-05T10:20:30Z"), Some("2024-03-05".to_string()));
/// assert_eq!(parse_timestamp("yesterday"), None);
/// ```
pub fn parse_timestamp(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let normalized = match raw.strip_suffix('Z') {
        Some(stem) => format!("{}+00:00", stem),
        None => raw.to_string(),
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(ts.format("%Y-%m-%d").to_string());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Parses the first run of digits in a commit label, ignoring separators
///
/// # Examples
///
/// ```
/// use repo_scout::crawler::parse_commit_text;
///
/// assert_eq!(parse_commit_text("1,234 Commits"), Some(1234));
/// assert_eq!(parse_commit_text("Commits"), None);
/// ```
pub fn parse_commit_text(text: &str) -> Option<u64> {
    let found = DIGITS.find(text)?;
    found.as_str().replace(',', "").parse().ok()
}

/// Reads a language name out of a breakdown label such as `"Python 72.3%"`
///
/// The name is the token before the first space, so `"Jupyter Notebook 12.5%"`
/// yields `"Jupyter"`. Labels without a space carry no percentage and are
/// skipped.
pub fn language_from_label(label: &str) -> Option<String> {
    let (name, _) = label.trim().split_once(' ')?;
    (!name.is_empty()).then(|| name.to_string())
}

fn first_match(page: &Html, strategies: &[Strategy], field: &str) -> Option<String> {
    for strategy in strategies {
        if let Some(value) = (strategy.run)(page).filter(|v| !v.trim().is_empty()) {
            tracing::trace!("{} matched by strategy {}", field, strategy.name);
            return Some(value.trim().to_string());
        }
    }
    tracing::trace!("{} not found by any strategy", field);
    None
}

fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

fn mentions_empty_repository(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("repository is empty") || lower.contains("empty repository")
}

fn language_filter_links(page: &Html) -> Vec<String> {
    let (Some(links), Some(spans)) = (selector(r#"a[href*="search?l="]"#), selector("span"))
    else {
        return Vec::new();
    };

    page.select(&links)
        .filter_map(|link| {
            link.select(&spans)
                .map(clean_text)
                .find(|t| !t.is_empty())
                .or_else(|| Some(clean_text(link)).filter(|t| !t.is_empty()))
        })
        .collect()
}

fn commits_link_text(page: &Html) -> Option<String> {
    let links = selector(r#"a[href*="/commits"]"#)?;
    let spans = selector("span")?;

    // Anchors labelled as commit counters first, then any commits anchor
    let anchors: Vec<ElementRef> = page.select(&links).collect();
    let (labelled, other): (Vec<_>, Vec<_>) = anchors
        .into_iter()
        .partition(|a| clean_text(*a).to_lowercase().contains("commit"));

    labelled.into_iter().chain(other).find_map(|anchor| {
        anchor
            .select(&spans)
            .map(clean_text)
            .chain(std::iter::once(clean_text(anchor)))
            .find(|text| parse_commit_text(text).is_some())
    })
}

fn first_numeric_text(page: &Html, css: &str) -> Option<String> {
    all_texts(page, css)
        .into_iter()
        .find(|text| parse_commit_text(text).is_some())
}

/// Compiles a CSS selector, logging instead of failing on bad input
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::warn!("Invalid selector {:?}: {}", css, e);
            None
        }
    }
}

/// Element text with whitespace runs collapsed
pub(crate) fn clean_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(page: &Html, css: &str) -> Option<String> {
    all_texts(page, css).into_iter().next()
}

fn first_text_or_content(page: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    page.select(&sel)
        .map(|el| match el.value().attr("content") {
            Some(content) => content.trim().to_string(),
            None => clean_text(el),
        })
        .find(|t| !t.is_empty())
}

fn all_texts(page: &Html, css: &str) -> Vec<String> {
    let Some(sel) = selector(css) else {
        return Vec::new();
    };
    page.select(&sel)
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .collect()
}

fn first_attr(page: &Html, css: &str, attr: &str) -> Option<String> {
    all_attrs(page, css, attr).into_iter().next()
}

fn all_attrs(page: &Html, css: &str, attr: &str) -> Vec<String> {
    let Some(sel) = selector(css) else {
        return Vec::new();
    };
    page.select(&sel)
        .filter_map(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
