//! Repository record builder
//!
//! Merges what the listing page knew about a repository with what its
//! detail page revealed, applying the sentinel defaults so the exported
//! record never has a missing field.

use crate::record::types::{
    DetailFields, RepositoryRecord, RepositoryStub, NO_COMMITS, NO_DESCRIPTION, NO_LANGUAGE,
    UNKNOWN_DATE,
};

/// Builds the final record from a stub and its detail-page fields
///
/// Detail-page values take precedence over listing values. `about` falls
/// back to the repository name, then to [`NO_DESCRIPTION`].
pub fn build(stub: &RepositoryStub, fields: DetailFields) -> RepositoryRecord {
    let about = non_blank(fields.about)
        .or_else(|| non_blank(stub.about.clone()))
        .or_else(|| non_blank(Some(stub.name.clone())))
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    let last_updated = non_blank(fields.last_updated)
        .filter(|d| d != UNKNOWN_DATE)
        .or_else(|| non_blank(stub.last_updated.clone()))
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());

    RepositoryRecord {
        url: stub.url.clone(),
        name: stub.name.clone(),
        about,
        last_updated,
        languages: finalize_languages(fields.languages),
        commits: fields
            .commits
            .map(|c| c.to_string())
            .unwrap_or_else(|| NO_COMMITS.to_string()),
    }
}

/// Builds a record for a repository known to be empty, without a detail fetch
pub fn build_empty(stub: &RepositoryStub) -> RepositoryRecord {
    build(stub, DetailFields::default())
}

/// Builds a record for a repository whose detail page could not be fetched
///
/// Only the stub's own fields survive; languages and commits take their
/// sentinels.
pub fn build_degraded(stub: &RepositoryStub) -> RepositoryRecord {
    build(stub, DetailFields::default())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Drops blanks and duplicates, keeping first-seen order; never returns empty
fn finalize_languages(languages: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(languages.len());
    for lang in languages {
        let lang = lang.trim();
        if lang.is_empty() || lang == NO_LANGUAGE || out.iter().any(|l| l == lang) {
            continue;
        }
        out.push(lang.to_string());
    }

    if out.is_empty() {
        out.push(NO_LANGUAGE.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub() -> RepositoryStub {
        RepositoryStub::new("https://github.com/octocat/hello", "hello")
    }

    #[test]
    fn test_about_falls_back_to_name() {
        let record = build(&stub(), DetailFields::default());
        assert_eq!(record.about, "hello");
    }

    #[test]
    fn test_about_falls_back_to_sentinel() {
        let stub = RepositoryStub::new("https://github.com/octocat/x", "  ");
        let record = build(&stub, DetailFields::default());
        assert_eq!(record.about, NO_DESCRIPTION);
    }

    #[test]
    fn test_detail_about_wins_over_listing_about() {
        let mut stub = stub();
        stub.about = Some("listing text".to_string());
        let fields = DetailFields {
            about: Some("  detail text ".to_string()),
            ..DetailFields::default()
        };
        assert_eq!(build(&stub, fields).about, "detail text");
    }

    #[test]
    fn test_listing_about_used_when_detail_missing() {
        let mut stub = stub();
        stub.about = Some("listing text".to_string());
        assert_eq!(build(&stub, DetailFields::default()).about, "listing text");
    }

    #[test]
    fn test_last_updated_prefers_detail_then_stub() {
        let mut stub = stub();
        stub.last_updated = Some("2023-01-02".to_string());

        let unknown = DetailFields {
            last_updated: Some(UNKNOWN_DATE.to_string()),
            ..DetailFields::default()
        };
        assert_eq!(build(&stub, unknown).last_updated, "2023-01-02");

        let known = DetailFields {
            last_updated: Some("2024-05-06".to_string()),
            ..DetailFields::default()
        };
        assert_eq!(build(&stub, known).last_updated, "2024-05-06");
    }

    #[test]
    fn test_all_fields_populated_from_nothing() {
        let record = build(&stub(), DetailFields::default());
        assert_eq!(record.last_updated, UNKNOWN_DATE);
        assert_eq!(record.languages, vec![NO_LANGUAGE.to_string()]);
        assert_eq!(record.commits, NO_COMMITS);
    }

    #[test]
    fn test_languages_deduplicated_in_order() {
        let fields = DetailFields {
            languages: vec![
                "Rust".to_string(),
                "Shell".to_string(),
                "Rust".to_string(),
                " ".to_string(),
            ],
            commits: Some(42),
            ..DetailFields::default()
        };
        let record = build(&stub(), fields);
        assert_eq!(record.languages, vec!["Rust", "Shell"]);
        assert_eq!(record.commits, "42");
    }

    #[test]
    fn test_empty_repository_record() {
        let mut stub = stub();
        stub.is_empty = true;
        let record = build_empty(&stub);
        assert!(record.has_no_languages());
        assert_eq!(record.commits, "0");
        assert_eq!(record.url, stub.url);
    }

    #[test]
    fn test_degraded_record_keeps_stub_identity() {
        let mut stub = stub();
        stub.about = Some("A greeting".to_string());
        let record = build_degraded(&stub);
        assert_eq!(record.url, "https://github.com/octocat/hello");
        assert_eq!(record.name, "hello");
        assert_eq!(record.about, "A greeting");
        assert!(record.has_no_languages());
        assert_eq!(record.commits, "0");
    }
}
