use serde::Serialize;

/// Placeholder for a repository with neither description nor name
pub const NO_DESCRIPTION: &str = "no description";

/// Placeholder for a missing or unparseable update timestamp
pub const UNKNOWN_DATE: &str = "unknown";

/// Placeholder language entry when no language signal exists
pub const NO_LANGUAGE: &str = "None";

/// Placeholder commit count when none could be determined
pub const NO_COMMITS: &str = "0";

/// A partially-known repository discovered on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryStub {
    /// Absolute, normalized detail URL; the record's unique key
    pub url: String,

    /// Display name, possibly empty
    pub name: String,

    /// Description shown on the listing, if any
    pub about: Option<String>,

    /// Last update as an ISO date, if the listing carried one
    pub last_updated: Option<String>,

    /// The listing already marks this repository as empty
    pub is_empty: bool,
}

impl RepositoryStub {
    /// Creates a stub with only its key and name known
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            about: None,
            last_updated: None,
            is_empty: false,
        }
    }
}

/// Fields extracted from a repository's detail (and commits) page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub about: Option<String>,
    pub last_updated: Option<String>,
    pub languages: Vec<String>,
    pub commits: Option<u64>,
}

/// The exported entity: one per distinct repository URL
///
/// Every field is always populated; absent data is carried by the sentinel
/// constants in this module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRecord {
    pub url: String,
    pub name: String,
    pub about: String,
    pub last_updated: String,
    pub languages: Vec<String>,
    pub commits: String,
}

impl RepositoryRecord {
    /// True when no language signal was found for this repository
    pub fn has_no_languages(&self) -> bool {
        self.languages.len() == 1 && self.languages[0] == NO_LANGUAGE
    }
}
