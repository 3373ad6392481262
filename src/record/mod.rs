//! Repository data model
//!
//! Stubs come from listing pages, detail fields from repository pages, and
//! the builder merges both into the exported [`RepositoryRecord`].

mod builder;
mod types;

pub use builder::{build, build_degraded, build_empty};
pub use types::{
    DetailFields, RepositoryRecord, RepositoryStub, NO_COMMITS, NO_DESCRIPTION, NO_LANGUAGE,
    UNKNOWN_DATE,
};
