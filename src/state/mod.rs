//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: per-URL fetch state (pending, fetching, parsed, fetch failed)
//! - `CrawlPhase`: global crawl state (running, draining, done)
//! - `HostState`: per-host send-slot bookkeeping for the politeness delay

mod host_state;
mod page_state;

// Re-export main types
pub use host_state::HostState;
pub use page_state::{CrawlPhase, PageState};
