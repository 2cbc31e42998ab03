//! Search module
//!
//! Ranked full-text search over the lemma index:
//! - Query lemmas are filtered by popularity and ordered rarest first
//! - Posting lists are intersected and ranks summed per page
//! - Relevance is normalized by the best page of each site
//! - Results carry a title and a highlighted snippet

mod engine;
mod snippet;

pub use engine::{intersect_postings, SearchEngine, SearchResponse, SearchResult};
pub use snippet::{build_snippet, highlight};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors returned by search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Empty search query")]
    EmptyQuery,

    #[error("The specified site was not found: {0}")]
    SiteNotFound(String),

    #[error("Nothing found")]
    NothingFound,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
