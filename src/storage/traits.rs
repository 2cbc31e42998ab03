//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::SiteStatus;
use crate::storage::{IndexRecord, LemmaRecord, PageRecord, SiteRecord};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every method is a single read-your-writes operation. Lookup-or-create
/// sequences (lemma upserts, page replacement) are performed inside the
/// implementation so that callers holding the storage lock never race.
pub trait Storage {
    // ===== Site Management =====

    /// Creates a site row with the given status and an empty last error
    fn insert_site(&mut self, url: &str, name: &str, status: SiteStatus)
        -> StorageResult<SiteRecord>;

    /// Gets a site by its root url
    fn get_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    /// Gets a site by ID
    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord>;

    /// Lists every stored site
    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    /// Sets status and last error, refreshing the status time
    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: &str,
    ) -> StorageResult<()>;

    /// Refreshes the status time of a site without changing its status
    fn touch_site(&mut self, site_id: i64) -> StorageResult<()>;

    /// Deletes a site together with its pages, lemmas and postings
    ///
    /// Returns true if a site was deleted.
    fn delete_site(&mut self, url: &str) -> StorageResult<bool>;

    // ===== Page Management =====

    /// Stores a page, replacing any prior page with the same path
    ///
    /// The prior page's postings are removed and the frequency of each
    /// lemma they referenced is decremented.
    ///
    /// # Returns
    ///
    /// The ID of the newly stored page
    fn replace_page(
        &mut self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
    ) -> StorageResult<i64>;

    /// Gets a page by ID
    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord>;

    /// Gets a page by site and path
    fn find_page(&self, site_id: i64, path: &str) -> StorageResult<Option<PageRecord>>;

    /// Checks whether a page with this path is stored for the site
    fn page_exists(&self, site_id: i64, path: &str) -> StorageResult<bool>;

    /// Deletes a page and its postings, decrementing lemma frequencies
    ///
    /// Returns true if a page was deleted.
    fn delete_page(&mut self, site_id: i64, path: &str) -> StorageResult<bool>;

    /// Counts the pages stored for a site
    fn count_pages(&self, site_id: i64) -> StorageResult<u64>;

    // ===== Lemmas and Postings =====

    /// Records the lemma counts of one page
    ///
    /// For each lemma: the lemma row is created or its frequency incremented
    /// (only when the page had no posting for it yet), then the posting is
    /// written with rank equal to the occurrence count.
    ///
    /// # Returns
    ///
    /// The number of postings written
    fn index_lemmas(
        &mut self,
        site_id: i64,
        page_id: i64,
        counts: &HashMap<String, u32>,
    ) -> StorageResult<usize>;

    /// Gets a lemma by site and text
    fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>>;

    /// Gets every posting referencing a lemma
    fn postings_for_lemma(&self, lemma_id: i64) -> StorageResult<Vec<IndexRecord>>;

    /// Gets every posting of a page
    fn postings_for_page(&self, page_id: i64) -> StorageResult<Vec<IndexRecord>>;

    /// Counts the lemmas stored for a site
    fn count_lemmas(&self, site_id: i64) -> StorageResult<u64>;
}
