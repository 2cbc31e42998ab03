//! Storage module for persisting sites, pages, lemmas and postings
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Site rows and their indexing status
//! - Page records keyed by site-relative path
//! - Lemma frequencies and the per-page postings of the inverted index

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{init_database, SqliteStorage};
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::SiteStatus;
use crate::SeekError;

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Storage handle shared by crawl tasks, the controller and the search engine
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SeekError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SeekError> {
    SqliteStorage::new(path)
}

/// Opens a storage database and wraps it for sharing across tasks
pub fn open_shared_storage(path: &Path) -> Result<SharedStorage, SeekError> {
    Ok(Arc::new(Mutex::new(SqliteStorage::new(path)?)))
}

/// Represents a site in the database
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: String,
    pub last_error: String,
}

/// Represents a page in the database
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    pub path: String,
    pub code: u16,
    pub content: String,
}

/// Represents a lemma of one site
#[derive(Debug, Clone, PartialEq)]
pub struct LemmaRecord {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    /// Number of pages of the site containing the lemma
    pub frequency: u32,
}

/// Represents one posting of the inverted index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub page_id: i64,
    pub lemma_id: i64,
    /// Occurrences of the lemma on the page
    pub rank: f64,
}
