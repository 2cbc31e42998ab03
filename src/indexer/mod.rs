//! Indexing pipeline
//!
//! Turns one fetched page into stored Page, Lemma and Index records. Lemma
//! extraction runs before the storage lock is taken; the lemma upserts and
//! postings of a page are then written under one lock acquisition.

use crate::crawler::extract_text;
use crate::lemma::LemmaExtractor;
use crate::storage::{SharedStorage, Storage, StorageResult};
use tracing::debug;

/// Outcome of storing one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredPage {
    pub page_id: i64,
    /// Number of postings written for the page
    pub postings: usize,
}

/// Removes null bytes from a fetched body
pub fn sanitize_content(body: &str) -> String {
    body.replace('\0', "")
}

/// Records the lemmas of an already stored page
///
/// # Arguments
///
/// * `storage` - Shared storage handle
/// * `extractor` - Lemma extractor
/// * `site_id` - Owning site
/// * `page_id` - Page the postings belong to
/// * `content` - Raw HTML of the page
///
/// # Returns
///
/// The number of postings written
pub fn index_content(
    storage: &SharedStorage,
    extractor: &dyn LemmaExtractor,
    site_id: i64,
    page_id: i64,
    content: &str,
) -> StorageResult<usize> {
    let text = extract_text(content);
    let counts = extractor.lemma_counts(&text);
    if counts.is_empty() {
        return Ok(0);
    }

    storage.lock().index_lemmas(site_id, page_id, &counts)
}

/// Stores a fetched page, replacing any prior page with the same path, and
/// indexes its content
///
/// Pages answering with an error status are stored with empty content and
/// produce no postings.
pub fn store_page(
    storage: &SharedStorage,
    extractor: &dyn LemmaExtractor,
    site_id: i64,
    path: &str,
    status_code: u16,
    body: &str,
) -> StorageResult<StoredPage> {
    let content = if status_code < 400 {
        sanitize_content(body)
    } else {
        String::new()
    };

    let page_id = storage
        .lock()
        .replace_page(site_id, path, status_code, &content)?;

    let postings = if content.is_empty() {
        0
    } else {
        index_content(storage, extractor, site_id, page_id, &content)?
    };

    debug!(
        "Stored page {} (site {}, code {}, {} postings)",
        path, site_id, status_code, postings
    );

    Ok(StoredPage { page_id, postings })
}
