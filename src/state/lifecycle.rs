//! Per-site indexing lifecycle
//!
//! Crawl tasks of one site share a `SiteLifecycle`. Status transitions are a
//! check-then-set under the site's lock, so only the first terminal
//! transition of a run is persisted.

use crate::state::SiteStatus;
use crate::storage::{SharedStorage, SiteRecord, Storage};
use crate::url::{is_site_root, relative_path};
use parking_lot::Mutex;
use tracing::{error, info, warn};

/// Last error recorded when a run is cancelled
pub const STOPPED_BY_USER: &str = "Indexing stopped by user";

/// Last error recorded when a run ends without the root page completing
pub const MAIN_PAGE_UNAVAILABLE: &str = "Main page is unavailable";

/// Builds the last error recorded when the root page answers with an error status
pub fn root_http_error(status_code: u16) -> String {
    format!("Main page returned HTTP {}", status_code)
}

/// Tracks one site through a crawl run
///
/// Every status change goes through a check-then-set under the site's own
/// lock, so a late success from one branch cannot overwrite a failure
/// recorded by a sibling.
pub struct SiteLifecycle {
    site_id: i64,
    url: String,
    name: String,
    status: Mutex<SiteStatus>,
    storage: SharedStorage,
}

impl SiteLifecycle {
    /// Creates a lifecycle handle for a stored site row
    pub fn new(record: &SiteRecord, storage: SharedStorage) -> Self {
        Self {
            site_id: record.id,
            url: record.url.clone(),
            name: record.name.clone(),
            status: Mutex::new(record.status),
            storage,
        }
    }

    pub fn site_id(&self) -> i64 {
        self.site_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current status
    pub fn status(&self) -> SiteStatus {
        *self.status.lock()
    }

    /// Marks the site INDEXED
    ///
    /// Returns false if the site already reached a terminal state.
    pub fn mark_indexed(&self) -> bool {
        let changed = self.transition(SiteStatus::Indexed, "");
        if changed {
            info!("Site {} indexed", self.url);
        }
        changed
    }

    /// Marks the site FAILED with the given last error
    ///
    /// Returns false if the site already reached a terminal state.
    pub fn mark_failed(&self, last_error: &str) -> bool {
        let changed = self.transition(SiteStatus::Failed, last_error);
        if changed {
            error!("Site {} failed: {}", self.url, last_error);
        }
        changed
    }

    /// Refreshes the stored status time while the site is still indexing
    pub fn refresh_status_time(&self) {
        let status = self.status.lock();
        if *status != SiteStatus::Indexing {
            return;
        }
        if let Err(e) = self.storage.lock().touch_site(self.site_id) {
            warn!("Failed to refresh status time of {}: {}", self.url, e);
        }
    }

    /// Returns true if `url` is this site's root page
    pub fn is_root(&self, url: &str) -> bool {
        is_site_root(url, &self.url)
    }

    /// Returns the site-relative path of a page url
    pub fn relative_path(&self, url: &str) -> String {
        relative_path(url, &self.url)
    }

    fn transition(&self, next: SiteStatus, last_error: &str) -> bool {
        let mut status = self.status.lock();
        if !status.can_transition_to(next) {
            return false;
        }

        if let Err(e) = self
            .storage
            .lock()
            .update_site_status(self.site_id, next, last_error)
        {
            error!("Failed to store status {} for {}: {}", next, self.url, e);
            return false;
        }

        *status = next;
        true
    }
}
