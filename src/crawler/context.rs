//! Per-run crawl context
//!
//! One `CrawlRun` is created when indexing starts and dropped when the last
//! task of the run finishes. It is never shared between runs.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::Fetcher;
use crate::lemma::LemmaExtractor;
use crate::storage::SharedStorage;
use crate::url::dedup_key;
use dashmap::DashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};

/// State shared by every crawl task of one run
pub struct CrawlRun {
    /// Urls claimed by a task in this run, keyed by `dedup_key`
    visited: DashSet<String>,

    /// Cleared when the run is stopped
    active: AtomicBool,

    /// Bounds the number of tasks fetching or indexing at once
    workers: Semaphore,

    fetcher: Fetcher,
    storage: SharedStorage,
    extractor: Arc<dyn LemmaExtractor>,
    request_delay: Duration,
}

impl CrawlRun {
    /// Creates a fresh, active run
    pub fn new(
        config: &CrawlerConfig,
        fetcher: Fetcher,
        storage: SharedStorage,
        extractor: Arc<dyn LemmaExtractor>,
    ) -> Self {
        Self {
            visited: DashSet::new(),
            active: AtomicBool::new(true),
            workers: Semaphore::new(config.max_concurrent_tasks.max(1) as usize),
            fetcher,
            storage,
            extractor,
            request_delay: Duration::from_millis(config.request_delay_ms),
        }
    }

    /// Returns true until the run is cancelled
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Cancels the run
    ///
    /// Tasks waiting for a worker slot wake up and return; fetches already in
    /// flight complete normally.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.workers.close();
    }

    /// Claims a url for this run
    ///
    /// Returns true for the first caller only.
    pub fn claim(&self, url: &str) -> bool {
        self.visited.insert(dedup_key(url))
    }

    /// Returns true if some task already claimed the url
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(&dedup_key(url))
    }

    /// Number of urls claimed so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Waits for a worker slot
    ///
    /// Returns None once the run is cancelled.
    pub async fn acquire_worker(&self) -> Option<SemaphorePermit<'_>> {
        self.workers.acquire().await.ok()
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    pub fn extractor(&self) -> &dyn LemmaExtractor {
        self.extractor.as_ref()
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }
}
