//! Indexing controller - start/stop orchestration of crawl runs
//!
//! The controller owns the active run slot. Starting indexing resets every
//! configured site, creates a fresh `CrawlRun` and spawns one root task per
//! site on a background task. Stopping cancels the run cooperatively.

use crate::config::Config;
use crate::crawler::context::CrawlRun;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::task::crawl_page;
use crate::indexer::store_page;
use crate::lemma::LemmaExtractor;
use crate::state::{SiteLifecycle, SiteStatus, MAIN_PAGE_UNAVAILABLE, STOPPED_BY_USER};
use crate::storage::{SharedStorage, Storage, StorageError};
use crate::url::{parse_index_page_request, relative_path, validate_http_url};
use crate::{SeekError, UrlError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info};

/// Errors returned by indexing control operations
#[derive(Debug, Error)]
pub enum IndexingError {
    #[error("Indexing is already running")]
    AlreadyRunning,

    #[error("Indexing is not running")]
    NotRunning,

    #[error("This page is outside the sites listed in the configuration file")]
    OutsideConfiguredSites,

    #[error("Invalid page url: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Failed to fetch page: {0}")]
    Fetch(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Outcome of a single-page index request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPage {
    pub site_url: String,
    pub path: String,
    pub status_code: u16,
    pub postings: usize,
}

type ActiveRun = Arc<Mutex<Option<Arc<CrawlRun>>>>;

/// Starts, stops and tracks crawl runs
pub struct IndexingController {
    config: Arc<Config>,
    storage: SharedStorage,
    extractor: Arc<dyn LemmaExtractor>,
    fetcher: Fetcher,
    active: ActiveRun,
    runs: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl IndexingController {
    /// Creates an idle controller
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration (site list and crawler settings)
    /// * `storage` - Shared storage handle
    /// * `extractor` - Lemma extractor used for every indexed page
    pub fn new(
        config: Arc<Config>,
        storage: SharedStorage,
        extractor: Arc<dyn LemmaExtractor>,
    ) -> Result<Self, SeekError> {
        let fetcher = Fetcher::new(&config.crawler)?;
        Ok(Self {
            config,
            storage,
            extractor,
            fetcher,
            active: Arc::new(Mutex::new(None)),
            runs: tokio::sync::Mutex::new(Vec::new()),
        })
    }

    /// Returns true while a crawl run is active
    pub fn is_indexing(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Starts a crawl run over every configured site
    ///
    /// Each site's stored data is deleted and its row recreated as INDEXING
    /// before this returns; the crawl itself continues in the background.
    pub async fn start_indexing(&self) -> Result<(), IndexingError> {
        let run = {
            let mut active = self.active.lock();
            if active.is_some() {
                return Err(IndexingError::AlreadyRunning);
            }
            let run = Arc::new(CrawlRun::new(
                &self.config.crawler,
                self.fetcher.clone(),
                self.storage.clone(),
                self.extractor.clone(),
            ));
            *active = Some(run.clone());
            run
        };

        let sites = match self.reset_sites() {
            Ok(sites) => sites,
            Err(e) => {
                self.release(&run);
                return Err(e.into());
            }
        };

        info!("Indexing started for {} sites", sites.len());
        let handle = tokio::spawn(run_sites(run, sites, self.active.clone()));

        let mut runs = self.runs.lock().await;
        runs.retain(|handle| !handle.is_finished());
        runs.push(handle);
        Ok(())
    }

    /// Cancels the active crawl run
    ///
    /// The slot is cleared immediately; tasks already fetching finish their
    /// request and then unwind, driving unfinished sites to FAILED.
    pub fn stop_indexing(&self) -> Result<(), IndexingError> {
        let run = self
            .active
            .lock()
            .take()
            .ok_or(IndexingError::NotRunning)?;
        run.cancel();
        info!("Indexing stopped by user");
        Ok(())
    }

    /// Waits until every spawned run has finished unwinding
    pub async fn wait_until_idle(&self) {
        let handles: Vec<_> = self.runs.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Crawl run ended abnormally: {}", e);
            }
        }
    }

    /// Fetches and indexes a single page of a configured site
    ///
    /// # Arguments
    ///
    /// * `request` - Raw url, or a form-encoded `url=<encoded>` body
    ///
    /// # Returns
    ///
    /// * `Ok(IndexedPage)` - The page was stored (error statuses are stored empty)
    /// * `Err(IndexingError)` - The url is outside the configured sites or could not be fetched
    pub async fn index_page(&self, request: &str) -> Result<IndexedPage, IndexingError> {
        let url = parse_index_page_request(request);
        let site = self
            .config
            .site_for_url(&url)
            .ok_or(IndexingError::OutsideConfiguredSites)?;
        validate_http_url(&url)?;

        let (status_code, body) = match self.fetcher.fetch(&url).await {
            FetchResult::Success {
                status_code, body, ..
            } => (status_code, body),
            FetchResult::HttpError { status_code } => (status_code, String::new()),
            FetchResult::ContentMismatch { content_type } => {
                return Err(IndexingError::Fetch(format!(
                    "{} is not an HTML page ({})",
                    url, content_type
                )))
            }
            FetchResult::NetworkError { error } => return Err(IndexingError::Fetch(error)),
        };

        let (site_id, created) = {
            let mut storage = self.storage.lock();
            match storage.get_site_by_url(&site.url)? {
                Some(record) => (record.id, false),
                None => {
                    info!("Creating site {} for single page indexing", site.url);
                    let record = storage.insert_site(&site.url, &site.name, SiteStatus::Indexing)?;
                    (record.id, true)
                }
            }
        };

        let path = relative_path(&url, &site.url);
        info!("Saving page {}", url);
        let stored = store_page(
            &self.storage,
            self.extractor.as_ref(),
            site_id,
            &path,
            status_code,
            &body,
        )?;

        {
            let mut storage = self.storage.lock();
            if created {
                storage.update_site_status(site_id, SiteStatus::Indexed, "")?;
            } else {
                storage.touch_site(site_id)?;
            }
        }

        Ok(IndexedPage {
            site_url: site.url.clone(),
            path,
            status_code,
            postings: stored.postings,
        })
    }

    /// Deletes every configured site's data and recreates its row as INDEXING
    fn reset_sites(&self) -> Result<Vec<Arc<SiteLifecycle>>, StorageError> {
        let mut storage = self.storage.lock();
        let mut sites = Vec::with_capacity(self.config.sites.len());

        for entry in &self.config.sites {
            if storage.delete_site(&entry.url)? {
                info!("Deleted stored data of {}", entry.url);
            }
            let record = storage.insert_site(&entry.url, &entry.name, SiteStatus::Indexing)?;
            sites.push(Arc::new(SiteLifecycle::new(&record, self.storage.clone())));
        }

        Ok(sites)
    }

    fn release(&self, run: &Arc<CrawlRun>) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|current| Arc::ptr_eq(current, run)) {
            *active = None;
        }
    }
}

/// Runs the root task of every site and finalizes the run
async fn run_sites(run: Arc<CrawlRun>, sites: Vec<Arc<SiteLifecycle>>, active: ActiveRun) {
    let started = Instant::now();

    let mut roots = JoinSet::new();
    for site in &sites {
        roots.spawn(crawl_page(run.clone(), site.clone(), site.url().to_string()));
    }
    while let Some(joined) = roots.join_next().await {
        if let Err(e) = joined {
            error!("Root crawl task ended abnormally: {}", e);
        }
    }

    let reason = if run.is_active() {
        MAIN_PAGE_UNAVAILABLE
    } else {
        STOPPED_BY_USER
    };
    for site in &sites {
        if site.status() == SiteStatus::Indexing {
            site.mark_failed(reason);
        }
    }

    info!(
        "Crawl run finished in {:.1}s, {} urls visited",
        started.elapsed().as_secs_f64(),
        run.visited_count()
    );

    let mut slot = active.lock();
    if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, &run)) {
        *slot = None;
    }
}
