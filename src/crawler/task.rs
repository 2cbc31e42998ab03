//! Recursive crawl task
//!
//! A task fetches one url, stores and indexes the page, then forks one child
//! task per eligible link and joins them all before returning. The tree of
//! tasks under a site's root is the crawl of that site.

use crate::crawler::context::CrawlRun;
use crate::crawler::fetcher::FetchResult;
use crate::crawler::parser::parse_html;
use crate::indexer::store_page;
use crate::state::{root_http_error, SiteLifecycle, STOPPED_BY_USER};
use crate::url::is_eligible_link;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

/// Boxed crawl task future
pub type CrawlFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Crawls `url` and everything reachable from it inside the site
///
/// # Arguments
///
/// * `run` - Context of the current crawl run
/// * `site` - Lifecycle handle of the site being crawled
/// * `url` - Absolute url to fetch
pub fn crawl_page(run: Arc<CrawlRun>, site: Arc<SiteLifecycle>, url: String) -> CrawlFuture {
    Box::pin(async move {
        if !run.is_active() {
            site.mark_failed(STOPPED_BY_USER);
            return;
        }

        if !run.claim(&url) {
            return;
        }

        let links = {
            let Some(_permit) = run.acquire_worker().await else {
                site.mark_failed(STOPPED_BY_USER);
                return;
            };

            if !run.request_delay().is_zero() {
                tokio::time::sleep(run.request_delay()).await;
            }

            if !run.is_active() {
                site.mark_failed(STOPPED_BY_USER);
                return;
            }

            match visit(&run, &site, &url).await {
                Some(links) => links,
                None => return,
            }
        };

        let mut children = JoinSet::new();
        for link in links {
            if !run.is_active() {
                break;
            }
            if run.is_visited(&link) {
                continue;
            }
            children.spawn(crawl_page(run.clone(), site.clone(), link));
        }

        while let Some(joined) = children.join_next().await {
            if let Err(e) = joined {
                warn!("Crawl task under {} ended abnormally: {}", url, e);
            }
        }

        if !run.is_active() {
            site.mark_failed(STOPPED_BY_USER);
        } else if site.is_root(&url) {
            site.mark_indexed();
        }
    })
}

/// Fetches and stores one page
///
/// Returns the eligible links of the page (none for an error status page),
/// or None when the task ends without completing its subtree.
async fn visit(run: &CrawlRun, site: &SiteLifecycle, url: &str) -> Option<Vec<String>> {
    let path = site.relative_path(url);

    match run.fetcher().fetch(url).await {
        FetchResult::Success {
            final_url,
            status_code,
            body,
        } => {
            info!("Saving page {}", url);
            if let Err(e) = store_page(
                run.storage(),
                run.extractor(),
                site.site_id(),
                &path,
                status_code,
                &body,
            ) {
                warn!("Failed to store page {}: {}", url, e);
                return None;
            }
            site.refresh_status_time();

            Some(eligible_links(run, site, &final_url, url, &body))
        }

        FetchResult::HttpError { status_code } if status_code >= 500 && site.is_root(url) => {
            site.mark_failed(&root_http_error(status_code));
            None
        }

        FetchResult::HttpError { status_code } => {
            warn!("HTTP {} for {}", status_code, url);
            if let Err(e) = store_page(
                run.storage(),
                run.extractor(),
                site.site_id(),
                &path,
                status_code,
                "",
            ) {
                warn!("Failed to store error page {}: {}", url, e);
            }
            site.refresh_status_time();
            Some(Vec::new())
        }

        FetchResult::ContentMismatch { content_type } => {
            debug!("Skipping {} with content type {}", url, content_type);
            None
        }

        FetchResult::NetworkError { error } => {
            warn!("Failed to fetch {}: {}", url, error);
            None
        }
    }
}

fn eligible_links(
    run: &CrawlRun,
    site: &SiteLifecycle,
    final_url: &str,
    url: &str,
    body: &str,
) -> Vec<String> {
    let Ok(base) = Url::parse(final_url).or_else(|_| Url::parse(url)) else {
        return Vec::new();
    };

    let mut links: Vec<String> = parse_html(body, &base)
        .links
        .into_iter()
        .filter(|link| is_eligible_link(link, site.url()) && !run.is_visited(link))
        .collect();
    links.sort();
    links.dedup();
    links
}
