//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and error classification
//! - HTML parsing, link extraction and text extraction
//! - The per-run crawl context (visited set, cancellation flag, worker pool)
//! - The recursive fork-join crawl task
//! - The indexing controller that starts and stops runs

mod context;
mod controller;
mod fetcher;
mod parser;
mod task;

pub use context::CrawlRun;
pub use controller::{IndexedPage, IndexingController, IndexingError};
pub use fetcher::{build_http_client, FetchResult, Fetcher};
pub use parser::{extract_text, extract_title, parse_html, ParsedPage};
pub use task::{crawl_page, CrawlFuture};
