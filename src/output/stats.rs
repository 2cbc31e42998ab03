//! Statistics generation from the index database
//!
//! This module provides functionality for extracting and displaying
//! per-site indexing statistics from the storage layer.

use crate::config::Config;
use crate::storage::Storage;
use crate::SeekError;
use chrono::DateTime;
use serde::Serialize;

/// Status reported for configured sites that have no stored row
pub const NOT_INDEXED: &str = "NOT_INDEXED";

/// Totals across all configured sites
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalStatistics {
    pub sites: usize,
    pub pages: u64,
    pub lemmas: u64,

    /// Whether a crawl run is active
    pub indexing: bool,
}

/// Figures for one configured site
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStatistics {
    pub url: String,
    pub name: String,
    pub status: String,

    /// Time of the last status change, in milliseconds since the epoch
    pub status_time: i64,
    pub error: String,
    pub pages: u64,
    pub lemmas: u64,
}

/// Indexing statistics summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total: TotalStatistics,
    pub detailed: Vec<DetailedStatistics>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `config` - Configuration holding the site list
/// * `storage` - The storage backend to query
/// * `indexing` - Whether a crawl run is currently active
///
/// # Returns
///
/// * `Ok(Statistics)` - Successfully loaded statistics
/// * `Err(SeekError)` - Failed to query statistics
pub fn load_statistics(
    config: &Config,
    storage: &dyn Storage,
    indexing: bool,
) -> Result<Statistics, SeekError> {
    let mut total = TotalStatistics {
        sites: config.sites.len(),
        pages: 0,
        lemmas: 0,
        indexing,
    };
    let mut detailed = Vec::with_capacity(config.sites.len());

    for entry in &config.sites {
        let item = match storage.get_site_by_url(&entry.url)? {
            Some(site) => DetailedStatistics {
                url: entry.url.clone(),
                name: entry.name.clone(),
                status: site.status.to_string(),
                status_time: DateTime::parse_from_rfc3339(&site.status_time)
                    .map(|t| t.timestamp_millis())
                    .unwrap_or(0),
                error: site.last_error,
                pages: storage.count_pages(site.id)?,
                lemmas: storage.count_lemmas(site.id)?,
            },
            None => DetailedStatistics {
                url: entry.url.clone(),
                name: entry.name.clone(),
                status: NOT_INDEXED.to_string(),
                status_time: 0,
                error: String::new(),
                pages: 0,
                lemmas: 0,
            },
        };

        total.pages += item.pages;
        total.lemmas += item.lemmas;
        detailed.push(item);
    }

    Ok(Statistics { total, detailed })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &Statistics) {
    println!("=== Index Statistics ===\n");

    println!("Overview:");
    println!("  Sites: {}", stats.total.sites);
    println!("  Pages: {}", stats.total.pages);
    println!("  Lemmas: {}", stats.total.lemmas);
    println!("  Indexing: {}", if stats.total.indexing { "yes" } else { "no" });
    println!();

    println!("Sites:");
    for site in &stats.detailed {
        println!("  {} ({})", site.name, site.url);
        println!("    Status: {}", site.status);
        println!("    Pages: {}, Lemmas: {}", site.pages, site.lemmas);
        if !site.error.is_empty() {
            println!("    Last error: {}", site.error);
        }
    }
}
