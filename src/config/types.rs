use serde::Deserialize;

/// Main configuration structure for Siteseek
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
}

impl Config {
    /// Returns the configured site that `url` belongs to
    pub fn site_for_url(&self, url: &str) -> Option<&SiteEntry> {
        self.sites
            .iter()
            .find(|site| crate::url::is_within_site(url, &site.url))
    }

    /// Returns the configured site with exactly this url
    pub fn site_by_url(&self, url: &str) -> Option<&SiteEntry> {
        let url = url.trim_end_matches('/');
        self.sites.iter().find(|site| site.url == url)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the API listens on
    #[serde(rename = "bind-address", default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Language used by the lemma extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Russian,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Referer header sent with every request
    #[serde(default = "default_referrer")]
    pub referrer: String,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of crawl tasks fetching or indexing at once
    #[serde(rename = "max-concurrent-tasks", default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: u32,

    /// Pause before each fetch (milliseconds)
    #[serde(rename = "request-delay-ms", default)]
    pub request_delay_ms: u64,

    /// Stemming language for lemma extraction
    #[serde(default = "default_language")]
    pub language: Language,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            referrer: default_referrer(),
            timeout_ms: default_timeout_ms(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            request_delay_ms: 0,
            language: default_language(),
        }
    }
}

/// Search and ranking configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Lemmas present on more than this fraction of a site's pages are ignored
    #[serde(rename = "popularity-threshold", default = "default_popularity_threshold")]
    pub popularity_threshold: f64,

    /// Whether a lemma exactly at the threshold is still kept
    #[serde(rename = "inclusive-threshold", default = "default_true")]
    pub inclusive_threshold: bool,

    /// Page size used when a request carries no limit
    #[serde(rename = "default-limit", default = "default_limit")]
    pub default_limit: usize,

    /// Number of characters taken after a snippet match
    #[serde(rename = "snippet-length", default = "default_snippet_length")]
    pub snippet_length: usize,

    /// Fetch result titles from the live page instead of stored content
    #[serde(rename = "live-titles", default = "default_true")]
    pub live_titles: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            popularity_threshold: default_popularity_threshold(),
            inclusive_threshold: true,
            default_limit: default_limit(),
            snippet_length: default_snippet_length(),
            live_titles: true,
        }
    }
}

/// A site to crawl and search
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Root URL of the site (scope anchor for the crawl)
    pub url: String,

    /// Human-readable site name
    pub name: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_user_agent() -> String {
    "SiteseekBot/1.0".to_string()
}

fn default_referrer() -> String {
    "http://www.google.com".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_concurrent_tasks() -> u32 {
    16
}

fn default_language() -> Language {
    Language::Russian
}

fn default_popularity_threshold() -> f64 {
    1.0
}

fn default_limit() -> usize {
    20
}

fn default_snippet_length() -> usize {
    300
}

fn default_true() -> bool {
    true
}
