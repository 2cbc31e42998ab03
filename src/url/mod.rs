//! URL handling module for Siteseek
//!
//! This module decides which discovered links belong to a crawl, maps page
//! urls to site-relative paths and decodes single-page index requests.

mod scope;

pub use scope::{
    dedup_key, has_excluded_extension, is_eligible_link, is_site_root, is_within_site,
    parse_index_page_request, relative_path, validate_http_url, EXCLUDED_EXTENSIONS,
};
