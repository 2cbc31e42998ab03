use crate::{UrlError, UrlResult};
use url::form_urlencoded;
use url::Url;

/// File extensions whose links are never fetched
pub const EXCLUDED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "pdf", "doc", "docx", "xls", "xlsx",
    "ppt", "pptx", "zip", "rar", "tar", "gz", "7z", "mp3", "wav", "mp4", "mkv", "avi", "mov",
    "sql",
];

/// Returns the key under which a url is recorded in a run's visited set
///
/// A site root and the same root with a trailing slash share one key.
pub fn dedup_key(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Returns true if `url` lies under `site_url`
///
/// The site url must be a textual prefix and the remainder must start a new
/// path segment or a query, so `https://a.com` does not cover `https://a.com.evil.org`.
pub fn is_within_site(url: &str, site_url: &str) -> bool {
    match url.strip_prefix(site_url) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

/// Returns true if `url` is the site root itself
pub fn is_site_root(url: &str, site_url: &str) -> bool {
    url == site_url || url.strip_prefix(site_url) == Some("/")
}

/// Returns true if the last path segment carries an excluded extension
///
/// # Arguments
///
/// * `url` - Absolute url of the link
pub fn has_excluded_extension(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };

    let segment = path.rsplit('/').next().unwrap_or("");
    match segment.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            EXCLUDED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Checks whether a discovered link may be crawled for a site
///
/// Visited-set membership is checked separately by the crawl run.
///
/// # Returns
///
/// * `true` - The link is inside the site, has no fragment and is not an excluded file type
/// * `false` - The link is dropped
pub fn is_eligible_link(link: &str, site_url: &str) -> bool {
    is_within_site(link, site_url) && !link.contains('#') && !has_excluded_extension(link)
}

/// Maps a page url to its site-relative path
///
/// The root maps to `/`.
pub fn relative_path(url: &str, site_url: &str) -> String {
    let rest = url.strip_prefix(site_url).unwrap_or(url);
    if rest.is_empty() {
        "/".to_string()
    } else if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    }
}

/// Extracts the target url of a single-page index request
///
/// The body is either the raw url or a form-encoded `url=<encoded>` pair.
pub fn parse_index_page_request(body: &str) -> String {
    let body = body.trim();
    if body.starts_with("url=") {
        if let Some((_, value)) = form_urlencoded::parse(body.as_bytes()).find(|(key, _)| key == "url")
        {
            return value.trim().to_string();
        }
    }
    body.to_string()
}

/// Parses a url and checks that it uses HTTP or HTTPS
pub fn validate_http_url(url: &str) -> UrlResult<Url> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(UrlError::InvalidScheme(other.to_string())),
    }
}
