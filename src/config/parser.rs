use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use siteseek::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Database: {}", config.storage.database_path);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
///
/// Site urls are stored without a trailing slash so that the textual
/// prefix checks used by the crawl scope filter behave consistently.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(content)?;

    for site in &mut config.sites {
        let trimmed = site.url.trim().trim_end_matches('/').to_string();
        site.url = trimmed;
        site.name = site.name.trim().to_string();
    }

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
[server]
bind-address = "0.0.0.0:9000"

[storage]
database-path = "./test.db"

[crawler]
user-agent = "TestBot/1.0"
referrer = "https://example.com"
timeout-ms = 5000
max-concurrent-tasks = 8
language = "english"

[search]
popularity-threshold = 0.8
inclusive-threshold = false

[[sites]]
url = "https://example.com/"
name = "Example"

[[sites]]
url = "https://other.org"
name = "Other"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.crawler.timeout_ms, 5000);
        assert_eq!(config.crawler.max_concurrent_tasks, 8);
        assert_eq!(config.crawler.language, Language::English);
        assert_eq!(config.search.popularity_threshold, 0.8);
        assert!(!config.search.inclusive_threshold);
        assert_eq!(config.sites.len(), 2);
    }

    #[test]
    fn test_site_urls_lose_trailing_slash() {
        let config = parse_config(VALID_CONFIG).unwrap();
        assert_eq!(config.sites[0].url, "https://example.com");
        assert_eq!(config.sites[1].url, "https://other.org");
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_config(
            r#"
[storage]
database-path = "./test.db"
"#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.crawler.timeout_ms, 10_000);
        assert_eq!(config.crawler.language, Language::Russian);
        assert_eq!(config.search.default_limit, 20);
        assert_eq!(config.search.snippet_length, 300);
        assert!(config.search.inclusive_threshold);
        assert!(config.sites.is_empty());
    }

    #[test]
    fn test_site_lookup_by_prefix() {
        let config = parse_config(VALID_CONFIG).unwrap();
        let site = config.site_for_url("https://example.com/docs/page").unwrap();
        assert_eq!(site.name, "Example");
        assert!(config.site_for_url("https://elsewhere.net/").is_none());
        assert_eq!(config.site_by_url("https://other.org/").unwrap().name, "Other");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[storage]
database-path = "./test.db"

[crawler]
max-concurrent-tasks = 0
"#;
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
