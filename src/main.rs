//! Siteseek main entry point
//!
//! This is the command-line interface for the Siteseek crawler and search server.

use anyhow::Context;
use clap::Parser;
use siteseek::api::{serve, AppState};
use siteseek::config::{load_config_with_hash, Config};
use siteseek::crawler::IndexingController;
use siteseek::lemma::{LemmaExtractor, StemmingExtractor};
use siteseek::output::{load_statistics, print_statistics};
use siteseek::search::SearchEngine;
use siteseek::storage::{open_shared_storage, open_storage};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Siteseek: a site crawler and lemma search engine
///
/// Siteseek crawls the configured sites, indexes the lemmas of every page
/// and serves ranked full-text search over HTTP.
#[derive(Parser, Debug)]
#[command(name = "siteseek")]
#[command(version = "1.0.0")]
#[command(about = "A site crawler and lemma search engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be indexed without serving
    #[arg(long, conflicts_with_all = ["stats", "crawl"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "crawl"])]
    stats: bool,

    /// Run one full crawl without serving, then print statistics
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    crawl: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.crawl {
        handle_crawl(config).await?;
    } else {
        handle_serve(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("siteseek=info,warn"),
            1 => EnvFilter::new("siteseek=debug,tower_http=debug,info"),
            2 => EnvFilter::new("siteseek=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Opens storage and wires the controller and search engine into the API state
fn build_state(config: Config) -> anyhow::Result<AppState> {
    let config = Arc::new(config);
    let storage = open_shared_storage(Path::new(&config.storage.database_path))?;
    let extractor: Arc<dyn LemmaExtractor> =
        Arc::new(StemmingExtractor::new(config.crawler.language)?);

    let controller = Arc::new(IndexingController::new(
        config.clone(),
        storage.clone(),
        extractor.clone(),
    )?);
    let search = Arc::new(SearchEngine::new(config.clone(), storage.clone(), extractor)?);

    Ok(AppState {
        config,
        storage,
        controller,
        search,
    })
}

/// Handles the --dry-run mode: validates config and shows what would be indexed
fn handle_dry_run(config: &Config) {
    println!("=== Siteseek Dry Run ===\n");

    println!("Server:");
    println!("  Bind address: {}", config.server.bind_address);

    println!("\nCrawler Configuration:");
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Referrer: {}", config.crawler.referrer);
    println!("  Timeout: {}ms", config.crawler.timeout_ms);
    println!("  Max concurrent tasks: {}", config.crawler.max_concurrent_tasks);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Language: {:?}", config.crawler.language);

    println!("\nSearch:");
    println!(
        "  Popularity threshold: {} ({})",
        config.search.popularity_threshold,
        if config.search.inclusive_threshold {
            "inclusive"
        } else {
            "exclusive"
        }
    );
    println!("  Default limit: {}", config.search.default_limit);
    println!("  Snippet length: {}", config.search.snippet_length);

    println!("\nDatabase: {}", config.storage.database_path);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} ({})", site.name, site.url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let stats = load_statistics(config, &storage, false)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --crawl mode: one full crawl run in the foreground
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let state = build_state(config)?;

    state.controller.start_indexing().await?;
    tokio::select! {
        _ = state.controller.wait_until_idle() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping crawl");
            let _ = state.controller.stop_indexing();
            state.controller.wait_until_idle().await;
        }
    }

    let stats = {
        let storage = state.storage.lock();
        load_statistics(&state.config, &*storage, false)?
    };
    print_statistics(&stats);
    Ok(())
}

/// Handles the default mode: serves the HTTP API
async fn handle_serve(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .context("Invalid bind address")?;
    let state = build_state(config)?;

    serve(state, addr).await?;
    Ok(())
}
