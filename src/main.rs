//! Sitewalk main entry point
//!
//! This is the command-line interface for the Sitewalk site crawler.

use anyhow::{Context, Result};
use clap::Parser;
use sitewalk::config::{load_config_with_hash, AuthMode, Config};
use sitewalk::crawler::Coordinator;
use sitewalk::index::VectorIndex;
use sitewalk::output::{
    format_report, load_statistics, print_statistics, write_results, SqlitePageSink,
};
use sitewalk::storage::SqliteStorage;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Sitewalk: a single-site breadth-first crawler
///
/// Sitewalk crawls one site from a seed URL, extracts the readable text of
/// every page, and writes the results to JSON (and optionally SQLite and a
/// vector index). Logged-in sessions are kept alive by logging in again when
/// they expire.
#[derive(Parser, Debug)]
#[command(name = "sitewalk")]
#[command(version)]
#[command(about = "A single-site breadth-first crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "search"])]
    dry_run: bool,

    /// Show statistics from the page database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "search"])]
    stats: bool,

    /// Search the vector index and exit
    #[arg(long, value_name = "QUERY", conflicts_with_all = ["dry_run", "stats"])]
    search: Option<String>,

    /// Number of search results to show
    #[arg(long, default_value_t = 5, requires = "search")]
    top_k: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(query) = &cli.search {
        handle_search(&config, query, cli.top_k).await?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitewalk=info,warn"),
            1 => EnvFilter::new("sitewalk=debug,info"),
            2 => EnvFilter::new("sitewalk=trace,debug"),
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

fn mask(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "********",
        None => "(not set)",
    }
}

/// Handles the --dry-run mode: shows the effective configuration with secrets masked
fn handle_dry_run(config: &Config) {
    println!("=== Sitewalk Dry Run ===\n");

    let crawler = &config.crawler;
    println!("Crawler Configuration:");
    println!("  Seed URL: {}", crawler.seed_url);
    match crawler.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unbounded"),
    }
    println!(
        "  Delay: {}s{}",
        crawler.delay_seconds,
        if crawler.stealth { " (randomized, stealth)" } else { "" }
    );
    println!("  Request timeout: {}s", crawler.request_timeout_seconds);
    println!("  Preview length: {} characters", crawler.preview_length);
    println!("  Workers: {}", crawler.workers);

    if !crawler.stealth {
        println!("\nUser Agent:");
        println!("  {}", config.user_agent.header_value());
    }

    let auth = &config.auth;
    println!("\nAuthentication:");
    println!("  Mode: {}", auth.mode.as_str());
    match auth.mode {
        AuthMode::None => {}
        AuthMode::Basic => {
            println!("  Username: {}", auth.username.as_deref().unwrap_or("(not set)"));
            println!("  Password: {}", mask(&auth.password));
        }
        AuthMode::Cookies => {
            let names: Vec<&str> = auth.cookies.keys().map(String::as_str).collect();
            println!("  Cookies: {}", names.join(", "));
        }
        AuthMode::AutoCookies => {
            println!("  Login URL: {}", auth.login_url.as_deref().unwrap_or("(not set)"));
            println!("  Username: {}", auth.username.as_deref().unwrap_or("(not set)"));
            println!("  Password: {}", mask(&auth.password));
            println!(
                "  Form fields: {} / {}",
                auth.username_field, auth.password_field
            );
            println!("  Expiry statuses: {:?}", auth.expiry.statuses);
        }
        AuthMode::Headers => {
            println!("  Bearer token: {}", mask(&auth.bearer_token));
        }
    }

    println!("\nOutput:");
    println!("  Results: {}", config.output.results_path);
    println!(
        "  Database: {}",
        config.output.database_path.as_deref().unwrap_or("(disabled)")
    );

    let vectors = &config.vector_store;
    if vectors.enabled {
        println!("\nVector Store:");
        println!("  Path: {}", vectors.path);
        println!("  Collection: {}", vectors.collection);
        println!("  Embedder: {:?}", vectors.embedder);
        println!("  API key: {}", mask(&vectors.api_key));
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", crawler.seed_url);
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<()> {
    let path = config
        .output
        .database_path
        .as_deref()
        .context("No database-path configured under [output]")?;

    println!("Database: {}\n", path);

    let storage = SqliteStorage::new(Path::new(path))
        .with_context(|| format!("Failed to open database {}", path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --search mode: queries the vector index
async fn handle_search(config: &Config, query: &str, top_k: usize) -> Result<()> {
    let index = VectorIndex::from_config(&config.vector_store)
        .context("Failed to open vector index")?;

    println!(
        "Searching '{}' in {} ({} pages)\n",
        query,
        index.collection(),
        index.count()?
    );

    let hits = index.search(query, top_k).await?;
    if hits.is_empty() {
        println!("No results");
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{}. {} [{}] (distance {:.4})",
            rank + 1,
            if hit.title.is_empty() { "(untitled)" } else { hit.title.as_str() },
            hit.url,
            hit.distance
        );
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> Result<()> {
    let results_path = PathBuf::from(&config.output.results_path);
    let database_path = config.output.database_path.clone();
    let vector_store = config.vector_store.clone();

    tracing::info!(
        "Crawling {} (max pages: {}, auth: {})",
        config.crawler.seed_url,
        config
            .crawler
            .max_pages
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unbounded".to_string()),
        config.auth.mode.as_str()
    );

    let mut coordinator = Coordinator::new(config).context("Failed to set up crawler")?;

    if let Some(path) = &database_path {
        let storage = SqliteStorage::new(Path::new(path))
            .with_context(|| format!("Failed to open database {}", path))?;
        coordinator = coordinator.with_sink(Arc::new(SqlitePageSink::new(Arc::new(Mutex::new(
            storage,
        )))));
    }

    if vector_store.enabled {
        let index =
            VectorIndex::from_config(&vector_store).context("Failed to open vector index")?;
        coordinator = coordinator.with_sink(Arc::new(index));
    }

    let token = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight pages");
            token.cancel();
        }
    });

    let report = coordinator.run().await;

    write_results(&results_path, &report.pages)
        .with_context(|| format!("Failed to write {}", results_path.display()))?;

    tracing::info!(
        "Crawl {}: {} pages, {} failures",
        report.state,
        report.pages.len(),
        report.failures.len()
    );
    print!("{}", format_report(&report));

    Ok(())
}
