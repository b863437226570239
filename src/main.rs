//! Prospect main entry point
//!
//! This is the command-line interface for the Prospect company contact
//! crawler.

use clap::Parser;
use prospect::config::load_config_with_hash;
use prospect::crawler::{FetchPipeline, Orchestrator, SharedStore};
use prospect::extract::ContactExtractor;
use prospect::storage::{CompanyStore, SqliteCompanyStore};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Prospect: a company contact discovery crawler
///
/// Prospect crawls a set of seed pages, follows links discovered within
/// the crawl, extracts company contact information, and persists each
/// newly discovered company once per distinct website.
#[derive(Parser, Debug)]
#[command(name = "prospect")]
#[command(version = "1.0.0")]
#[command(about = "A company contact discovery crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed URL to crawl (repeatable; overrides the configured seed list)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the company database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &cli.seeds)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.seeds).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("prospect=info,warn"),
            1 => EnvFilter::new("prospect=debug,info"),
            2 => EnvFilter::new("prospect=trace,debug"),
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

/// Picks the effective seed list: CLI overrides take precedence
fn effective_seeds(config_seeds: &[String], cli_seeds: &[String]) -> Vec<String> {
    if cli_seeds.is_empty() {
        config_seeds.to_vec()
    } else {
        cli_seeds.to_vec()
    }
}

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(
    config: &prospect::config::Config,
    cli_seeds: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Prospect Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Page budget per task: {}", config.crawler.max_pages_per_task);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay_ms);
    println!("  Max concurrent tasks: {}", config.crawler.max_concurrent_tasks);
    println!(
        "  Queue when saturated: {}",
        config.crawler.queue_when_saturated
    );

    println!("\nFetch:");
    println!("  Request timeout: {}s", config.fetch.request_timeout_secs);
    println!("  Connect timeout: {}s", config.fetch.connect_timeout_secs);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let seeds = effective_seeds(&config.seeds, cli_seeds);
    println!("\nSeed URLs ({}):", seeds.len());
    for seed in &seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} seed URL(s)", seeds.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics from the company database
fn handle_stats(config: &prospect::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let store = SqliteCompanyStore::new(Path::new(&config.output.database_path))?;

    let total = store.count_companies()?;
    let with_contacts = store.find_with_contacts()?;

    println!("Companies discovered: {}", total);
    println!("Companies with contacts: {}", with_contacts.len());

    for company in &with_contacts {
        println!(
            "  - {} ({}): {} email(s), {} phone(s)",
            company.name,
            company.website,
            company.emails.len(),
            company.phones.len()
        );
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: prospect::config::Config,
    cli_seeds: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let seeds = effective_seeds(&config.seeds, &cli_seeds);
    if seeds.is_empty() {
        tracing::error!("No seed URLs: provide them in the config or with --seed");
        return Err(prospect::CrawlerError::NoSeeds.into());
    }

    tracing::info!("Starting crawl with {} seed URL(s)", seeds.len());

    // Open the company database
    let store: SharedStore = Arc::new(Mutex::new(SqliteCompanyStore::new(Path::new(
        &config.output.database_path,
    ))?));

    // Build the fetch pipeline and the orchestrator
    let user_agent = config.user_agent.header_value();
    let pipeline = FetchPipeline::with_default_strategies(&user_agent, &config.fetch)?;
    let orchestrator = Orchestrator::new(
        config,
        pipeline,
        ContactExtractor::new(),
        Arc::clone(&store),
    );

    // Run one task over the seed list and wait for it
    let task_id = orchestrator.start_crawl(seeds)?;
    tracing::info!("Task {} submitted", task_id);

    let snapshot = orchestrator.wait(&task_id).await?;

    let companies = {
        let store = store.lock().unwrap();
        store.count_companies()?
    };

    println!("Task {} finished: {}", snapshot.id, snapshot.status);
    println!("Pages crawled: {}", snapshot.pages_crawled);
    println!("Total pages this run: {}", orchestrator.total_pages_crawled());
    println!("Companies in database: {}", companies);

    Ok(())
}
