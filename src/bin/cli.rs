//! Harvester CLI
//!
//! Local execution entry point: one-off crawls, the periodic schedule and
//! history maintenance.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use harvester::{
    error::{AppError, Result},
    models::{Config, RunOutcome},
    pipeline::{self, CrawlOrchestrator, RunLifecycle},
    storage::{LocalStorage, PostingStore},
    utils::http::HttpSource,
};

/// harvester - incremental paste listing crawler
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Incrementally harvests postings from a paginated listing site"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "harvester.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl once, storing new postings
    Crawl,

    /// Crawl on the configured interval until interrupted
    Watch,

    /// Print the number of stored postings
    Count,

    /// Delete every stored posting
    Purge {
        /// Confirm the purge
        #[arg(long)]
        yes: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_outcome(outcome: &RunOutcome) {
    log::info!("New postings: {}", outcome.new_posting_count);
    log::info!("Pages visited: {}", outcome.pages_visited);
    if outcome.details_skipped > 0 {
        log::warn!("Detail pages skipped: {}", outcome.details_skipped);
    }
    if outcome.dates_rejected > 0 {
        log::warn!("Rows with unreadable dates: {}", outcome.dates_rejected);
    }
    log::info!("Stopped: {}", outcome.termination);
}

async fn build_orchestrator(config: Arc<Config>) -> Result<CrawlOrchestrator> {
    config.validate()?;
    let source = HttpSource::from_config(&config.crawler)?;
    let storage = LocalStorage::open(&config.storage.path).await?;
    CrawlOrchestrator::new(config, Arc::new(source), Arc::new(storage))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let found = cli.config.exists();
    let config = Config::load_or_default(&cli.config)?;
    init_logging(cli.verbose, &config.logging.level);

    if !found {
        log::warn!("No config at {}, using defaults", cli.config.display());
    }
    let config = Arc::new(config);

    match cli.command {
        Command::Crawl => {
            let orchestrator = build_orchestrator(Arc::clone(&config)).await?;
            let outcome = orchestrator.run().await;
            print_outcome(&outcome);
            if let Some(reason) = outcome.failure() {
                return Err(AppError::crawl(config.crawler.start_url.as_str(), reason));
            }
        }

        Command::Watch => {
            let orchestrator = build_orchestrator(Arc::clone(&config)).await?;
            let lifecycle = Arc::new(RunLifecycle::new());

            let signal_lifecycle = Arc::clone(&lifecycle);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::info!("Interrupt received, stopping after the current run");
                    signal_lifecycle.stop();
                }
            });

            pipeline::run_periodic(&orchestrator, &lifecycle, &config.schedule).await;
        }

        Command::Count => {
            let storage = LocalStorage::open(&config.storage.path).await?;
            println!("{}", storage.count().await?);
        }

        Command::Purge { yes } => {
            if !yes {
                log::warn!("Refusing to purge without --yes");
                return Ok(());
            }
            let storage = LocalStorage::open(&config.storage.path).await?;
            let count = storage.count().await?;
            storage.purge().await?;
            log::info!("Purged {} postings from {}", count, storage.path().display());
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (start URL, timeouts, proxies and selectors)");
        }
    }

    Ok(())
}
