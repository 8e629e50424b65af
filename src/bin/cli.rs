//! dealwatch CLI
//!
//! Local execution entry point for scheduled runs.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use dealwatch::{
    error::{AppError, Result},
    models::Config,
    pipeline::Scraper,
    storage::{self, SnapshotStore},
};

/// dealwatch - Discounted listing tracker
#[derive(Parser, Debug)]
#[command(
    name = "dealwatch",
    version,
    about = "Scrapes discounted listings into an atomically committed snapshot"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape every category and commit a new snapshot
    Run {
        /// Run date written into the snapshot (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Validate the configuration file
    Validate,

    /// Show committed snapshot info
    Info,
}

/// Initialize logging. `RUST_LOG` overrides `level`.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let level = match (&loaded, cli.verbose) {
        (_, true) => "debug",
        (Ok(config), false) => config.logging.level.as_str(),
        (Err(_), false) => "info",
    };
    init_logging(level);

    let config = match loaded {
        Ok(config) => {
            log::info!("Loaded configuration from {}", cli.config.display());
            config
        }
        Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!(
                "No config at {}, using built-in defaults",
                cli.config.display()
            );
            Config::default()
        }
        Err(e) => {
            log::error!("Config load failed from {}: {}", cli.config.display(), e);
            return Err(e);
        }
    };

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    let config = Arc::new(config);

    match cli.command {
        Command::Run { date } => {
            let run_date = date.unwrap_or_else(|| Local::now().date_naive());
            let mirror = storage::open_mirror(&config.mirror, &config.output).await?;
            if let Some(mirror) = &mirror {
                log::info!("Publishing partial snapshots to {}", mirror.describe());
            }

            let scraper = Scraper::from_config(Arc::clone(&config))?.with_mirror(mirror);
            if let Err(e) = scraper.run(run_date).await {
                log::error!("Run failed: {}", e);
                return Err(e);
            }
        }

        Command::Validate => {
            log::info!("✓ Config OK");
            log::info!("  Search endpoint: {}", config.api.search_url);
            log::info!(
                "  Paging: {} per page, up to {} pages, {}ms between requests",
                config.scrape.page_size,
                config.scrape.max_pages,
                config.scrape.request_delay_ms
            );
            log::info!(
                "  Retries: {} after the first attempt, {}ms apart",
                config.scrape.max_retries,
                config.scrape.retry_delay_ms
            );
            for category in &config.categories {
                log::info!("  Category {} ({})", category.key, category.display_name());
            }
            log::info!(
                "  Mirror: {}",
                if config.mirror.is_configured() {
                    "configured"
                } else {
                    "none"
                }
            );
        }

        Command::Info => {
            let store = SnapshotStore::from_config(&config.output);
            log::info!("Snapshot: {}", store.snapshot_path().display());

            let deals = store.load_previous().await?;
            if deals.is_empty() {
                log::info!("No snapshot found yet.");
            } else {
                if let Some(scraped) = deals.iter().map(|d| d.scraped_date).max() {
                    log::info!("Last scraped: {}", scraped);
                }
                log::info!("{} deals, top discounts:", deals.len());
                for deal in deals.iter().take(5) {
                    log::info!(
                        "  {:>5}%  {} ({}) {} → {}",
                        deal.discount_pct,
                        deal.product_name,
                        deal.category,
                        deal.original_price,
                        deal.sale_price
                    );
                }
            }

            match store.load_stats().await {
                Ok(Some(stats)) => log::info!(
                    "Last run: {} → {}, {} pages, {} listings, {} added, {} changed, {} removed",
                    stats.start_time,
                    stats.end_time,
                    stats.pages_fetched(),
                    stats.entries_seen(),
                    stats.added,
                    stats.changed,
                    stats.removed
                ),
                Ok(None) => log::info!("No run stats recorded yet."),
                Err(e) => log::warn!("Run stats unreadable: {}", e),
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
