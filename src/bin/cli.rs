//! showwatch CLI
//!
//! Run once per scheduled trigger (`showwatch run`), or inspect and maintain
//! the stored state.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use showwatch::{
    error::{AppError, Result},
    models::{Config, Platform, ShowMatch},
    pipeline::Monitor,
    storage::{LocalStorage, StateStore},
};

/// showwatch - Weekly streaming picks monitor
#[derive(Parser, Debug)]
#[command(
    name = "showwatch",
    version,
    about = "Watches a weekly streaming-picks series and announces new recommendations"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the state directory from the configuration
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the series once and announce anything new
    Run,

    /// Show component health and stored state as JSON
    Status,

    /// Print the effective configuration
    Config,

    /// Validate the configuration
    Validate,

    /// Fetch the index, read storage and send a test notification
    Test,

    /// Show storage statistics as JSON
    Stats,

    /// Show the most recent history entries
    History {
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Search stored shows by title or description
    Search {
        query: String,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// List stored shows available on a platform
    Platform {
        name: String,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// List processed articles, most recent last
    Processed,

    /// Remove duplicate history entries
    Duplicates,

    /// Remove history entries older than N days
    Cleanup {
        #[arg(long, default_value_t = 90)]
        days: u32,
    },

    /// Keep only the N most recently processed articles
    CleanupArticles {
        #[arg(long, default_value_t = 100)]
        max: usize,
    },

    /// Delete all stored state
    Reset {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Initialize logging with the given default filter.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load the configuration file, falling back to defaults when it is absent.
/// A file that exists but does not parse is fatal.
fn load_config(cli: &Cli) -> Result<Config> {
    let loaded = if cli.config.exists() {
        Some(Config::load(&cli.config)?)
    } else {
        None
    };

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        loaded
            .as_ref()
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|| "info".to_string())
    };
    init_logging(&level);

    let mut config = match loaded {
        Some(config) => {
            log::info!("Loaded configuration from {}", cli.config.display());
            config
        }
        None => Config::load_or_default(&cli.config),
    };

    config.apply_env();
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.clone();
    }
    Ok(config)
}

fn print_matches(matches: &[ShowMatch]) {
    for (i, m) in matches.iter().enumerate() {
        let star = if m.show.is_featured { " ⭐" } else { "" };
        println!("{}. {}{} [{}]", i + 1, m.show.title, star, m.show.platform);
        println!("   {} ({})", m.article_title, m.article_date);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let storage = LocalStorage::new(&config.storage.data_dir);

    match cli.command {
        Command::Run => {
            config.validate()?;
            let monitor = Monitor::from_config(Arc::new(config))?;
            let outcome = monitor.run().await?;
            if outcome.found_new() {
                log::info!("New content processed");
            } else {
                log::info!("No new content: {}", outcome);
            }
        }

        Command::Status => {
            config.validate()?;
            let monitor = Monitor::from_config(Arc::new(config))?;
            print_json(&monitor.status().await)?;
        }

        Command::Config => {
            for (key, value) in config.summary() {
                println!("{key:>26}: {value}");
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            if !config.notifier_configured() {
                log::warn!("No webhook configured; runs will not send notifications");
            }
            log::info!("✓ Config OK");
        }

        Command::Test => {
            config.validate()?;
            let monitor = Monitor::from_config(Arc::new(config))?;
            let report = monitor.self_test().await?;
            log::info!(
                "✓ Found {} articles, latest: {} ({})",
                report.articles_found,
                report.latest.title,
                report.latest.date_string()
            );
            log::info!(
                "✓ Storage: {} processed, {} history entries",
                report.storage.processed_count,
                report.storage.history_entry_count
            );
            if report.notification_sent {
                log::info!("✓ Test notification sent");
            } else {
                log::warn!("Notifier not configured, no test message sent");
            }
        }

        Command::Stats => {
            print_json(&storage.stats().await)?;
        }

        Command::History { limit } => {
            let history = storage.history(limit).await;
            if history.is_empty() {
                println!("No history yet.");
            }
            for entry in history {
                println!(
                    "{} - {} ({} shows)",
                    entry.article_date, entry.article_title, entry.shows_count
                );
                for show in &entry.shows {
                    let star = if show.is_featured { " ⭐" } else { "" };
                    println!("   • {}{} [{}]", show.title, star, show.platform);
                }
            }
        }

        Command::Search { query, limit } => {
            let matches = storage.search(&query, limit).await;
            println!("{} shows matching '{}'", matches.len(), query);
            print_matches(&matches);
        }

        Command::Platform { name, limit } => {
            let platform = Platform::from_name(&name).ok_or_else(|| {
                let known: Vec<_> = Platform::ALL.iter().map(|p| p.as_str()).collect();
                AppError::validation(format!(
                    "unknown platform '{}', expected one of: {}",
                    name,
                    known.join(", ")
                ))
            })?;
            let matches = storage.by_platform(platform, limit).await;
            println!("{} shows on {}", matches.len(), platform);
            print_matches(&matches);
        }

        Command::Processed => {
            let records = storage.records().await;
            println!("{} processed articles", records.len());
            for record in records {
                println!(
                    "{} - {} ({} shows, processed {})",
                    record.published_date,
                    record.title,
                    record.recommendation_count,
                    record.processed_at.format("%Y-%m-%d %H:%M")
                );
                println!("   {}", record.url);
            }
        }

        Command::Duplicates => {
            let removed = storage.remove_duplicate_history().await?;
            log::info!("✓ Removed {} duplicate history entries", removed);
        }

        Command::Cleanup { days } => {
            let removed = storage.prune_history(days).await?;
            log::info!("✓ Removed {} history entries older than {} days", removed, days);
        }

        Command::CleanupArticles { max } => {
            let removed = storage.prune_processed(max).await?;
            log::info!("✓ Removed {} processed articles, kept at most {}", removed, max);
        }

        Command::Reset { yes } => {
            if !yes {
                log::error!("Refusing to delete state without --yes");
                return Err(AppError::config("reset requires --yes"));
            }
            storage.reset().await?;
            log::info!("✓ All stored state deleted");
        }
    }

    Ok(())
}
