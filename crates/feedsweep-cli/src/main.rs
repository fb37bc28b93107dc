use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedsweep_core::{dates, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "feedsweep")]
#[command(author, version, about = "Clean up and triage a Readwise Reader feed")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the configuration file
    #[arg(long, global = true, env = "FEEDSWEEP_CONFIG")]
    config: Option<PathBuf>,

    /// Read filters from this JSON file
    #[arg(long, global = true)]
    filters_file: Option<PathBuf>,

    /// Read filters from this GitHub gist instead of a file
    #[arg(long, global = true)]
    gist: Option<String>,

    /// Show what would change without deleting or moving anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Only consider documents updated after this time
    /// (RFC 3339, "YYYY-MM-DD HH:MM[:SS]" or "YYYY-MM-DD", local time)
    #[arg(long, global = true, conflicts_with = "hours")]
    updated_after: Option<String>,

    /// Only consider documents updated in the last N hours
    #[arg(long, global = true)]
    hours: Option<u32>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Delete feed documents matching the exclusion filters (default)
    Cleanup,
    /// Move documents from chosen authors to the inbox or later list
    Save,
    /// Run cleanup, then save
    All,
    /// Print the resolved filter configuration as JSON
    Filters,
}

impl Cli {
    /// Cutoff for the list query; defaults to the start of yesterday
    fn updated_after(&self) -> Result<DateTime<Utc>> {
        let now = Local::now();
        if let Some(input) = &self.updated_after {
            return dates::parse_to_utc(input)
                .with_context(|| format!("Invalid --updated-after value '{}'", input));
        }
        Ok(match self.hours {
            Some(hours) => dates::hours_ago(hours, now),
            None => dates::start_of_yesterday(now),
        })
    }

    fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => AppConfig::load()?,
        };
        config.apply_env();

        if let Some(path) = &self.filters_file {
            config.filters.path = path.clone();
            config.filters.gist_id = None;
        }
        if let Some(gist) = &self.gist {
            config.filters.gist_id = Some(gist.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    // Initialize logging; status lines go to stdout, diagnostics to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let options = || -> Result<_> {
        Ok(commands::run_options(&config, cli.dry_run, cli.updated_after()?))
    };

    match cli.command.unwrap_or(Commands::Cleanup) {
        Commands::Cleanup => commands::cleanup::run(&config, &options()?).await,
        Commands::Save => commands::save::run(&config, &options()?).await,
        Commands::All => commands::all::run(&config, &options()?).await,
        Commands::Filters => commands::filters::run(&config).await,
    }
}
