use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use threadsift::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "threadsift",
    version,
    about = "Extract structured posts from text copied out of a social feed profile",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a pasted profile and print new posts as JSON
    Parse {
        /// Text file with the pasted profile
        input: PathBuf,

        /// JSON array of already-seen post ids, updated in place
        #[arg(long)]
        seen: Option<PathBuf>,

        /// Capture time (RFC 3339) used for relative time tokens
        #[arg(long)]
        now: Option<String>,
    },

    /// Parse a pasted profile and store new posts in SQLite
    Import {
        /// Text file with the pasted profile
        input: PathBuf,

        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,

        /// Capture time (RFC 3339) used for relative time tokens
        #[arg(long)]
        now: Option<String>,
    },

    /// Record analyzer ticker mentions for an account
    Mentions {
        /// Analyzer output (JSON array or object with `results`)
        json: PathBuf,

        /// Account the mentions belong to
        #[arg(short, long)]
        account: String,

        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Show stored ticker weights
    Weights {
        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,

        /// Only show one account
        #[arg(short, long)]
        account: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::from_env().context("Invalid configuration in environment")?,
    };

    // Initialize tracing/logging
    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    tracing::debug!("threadsift starting");

    match cli.command {
        Commands::Parse { input, seen, now } => {
            tracing::info!(
                input = %input.display(),
                seen = ?seen,
                now = ?now,
                "Starting parse command"
            );
            let now = now.as_deref().map(commands::parse_now).transpose()?;
            commands::parse(&config, input, seen, now).await?;
        }

        Commands::Import { input, db, now } => {
            tracing::info!(
                input = %input.display(),
                db = ?db,
                now = ?now,
                "Starting import command"
            );
            let now = now.as_deref().map(commands::parse_now).transpose()?;
            commands::import(&config, input, db, now).await?;
        }

        Commands::Mentions { json, account, db } => {
            tracing::info!(
                json = %json.display(),
                account = %account,
                db = ?db,
                "Starting mentions command"
            );
            commands::mentions(&config, json, account, db).await?;
        }

        Commands::Weights { db, account } => {
            tracing::info!(db = ?db, account = ?account, "Starting weights command");
            commands::weights(&config, db, account).await?;
        }
    }

    tracing::debug!("threadsift completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("threadsift=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("threadsift={level},warn")))
    };

    // Logs go to stderr so JSON output on stdout stays clean
    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}
