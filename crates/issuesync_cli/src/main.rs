//! issuesync CLI
//!
//! Mirrors an issue tracker collection into the in-memory cache and
//! reports the resulting status.
//!
//! # Commands
//!
//! - `run` - Perform one sync run and print the status
//! - `watch` - Run syncs on an interval until interrupted

mod commands;
mod error;
mod fixture;
mod http_client;
mod settings;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use issuesync_engine::SyncState;
use settings::{FileSettings, Overrides, Settings};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Issue tracker sync tools.
#[derive(Parser)]
#[command(name = "issuesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a JSON settings file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Remote collection (team) to mirror
    #[arg(global = true, long)]
    collection: Option<String>,

    /// GraphQL endpoint
    #[arg(global = true, long)]
    endpoint: Option<String>,

    /// Serve pages from a local fixture file instead of the remote API
    #[arg(global = true, long)]
    fixture: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Perform one sync run and print the status
    Run {
        /// Also print the cached issues
        #[arg(short, long)]
        items: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run syncs on an interval until interrupted
    Watch {
        /// Seconds between runs
        #[arg(short, long)]
        interval: Option<u64>,

        /// Stop after this many completed runs
        #[arg(long)]
        max_runs: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins when set
    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let interval_flag = match &cli.command {
        Commands::Watch { interval, .. } => *interval,
        _ => None,
    };

    let load_engine = || -> Result<commands::Engine, Box<dyn std::error::Error>> {
        let file = match &cli.config {
            Some(path) => FileSettings::load(path)?,
            None => FileSettings::default(),
        };
        let overrides = Overrides {
            collection_id: cli.collection.clone(),
            endpoint: cli.endpoint.clone(),
            sync_interval_secs: interval_flag,
        };
        let settings = Settings::resolve(file, overrides)?;
        Ok(commands::build_engine(&settings, cli.fixture.as_deref())?)
    };

    match cli.command {
        Commands::Run { items, format } => {
            let engine = load_engine()?;
            let state = commands::run::run(&engine, format, items)?;
            if state == SyncState::Error {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Watch {
            max_runs, format, ..
        } => {
            let engine = load_engine()?;
            let interval = engine
                .config()
                .sync_interval
                .unwrap_or(commands::watch::DEFAULT_INTERVAL);
            commands::watch::run(engine, interval, max_runs, format)?;
        }
        Commands::Version => {
            println!("issuesync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("issuesync engine v{}", issuesync_engine::VERSION);
        }
    }

    Ok(ExitCode::SUCCESS)
}
