//! SpamGuard - keyword based SMS spam filter
//!
//! Command-line entry point: loads configuration, sets up logging and runs
//! the requested command.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use spamguard::commands::{
    AddCommand, CheckCommand, ClearCommand, Context, DevicesCommand, InjectCommand, ListCommand,
    RemoveCommand, RemoveKeywordCommand, WatchCommand,
};
use spamguard::core::{AppConfig, APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "spamguard", version, about = "Block text messages containing spam keywords")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the keyword preferences
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the keyword list with positions
    List,
    /// Add a keyword
    Add { keyword: String },
    /// Remove the keyword at a list position
    Remove { index: usize },
    /// Remove a keyword by value
    RemoveKeyword { keyword: String },
    /// Remove every keyword
    Clear,
    /// Classify a message body against the keyword list
    Check {
        /// Sender address
        #[arg(long)]
        sender: Option<String>,
        body: String,
    },
    /// Watch a device inbox and suppress spam
    Watch {
        /// Device serial (first online device by default)
        #[arg(long)]
        serial: Option<String>,
        /// Report spam without deleting it
        #[arg(long)]
        report_only: bool,
    },
    /// List connected devices
    Devices,
    /// Send a test message to an emulator
    Inject {
        #[arg(long)]
        serial: String,
        /// Sender address shown on the emulator
        #[arg(long)]
        from: String,
        body: String,
    },
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path).await?,
        None => AppConfig::load().await?,
    };

    init_logging(&config, cli.verbose)?;
    debug!("{} v{} starting", APP_NAME, VERSION);

    let ctx = Context::new(config, cli.data_dir)?;
    info!("Keyword storage at {:?}", ctx.data_dir);

    match cli.command {
        Commands::List => ListCommand.execute(&ctx)?,
        Commands::Add { keyword } => AddCommand { keyword }.execute(&ctx)?,
        Commands::Remove { index } => RemoveCommand { index }.execute(&ctx)?,
        Commands::RemoveKeyword { keyword } => RemoveKeywordCommand { keyword }.execute(&ctx)?,
        Commands::Clear => ClearCommand.execute(&ctx)?,
        Commands::Check { sender, body } => {
            CheckCommand { sender, body }.execute(&ctx)?;
        }
        Commands::Watch { serial, report_only } => {
            WatchCommand { serial, report_only }.execute(&ctx).await?
        }
        Commands::Devices => DevicesCommand.execute(&ctx).await?,
        Commands::Inject { serial, from, body } => {
            InjectCommand { serial, from, body }.execute(&ctx).await?
        }
    }

    Ok(())
}

/// Install the fmt subscriber; `RUST_LOG` overrides the configured level
fn init_logging(config: &AppConfig, verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(())
}
