//! dealsync CLI
//!
//! Local execution entry point for the Imoview -> RD Station sync.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dealsync::{
    config::{self, Credentials},
    error::Result,
    models::Config,
    pipeline,
    services::{DealSource, ImoviewClient, RdStationClient},
};

/// dealsync - Imoview to RD Station conversion sync
#[derive(Parser, Debug)]
#[command(
    name = "dealsync",
    version,
    about = "Forwards Imoview deal activity to RD Station as conversion events"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "dealsync.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full sync across all stages
    Run,

    /// Probe the Imoview API without sending anything
    Check,

    /// Validate the configuration file
    Validate,

    /// Show the effective configuration
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("dealsync starting...");

    let mut config = Config::load_or_default(&cli.config);
    log::info!("Loaded configuration from {}", cli.config.display());

    if let Some(hours) = config::lookback_override()? {
        log::info!("Lookback window overridden to {hours}h from environment");
        config.sync.lookback_hours = hours;
    }

    match cli.command {
        Command::Run => {
            config.validate()?;
            let credentials = Credentials::from_env()?;

            let source = ImoviewClient::new(config.imoview.clone(), credentials.imoview_api_key)?;
            let sink =
                RdStationClient::new(config.rdstation.clone(), credentials.rd_public_token)?;

            let outcome = pipeline::run_sync(&config.sync, &source, &sink).await?;

            log::info!(
                "Run finished: {} events sent from {} records ({} without email, {} duplicates)",
                outcome.total_sent(),
                outcome.total_records(),
                outcome.total_no_email(),
                outcome.total_duplicates()
            );
        }

        Command::Check => {
            let credentials = Credentials::from_env()?;
            let source = ImoviewClient::new(config.imoview.clone(), credentials.imoview_api_key)?;

            source.check_connection().await?;
            log::info!("✓ Imoview API reachable");
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (endpoints, paging, and lookback window)");
        }

        Command::Info => {
            log::info!("Config file: {}", cli.config.display());
            log::info!("Filter mode: {}", config.sync.filter_mode);
            log::info!("Lookback window: {}h", config.sync.lookback_hours);
            log::info!("Imoview API: {}", config.imoview.base_url);
            log::info!(
                "Paging: {} records/page, up to {} pages",
                config.imoview.page_size,
                config.imoview.max_pages
            );
            log::info!("RD Station events API: {}", config.rdstation.events_url);
            log::info!("RD Station legacy API: {}", config.rdstation.legacy_url);
            log::info!(
                "Test event on idle runs: {}",
                if config.sync.send_test_event {
                    "enabled"
                } else {
                    "disabled"
                }
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
