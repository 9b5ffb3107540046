//! listing-watch CLI
//!
//! Runs the change-detection poller in the foreground until interrupted.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use listing_watch::{
    error::Result,
    models::Config,
    pipeline::{Scheduler, Shutdown, ShutdownTrigger},
};

/// listing-watch - Listing Count Monitor
#[derive(Parser, Debug)]
#[command(
    name = "listing-watch",
    version,
    about = "Notifies when the item count on a listing page changes"
)]

struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "monitor.toml")]
    config: PathBuf,

    /// Extra source URL to monitor (repeatable)
    #[arg(short, long = "source", global = true)]
    sources: Vec<String>,

    /// Override the poll interval in seconds
    #[arg(short, long, global = true)]
    interval: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll all sources until Ctrl+C
    Run {
        /// Stop after this many cycles
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        cycles: Option<u64>,
    },

    /// Run a single cycle and print the report as JSON
    Check,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Fire the trigger on Ctrl+C or SIGTERM.
async fn forward_signals(trigger: ShutdownTrigger) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                log::warn!("Cannot listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    log::info!("Shutdown signal received, finishing up...");
    trigger.trigger();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config)?.with_extra_sources(cli.sources);
    if let Some(interval) = cli.interval {
        config.monitor.interval_secs = interval;
    }

    log::info!(
        "Loaded configuration from {} ({} sources)",
        cli.config.display(),
        config.sources.len()
    );

    match cli.command {
        Command::Run { cycles } => {
            let mut scheduler = Scheduler::from_config(&config)?;
            if let Some(cycles) = cycles {
                scheduler = scheduler.with_max_cycles(cycles);
            }
            let (trigger, shutdown) = Shutdown::channel();
            tokio::spawn(forward_signals(trigger));

            scheduler.run(shutdown).await;
        }

        Command::Check => {
            let mut scheduler = Scheduler::from_config(&config)?;
            let (trigger, mut shutdown) = Shutdown::channel();
            tokio::spawn(forward_signals(trigger));

            let report = scheduler.run_cycle(&mut shutdown).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            for source in &config.sources {
                log::info!(
                    "✓ {}{}",
                    source.url,
                    source
                        .name
                        .as_deref()
                        .map(|n| format!(" ({n})"))
                        .unwrap_or_default()
                );
            }

            log::info!("All validations passed!");
        }
    }

    Ok(())
}
