mod config;
mod error;
mod monitoring;
mod notify;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info, warn};

use config::Config;
use monitoring::{CycleCoordinator, HttpFetcher, PatternExtractor, Scheduler, Target};
use notify::TelegramNotifier;

/// Watches product pages and reports stock and price changes to Telegram
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/stockwatch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll targets until interrupted (default)
    Run,
    /// Run a single cycle and exit
    Once,
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_deref()).context("Failed to load config")?;

    if let Some(Command::Config) = cli.command {
        print!("{config}");
        return Ok(());
    }

    logger::init(config.logging.file.as_deref()).context("Failed to initialize logging")?;
    monitoring::validation::validate_config(&config).context("Invalid configuration")?;

    let mut scheduler = build_scheduler(&config)?;

    match cli.command {
        Some(Command::Once) => {
            let report = scheduler.run_once().await?;
            if scheduler.coordinator().store().is_empty() {
                warn!("No target produced data; check the stock and price patterns");
            }
            info!(
                tracked = scheduler.coordinator().store().len(),
                at = ?scheduler.last_cycle_at(),
                "Single cycle finished: {}",
                report
            );
        }
        _ => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => info!("Monitoring stopped by user"),
                    Err(e) => {
                        error!("Failed to listen for interrupt: {}", e);
                        // Keep the sender alive so the loop is not stopped
                        std::future::pending::<()>().await;
                    }
                }
                let _ = shutdown_tx.send(true);
            });

            scheduler.run(shutdown_rx).await;
        }
    }

    Ok(())
}

fn build_scheduler(config: &Config) -> Result<Scheduler> {
    let fetcher = Arc::new(HttpFetcher::new(&config.monitor).context("Failed to build HTTP client")?);
    let extractor = Arc::new(PatternExtractor::from_settings(&config.monitor)?);
    let notifier = Arc::new(TelegramNotifier::new(&config.telegram)?);

    let coordinator = CycleCoordinator::new(
        fetcher,
        extractor,
        notifier,
        config.monitor.max_workers,
        config.monitor.currency.clone(),
    );
    let targets = config.targets.iter().map(Target::from).collect();

    Ok(Scheduler::new(coordinator, targets, Duration::from_secs(config.monitor.interval_seconds)))
}
