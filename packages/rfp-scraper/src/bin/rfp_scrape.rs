//! CLI for running the extraction pipeline by hand
//!
//! Prints results as JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use chrono::TimeDelta;
use clap::{Parser, Subcommand};
use rfp_scraper::{ExtractionMode, MemoryAttemptLog, Orchestrator, ScraperConfig};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MAX_TIERS_PER_RUN: usize = 4;

#[derive(Parser)]
#[command(name = "rfp-scrape")]
#[command(about = "Extract structured content from procurement pages")]
struct Cli {
    /// Serve canned fixture pages instead of hitting the network
    #[arg(long, global = true)]
    demo: bool,

    /// Single-line JSON output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one URL and print the result
    Extract { url: String },

    /// Extract each URL, then print attempt statistics
    Stats {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Statistics window in days
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
}

#[derive(Serialize)]
struct UrlOutcome {
    url: String,
    status: rfp_scraper::ExtractionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<String>,
    text_length: usize,
}

#[derive(Serialize)]
struct StatsReport {
    results: Vec<UrlOutcome>,
    stats: rfp_scraper::AttemptStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rfp_scraper=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ScraperConfig::from_env().context("Invalid scraper configuration")?;
    if cli.demo {
        config = config.with_mode(ExtractionMode::Demo);
    }

    let capacity = match &cli.command {
        Commands::Extract { .. } => config.attempt_log_capacity,
        // Every attempt of the run has to fit for the stats to be complete.
        Commands::Stats { urls, .. } => config
            .attempt_log_capacity
            .max(urls.len() * MAX_TIERS_PER_RUN),
    };
    let log = Arc::new(MemoryAttemptLog::with_capacity(capacity));
    let orchestrator = Orchestrator::from_config(&config, log.clone())
        .context("Failed to build extraction pipeline")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling extraction");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Extract { url } => {
            let result = orchestrator.extract_with_cancel(&url, cancel).await;
            output(&result, cli.compact)
        }
        Commands::Stats { urls, days } => {
            let window = stats_window(days)?;
            let mut results = Vec::with_capacity(urls.len());
            for url in urls {
                if cancel.is_cancelled() {
                    break;
                }
                let result = orchestrator.extract_with_cancel(&url, cancel.clone()).await;
                results.push(UrlOutcome {
                    status: result.status,
                    strategy: result.meta.get("strategy").cloned(),
                    quality: result.meta.get("quality").cloned(),
                    text_length: result.text_length(),
                    url,
                });
            }

            output(
                &StatsReport {
                    results,
                    stats: log.stats(window),
                },
                cli.compact,
            )
        }
    }
}

fn stats_window(days: i64) -> Result<TimeDelta> {
    if days < 0 {
        anyhow::bail!("--days must not be negative, got {days}");
    }
    TimeDelta::try_days(days).with_context(|| format!("--days {days} is out of range"))
}

fn output<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
