//! lectio-rr - liturgical reference resolver
//!
//! Resolves the reading references for a window of dates and prints one line
//! (or one JSON document) per date. Exits non-zero if any date failed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lectio_common::time::{date_window, parse_iso_date, today_utc, MAX_WINDOW_DAYS};
use lectio_rr::config::CliOverrides;
use lectio_rr::{AppConfig, ResolutionResult, Resolver};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for resolved dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Command-line arguments for lectio-rr
#[derive(Parser, Debug)]
#[command(name = "lectio-rr")]
#[command(about = "Resolve daily Mass reading references from multiple providers")]
#[command(version)]
struct Args {
    /// First date to resolve (YYYY-MM-DD, default: today in UTC)
    #[arg(short, long)]
    date: Option<String>,

    /// Number of consecutive days to resolve (1-14)
    #[arg(short = 'n', long, default_value_t = 1)]
    days: u32,

    /// Fail a date when first reading, psalm or gospel is missing
    #[arg(long)]
    strict: bool,

    /// Config file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override file (JSON) with manual per-date corrections
    #[arg(long, value_name = "FILE")]
    overrides: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(&CliOverrides {
        config_path: args.config.clone(),
        strict: args.strict,
        overrides_path: args.overrides.clone(),
    })
    .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting lectio-rr v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let start = match &args.date {
        Some(raw) => parse_iso_date(raw).context("Invalid --date")?,
        None => today_utc(),
    };
    if args.days == 0 || args.days > MAX_WINDOW_DAYS {
        info!(
            "--days {} clamped to the 1..={} range",
            args.days, MAX_WINDOW_DAYS
        );
    }
    let dates = date_window(start, args.days);

    let resolver = Resolver::from_config(&config).context("Failed to initialize resolver")?;
    info!(
        "Resolving {} date(s) from {} with {} provider(s){}",
        dates.len(),
        start,
        resolver.adapter_count(),
        if resolver.is_strict() { ", strict" } else { "" }
    );

    let mut failures = 0usize;
    for (date, outcome) in resolver.resolve_many(&dates).await {
        match outcome {
            Ok(result) => match args.format {
                OutputFormat::Text => println!("{}", format_ok_line(&result)),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string(&result).context("Failed to serialize result")?
                ),
            },
            Err(e) => {
                failures += 1;
                error!(date = %date, error = %e, "Resolution failed");
                match args.format {
                    OutputFormat::Text => println!("[fail] {}: {}", date, e),
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::json!({ "date": date, "error": e.to_string() })
                    ),
                }
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} date(s) failed", failures, dates.len());
    }
    Ok(())
}

fn format_ok_line(result: &ResolutionResult) -> String {
    format!(
        "[ok] {}: First={} | Second={} | Psalm={} | Gospel={}",
        result.date,
        display_or_dash(&result.first_ref),
        display_or_dash(&result.second_ref),
        display_or_dash(&result.psalm_ref),
        display_or_dash(&result.gospel_ref),
    )
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
