//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the Tidepool liquidity agent.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::venues::build_registry;
use crate::application::{
    ActivityLog, DecisionLog, PoolAggregator, PositionMonitor, PriceOracle,
};
use crate::config::{load_config, Config};

/// Tidepool - Autonomous Concentrated Liquidity Agent for Solana
#[derive(Parser, Debug)]
#[command(
    name = "tidepool",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Autonomous Concentrated Liquidity Agent for Solana",
    long_about = "Tidepool manages concentrated liquidity positions across Meteora, Orca, \
                  and Raydium: it monitors ranges, rebalances around price, collects fees, \
                  and surfaces cross-venue migration opportunities."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the monitoring loop
    Run(RunCmd),

    /// Compare pools for the configured pair across venues
    Pools(PoolsCmd),

    /// Show agent configuration and market status
    Status(StatusCmd),
}

/// Start the monitoring loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Run a single evaluation pass and exit
    #[arg(long)]
    pub once: bool,

    /// Override RPC URL
    #[arg(long, value_name = "URL")]
    pub rpc_url: Option<String>,
}

/// Compare pools across venues
#[derive(Parser, Debug)]
pub struct PoolsCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Base token mint (defaults to the configured pair)
    #[arg(long, value_name = "MINT")]
    pub base: Option<String>,

    /// Quote token mint (defaults to the configured pair)
    #[arg(long, value_name = "MINT")]
    pub quote: Option<String>,

    /// Maximum pools to display
    #[arg(short, long, value_name = "N", default_value = "10")]
    pub limit: usize,

    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    pub format: String,
}

/// Show status
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    pub format: String,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    init_logging(app.verbose, app.debug)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd).await,
        Command::Pools(cmd) => pools_command(cmd).await,
        Command::Status(cmd) => status_command(cmd).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}

fn load(path: &PathBuf) -> Result<Config> {
    load_config(path).with_context(|| format!("loading config from {}", path.display()))
}

async fn initialized_registry(config: &Config) -> Result<crate::ports::VenueRegistry> {
    let registry = build_registry(&config.venues.enabled);
    let rpc_url = config.venues.get_rpc_url();
    for adapter in registry.all() {
        adapter
            .initialize(&rpc_url)
            .await
            .with_context(|| format!("initializing {} adapter", adapter.venue()))?;
    }
    Ok(registry)
}

fn build_oracle(config: &Config) -> Arc<PriceOracle> {
    Arc::new(PriceOracle::new(
        config.oracle.get_api_url(),
        Duration::from_secs(config.oracle.cache_ttl_secs),
    ))
}

/// Handle run command
async fn run_command(cmd: RunCmd) -> Result<()> {
    let mut config = load(&cmd.config)?;
    if let Some(rpc_url) = cmd.rpc_url {
        config.venues.rpc_url = rpc_url;
    }

    tracing::info!(
        config = %cmd.config.display(),
        pair = %config.tokens.pair_symbol,
        venues = config.venues.enabled.len(),
        "starting tidepool agent"
    );

    let registry = initialized_registry(&config).await?;
    let aggregator = Arc::new(PoolAggregator::new(registry.clone()));
    let oracle = build_oracle(&config);
    let activity = Arc::new(ActivityLog::new());
    let decisions = Arc::new(DecisionLog::new());

    let monitor = Arc::new(
        PositionMonitor::new((&config).into(), registry, activity.clone(), decisions)
            .with_aggregator(aggregator)
            .with_oracle(oracle)
            .with_migration_thresholds((&config).into()),
    );

    if cmd.once {
        monitor.tick().await;
        for entry in activity.recent().into_iter().take(20) {
            println!("[{:?}] {}", entry.kind, entry.message);
        }
        return Ok(());
    }

    {
        let monitor = monitor.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                monitor.stop();
            }
        });
    }

    monitor.run().await;
    Ok(())
}

/// Handle pools command
async fn pools_command(cmd: PoolsCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let base = cmd.base.unwrap_or_else(|| config.tokens.base_mint.clone());
    let quote = cmd.quote.unwrap_or_else(|| config.tokens.quote_mint.clone());

    let registry = initialized_registry(&config).await?;
    let aggregator = PoolAggregator::new(registry);

    tracing::info!(pair = %config.tokens.pair_symbol, "comparing pools across venues");
    let mut comparison = aggregator.compare_pools_for_pair(&base, &quote).await;
    comparison.ranked.truncate(cmd.limit);

    if cmd.format == "json" {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(());
    }

    if comparison.ranked.is_empty() {
        println!("No pools found for {}", config.tokens.pair_symbol);
        return Ok(());
    }

    println!(
        "{:<4} {:<9} {:<12} {:>10} {:>14} {:>14} {:>8}",
        "#", "venue", "type", "apr %", "tvl $", "vol 24h $", "score"
    );
    for (i, entry) in comparison.ranked.iter().enumerate() {
        println!(
            "{:<4} {:<9} {:<12} {:>10.2} {:>14.0} {:>14.0} {:>8.1}",
            i + 1,
            entry.pool.venue.to_string(),
            entry.pool.pool_type.to_string(),
            entry.effective_apr,
            decimal_to_f64(entry.pool.tvl),
            decimal_to_f64(entry.pool.volume_24h),
            entry.score,
        );
    }

    if let Some(ref rec) = comparison.recommendation {
        println!("\nRecommendation: {}", rec.reason);
        println!("  Pool: {} ({})", rec.pool_address, rec.venue);
    }

    Ok(())
}

/// Handle status command
async fn status_command(cmd: StatusCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let oracle = build_oracle(&config);
    let sol_price = oracle.price("SOL").await;

    if cmd.format == "json" {
        let status = serde_json::json!({
            "pair": config.tokens.pair_symbol,
            "venues": config.venues.enabled,
            "check_interval_secs": config.monitor.check_interval_secs,
            "migration_scan_enabled": config.monitor.migration_scan_enabled,
            "deposit_fee_bps": config.fees.deposit_fee_bps,
            "performance_fee_bps": config.fees.performance_fee_bps,
            "treasury_address": config.fees.treasury_address,
            "sol_price_usd": sol_price,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Tidepool Agent Status");
    println!("  Pair:             {}", config.tokens.pair_symbol);
    println!(
        "  Venues:           {}",
        config
            .venues
            .enabled
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "  Check interval:   {}s",
        config.monitor.check_interval_secs
    );
    println!(
        "  Migration scan:   {}",
        if config.monitor.migration_scan_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  Fees:             {} bps deposit / {} bps performance",
        config.fees.deposit_fee_bps, config.fees.performance_fee_bps
    );
    println!("  Treasury:         {}", config.fees.treasury_address);
    if sol_price > 0.0 {
        println!("  SOL price:        ${sol_price:.2}");
    } else {
        println!(
            "  SOL price:        unavailable (fallback ${:.2})",
            config.monitor.sol_price_fallback_usd
        );
    }

    Ok(())
}

fn decimal_to_f64(value: rust_decimal::Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().unwrap_or(0.0)
}
