//! Tidepool - Autonomous Concentrated Liquidity Agent
//!
//! Monitors concentrated liquidity positions across Meteora, Orca, and
//! Raydium, rebalancing and collecting fees autonomously.

use anyhow::Result;

use tidepool::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
