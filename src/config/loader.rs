//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::application::MonitorConfig;
use crate::domain::{FeeConfig, FeeConfigError, VenueId};
use crate::strategy::MigrationThresholds;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub monitor: MonitorSection,
    pub fees: FeesSection,
    pub venues: VenuesSection,
    pub tokens: TokensSection,
    #[serde(default)]
    pub oracle: OracleSection,
    #[serde(default)]
    pub migration: MigrationSection,
    pub logging: LoggingSection,
}

/// Monitor loop configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSection {
    /// Seconds between position checks
    pub check_interval_secs: u64,
    /// Fallback SOL price when the oracle is unavailable
    #[serde(default = "default_sol_price")]
    pub sol_price_fallback_usd: f64,
    /// Estimated daily benefit must exceed gas cost by this factor
    #[serde(default = "default_gas_multiplier")]
    pub gas_benefit_multiplier: f64,
    /// Scan for better pools on other venues
    #[serde(default = "default_true")]
    pub migration_scan_enabled: bool,
    /// Candidate pools examined per position per scan
    #[serde(default = "default_migration_candidates")]
    pub max_migration_candidates: usize,
    /// Positions below this USD value are never scanned for migration
    #[serde(default = "default_min_migration_usd")]
    pub min_migration_position_usd: f64,
}

fn default_sol_price() -> f64 {
    200.0
}

fn default_gas_multiplier() -> f64 {
    1.5
}

fn default_true() -> bool {
    true
}

fn default_migration_candidates() -> usize {
    3
}

fn default_min_migration_usd() -> f64 {
    10.0
}

/// Revenue model configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct FeesSection {
    /// Deposit fee in basis points (10 = 0.1%)
    pub deposit_fee_bps: u16,
    /// Performance fee on claimed LP fees in basis points (500 = 5%)
    pub performance_fee_bps: u16,
    /// Share of the performance fee kept for agent gas, bps of the fee
    pub agent_gas_reserve_bps: u16,
    /// Treasury wallet address receiving fee revenue
    pub treasury_address: String,
}

/// Venue connectivity configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct VenuesSection {
    /// RPC endpoint (use private RPC for production)
    pub rpc_url: String,
    /// Venues to register adapters for
    pub enabled: Vec<VenueId>,
}

impl VenuesSection {
    /// Get RPC URL with environment variable override
    /// Checks SOLANA_RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        std::env::var("SOLANA_RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }
}

/// Default token pair configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct TokensSection {
    /// Base token mint address
    pub base_mint: String,
    /// Quote token mint address
    pub quote_mint: String,
    /// Pair symbol (for logging and CLI defaults)
    pub pair_symbol: String,
}

/// Price oracle configuration section (optional)
#[derive(Debug, Clone, Deserialize)]
pub struct OracleSection {
    /// Price API base URL
    #[serde(default = "default_oracle_url")]
    pub api_url: String,
    /// Price cache TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl OracleSection {
    /// Get the oracle URL with environment variable override
    /// Checks ORACLE_API_URL env var first, falls back to config value
    pub fn get_api_url(&self) -> String {
        std::env::var("ORACLE_API_URL").unwrap_or_else(|_| self.api_url.clone())
    }
}

fn default_oracle_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_cache_ttl() -> u64 {
    60
}

impl Default for OracleSection {
    fn default() -> Self {
        Self {
            api_url: default_oracle_url(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

/// Migration threshold overrides (optional)
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationSection {
    #[serde(default = "default_break_even")]
    pub max_break_even_days: f64,
    #[serde(default = "default_net_benefit")]
    pub min_net_benefit_per_day_usd: f64,
    #[serde(default = "default_target_tvl")]
    pub min_target_tvl_usd: f64,
    #[serde(default = "default_tx_cost")]
    pub tx_cost_sol: f64,
}

fn default_break_even() -> f64 {
    7.0
}

fn default_net_benefit() -> f64 {
    0.5
}

fn default_target_tvl() -> f64 {
    50_000.0
}

fn default_tx_cost() -> f64 {
    0.01
}

impl Default for MigrationSection {
    fn default() -> Self {
        Self {
            max_break_even_days: default_break_even(),
            min_net_benefit_per_day_usd: default_net_benefit(),
            min_target_tvl_usd: default_target_tvl(),
            tx_cost_sol: default_tx_cost(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log to file (in addition to stdout)
    #[serde(default)]
    pub log_to_file: bool,
    /// Log file path
    #[serde(default)]
    pub log_file: String,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error(transparent)]
    FeeError(#[from] FeeConfigError),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.check_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "check_interval_secs must be > 0".to_string(),
            ));
        }

        if self.monitor.gas_benefit_multiplier <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "gas_benefit_multiplier must be > 0, got {}",
                self.monitor.gas_benefit_multiplier
            )));
        }

        for (field, value) in [
            ("deposit_fee_bps", self.fees.deposit_fee_bps),
            ("performance_fee_bps", self.fees.performance_fee_bps),
            ("agent_gas_reserve_bps", self.fees.agent_gas_reserve_bps),
        ] {
            if value > 10_000 {
                return Err(ConfigError::ValidationError(format!(
                    "{field} must be 0-10000, got {value}"
                )));
            }
        }

        if self.fees.treasury_address.is_empty() {
            return Err(ConfigError::ValidationError(
                "treasury_address cannot be empty".to_string(),
            ));
        }

        if self.venues.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }

        if self.venues.enabled.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one venue must be enabled".to_string(),
            ));
        }

        if self.tokens.base_mint.is_empty() {
            return Err(ConfigError::ValidationError(
                "base_mint cannot be empty".to_string(),
            ));
        }

        if self.tokens.quote_mint.is_empty() {
            return Err(ConfigError::ValidationError(
                "quote_mint cannot be empty".to_string(),
            ));
        }

        if self.migration.max_break_even_days <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "max_break_even_days must be > 0, got {}",
                self.migration.max_break_even_days
            )));
        }

        Ok(())
    }

    /// Build the validated fee configuration.
    pub fn fee_config(&self) -> Result<FeeConfig, ConfigError> {
        Ok(FeeConfig::new(
            self.fees.deposit_fee_bps,
            self.fees.performance_fee_bps,
            self.fees.treasury_address.clone(),
            self.fees.agent_gas_reserve_bps,
        )?)
    }
}

impl From<&Config> for MonitorConfig {
    fn from(config: &Config) -> Self {
        MonitorConfig {
            check_interval_secs: config.monitor.check_interval_secs,
            sol_price_usd: config.monitor.sol_price_fallback_usd,
            gas_benefit_multiplier: Decimal::from_f64(config.monitor.gas_benefit_multiplier)
                .unwrap_or(MonitorConfig::default().gas_benefit_multiplier),
            migration_scan_enabled: config.monitor.migration_scan_enabled,
            max_migration_candidates: config.monitor.max_migration_candidates,
            min_migration_position_usd: config.monitor.min_migration_position_usd,
        }
    }
}

impl From<&Config> for MigrationThresholds {
    fn from(config: &Config) -> Self {
        MigrationThresholds {
            max_break_even_days: config.migration.max_break_even_days,
            min_net_benefit_per_day_usd: config.migration.min_net_benefit_per_day_usd,
            min_target_tvl_usd: config.migration.min_target_tvl_usd,
            tx_cost_sol: config.migration.tx_cost_sol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[monitor]
check_interval_secs = 60
sol_price_fallback_usd = 200.0
gas_benefit_multiplier = 1.5
migration_scan_enabled = true
max_migration_candidates = 3
min_migration_position_usd = 10.0

[fees]
deposit_fee_bps = 10
performance_fee_bps = 500
agent_gas_reserve_bps = 200
treasury_address = "Treasury1111111111111111111111111111111111"

[venues]
rpc_url = "https://api.mainnet-beta.solana.com"
enabled = ["meteora", "orca", "raydium"]

[tokens]
base_mint = "So11111111111111111111111111111111111111112"
quote_mint = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
pair_symbol = "SOL/USDC"

[oracle]
api_url = "https://api.coingecko.com/api/v3"
cache_ttl_secs = 60

[migration]
max_break_even_days = 7.0
min_net_benefit_per_day_usd = 0.5
min_target_tvl_usd = 50000.0
tx_cost_sol = 0.01

[logging]
level = "info"
log_to_file = true
log_file = "logs/tidepool.log"
"#
        .to_string()
    }

    fn load_from_str(content: &str) -> Result<Config, ConfigError> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        load_config(file.path())
    }

    #[test]
    fn test_load_valid_config() {
        let config = load_from_str(&create_valid_config()).unwrap();

        assert_eq!(config.monitor.check_interval_secs, 60);
        assert_eq!(config.fees.performance_fee_bps, 500);
        assert_eq!(config.venues.enabled.len(), 3);
        assert_eq!(config.tokens.pair_symbol, "SOL/USDC");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let invalid = create_valid_config().replace(
            "check_interval_secs = 60",
            "check_interval_secs = 0",
        );
        assert!(matches!(
            load_from_str(&invalid).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_fee_bps_out_of_range_rejected() {
        let invalid = create_valid_config().replace(
            "performance_fee_bps = 500",
            "performance_fee_bps = 10001",
        );
        assert!(matches!(
            load_from_str(&invalid).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_empty_treasury_rejected() {
        let invalid = create_valid_config().replace(
            "treasury_address = \"Treasury1111111111111111111111111111111111\"",
            "treasury_address = \"\"",
        );
        assert!(matches!(
            load_from_str(&invalid).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_no_venues_rejected() {
        let invalid = create_valid_config().replace(
            "enabled = [\"meteora\", \"orca\", \"raydium\"]",
            "enabled = []",
        );
        assert!(matches!(
            load_from_str(&invalid).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_unknown_venue_is_parse_error() {
        let invalid = create_valid_config().replace(
            "enabled = [\"meteora\", \"orca\", \"raydium\"]",
            "enabled = [\"uniswap\"]",
        );
        assert!(matches!(
            load_from_str(&invalid).unwrap_err(),
            ConfigError::ParseError(_)
        ));
    }

    #[test]
    fn test_optional_sections_default() {
        let minimal = r#"
[monitor]
check_interval_secs = 60

[fees]
deposit_fee_bps = 10
performance_fee_bps = 500
agent_gas_reserve_bps = 200
treasury_address = "Treasury1111111111111111111111111111111111"

[venues]
rpc_url = "https://api.mainnet-beta.solana.com"
enabled = ["meteora"]

[tokens]
base_mint = "So11111111111111111111111111111111111111112"
quote_mint = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
pair_symbol = "SOL/USDC"

[logging]
level = "info"
"#;
        let config = load_from_str(minimal).unwrap();
        assert_eq!(config.oracle.cache_ttl_secs, 60);
        assert_eq!(config.migration.max_break_even_days, 7.0);
        assert!(config.monitor.migration_scan_enabled);
        assert_eq!(config.monitor.max_migration_candidates, 3);
    }

    #[test]
    fn test_monitor_config_conversion() {
        let config = load_from_str(&create_valid_config()).unwrap();
        let monitor: MonitorConfig = (&config).into();
        assert_eq!(monitor.check_interval_secs, 60);
        assert_eq!(monitor.max_migration_candidates, 3);

        let thresholds: MigrationThresholds = (&config).into();
        assert_eq!(thresholds.max_break_even_days, 7.0);
        assert_eq!(thresholds.tx_cost_sol, 0.01);
    }

    #[test]
    fn test_fee_config_built_from_sections() {
        let config = load_from_str(&create_valid_config()).unwrap();
        let fees = config.fee_config().unwrap();
        assert_eq!(fees.deposit_fee_bps, 10);
        assert_eq!(fees.performance_fee_bps, 500);
    }
}
