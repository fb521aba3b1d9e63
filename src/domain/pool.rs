//! Pool snapshots and venue identity.
//!
//! A `PoolSnapshot` is immutable market data fetched fresh on every query.
//! It has no persistent identity beyond (venue, address) — snapshots are
//! never cached or diffed, only compared and discarded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported liquidity venues. Closed set: each variant has exactly one
/// conforming adapter implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueId {
    Meteora,
    Orca,
    Raydium,
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VenueId::Meteora => write!(f, "meteora"),
            VenueId::Orca => write!(f, "orca"),
            VenueId::Raydium => write!(f, "raydium"),
        }
    }
}

/// Pool flavor within a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolType {
    Dlmm,
    DammV2,
    Whirlpool,
    Clmm,
    Unknown,
}

impl Default for PoolType {
    fn default() -> Self {
        PoolType::Unknown
    }
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolType::Dlmm => write!(f, "DLMM"),
            PoolType::DammV2 => write!(f, "DAMM_V2"),
            PoolType::Whirlpool => write!(f, "Whirlpool"),
            PoolType::Clmm => write!(f, "CLMM"),
            PoolType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Token mint plus human-readable symbol. Addresses are opaque base58
/// strings — the engine never constructs on-chain types itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRef {
    pub mint: String,
    pub symbol: String,
}

impl TokenRef {
    pub fn new(mint: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            mint: mint.into(),
            symbol: symbol.into(),
        }
    }
}

/// Point-in-time view of a pool on some venue.
///
/// Adapters returning partially populated data default missing yield/TVL
/// fields to zero rather than erroring; downstream scoring guards against
/// the zeros.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub venue: VenueId,
    pub address: String,
    pub token_a: TokenRef,
    pub token_b: TokenRef,
    pub current_price: Decimal,
    /// Pool fee in basis points.
    pub fee_bps: u16,
    /// Total value locked, USD.
    pub tvl: Decimal,
    /// 24h trade volume, USD.
    pub volume_24h: Decimal,
    /// Venue-reported annualized yield, percent. Often absent or
    /// inconsistently computed; scoring substitutes its own proxy.
    pub apr_24h: Decimal,
    #[serde(default)]
    pub pool_type: PoolType,
    /// Tick spacing for CLMM-style pools.
    #[serde(default)]
    pub tick_spacing: Option<u16>,
    /// Bin step for DLMM pools.
    #[serde(default)]
    pub bin_step: Option<u16>,
}

impl PoolSnapshot {
    /// Pool fee as a decimal fraction (30 bps -> 0.003).
    pub fn fee_rate(&self) -> Decimal {
        Decimal::from(self.fee_bps) / Decimal::from(10_000)
    }

    /// "SOL/USDC"-style pair label for logs and reports.
    pub fn token_pair(&self) -> String {
        format!("{}/{}", self.token_a.symbol, self.token_b.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_venue_display() {
        assert_eq!(VenueId::Meteora.to_string(), "meteora");
        assert_eq!(VenueId::Orca.to_string(), "orca");
        assert_eq!(VenueId::Raydium.to_string(), "raydium");
    }

    #[test]
    fn test_fee_rate_conversion() {
        let pool = PoolSnapshot {
            venue: VenueId::Orca,
            address: "pool1".to_string(),
            token_a: TokenRef::new("mintA", "SOL"),
            token_b: TokenRef::new("mintB", "USDC"),
            current_price: dec!(100),
            fee_bps: 30,
            tvl: dec!(1000000),
            volume_24h: dec!(500000),
            apr_24h: dec!(0),
            pool_type: PoolType::Whirlpool,
            tick_spacing: Some(64),
            bin_step: None,
        };
        assert_eq!(pool.fee_rate(), dec!(0.003));
    }

    #[test]
    fn test_venue_serde_snake_case() {
        let json = serde_json::to_string(&VenueId::Meteora).unwrap();
        assert_eq!(json, "\"meteora\"");
    }
}
