//! Concentrated-liquidity positions and per-position strategy settings.
//!
//! A `Position` tracked by the monitor is a write-after-confirm cache of
//! on-chain state: the chain is authoritative, and the in-memory copy is
//! only updated after an adapter confirms a transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::pool::VenueId;

/// Position lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Active,
    OutOfRange,
    Closed,
    Pending,
}

/// Per-position strategy settings supplied by the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    /// Whether the monitor may rebalance this position automatically.
    pub auto_rebalance: bool,
    /// Position metadata is held under the privacy subsystem when set.
    pub privacy_enabled: bool,
    /// Max slippage tolerated on rebalance, basis points.
    pub max_slippage_bps: u16,
    /// Minimum seconds between rebalances.
    pub min_rebalance_interval_secs: u64,
    /// Target daily yield percentage, e.g. 0.4 for 0.4%/day. When set,
    /// the yield-target trigger is active.
    pub target_daily_yield: Option<Decimal>,
}

impl Default for Strategy {
    fn default() -> Self {
        Self {
            auto_rebalance: true,
            privacy_enabled: false,
            max_slippage_bps: 100,
            min_rebalance_interval_secs: 3600,
            target_daily_yield: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("invalid price range: lower {0} must be below upper {1}")]
    InvalidRange(Decimal, Decimal),
    #[error("slippage {0} bps outside [0, 10000]")]
    InvalidSlippage(u16),
}

/// A concentrated-liquidity position on one venue's pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Position account address (doubles as the registry key).
    pub id: String,
    pub owner: String,
    pub venue: VenueId,
    pub pool: String,
    pub liquidity: Decimal,
    pub lower_price: Decimal,
    pub upper_price: Decimal,
    pub token_a_amount: Decimal,
    pub token_b_amount: Decimal,
    pub unclaimed_fees_a: Decimal,
    pub unclaimed_fees_b: Decimal,
    pub status: PositionStatus,
    pub strategy: Strategy,
    pub created_at: DateTime<Utc>,
    pub last_rebalance_at: Option<DateTime<Utc>>,
}

impl Position {
    /// Validate invariants that must hold for every tracked position.
    pub fn validate(&self) -> Result<(), PositionError> {
        if self.lower_price >= self.upper_price {
            return Err(PositionError::InvalidRange(
                self.lower_price,
                self.upper_price,
            ));
        }
        if self.strategy.max_slippage_bps > 10_000 {
            return Err(PositionError::InvalidSlippage(
                self.strategy.max_slippage_bps,
            ));
        }
        Ok(())
    }

    /// Whether `price` sits inside the position's active range.
    pub fn is_in_range(&self, price: Decimal) -> bool {
        price >= self.lower_price && price <= self.upper_price
    }

    /// Absolute range width in price terms.
    pub fn range_width(&self) -> Decimal {
        self.upper_price - self.lower_price
    }

    /// Combined token value. Token amounts are already denominated in a
    /// common quote unit by the adapters.
    pub fn total_value(&self) -> Decimal {
        self.token_a_amount + self.token_b_amount
    }

    /// Total unclaimed fees across both tokens.
    pub fn total_unclaimed_fees(&self) -> Decimal {
        self.unclaimed_fees_a + self.unclaimed_fees_b
    }

    /// Days since the position was opened, as of `now`.
    pub fn days_active(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = now.signed_duration_since(self.created_at);
        elapsed.num_milliseconds() as f64 / 86_400_000.0
    }

    /// Seconds since the last rebalance, if any.
    pub fn secs_since_rebalance(&self, now: DateTime<Utc>) -> Option<u64> {
        self.last_rebalance_at
            .map(|t| now.signed_duration_since(t).num_seconds().max(0) as u64)
    }
}
