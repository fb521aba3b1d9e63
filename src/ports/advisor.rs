//! Optional advisory reasoner port.
//!
//! An advisor can veto or add confidence to a rule-based rebalance decision.
//! The engine must behave identically with no advisor configured, and any
//! advisor failure silently falls back to the rule-based decision — an
//! unreachable advisory layer is never an operator-visible error.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Position, RebalanceTrigger};

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("advisor not configured")]
    NotConfigured,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unparseable advisor response: {0}")]
    Parse(String),
}

/// Market conditions supplied to the advisor alongside the position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketContext {
    pub current_price: Decimal,
    pub price_change_1h_pct: f64,
    pub price_change_24h_pct: f64,
    pub volatility_24h_pct: f64,
    pub pool_tvl: Decimal,
    pub pool_volume_24h: Decimal,
    pub pool_fee_bps: u16,
    pub current_yield_24h_pct: f64,
    pub gas_estimate_sol: Decimal,
    pub position_value_usd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorAction {
    Rebalance,
    Wait,
    Migrate,
    Close,
}

/// Advisor verdict on a proposed action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advice {
    pub action: AdvisorAction,
    /// 0.0 - 1.0.
    pub confidence: f64,
    pub reasoning: String,
}

#[async_trait]
pub trait Advisor: Send + Sync {
    async fn analyze_rebalance(
        &self,
        position: &Position,
        context: &MarketContext,
        trigger: RebalanceTrigger,
    ) -> Result<Advice, AdvisorError>;
}
