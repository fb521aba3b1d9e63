//! Rebalance decisions produced by the monitor's evaluation pass.
//!
//! Decisions are transient: they drive one tick's execution and are recorded
//! in the decision log, never persisted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What caused a rebalance to be considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceTrigger {
    /// Current price moved outside [lower, upper].
    PriceExit,
    /// Measured yield fell below the configured target.
    YieldTarget,
    TimeBased,
    Manual,
}

impl fmt::Display for RebalanceTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceTrigger::PriceExit => write!(f, "price_exit"),
            RebalanceTrigger::YieldTarget => write!(f, "yield_target"),
            RebalanceTrigger::TimeBased => write!(f, "time_based"),
            RebalanceTrigger::Manual => write!(f, "manual"),
        }
    }
}

/// Outcome of evaluating one position during a tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceDecision {
    pub should_rebalance: bool,
    pub trigger: Option<RebalanceTrigger>,
    pub reason: String,
    pub new_lower_price: Option<Decimal>,
    pub new_upper_price: Option<Decimal>,
    /// Expected daily yield improvement, percent.
    pub estimated_benefit: Option<Decimal>,
    /// Estimated gas for the rebalance, SOL.
    pub estimated_gas_cost: Option<Decimal>,
    /// Informational risk score, 0-100. Not a gating input.
    pub risk_score: Option<u8>,
}

impl RebalanceDecision {
    /// A decision that takes no action.
    pub fn hold(reason: impl Into<String>) -> Self {
        Self {
            should_rebalance: false,
            trigger: None,
            reason: reason.into(),
            new_lower_price: None,
            new_upper_price: None,
            estimated_benefit: None,
            estimated_gas_cost: None,
            risk_score: None,
        }
    }
}
