//! Fee-split value objects and the exact arithmetic behind them.
//!
//! The splits are pure functions of a validated `FeeConfig`. Conservation
//! holds by construction: every split sums back to the input amount exactly,
//! because all shares are computed in `Decimal` and the remainder term is
//! derived by subtraction rather than a second rounding.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BPS_DENOMINATOR: u32 = 10_000;

#[derive(Debug, Error)]
pub enum FeeConfigError {
    #[error("treasury address must not be empty")]
    MissingTreasury,
    #[error("{field} is {value} bps, must be within [0, 10000]")]
    BpsOutOfRange { field: &'static str, value: u16 },
}

/// Parameters of the revenue model.
///
/// Defaults mirror the deployed configuration: 0.1% deposit fee, 5%
/// performance fee, 2% of the performance fee retained for agent gas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Deposit fee in basis points (10 = 0.1%).
    pub deposit_fee_bps: u16,
    /// Performance fee on claimed LP fees, basis points (500 = 5%).
    pub performance_fee_bps: u16,
    /// Treasury wallet address receiving fee revenue.
    pub treasury_address: String,
    /// Share of the performance fee kept in the operating wallet for gas,
    /// in bps of the fee itself (200 = 2%).
    pub agent_gas_reserve_bps: u16,
}

impl FeeConfig {
    /// Build a validated config. Fatal at construction time only — the
    /// split methods never fail afterwards.
    pub fn new(
        deposit_fee_bps: u16,
        performance_fee_bps: u16,
        treasury_address: impl Into<String>,
        agent_gas_reserve_bps: u16,
    ) -> Result<Self, FeeConfigError> {
        let treasury_address = treasury_address.into();
        if treasury_address.is_empty() {
            return Err(FeeConfigError::MissingTreasury);
        }
        for (field, value) in [
            ("deposit_fee_bps", deposit_fee_bps),
            ("performance_fee_bps", performance_fee_bps),
            ("agent_gas_reserve_bps", agent_gas_reserve_bps),
        ] {
            if value > BPS_DENOMINATOR as u16 {
                return Err(FeeConfigError::BpsOutOfRange { field, value });
            }
        }
        Ok(Self {
            deposit_fee_bps,
            performance_fee_bps,
            treasury_address,
            agent_gas_reserve_bps,
        })
    }

    /// Split a deposit into the LP share and the treasury share.
    pub fn deposit_breakdown(&self, deposit_amount: Decimal) -> FeeBreakdown {
        let fee = deposit_amount * Decimal::from(self.deposit_fee_bps)
            / Decimal::from(BPS_DENOMINATOR);
        FeeBreakdown {
            to_position: deposit_amount - fee,
            to_treasury: fee,
            total_fee: fee,
        }
    }

    /// Split claimed LP fees into user / treasury / agent-gas shares.
    pub fn performance_breakdown(&self, claimed_fees: Decimal) -> PerformanceFeeBreakdown {
        let total_fee = claimed_fees * Decimal::from(self.performance_fee_bps)
            / Decimal::from(BPS_DENOMINATOR);
        let gas_reserve = total_fee * Decimal::from(self.agent_gas_reserve_bps)
            / Decimal::from(BPS_DENOMINATOR);
        PerformanceFeeBreakdown {
            to_user: claimed_fees - total_fee,
            to_treasury: total_fee - gas_reserve,
            to_agent_gas: gas_reserve,
            total_fee,
        }
    }
}

/// Deposit fee split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Amount that actually enters the LP position.
    pub to_position: Decimal,
    /// Fee routed to the treasury.
    pub to_treasury: Decimal,
    pub total_fee: Decimal,
}

/// Performance fee split on claimed LP fees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceFeeBreakdown {
    /// Returned to the position owner.
    pub to_user: Decimal,
    /// Sent to the treasury.
    pub to_treasury: Decimal,
    /// Retained in the operating wallet for gas; never transferred.
    pub to_agent_gas: Decimal,
    pub total_fee: Decimal,
}
