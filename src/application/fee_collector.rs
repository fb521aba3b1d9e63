//! Revenue fee collection.
//!
//! Applies the configured deposit/performance splits and routes the treasury
//! share through the injected signer. Running totals advance only after the
//! transfer confirms, so reported revenue never exceeds what actually moved.
//!
//! Amounts are in a token's smallest units. The agent gas reserve stays in
//! the operating wallet; it is accounted for but never transferred.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::domain::{FeeBreakdown, FeeConfig, PerformanceFeeBreakdown};
use crate::ports::{SignerError, TreasurySigner};

#[derive(Debug, Error)]
pub enum FeeCollectorError {
    #[error(transparent)]
    Signer(#[from] SignerError),
    #[error("fee amount {0} does not fit a transfer")]
    AmountOverflow(Decimal),
}

/// Outcome of a deposit fee collection.
#[derive(Debug, Clone, Serialize)]
pub struct DepositFeeReceipt {
    pub breakdown: FeeBreakdown,
    /// Transfer signature; absent when the fee rounded to zero and no
    /// transfer was needed.
    pub signature: Option<String>,
}

/// Outcome of a performance fee collection.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceFeeReceipt {
    pub breakdown: PerformanceFeeBreakdown,
    pub signature: Option<String>,
}

/// Lifetime revenue snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct FeeStats {
    pub total_deposit_fees: Decimal,
    pub total_performance_fees: Decimal,
    pub total_gas_reserved: Decimal,
    pub deposit_fee_bps: u16,
    pub performance_fee_bps: u16,
    pub treasury_address: String,
}

#[derive(Default)]
struct Totals {
    deposit_fees: Decimal,
    performance_fees: Decimal,
    gas_reserved: Decimal,
}

/// Collects protocol fees on deposits and claimed LP fees.
pub struct FeeCollector {
    config: FeeConfig,
    signer: Arc<dyn TreasurySigner>,
    totals: Mutex<Totals>,
}

impl FeeCollector {
    pub fn new(config: FeeConfig, signer: Arc<dyn TreasurySigner>) -> Self {
        Self {
            config,
            signer,
            totals: Mutex::new(Totals::default()),
        }
    }

    pub fn config(&self) -> &FeeConfig {
        &self.config
    }

    /// Take the deposit fee on an incoming deposit. Returns the split and
    /// the transfer signature; a zero fee skips the transfer entirely.
    pub async fn collect_deposit_fee(
        &self,
        deposit_amount: Decimal,
    ) -> Result<DepositFeeReceipt, FeeCollectorError> {
        let breakdown = self.config.deposit_breakdown(deposit_amount);
        let signature = self.transfer_to_treasury(breakdown.to_treasury).await?;

        if signature.is_some() {
            self.totals.lock().unwrap().deposit_fees += breakdown.to_treasury;
            tracing::info!(
                fee = %breakdown.to_treasury,
                to_position = %breakdown.to_position,
                "deposit fee collected"
            );
        }

        Ok(DepositFeeReceipt {
            breakdown,
            signature,
        })
    }

    /// Take the performance fee on claimed LP fees. The treasury share is
    /// transferred; the gas reserve is only recorded.
    pub async fn collect_performance_fee(
        &self,
        claimed_fees: Decimal,
    ) -> Result<PerformanceFeeReceipt, FeeCollectorError> {
        let breakdown = self.config.performance_breakdown(claimed_fees);
        let signature = self.transfer_to_treasury(breakdown.to_treasury).await?;

        if signature.is_some() || breakdown.to_agent_gas > Decimal::ZERO {
            let mut totals = self.totals.lock().unwrap();
            if signature.is_some() {
                totals.performance_fees += breakdown.to_treasury;
            }
            totals.gas_reserved += breakdown.to_agent_gas;
        }
        if signature.is_some() {
            tracing::info!(
                fee = %breakdown.total_fee,
                to_treasury = %breakdown.to_treasury,
                gas_reserve = %breakdown.to_agent_gas,
                "performance fee collected"
            );
        }

        Ok(PerformanceFeeReceipt {
            breakdown,
            signature,
        })
    }

    pub fn stats(&self) -> FeeStats {
        let totals = self.totals.lock().unwrap();
        FeeStats {
            total_deposit_fees: totals.deposit_fees,
            total_performance_fees: totals.performance_fees,
            total_gas_reserved: totals.gas_reserved,
            deposit_fee_bps: self.config.deposit_fee_bps,
            performance_fee_bps: self.config.performance_fee_bps,
            treasury_address: self.config.treasury_address.clone(),
        }
    }

    /// Transfer whole smallest-units to the treasury. Amounts that floor to
    /// zero need no transaction.
    async fn transfer_to_treasury(
        &self,
        amount: Decimal,
    ) -> Result<Option<String>, FeeCollectorError> {
        let lamports = amount
            .floor()
            .to_u64()
            .ok_or(FeeCollectorError::AmountOverflow(amount))?;
        if lamports == 0 {
            return Ok(None);
        }
        let signature = self
            .signer
            .transfer_lamports(&self.config.treasury_address, lamports)
            .await?;
        Ok(Some(signature))
    }
}
