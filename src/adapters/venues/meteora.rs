//! Meteora DLMM venue adapter (API read mode).
//!
//! Pool discovery and market reads go through the public DLMM API.
//! Transaction submission requires the on-chain signing service, which this
//! build does not carry; write operations report a failed `TxResult` the
//! same way an SDK-less deployment would.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::{PoolSnapshot, PoolType, Position, TokenRef, VenueId};
use crate::ports::{
    ClosePositionParams, CollectFeesParams, CreatePositionParams, RebalanceParams, TxResult,
    VenueAdapter, VenueError, VenueOp,
};

use super::http::{flex_decimal, REQUEST_TIMEOUT_SECS};

const DEFAULT_API_BASE: &str = "https://dlmm-api.meteora.ag";

/// One pair record from the DLMM API. Monetary fields arrive as strings or
/// numbers depending on endpoint version.
#[derive(Debug, Deserialize)]
pub(crate) struct MeteoraPair {
    pub address: String,
    #[serde(default)]
    pub name: String,
    pub mint_x: String,
    pub mint_y: String,
    #[serde(default, deserialize_with = "flex_decimal")]
    pub current_price: Decimal,
    #[serde(default, deserialize_with = "flex_decimal")]
    pub liquidity: Decimal,
    #[serde(default, deserialize_with = "flex_decimal")]
    pub trade_volume_24h: Decimal,
    #[serde(default, deserialize_with = "flex_decimal")]
    pub apr: Decimal,
    /// Base fee as a percentage, e.g. "0.3" for 30 bps.
    #[serde(default, deserialize_with = "flex_decimal")]
    pub base_fee_percentage: Decimal,
    #[serde(default)]
    pub bin_step: Option<u16>,
}

pub(crate) fn snapshot_from_pair(pair: &MeteoraPair) -> PoolSnapshot {
    let (symbol_a, symbol_b) = split_pair_name(&pair.name);
    PoolSnapshot {
        venue: VenueId::Meteora,
        address: pair.address.clone(),
        token_a: TokenRef::new(pair.mint_x.clone(), symbol_a),
        token_b: TokenRef::new(pair.mint_y.clone(), symbol_b),
        current_price: pair.current_price,
        fee_bps: (pair.base_fee_percentage * dec!(100))
            .to_u16()
            .unwrap_or(0),
        tvl: pair.liquidity,
        volume_24h: pair.trade_volume_24h,
        apr_24h: pair.apr,
        pool_type: PoolType::Dlmm,
        tick_spacing: None,
        bin_step: pair.bin_step,
    }
}

fn split_pair_name(name: &str) -> (String, String) {
    let mut parts = name.splitn(2, '-');
    let a = parts.next().unwrap_or("Unknown").to_string();
    let b = parts.next().unwrap_or("Unknown").to_string();
    (a, b)
}

pub struct MeteoraAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl MeteoraAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    async fn fetch_pair(&self, pool_address: &str) -> Result<MeteoraPair, VenueError> {
        let url = format!("{}/pair/{pool_address}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VenueError::Rpc(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(VenueError::PoolNotFound(pool_address.to_string()));
        }
        if !response.status().is_success() {
            return Err(VenueError::Rpc(format!("status {}", response.status())));
        }
        response
            .json::<MeteoraPair>()
            .await
            .map_err(|e| VenueError::BadData(e.to_string()))
    }

    fn unsupported_write(&self, operation: &str) -> TxResult {
        TxResult::failed(format!(
            "{operation} requires the transaction signing service; meteora adapter is read-only"
        ))
    }
}

impl Default for MeteoraAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueAdapter for MeteoraAdapter {
    fn venue(&self) -> VenueId {
        VenueId::Meteora
    }

    fn name(&self) -> &str {
        "Meteora DLMM"
    }

    async fn initialize(&self, _rpc_url: &str) -> Result<(), VenueError> {
        tracing::info!("meteora adapter initialized (API mode)");
        Ok(())
    }

    async fn find_pools(
        &self,
        token_a: &str,
        token_b: &str,
    ) -> Result<Vec<PoolSnapshot>, VenueError> {
        let url = format!("{}/pair/all", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VenueError::Rpc(e.to_string()))?;
        if !response.status().is_success() {
            return Err(VenueError::Rpc(format!("status {}", response.status())));
        }
        let pairs: Vec<MeteoraPair> = response
            .json()
            .await
            .map_err(|e| VenueError::BadData(e.to_string()))?;

        let mut pools: Vec<PoolSnapshot> = pairs
            .iter()
            .filter(|p| {
                (p.mint_x == token_a && p.mint_y == token_b)
                    || (p.mint_x == token_b && p.mint_y == token_a)
            })
            .map(snapshot_from_pair)
            .collect();
        pools.sort_by(|a, b| b.tvl.cmp(&a.tvl));
        Ok(pools)
    }

    async fn get_pool_info(&self, pool_address: &str) -> Result<PoolSnapshot, VenueError> {
        Ok(snapshot_from_pair(&self.fetch_pair(pool_address).await?))
    }

    async fn get_current_price(&self, pool_address: &str) -> Result<Decimal, VenueError> {
        Ok(self.fetch_pair(pool_address).await?.current_price)
    }

    async fn get_positions(&self, _owner: &str) -> Result<Vec<Position>, VenueError> {
        // Position enumeration needs the on-chain indexer.
        tracing::debug!("meteora position enumeration unavailable in API mode");
        Ok(Vec::new())
    }

    async fn create_position(&self, _params: CreatePositionParams) -> Result<TxResult, VenueError> {
        Ok(self.unsupported_write("create_position"))
    }

    async fn close_position(&self, _params: ClosePositionParams) -> Result<TxResult, VenueError> {
        Ok(self.unsupported_write("close_position"))
    }

    async fn collect_fees(&self, _params: CollectFeesParams) -> Result<TxResult, VenueError> {
        Ok(self.unsupported_write("collect_fees"))
    }

    async fn rebalance(&self, _params: RebalanceParams) -> Result<TxResult, VenueError> {
        // No native rebalance on DLMM: close + reopen, both of which need
        // the signing service.
        Ok(self.unsupported_write("rebalance"))
    }

    async fn estimate_gas(&self, op: VenueOp) -> Result<Decimal, VenueError> {
        Ok(match op {
            VenueOp::Create => dec!(0.003),
            VenueOp::Close => dec!(0.002),
            VenueOp::Rebalance => dec!(0.005),
            VenueOp::Collect => dec!(0.001),
        })
    }
}
