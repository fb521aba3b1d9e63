//! Raydium CLMM venue adapter (API read mode).
//!
//! Pool discovery uses the v3 API's mint-pair search, filtered to
//! concentrated pools. Write operations need the signing service and
//! report a failed `TxResult`.

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

const DEFAULT_API_BASE: &str = "https://api-v3.raydium.io";

#[derive(Debug, Deserialize)]
pub(crate) struct RaydiumMint {
    pub address: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RaydiumDayStats {
    #[serde(default, deserialize_with = "flex_decimal")]
    pub volume: Decimal,
    #[serde(default, deserialize_with = "flex_decimal")]
    pub apr: Decimal,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RaydiumPoolConfig {
    #[serde(default)]
    pub tick_spacing: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RaydiumPool {
    pub id: String,
    #[serde(default, rename = "type")]
    pub pool_type: String,
    pub mint_a: RaydiumMint,
    pub mint_b: RaydiumMint,
    #[serde(default, deserialize_with = "flex_decimal")]
    pub price: Decimal,
    /// Fee rate as a fraction, e.g. 0.0025 for 25 bps.
    #[serde(default, deserialize_with = "flex_decimal")]
    pub fee_rate: Decimal,
    #[serde(default, deserialize_with = "flex_decimal")]
    pub tvl: Decimal,
    #[serde(default)]
    pub day: Option<RaydiumDayStats>,
    #[serde(default)]
    pub config: Option<RaydiumPoolConfig>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    data: Vec<RaydiumPool>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    success: bool,
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct IdsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<Option<RaydiumPool>>,
}

pub(crate) fn snapshot_from_pool(pool: &RaydiumPool) -> PoolSnapshot {
    let day = pool.day.as_ref();
    PoolSnapshot {
        venue: VenueId::Raydium,
        address: pool.id.clone(),
        token_a: TokenRef::new(pool.mint_a.address.clone(), pool.mint_a.symbol.clone()),
        token_b: TokenRef::new(pool.mint_b.address.clone(), pool.mint_b.symbol.clone()),
        current_price: pool.price,
        fee_bps: (pool.fee_rate * dec!(10000)).to_u16().unwrap_or(0),
        tvl: pool.tvl,
        volume_24h: day.map(|d| d.volume).unwrap_or(Decimal::ZERO),
        apr_24h: day.map(|d| d.apr).unwrap_or(Decimal::ZERO),
        pool_type: PoolType::Clmm,
        tick_spacing: pool.config.as_ref().and_then(|c| c.tick_spacing),
        bin_step: None,
    }
}

pub struct RaydiumAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl RaydiumAdapter {
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

    async fn fetch_by_id(&self, pool_address: &str) -> Result<RaydiumPool, VenueError> {
        let url = format!("{}/pools/info/ids?ids={pool_address}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VenueError::Rpc(e.to_string()))?;
        if !response.status().is_success() {
            return Err(VenueError::Rpc(format!("status {}", response.status())));
        }
        let body: IdsResponse = response
            .json()
            .await
            .map_err(|e| VenueError::BadData(e.to_string()))?;
        if !body.success {
            return Err(VenueError::BadData("api reported failure".to_string()));
        }
        body.data
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| VenueError::PoolNotFound(pool_address.to_string()))
    }

    fn unsupported_write(&self, operation: &str) -> TxResult {
        TxResult::failed(format!(
            "{operation} requires the transaction signing service; raydium adapter is read-only"
        ))
    }
}

impl Default for RaydiumAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueAdapter for RaydiumAdapter {
    fn venue(&self) -> VenueId {
        VenueId::Raydium
    }

    fn name(&self) -> &str {
        "Raydium CLMM"
    }

    async fn initialize(&self, _rpc_url: &str) -> Result<(), VenueError> {
        tracing::info!("raydium adapter initialized (API mode)");
        Ok(())
    }

    async fn find_pools(
        &self,
        token_a: &str,
        token_b: &str,
    ) -> Result<Vec<PoolSnapshot>, VenueError> {
        let url = format!(
            "{}/pools/info/mint?mint1={token_a}&mint2={token_b}&poolType=all&poolSortField=default&sortType=desc&pageSize=100&page=1",
            self.base_url
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VenueError::Rpc(e.to_string()))?;
        if !response.status().is_success() {
            return Err(VenueError::Rpc(format!("status {}", response.status())));
        }
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| VenueError::BadData(e.to_string()))?;
        if !body.success {
            return Err(VenueError::BadData("api reported failure".to_string()));
        }

        let mut pools: Vec<PoolSnapshot> = body
            .data
            .map(|d| d.data)
            .unwrap_or_default()
            .iter()
            .filter(|p| p.pool_type == "Concentrated")
            .map(snapshot_from_pool)
            .collect();
        pools.sort_by(|a, b| b.tvl.cmp(&a.tvl));
        Ok(pools)
    }

    async fn get_pool_info(&self, pool_address: &str) -> Result<PoolSnapshot, VenueError> {
        Ok(snapshot_from_pool(&self.fetch_by_id(pool_address).await?))
    }

    async fn get_current_price(&self, pool_address: &str) -> Result<Decimal, VenueError> {
        Ok(self.fetch_by_id(pool_address).await?.price)
    }

    async fn get_positions(&self, _owner: &str) -> Result<Vec<Position>, VenueError> {
        tracing::debug!("raydium position enumeration unavailable in API mode");
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
