//! Orca Whirlpool venue adapter (API read mode).
//!
//! The whirlpool list endpoint returns every pool on the venue in one
//! payload, so it is fetched at most once per cache window and shared by
//! all lookups. Write operations need the signing service and report a
//! failed `TxResult`.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::domain::{PoolSnapshot, PoolType, Position, TokenRef, VenueId};
use crate::ports::{
    ClosePositionParams, CollectFeesParams, CreatePositionParams, RebalanceParams, TxResult,
    VenueAdapter, VenueError, VenueOp,
};

use super::http::flex_decimal;

const DEFAULT_API_BASE: &str = "https://api.mainnet.orca.so";
const POOL_LIST_TTL: Duration = Duration::from_secs(600);
/// The full whirlpool list is tens of megabytes; give it more room than a
/// single-pool read.
const LIST_TIMEOUT_SECS: u64 = 90;

#[derive(Debug, Deserialize)]
pub(crate) struct WhirlpoolToken {
    pub mint: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WhirlpoolVolume {
    #[serde(default, deserialize_with = "flex_decimal")]
    pub day: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WhirlpoolApr {
    #[serde(default, deserialize_with = "flex_decimal")]
    pub day: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Whirlpool {
    pub address: String,
    pub token_a: WhirlpoolToken,
    pub token_b: WhirlpoolToken,
    #[serde(default, deserialize_with = "flex_decimal")]
    pub price: Decimal,
    /// Fee rate in hundredths of a basis point, e.g. 3000 for 30 bps.
    #[serde(default, deserialize_with = "flex_decimal")]
    pub fee_rate: Decimal,
    #[serde(default, deserialize_with = "flex_decimal")]
    pub tvl: Decimal,
    #[serde(default)]
    pub volume: Option<WhirlpoolVolume>,
    #[serde(default)]
    pub fee_apr: Option<WhirlpoolApr>,
    #[serde(default)]
    pub total_apr: Option<WhirlpoolApr>,
    #[serde(default)]
    pub tick_spacing: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct WhirlpoolList {
    whirlpools: Vec<Whirlpool>,
}

pub(crate) fn snapshot_from_whirlpool(pool: &Whirlpool) -> PoolSnapshot {
    let apr = pool
        .fee_apr
        .as_ref()
        .map(|a| a.day)
        .filter(|d| !d.is_zero())
        .or_else(|| pool.total_apr.as_ref().map(|a| a.day))
        .unwrap_or(Decimal::ZERO);
    PoolSnapshot {
        venue: VenueId::Orca,
        address: pool.address.clone(),
        token_a: TokenRef::new(pool.token_a.mint.clone(), pool.token_a.symbol.clone()),
        token_b: TokenRef::new(pool.token_b.mint.clone(), pool.token_b.symbol.clone()),
        current_price: pool.price,
        fee_bps: (pool.fee_rate / dec!(100)).to_u16().unwrap_or(0),
        tvl: pool.tvl,
        volume_24h: pool
            .volume
            .as_ref()
            .map(|v| v.day)
            .unwrap_or(Decimal::ZERO),
        apr_24h: apr,
        pool_type: PoolType::Whirlpool,
        tick_spacing: pool.tick_spacing,
        bin_step: None,
    }
}

struct CachedList {
    pools: Vec<PoolSnapshot>,
    fetched_at: Instant,
}

pub struct OrcaAdapter {
    client: reqwest::Client,
    base_url: String,
    // Held across the refetch so concurrent callers share one download.
    pool_list: Mutex<Option<CachedList>>,
}

impl OrcaAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(LIST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            pool_list: Mutex::new(None),
        }
    }

    /// All whirlpools, from cache when fresh.
    async fn pool_list(&self) -> Result<Vec<PoolSnapshot>, VenueError> {
        let mut guard = self.pool_list.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.fetched_at.elapsed() < POOL_LIST_TTL {
                return Ok(cached.pools.clone());
            }
        }

        let url = format!("{}/v1/whirlpool/list", self.base_url);
        tracing::debug!("fetching orca whirlpool list");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VenueError::Rpc(e.to_string()))?;
        if !response.status().is_success() {
            return Err(VenueError::Rpc(format!("status {}", response.status())));
        }
        let list: WhirlpoolList = response
            .json()
            .await
            .map_err(|e| VenueError::BadData(e.to_string()))?;

        let pools: Vec<PoolSnapshot> = list.whirlpools.iter().map(snapshot_from_whirlpool).collect();
        tracing::debug!(count = pools.len(), "cached orca whirlpool list");
        *guard = Some(CachedList {
            pools: pools.clone(),
            fetched_at: Instant::now(),
        });
        Ok(pools)
    }

    fn unsupported_write(&self, operation: &str) -> TxResult {
        TxResult::failed(format!(
            "{operation} requires the transaction signing service; orca adapter is read-only"
        ))
    }
}

impl Default for OrcaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueAdapter for OrcaAdapter {
    fn venue(&self) -> VenueId {
        VenueId::Orca
    }

    fn name(&self) -> &str {
        "Orca Whirlpools"
    }

    async fn initialize(&self, _rpc_url: &str) -> Result<(), VenueError> {
        tracing::info!("orca adapter initialized (API mode)");
        Ok(())
    }

    async fn find_pools(
        &self,
        token_a: &str,
        token_b: &str,
    ) -> Result<Vec<PoolSnapshot>, VenueError> {
        let mut pools: Vec<PoolSnapshot> = self
            .pool_list()
            .await?
            .into_iter()
            .filter(|p| {
                (p.token_a.mint == token_a && p.token_b.mint == token_b)
                    || (p.token_a.mint == token_b && p.token_b.mint == token_a)
            })
            .collect();
        pools.sort_by(|a, b| b.tvl.cmp(&a.tvl));
        Ok(pools)
    }

    async fn get_pool_info(&self, pool_address: &str) -> Result<PoolSnapshot, VenueError> {
        let url = format!("{}/v1/whirlpool/{pool_address}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VenueError::Rpc(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            // Fall back to the cached list; not every pool has a detail page.
            return self
                .pool_list()
                .await?
                .into_iter()
                .find(|p| p.address == pool_address)
                .ok_or_else(|| VenueError::PoolNotFound(pool_address.to_string()));
        }
        if !response.status().is_success() {
            return Err(VenueError::Rpc(format!("status {}", response.status())));
        }
        let pool: Whirlpool = response
            .json()
            .await
            .map_err(|e| VenueError::BadData(e.to_string()))?;
        Ok(snapshot_from_whirlpool(&pool))
    }

    async fn get_current_price(&self, pool_address: &str) -> Result<Decimal, VenueError> {
        Ok(self.get_pool_info(pool_address).await?.current_price)
    }

    async fn get_positions(&self, _owner: &str) -> Result<Vec<Position>, VenueError> {
        tracing::debug!("orca position enumeration unavailable in API mode");
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
            VenueOp::Create => dec!(0.004),
            VenueOp::Close => dec!(0.003),
            VenueOp::Rebalance => dec!(0.007),
            VenueOp::Collect => dec!(0.001),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whirlpool_mapping() {
        let json = r#"{
            "address": "whirl1",
            "tokenA": {"mint": "So11111111111111111111111111111111111111112", "symbol": "SOL"},
            "tokenB": {"mint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "symbol": "USDC"},
            "price": 151.8,
            "feeRate": 3000,
            "tvl": 5200000,
            "volume": {"day": 1200000},
            "feeApr": {"day": 35.2},
            "totalApr": {"day": 48.1},
            "tickSpacing": 64
        }"#;
        let pool: Whirlpool = serde_json::from_str(json).unwrap();
        let snapshot = snapshot_from_whirlpool(&pool);

        assert_eq!(snapshot.venue, VenueId::Orca);
        assert_eq!(snapshot.fee_bps, 30);
        assert_eq!(snapshot.apr_24h, dec!(35.2));
        assert_eq!(snapshot.volume_24h, dec!(1200000));
        assert_eq!(snapshot.tick_spacing, Some(64));
        assert_eq!(snapshot.pool_type, PoolType::Whirlpool);
    }

    #[test]
    fn test_apr_falls_back_to_total() {
        let json = r#"{
            "address": "whirl2",
            "tokenA": {"mint": "mintA", "symbol": "SOL"},
            "tokenB": {"mint": "mintB", "symbol": "USDC"},
            "price": 150,
            "feeRate": 400,
            "tvl": 100000,
            "feeApr": {"day": 0},
            "totalApr": {"day": 22.5}
        }"#;
        let pool: Whirlpool = serde_json::from_str(json).unwrap();
        let snapshot = snapshot_from_whirlpool(&pool);

        assert_eq!(snapshot.apr_24h, dec!(22.5));
        assert_eq!(snapshot.fee_bps, 4);
        assert_eq!(snapshot.volume_24h, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_write_operations_fail_cleanly() {
        let adapter = OrcaAdapter::new();
        let result = adapter
            .collect_fees(CollectFeesParams {
                position_address: "pos1".to_string(),
            })
            .await
            .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_gas_estimates() {
        let adapter = OrcaAdapter::new();
        assert_eq!(
            adapter.estimate_gas(VenueOp::Rebalance).await.unwrap(),
            dec!(0.007)
        );
        assert_eq!(
            adapter.estimate_gas(VenueOp::Create).await.unwrap(),
            dec!(0.004)
        );
    }
}
