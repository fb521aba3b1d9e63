//! Scripted port implementations for tests.
//!
//! These record every call and return pre-configured responses, letting the
//! engine's decision paths run without any network. Failure injection covers
//! the partial-failure cases the engine must isolate.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::{PoolSnapshot, Position, RebalanceTrigger, VenueId};

use super::advisor::{Advice, Advisor, AdvisorError, MarketContext};
use super::signer::{SignerError, TreasurySigner};
use super::venue::{
    ClosePositionParams, CollectFeesParams, CreatePositionParams, RebalanceParams, TxResult,
    VenueAdapter, VenueError, VenueOp,
};

/// Scripted venue adapter.
pub struct MockVenueAdapter {
    venue: VenueId,
    pools: Vec<PoolSnapshot>,
    prices: HashMap<String, Decimal>,
    gas_sol: Decimal,
    fail_discovery: bool,
    rebalance_failure: Option<String>,
    collect_failure: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockVenueAdapter {
    pub fn new(venue: VenueId) -> Self {
        Self {
            venue,
            pools: Vec::new(),
            prices: HashMap::new(),
            gas_sol: dec!(0.002),
            fail_discovery: false,
            rebalance_failure: None,
            collect_failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pools returned from `find_pools` and resolvable via `get_pool_info`.
    pub fn with_pools(mut self, pools: Vec<PoolSnapshot>) -> Self {
        self.pools = pools;
        self
    }

    /// Override the price reported for one pool address.
    pub fn with_price(mut self, pool: &str, price: Decimal) -> Self {
        self.prices.insert(pool.to_string(), price);
        self
    }

    pub fn with_gas(mut self, gas_sol: Decimal) -> Self {
        self.gas_sol = gas_sol;
        self
    }

    /// Make `find_pools` fail with an RPC error.
    pub fn failing_discovery(mut self) -> Self {
        self.fail_discovery = true;
        self
    }

    /// Make `rebalance` return an unsuccessful `TxResult`.
    pub fn failing_rebalance(mut self, error: &str) -> Self {
        self.rebalance_failure = Some(error.to_string());
        self
    }

    /// Make `collect_fees` return an unsuccessful `TxResult`.
    pub fn failing_collect(mut self, error: &str) -> Self {
        self.collect_failure = Some(error.to_string());
        self
    }

    /// All recorded method invocations, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl VenueAdapter for MockVenueAdapter {
    fn venue(&self) -> VenueId {
        self.venue
    }

    fn name(&self) -> &str {
        "mock"
    }

    async fn initialize(&self, _rpc_url: &str) -> Result<(), VenueError> {
        Ok(())
    }

    async fn find_pools(
        &self,
        token_a: &str,
        token_b: &str,
    ) -> Result<Vec<PoolSnapshot>, VenueError> {
        self.record(format!("find_pools:{token_a}/{token_b}"));
        if self.fail_discovery {
            return Err(VenueError::Rpc("mock discovery failure".to_string()));
        }
        Ok(self.pools.clone())
    }

    async fn get_pool_info(&self, pool_address: &str) -> Result<PoolSnapshot, VenueError> {
        self.record(format!("get_pool_info:{pool_address}"));
        self.pools
            .iter()
            .find(|p| p.address == pool_address)
            .cloned()
            .ok_or_else(|| VenueError::PoolNotFound(pool_address.to_string()))
    }

    async fn get_current_price(&self, pool_address: &str) -> Result<Decimal, VenueError> {
        self.record(format!("get_current_price:{pool_address}"));
        if let Some(price) = self.prices.get(pool_address) {
            return Ok(*price);
        }
        self.pools
            .iter()
            .find(|p| p.address == pool_address)
            .map(|p| p.current_price)
            .ok_or_else(|| VenueError::PoolNotFound(pool_address.to_string()))
    }

    async fn get_positions(&self, owner: &str) -> Result<Vec<Position>, VenueError> {
        self.record(format!("get_positions:{owner}"));
        Ok(Vec::new())
    }

    async fn create_position(&self, params: CreatePositionParams) -> Result<TxResult, VenueError> {
        self.record(format!("create_position:{}", params.pool));
        Ok(TxResult::ok("mock-create-sig"))
    }

    async fn close_position(&self, params: ClosePositionParams) -> Result<TxResult, VenueError> {
        self.record(format!("close_position:{}", params.position_address));
        Ok(TxResult::ok("mock-close-sig"))
    }

    async fn collect_fees(&self, params: CollectFeesParams) -> Result<TxResult, VenueError> {
        self.record(format!("collect_fees:{}", params.position_address));
        match &self.collect_failure {
            Some(err) => Ok(TxResult::failed(err.clone())),
            None => Ok(TxResult::ok("mock-collect-sig")),
        }
    }

    async fn rebalance(&self, params: RebalanceParams) -> Result<TxResult, VenueError> {
        self.record(format!(
            "rebalance:{}:[{},{}]",
            params.position_address, params.new_lower_price, params.new_upper_price
        ));
        match &self.rebalance_failure {
            Some(err) => Ok(TxResult::failed(err.clone())),
            None => Ok(TxResult::ok("mock-rebalance-sig")),
        }
    }

    async fn estimate_gas(&self, _op: VenueOp) -> Result<Decimal, VenueError> {
        self.record("estimate_gas".to_string());
        Ok(self.gas_sol)
    }
}

/// Scripted treasury signer recording transfers.
#[derive(Default)]
pub struct MockSigner {
    fail: bool,
    transfers: Arc<Mutex<Vec<(String, u64)>>>,
}

impl MockSigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            transfers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Recorded (destination, lamports) transfers.
    pub fn transfers(&self) -> Vec<(String, u64)> {
        self.transfers.lock().unwrap().clone()
    }
}

#[async_trait]
impl TreasurySigner for MockSigner {
    fn public_key(&self) -> String {
        "MockSigner11111111111111111111111111111111".to_string()
    }

    async fn transfer_lamports(&self, to: &str, lamports: u64) -> Result<String, SignerError> {
        if self.fail {
            return Err(SignerError::TransferFailed(
                "mock transfer failure".to_string(),
            ));
        }
        self.transfers
            .lock()
            .unwrap()
            .push((to.to_string(), lamports));
        Ok(format!("mock-transfer-{lamports}"))
    }
}

/// Scripted advisor returning a fixed verdict, or always erroring.
pub struct MockAdvisor {
    response: Result<Advice, String>,
}

impl MockAdvisor {
    pub fn approving() -> Self {
        Self {
            response: Ok(Advice {
                action: super::advisor::AdvisorAction::Rebalance,
                confidence: 0.9,
                reasoning: "mock approval".to_string(),
            }),
        }
    }

    pub fn waiting(reasoning: &str) -> Self {
        Self {
            response: Ok(Advice {
                action: super::advisor::AdvisorAction::Wait,
                confidence: 0.8,
                reasoning: reasoning.to_string(),
            }),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            response: Err("mock transport failure".to_string()),
        }
    }
}

#[async_trait]
impl Advisor for MockAdvisor {
    async fn analyze_rebalance(
        &self,
        _position: &Position,
        _context: &MarketContext,
        _trigger: RebalanceTrigger,
    ) -> Result<Advice, AdvisorError> {
        self.response.clone().map_err(AdvisorError::Transport)
    }
}
