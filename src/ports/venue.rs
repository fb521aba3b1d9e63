//! Venue adapter port.
//!
//! Every supported venue (Meteora, Orca, Raydium) ships one adapter
//! implementing this capability set. The engine treats adapters uniformly
//! and tolerates any of them throwing, returning empty lists, or returning
//! partially populated snapshots.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{PoolSnapshot, Position, VenueId};

#[derive(Debug, Error)]
pub enum VenueError {
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("pool not found: {0}")]
    PoolNotFound(String),
    #[error("venue returned unusable data: {0}")]
    BadData(String),
    #[error("no adapter registered for venue {0}")]
    NotRegistered(VenueId),
    #[error("operation timed out: {0}")]
    Timeout(String),
}

/// On-chain operations a venue can estimate gas for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueOp {
    Create,
    Close,
    Rebalance,
    Collect,
}

/// Result of a submitted venue transaction.
#[derive(Debug, Clone, Default)]
pub struct TxResult {
    pub success: bool,
    pub signature: Option<String>,
    pub error: Option<String>,
    /// Refreshed position state after the transaction, when the venue
    /// returns it.
    pub position: Option<Position>,
}

impl TxResult {
    pub fn ok(signature: impl Into<String>) -> Self {
        Self {
            success: true,
            signature: Some(signature.into()),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePositionParams {
    pub pool: String,
    pub token_a_amount: Decimal,
    pub token_b_amount: Decimal,
    pub lower_price: Decimal,
    pub upper_price: Decimal,
    pub slippage_bps: u16,
}

#[derive(Debug, Clone)]
pub struct ClosePositionParams {
    pub position_address: String,
    /// Withdraw only a portion when set, 0-100.
    pub percent_to_withdraw: Option<u8>,
    pub slippage_bps: u16,
}

#[derive(Debug, Clone)]
pub struct CollectFeesParams {
    pub position_address: String,
}

#[derive(Debug, Clone)]
pub struct RebalanceParams {
    pub position_address: String,
    pub new_lower_price: Decimal,
    pub new_upper_price: Decimal,
    pub slippage_bps: u16,
}

/// Capability contract implemented once per venue.
///
/// Adapters own their request timeouts: a hung external call must fail the
/// adapter, not stall the caller indefinitely.
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    fn venue(&self) -> VenueId;
    fn name(&self) -> &str;

    /// Connect to the venue's RPC/API endpoints.
    async fn initialize(&self, rpc_url: &str) -> Result<(), VenueError>;

    /// Find pools for a token pair. An empty list is a valid answer.
    async fn find_pools(
        &self,
        token_a: &str,
        token_b: &str,
    ) -> Result<Vec<PoolSnapshot>, VenueError>;

    async fn get_pool_info(&self, pool_address: &str) -> Result<PoolSnapshot, VenueError>;

    async fn get_current_price(&self, pool_address: &str) -> Result<Decimal, VenueError>;

    async fn get_positions(&self, owner: &str) -> Result<Vec<Position>, VenueError>;

    async fn create_position(&self, params: CreatePositionParams) -> Result<TxResult, VenueError>;

    async fn close_position(&self, params: ClosePositionParams) -> Result<TxResult, VenueError>;

    async fn collect_fees(&self, params: CollectFeesParams) -> Result<TxResult, VenueError>;

    /// Close + reopen at a new range, or a native rebalance where the venue
    /// supports one.
    async fn rebalance(&self, params: RebalanceParams) -> Result<TxResult, VenueError>;

    /// Estimated gas cost in SOL for one operation.
    async fn estimate_gas(&self, op: VenueOp) -> Result<Decimal, VenueError>;
}

/// Lookup table from venue id to its adapter.
#[derive(Default, Clone)]
pub struct VenueRegistry {
    adapters: HashMap<VenueId, Arc<dyn VenueAdapter>>,
}

impl VenueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn VenueAdapter>) {
        tracing::info!(venue = %adapter.venue(), name = adapter.name(), "registered venue adapter");
        self.adapters.insert(adapter.venue(), adapter);
    }

    pub fn get(&self, venue: VenueId) -> Result<Arc<dyn VenueAdapter>, VenueError> {
        self.adapters
            .get(&venue)
            .cloned()
            .ok_or(VenueError::NotRegistered(venue))
    }

    pub fn all(&self) -> Vec<Arc<dyn VenueAdapter>> {
        self.adapters.values().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
