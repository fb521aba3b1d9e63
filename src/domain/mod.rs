//! Domain Layer - Core data model for the liquidity agent
//!
//! Pure types and invariants with no I/O: pool snapshots, positions,
//! rebalance decisions, and fee-split value objects. All external
//! interaction happens through the ports layer.

pub mod decision;
pub mod fees;
pub mod pool;
pub mod position;

pub use decision::{RebalanceDecision, RebalanceTrigger};
pub use fees::{FeeBreakdown, FeeConfig, FeeConfigError, PerformanceFeeBreakdown};
pub use pool::{PoolSnapshot, PoolType, TokenRef, VenueId};
pub use position::{Position, PositionError, PositionStatus, Strategy};
