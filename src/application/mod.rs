//! Application Layer - Orchestration over domain, strategy, and ports
//!
//! - `aggregator`: cross-venue pool discovery and ranking
//! - `fee_collector`: deposit and performance fee routing
//! - `monitor`: the rebalance/migration evaluation loop
//! - `oracle`: USD price lookups with a TTL cache
//! - `events`: capped activity and decision logs

pub mod aggregator;
pub mod events;
pub mod fee_collector;
pub mod monitor;
pub mod oracle;

pub use aggregator::{PoolAggregator, PoolComparison, PoolRecommendation, ScoredPool};
pub use events::{Activity, ActivityKind, ActivityLog, DecisionLog, DecisionRecord};
pub use fee_collector::{
    DepositFeeReceipt, FeeCollector, FeeCollectorError, FeeStats, PerformanceFeeReceipt,
};
pub use monitor::{MonitorConfig, MonitorError, PositionMonitor};
pub use oracle::{CoinGeckoSource, OracleError, PriceOracle, PriceSource};
