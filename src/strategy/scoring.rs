//! Pool scoring heuristics shared by the aggregator and migration analysis.
//!
//! Venues report realized yield inconsistently or not at all, so ranking
//! uses a turnover-based fee-revenue proxy computed the same way for every
//! snapshot. Consistency across heterogeneous sources matters more here
//! than historical accuracy, and none of these numbers ever drive a
//! transaction amount, so plain `f64` is fine.

use rust_decimal::prelude::ToPrimitive;

use crate::domain::PoolSnapshot;

/// Weight given to the yield proxy in the composite score (capped at 200%
/// APR, halved to a 0-100 point scale).
const APR_CAP_PCT: f64 = 200.0;

/// Annualized fee-revenue proxy, percent: `fee_rate × (volume/tvl) × 365 × 100`.
///
/// A pool with zero or unreported TVL scores 0 rather than propagating a
/// division by zero into the ranking.
pub fn yield_proxy_apr(pool: &PoolSnapshot) -> f64 {
    let tvl = pool.tvl.to_f64().unwrap_or(0.0);
    if tvl <= 0.0 {
        return 0.0;
    }
    let volume = pool.volume_24h.to_f64().unwrap_or(0.0);
    let fee_rate = pool.fee_bps as f64 / 10_000.0;
    let apr = fee_rate * (volume / tvl) * 365.0 * 100.0;
    if apr.is_finite() {
        apr
    } else {
        0.0
    }
}

/// Composite comparison score: 50% yield proxy, 30% TVL depth, 20% volume.
///
/// TVL and volume enter on a log10 scale so an order of magnitude of depth
/// is worth a fixed number of points instead of drowning out the yield term.
pub fn composite_score(pool: &PoolSnapshot) -> f64 {
    let apr_score = yield_proxy_apr(pool).min(APR_CAP_PCT) / 2.0;
    let tvl = pool.tvl.to_f64().unwrap_or(0.0);
    let volume = pool.volume_24h.to_f64().unwrap_or(0.0);
    let tvl_score = tvl.max(1.0).log10() * 5.0;
    let volume_score = volume.max(1.0).log10() * 3.0;
    apr_score + tvl_score + volume_score
}
