//! Cross-venue pool discovery and ranking.
//!
//! Fans a pair query out to every registered venue adapter concurrently and
//! merges the answers. One venue failing, timing out, or returning garbage
//! never hides the others' pools.

use futures::future::join_all;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{PoolSnapshot, PoolType, VenueId};
use crate::ports::VenueRegistry;
use crate::strategy::{composite_score, yield_proxy_apr};

/// A pool with its ranking score and the APR used to rank it.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPool {
    pub pool: PoolSnapshot,
    /// Composite ranking score, higher is better.
    pub score: f64,
    /// Fee-turnover proxy APR. Venue-reported APRs are computed
    /// inconsistently across venues, so the proxy replaces them for every
    /// pool and ranking and display always agree.
    pub effective_apr: f64,
}

/// Best-pool recommendation for a token pair.
#[derive(Debug, Clone, Serialize)]
pub struct PoolRecommendation {
    pub venue: VenueId,
    pub pool_address: String,
    pub pool_type: PoolType,
    pub estimated_apr: f64,
    pub reason: String,
}

/// Side-by-side ranking of every discovered pool for a pair.
#[derive(Debug, Clone, Serialize)]
pub struct PoolComparison {
    pub ranked: Vec<ScoredPool>,
    pub recommendation: Option<PoolRecommendation>,
}

/// Uniform read layer over all registered venues.
pub struct PoolAggregator {
    registry: VenueRegistry,
}

impl PoolAggregator {
    pub fn new(registry: VenueRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &VenueRegistry {
        &self.registry
    }

    /// All pools for a token pair across every venue, deepest first.
    ///
    /// Adapters are queried concurrently; a failing adapter contributes an
    /// empty list and a warning.
    pub async fn find_pools_for_pair(&self, token_a: &str, token_b: &str) -> Vec<PoolSnapshot> {
        let adapters = self.registry.all();
        let queries = adapters.iter().map(|adapter| {
            let adapter = adapter.clone();
            async move {
                match adapter.find_pools(token_a, token_b).await {
                    Ok(pools) => pools,
                    Err(err) => {
                        tracing::warn!(
                            venue = %adapter.venue(),
                            error = %err,
                            "pool discovery failed, skipping venue"
                        );
                        Vec::new()
                    }
                }
            }
        });

        let mut pools: Vec<PoolSnapshot> = join_all(queries).await.into_iter().flatten().collect();
        pools.sort_by(|a, b| b.tvl.cmp(&a.tvl));
        pools
    }

    /// Top pools for a pair by composite score.
    ///
    /// Every pool's APR is replaced with the fee-turnover proxy so venues
    /// with incomparable APR methodologies rank on the same footing.
    pub async fn best_pools(&self, token_a: &str, token_b: &str, limit: usize) -> Vec<ScoredPool> {
        let pools = self.find_pools_for_pair(token_a, token_b).await;

        let mut scored: Vec<ScoredPool> = pools
            .into_iter()
            .map(|mut pool| {
                let effective_apr = yield_proxy_apr(&pool);
                pool.apr_24h = Decimal::from_f64(effective_apr).unwrap_or(Decimal::ZERO);
                let score = composite_score(&pool);
                ScoredPool {
                    pool,
                    score,
                    effective_apr,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        scored
    }

    /// Full ranked comparison plus a single recommendation, or no
    /// recommendation when no venue knows the pair.
    pub async fn compare_pools_for_pair(&self, token_a: &str, token_b: &str) -> PoolComparison {
        let ranked = self.best_pools(token_a, token_b, usize::MAX).await;

        let recommendation = ranked.first().map(|best| PoolRecommendation {
            venue: best.pool.venue,
            pool_address: best.pool.address.clone(),
            pool_type: best.pool.pool_type,
            estimated_apr: best.effective_apr,
            reason: format!(
                "{} {} pool leads with score {:.1}: est. {:.1}% APR, ${:.0} TVL, ${:.0} 24h volume",
                best.pool.venue,
                best.pool.token_pair(),
                best.score,
                best.effective_apr,
                decimal_to_f64(best.pool.tvl),
                decimal_to_f64(best.pool.volume_24h),
            ),
        });

        PoolComparison {
            ranked,
            recommendation,
        }
    }
}

fn decimal_to_f64(value: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().unwrap_or(0.0)
}
