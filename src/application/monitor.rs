//! Position monitoring and rebalance execution loop.
//!
//! One tick walks every tracked position: read the current price, evaluate
//! the rebalance triggers, execute when worthwhile, and scan for better
//! pools elsewhere. Positions are evaluated sequentially and every failure
//! is isolated — one bad venue or position never stalls the rest.
//!
//! The in-memory position map is a write-after-confirm cache: it mutates
//! only after an adapter confirms the transaction succeeded.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::{Position, PositionStatus, RebalanceDecision, RebalanceTrigger};
use crate::ports::{
    Advisor, AdvisorAction, CollectFeesParams, MarketContext, RebalanceParams, VenueAdapter,
    VenueError, VenueOp, VenueRegistry,
};
use crate::strategy::{
    analyze_migration, MigrationParams, MigrationThresholds, YieldCalcInput, YieldCalculator,
};

use super::aggregator::PoolAggregator;
use super::events::{ActivityKind, ActivityLog, DecisionLog, DecisionRecord};
use super::fee_collector::FeeCollector;
use super::oracle::PriceOracle;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Venue(#[from] VenueError),
}

/// Monitor loop settings.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub check_interval_secs: u64,
    /// Fallback SOL price when no oracle is wired or it returns nothing.
    pub sol_price_usd: f64,
    /// Estimated daily benefit must exceed gas by this factor before a
    /// yield-driven rebalance executes.
    pub gas_benefit_multiplier: Decimal,
    pub migration_scan_enabled: bool,
    /// Candidates examined per position per scan.
    pub max_migration_candidates: usize,
    /// Positions below this USD value are never worth migrating.
    pub min_migration_position_usd: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 60,
            sol_price_usd: 200.0,
            gas_benefit_multiplier: dec!(1.5),
            migration_scan_enabled: true,
            max_migration_candidates: 3,
            min_migration_position_usd: 10.0,
        }
    }
}

/// The agent's main loop: tracks positions, evaluates triggers, executes
/// rebalances, and surfaces migration opportunities.
pub struct PositionMonitor {
    config: MonitorConfig,
    registry: VenueRegistry,
    positions: RwLock<HashMap<String, Position>>,
    running: AtomicBool,
    activity: Arc<ActivityLog>,
    decisions: Arc<DecisionLog>,
    fee_collector: Option<Arc<FeeCollector>>,
    aggregator: Option<Arc<PoolAggregator>>,
    advisor: Option<Arc<dyn Advisor>>,
    oracle: Option<Arc<PriceOracle>>,
    migration_thresholds: MigrationThresholds,
}

impl PositionMonitor {
    pub fn new(
        config: MonitorConfig,
        registry: VenueRegistry,
        activity: Arc<ActivityLog>,
        decisions: Arc<DecisionLog>,
    ) -> Self {
        Self {
            config,
            registry,
            positions: RwLock::new(HashMap::new()),
            running: AtomicBool::new(false),
            activity,
            decisions,
            fee_collector: None,
            aggregator: None,
            advisor: None,
            oracle: None,
            migration_thresholds: MigrationThresholds::default(),
        }
    }

    pub fn with_fee_collector(mut self, collector: Arc<FeeCollector>) -> Self {
        self.fee_collector = Some(collector);
        self
    }

    pub fn with_aggregator(mut self, aggregator: Arc<PoolAggregator>) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn Advisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn with_oracle(mut self, oracle: Arc<PriceOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_migration_thresholds(mut self, thresholds: MigrationThresholds) -> Self {
        self.migration_thresholds = thresholds;
        self
    }

    /// Start tracking a position. Replaces any previous entry with the
    /// same id.
    pub async fn track(&self, position: Position) {
        tracing::info!(
            position = %position.id,
            venue = %position.venue,
            pool = %position.pool,
            "tracking position"
        );
        self.positions
            .write()
            .await
            .insert(position.id.clone(), position);
    }

    pub async fn untrack(&self, id: &str) -> Option<Position> {
        self.positions.write().await.remove(id)
    }

    pub async fn position(&self, id: &str) -> Option<Position> {
        self.positions.read().await.get(id).cloned()
    }

    /// Snapshot of every tracked position.
    pub async fn positions(&self) -> Vec<Position> {
        self.positions.read().await.values().cloned().collect()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the monitoring loop until `stop` is called. Idempotent: a second
    /// call while running returns immediately.
    pub async fn run(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.activity.push(
            ActivityKind::AgentStarted,
            format!(
                "monitor started, checking every {}s",
                self.config.check_interval_secs
            ),
        );
        tracing::info!(
            interval_secs = self.config.check_interval_secs,
            "position monitor started"
        );

        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.check_interval_secs.max(1)));
        while self.running.load(Ordering::SeqCst) {
            interval.tick().await;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            self.tick().await;
        }

        self.activity
            .push(ActivityKind::AgentStopped, "monitor stopped");
        tracing::info!("position monitor stopped");
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// One evaluation pass over all tracked positions.
    pub async fn tick(&self) {
        let ids: Vec<String> = self.positions.read().await.keys().cloned().collect();
        for id in ids {
            if let Err(err) = self.check_position(&id).await {
                tracing::warn!(position = %id, error = %err, "position check failed");
            }
        }
    }

    /// Evaluate one position and act on the outcome. The decision is
    /// recorded whether or not execution succeeds; closed and manually
    /// managed positions are skipped entirely.
    pub async fn check_position(&self, id: &str) -> Result<Option<RebalanceDecision>, MonitorError> {
        let Some(position) = self.positions.read().await.get(id).cloned() else {
            return Ok(None);
        };
        if position.status == PositionStatus::Closed {
            return Ok(None);
        }
        // Manually managed positions never enter evaluation: no price
        // fetch, no decision record, no migration scan.
        if !position.strategy.auto_rebalance {
            return Ok(None);
        }

        let adapter = self.registry.get(position.venue)?;
        let price = adapter.get_current_price(&position.pool).await?;
        // Pool stats feed the yield trigger and migration scan; a venue
        // that cannot serve them still gets price-based monitoring.
        let pool = adapter.get_pool_info(&position.pool).await.ok();

        let now = Utc::now();
        let mut decision = self.decide(&position, price, pool.as_ref(), now);
        decision.risk_score = Some(risk_score(&position, price, now));

        self.decisions.record(DecisionRecord {
            timestamp: now,
            position_id: position.id.clone(),
            trigger: decision.trigger,
            should_rebalance: decision.should_rebalance,
            reason: decision.reason.clone(),
            estimated_benefit: decision.estimated_benefit.and_then(|d| d.to_f64()),
            estimated_cost: decision.estimated_gas_cost.and_then(|d| d.to_f64()),
            risk_score: decision.risk_score,
        });
        self.activity.push(
            ActivityKind::RebalanceCheck,
            format!("{}: {}", position.id, decision.reason),
        );

        if decision.should_rebalance {
            self.execute_rebalance(&position, &mut decision, adapter, price, pool.as_ref(), now)
                .await?;
        }

        if self.config.migration_scan_enabled {
            if let Some(pool) = pool.as_ref() {
                self.scan_migration(&position, pool).await;
            }
        }

        Ok(Some(decision))
    }

    /// Trigger evaluation. Ordered: cooldown gate, then price exit, then
    /// yield shortfall.
    fn decide(
        &self,
        position: &Position,
        price: Decimal,
        pool: Option<&crate::domain::PoolSnapshot>,
        now: DateTime<Utc>,
    ) -> RebalanceDecision {
        if let Some(secs) = position.secs_since_rebalance(now) {
            if secs < position.strategy.min_rebalance_interval_secs {
                return RebalanceDecision::hold(format!(
                    "rebalanced {secs}s ago, below {}s minimum interval",
                    position.strategy.min_rebalance_interval_secs
                ));
            }
        }

        if !position.is_in_range(price) {
            // Recenter on the current price, preserving the range width.
            let half = position.range_width() / dec!(2);
            return RebalanceDecision {
                should_rebalance: true,
                trigger: Some(RebalanceTrigger::PriceExit),
                reason: format!(
                    "price {price} outside range [{}, {}]",
                    position.lower_price, position.upper_price
                ),
                new_lower_price: Some(price - half),
                new_upper_price: Some(price + half),
                estimated_benefit: None,
                estimated_gas_cost: None,
                risk_score: None,
            };
        }

        if let (Some(target), Some(pool)) = (position.strategy.target_daily_yield, pool) {
            if let Some(decision) = self.evaluate_yield_trigger(position, price, pool, target, now)
            {
                return decision;
            }
        }

        RebalanceDecision::hold(format!("price {price} in range, no trigger"))
    }

    /// Yield-shortfall trigger: fires when measured daily yield runs below
    /// 80% of target AND a tighter range credibly recovers at least 20%.
    fn evaluate_yield_trigger(
        &self,
        position: &Position,
        price: Decimal,
        pool: &crate::domain::PoolSnapshot,
        target: Decimal,
        now: DateTime<Utc>,
    ) -> Option<RebalanceDecision> {
        let value = position.total_value();
        let days = Decimal::from_f64(position.days_active(now))?;
        if value <= Decimal::ZERO || days <= Decimal::ZERO {
            return None;
        }

        let measured = position.total_unclaimed_fees() / value / days * dec!(100);
        if measured >= target * dec!(0.8) {
            return None;
        }

        let recommended = YieldCalculator::calculate(&YieldCalcInput {
            target_daily_yield_pct: target,
            current_price: price,
            volatility_24h_pct: Decimal::ZERO,
            pool_fee_bps: pool.fee_bps,
            volume_24h: pool.volume_24h,
            tvl: pool.tvl,
        });

        if price <= Decimal::ZERO {
            return None;
        }
        let old_width = position.range_width() / price;
        let new_width = (recommended.recommended_upper - recommended.recommended_lower) / price;
        if new_width <= Decimal::ZERO {
            return None;
        }

        // Concentration gain scaled by expected time-in-range; must beat
        // the current yield by 20% to be worth gas and slippage.
        let expected = measured * old_width / new_width * dec!(0.9);
        if expected < measured * dec!(1.2) {
            return Some(RebalanceDecision::hold(format!(
                "yield {measured:.4}%/day below target {target}%/day, \
                 but retightening gains too little ({expected:.4}%/day)"
            )));
        }

        Some(RebalanceDecision {
            should_rebalance: true,
            trigger: Some(RebalanceTrigger::YieldTarget),
            reason: format!(
                "yield {measured:.4}%/day below 80% of target {target}%/day, \
                 tighter range projects {expected:.4}%/day"
            ),
            new_lower_price: Some(recommended.recommended_lower),
            new_upper_price: Some(recommended.recommended_upper),
            estimated_benefit: Some(expected - measured),
            estimated_gas_cost: None,
            risk_score: None,
        })
    }

    async fn execute_rebalance(
        &self,
        position: &Position,
        decision: &mut RebalanceDecision,
        adapter: Arc<dyn VenueAdapter>,
        price: Decimal,
        pool: Option<&crate::domain::PoolSnapshot>,
        now: DateTime<Utc>,
    ) -> Result<(), MonitorError> {
        let (Some(new_lower), Some(new_upper)) =
            (decision.new_lower_price, decision.new_upper_price)
        else {
            return Ok(());
        };

        let gas_sol = adapter.estimate_gas(VenueOp::Rebalance).await?;
        decision.estimated_gas_cost = Some(gas_sol);

        // Yield-driven rebalances must clear the gas gate. Price exits are
        // exempt: an out-of-range position earns nothing until it moves.
        if let Some(benefit_pct) = decision.estimated_benefit {
            let daily_benefit_usd = position.total_value() * benefit_pct / dec!(100);
            let sol_price = Decimal::from_f64(self.sol_price_usd().await)
                .unwrap_or_else(|| dec!(200));
            let required = gas_sol * sol_price * self.config.gas_benefit_multiplier;
            if daily_benefit_usd < required {
                self.activity.push(
                    ActivityKind::RebalanceCheck,
                    format!(
                        "{}: skipped, daily benefit ${daily_benefit_usd:.4} under {}x gas gate",
                        position.id, self.config.gas_benefit_multiplier
                    ),
                );
                return Ok(());
            }
        }

        if let Some(advisor) = &self.advisor {
            let context = MarketContext {
                current_price: price,
                price_change_1h_pct: 0.0,
                price_change_24h_pct: 0.0,
                volatility_24h_pct: 0.0,
                pool_tvl: pool.map(|p| p.tvl).unwrap_or_default(),
                pool_volume_24h: pool.map(|p| p.volume_24h).unwrap_or_default(),
                pool_fee_bps: pool.map(|p| p.fee_bps).unwrap_or_default(),
                current_yield_24h_pct: 0.0,
                gas_estimate_sol: gas_sol,
                position_value_usd: position.total_value().to_f64().unwrap_or(0.0),
            };
            let trigger = decision.trigger.unwrap_or(RebalanceTrigger::Manual);
            match advisor.analyze_rebalance(position, &context, trigger).await {
                Ok(advice) if advice.action == AdvisorAction::Wait => {
                    self.activity.push(
                        ActivityKind::RebalanceCheck,
                        format!("{}: advisor vetoed rebalance: {}", position.id, advice.reasoning),
                    );
                    return Ok(());
                }
                Ok(_) => {}
                Err(err) => {
                    // Advisory only: unreachable advisor falls back to the
                    // rule-based decision.
                    tracing::debug!(error = %err, "advisor unavailable, proceeding");
                }
            }
        }

        let fees_collected = self.collect_pending_fees(position, adapter.as_ref()).await;

        let result = adapter
            .rebalance(RebalanceParams {
                position_address: position.id.clone(),
                new_lower_price: new_lower,
                new_upper_price: new_upper,
                slippage_bps: position.strategy.max_slippage_bps,
            })
            .await?;

        if !result.success {
            let error = result.error.unwrap_or_else(|| "unknown".to_string());
            tracing::warn!(position = %position.id, error, "rebalance transaction failed");
            self.activity.push(
                ActivityKind::RebalanceCheck,
                format!("{}: rebalance failed: {error}", position.id),
            );
            return Ok(());
        }

        let mut positions = self.positions.write().await;
        if let Some(tracked) = positions.get_mut(&position.id) {
            tracked.lower_price = new_lower;
            tracked.upper_price = new_upper;
            tracked.status = PositionStatus::Active;
            tracked.last_rebalance_at = Some(now);
            if fees_collected {
                tracked.unclaimed_fees_a = Decimal::ZERO;
                tracked.unclaimed_fees_b = Decimal::ZERO;
            }
        }
        drop(positions);

        let signature = result.signature.unwrap_or_default();
        tracing::info!(
            position = %position.id,
            %new_lower,
            %new_upper,
            %signature,
            "rebalance executed"
        );
        self.activity.push_with_details(
            ActivityKind::RebalanceCheck,
            format!("{}: rebalanced to [{new_lower}, {new_upper}]", position.id),
            serde_json::json!({
                "signature": signature,
                "trigger": decision.trigger.map(|t| t.to_string()),
            })
            .into(),
        );
        Ok(())
    }

    /// Claim pending LP fees before a rebalance closes the old range, and
    /// take the performance cut. Best-effort: any failure leaves fees
    /// unclaimed for the next pass and never blocks the rebalance.
    async fn collect_pending_fees(&self, position: &Position, adapter: &dyn VenueAdapter) -> bool {
        let Some(collector) = &self.fee_collector else {
            return false;
        };
        let claimable = position.total_unclaimed_fees();
        if claimable <= Decimal::ZERO {
            return false;
        }

        let claim = adapter
            .collect_fees(CollectFeesParams {
                position_address: position.id.clone(),
            })
            .await;
        match claim {
            Ok(result) if result.success => {}
            Ok(result) => {
                tracing::warn!(
                    position = %position.id,
                    error = result.error.unwrap_or_default(),
                    "fee claim transaction failed"
                );
                return false;
            }
            Err(err) => {
                tracing::warn!(position = %position.id, error = %err, "fee claim failed");
                return false;
            }
        }

        match collector.collect_performance_fee(claimable).await {
            Ok(receipt) => {
                self.activity.push(
                    ActivityKind::FeeCollection,
                    format!(
                        "{}: claimed {claimable} in fees, {} to treasury",
                        position.id, receipt.breakdown.to_treasury
                    ),
                );
                true
            }
            Err(err) => {
                tracing::warn!(position = %position.id, error = %err, "performance fee failed");
                // Fees were claimed on-chain even though the split failed.
                true
            }
        }
    }

    /// Advisory migration scan. Logs profitable findings; never executes a
    /// migration and never lets a scan failure surface.
    async fn scan_migration(&self, position: &Position, current_pool: &crate::domain::PoolSnapshot) {
        let Some(aggregator) = &self.aggregator else {
            return;
        };
        let value_usd = position.total_value().to_f64().unwrap_or(0.0);
        if value_usd < self.config.min_migration_position_usd {
            return;
        }

        let candidates = aggregator
            .best_pools(
                &current_pool.token_a.mint,
                &current_pool.token_b.mint,
                self.config.max_migration_candidates + 1,
            )
            .await;
        let sol_price = self.sol_price_usd().await;

        for candidate in candidates
            .iter()
            .filter(|c| {
                !(c.pool.venue == current_pool.venue && c.pool.address == current_pool.address)
            })
            .take(self.config.max_migration_candidates)
        {
            let analysis = analyze_migration(
                &MigrationParams {
                    current_pool,
                    target_pool: &candidate.pool,
                    position_value_usd: value_usd,
                    sol_price_usd: sol_price,
                },
                &self.migration_thresholds,
            );
            if analysis.profitable {
                tracing::info!(
                    position = %position.id,
                    target = %analysis.target_pool_address,
                    venue = %analysis.target_venue,
                    net_per_day = analysis.net_benefit_per_day,
                    "profitable migration found"
                );
                self.activity.push_with_details(
                    ActivityKind::MigrationCheck,
                    format!("{}: {}", position.id, analysis.reason),
                    serde_json::to_value(&analysis).ok(),
                );
            }
        }
    }

    async fn sol_price_usd(&self) -> f64 {
        if let Some(oracle) = &self.oracle {
            let price = oracle.price("SOL").await;
            if price > 0.0 {
                return price;
            }
        }
        self.config.sol_price_usd
    }
}

/// Informational 0-100 risk score; recorded with every decision but never
/// gates execution.
fn risk_score(position: &Position, price: Decimal, now: DateTime<Utc>) -> u8 {
    let mut score: i32 = 50;
    if !position.is_in_range(price) {
        score += 20;
    }
    if price > Decimal::ZERO && position.range_width() / price < dec!(0.05) {
        score += 15;
    }
    if matches!(position.secs_since_rebalance(now), Some(s) if s < 3600) {
        score -= 10;
    }
    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeeConfig, PoolSnapshot, PoolType, Strategy, TokenRef, VenueId};
    use crate::ports::mocks::{MockAdvisor, MockSigner, MockVenueAdapter};
    use chrono::Duration as ChronoDuration;

    fn pool_snapshot(venue: VenueId, address: &str, tvl: Decimal, volume: Decimal) -> PoolSnapshot {
        PoolSnapshot {
            venue,
            address: address.to_string(),
            token_a: TokenRef::new("mintA", "SOL"),
            token_b: TokenRef::new("mintB", "USDC"),
            current_price: dec!(100),
            fee_bps: 30,
            tvl,
            volume_24h: volume,
            apr_24h: dec!(0),
            pool_type: PoolType::Dlmm,
            tick_spacing: None,
            bin_step: None,
        }
    }

    fn position(id: &str, lower: Decimal, upper: Decimal) -> Position {
        Position {
            id: id.to_string(),
            owner: "owner1".to_string(),
            venue: VenueId::Meteora,
            pool: "pool1".to_string(),
            liquidity: dec!(1000),
            lower_price: lower,
            upper_price: upper,
            token_a_amount: dec!(5000),
            token_b_amount: dec!(5000),
            unclaimed_fees_a: dec!(0),
            unclaimed_fees_b: dec!(0),
            status: PositionStatus::Active,
            strategy: Strategy::default(),
            created_at: Utc::now() - ChronoDuration::days(2),
            last_rebalance_at: None,
        }
    }

    fn monitor_with(adapter: MockVenueAdapter) -> (PositionMonitor, Arc<ActivityLog>, Arc<DecisionLog>) {
        let mut registry = VenueRegistry::new();
        registry.register(Arc::new(adapter));
        let activity = Arc::new(ActivityLog::new());
        let decisions = Arc::new(DecisionLog::new());
        let monitor = PositionMonitor::new(
            MonitorConfig {
                migration_scan_enabled: false,
                ..MonitorConfig::default()
            },
            registry,
            Arc::clone(&activity),
            Arc::clone(&decisions),
        );
        (monitor, activity, decisions)
    }

    #[tokio::test]
    async fn test_in_range_position_holds() {
        let adapter = MockVenueAdapter::new(VenueId::Meteora).with_price("pool1", dec!(100));
        let (monitor, _, decisions) = monitor_with(adapter);
        monitor.track(position("pos1", dec!(90), dec!(110))).await;

        let decision = monitor.check_position("pos1").await.unwrap().unwrap();
        assert!(!decision.should_rebalance);
        assert!(decision.reason.contains("in range"));

        let recorded = decisions.recent();
        assert_eq!(recorded.len(), 1);
        assert!(!recorded[0].should_rebalance);
        assert!(recorded[0].risk_score.is_some());
    }

    #[tokio::test]
    async fn test_price_exit_recenters_preserving_width() {
        let adapter = MockVenueAdapter::new(VenueId::Meteora).with_price("pool1", dec!(115));
        let (monitor, _, _) = monitor_with(adapter);
        monitor.track(position("pos1", dec!(90), dec!(110))).await;

        let decision = monitor.check_position("pos1").await.unwrap().unwrap();
        assert!(decision.should_rebalance);
        assert_eq!(decision.trigger, Some(RebalanceTrigger::PriceExit));
        assert_eq!(decision.new_lower_price, Some(dec!(105)));
        assert_eq!(decision.new_upper_price, Some(dec!(125)));

        // Committed after the adapter confirmed.
        let updated = monitor.position("pos1").await.unwrap();
        assert_eq!(updated.lower_price, dec!(105));
        assert_eq!(updated.upper_price, dec!(125));
        assert!(updated.last_rebalance_at.is_some());
    }

    #[tokio::test]
    async fn test_min_interval_holds_even_out_of_range() {
        let adapter = MockVenueAdapter::new(VenueId::Meteora).with_price("pool1", dec!(115));
        let (monitor, _, _) = monitor_with(adapter);
        let mut pos = position("pos1", dec!(90), dec!(110));
        pos.last_rebalance_at = Some(Utc::now() - ChronoDuration::seconds(60));
        monitor.track(pos).await;

        let decision = monitor.check_position("pos1").await.unwrap().unwrap();
        assert!(!decision.should_rebalance);
        assert!(decision.reason.contains("minimum interval"));

        // No mutation.
        let unchanged = monitor.position("pos1").await.unwrap();
        assert_eq!(unchanged.lower_price, dec!(90));
    }

    #[tokio::test]
    async fn test_failed_rebalance_leaves_position_untouched() {
        let adapter = MockVenueAdapter::new(VenueId::Meteora)
            .with_price("pool1", dec!(115))
            .failing_rebalance("slippage exceeded");
        let (monitor, activity, _) = monitor_with(adapter);
        monitor.track(position("pos1", dec!(90), dec!(110))).await;

        let decision = monitor.check_position("pos1").await.unwrap().unwrap();
        assert!(decision.should_rebalance);

        let unchanged = monitor.position("pos1").await.unwrap();
        assert_eq!(unchanged.lower_price, dec!(90));
        assert_eq!(unchanged.upper_price, dec!(110));
        assert!(unchanged.last_rebalance_at.is_none());

        assert!(activity
            .recent()
            .iter()
            .any(|a| a.message.contains("rebalance failed")));
    }

    #[tokio::test]
    async fn test_auto_rebalance_off_skips_evaluation_entirely() {
        let adapter = MockVenueAdapter::new(VenueId::Meteora).with_price("pool1", dec!(115));
        let mut registry = VenueRegistry::new();
        let handle = Arc::new(adapter);
        registry.register(Arc::clone(&handle) as Arc<dyn VenueAdapter>);
        let decisions = Arc::new(DecisionLog::new());
        let monitor = PositionMonitor::new(
            MonitorConfig::default(),
            registry,
            Arc::new(ActivityLog::new()),
            Arc::clone(&decisions),
        );
        let mut pos = position("pos1", dec!(90), dec!(110));
        pos.strategy.auto_rebalance = false;
        monitor.track(pos).await;

        // Out of range, but a manual position never reaches the venue:
        // no decision recorded, no adapter call, no mutation.
        let decision = monitor.check_position("pos1").await.unwrap();
        assert!(decision.is_none());
        assert!(decisions.recent().is_empty());
        assert!(handle.calls().is_empty());

        let unchanged = monitor.position("pos1").await.unwrap();
        assert_eq!(unchanged.lower_price, dec!(90));
    }

    #[tokio::test]
    async fn test_advisor_wait_vetoes_execution() {
        let adapter = MockVenueAdapter::new(VenueId::Meteora).with_price("pool1", dec!(115));
        let mut registry = VenueRegistry::new();
        registry.register(Arc::new(adapter));
        let activity = Arc::new(ActivityLog::new());
        let monitor = PositionMonitor::new(
            MonitorConfig {
                migration_scan_enabled: false,
                ..MonitorConfig::default()
            },
            registry,
            Arc::clone(&activity),
            Arc::new(DecisionLog::new()),
        )
        .with_advisor(Arc::new(MockAdvisor::waiting("volatile, wait it out")));
        monitor.track(position("pos1", dec!(90), dec!(110))).await;

        monitor.check_position("pos1").await.unwrap();

        let unchanged = monitor.position("pos1").await.unwrap();
        assert_eq!(unchanged.lower_price, dec!(90));
        assert!(activity
            .recent()
            .iter()
            .any(|a| a.message.contains("advisor vetoed")));
    }

    #[tokio::test]
    async fn test_unavailable_advisor_falls_back_to_rules() {
        let adapter = MockVenueAdapter::new(VenueId::Meteora).with_price("pool1", dec!(115));
        let mut registry = VenueRegistry::new();
        registry.register(Arc::new(adapter));
        let monitor = PositionMonitor::new(
            MonitorConfig {
                migration_scan_enabled: false,
                ..MonitorConfig::default()
            },
            registry,
            Arc::new(ActivityLog::new()),
            Arc::new(DecisionLog::new()),
        )
        .with_advisor(Arc::new(MockAdvisor::unavailable()));
        monitor.track(position("pos1", dec!(90), dec!(110))).await;

        monitor.check_position("pos1").await.unwrap();

        // Rebalance executed despite the advisor being unreachable.
        let updated = monitor.position("pos1").await.unwrap();
        assert_eq!(updated.lower_price, dec!(105));
    }

    #[tokio::test]
    async fn test_fees_claimed_before_rebalance() {
        let adapter = MockVenueAdapter::new(VenueId::Meteora).with_price("pool1", dec!(115));
        let mut registry = VenueRegistry::new();
        registry.register(Arc::new(adapter));
        let signer = Arc::new(MockSigner::new());
        let collector = Arc::new(FeeCollector::new(
            FeeConfig::new(10, 500, "Treasury1111111111111111111111111111111111", 200).unwrap(),
            Arc::clone(&signer) as Arc<dyn crate::ports::TreasurySigner>,
        ));
        let monitor = PositionMonitor::new(
            MonitorConfig {
                migration_scan_enabled: false,
                ..MonitorConfig::default()
            },
            registry,
            Arc::new(ActivityLog::new()),
            Arc::new(DecisionLog::new()),
        )
        .with_fee_collector(Arc::clone(&collector));

        let mut pos = position("pos1", dec!(90), dec!(110));
        pos.unclaimed_fees_a = dec!(6000);
        pos.unclaimed_fees_b = dec!(4000);
        monitor.track(pos).await;

        monitor.check_position("pos1").await.unwrap();

        // 5% of 10_000 = 500 fee, minus 2% gas reserve = 490 to treasury.
        assert_eq!(signer.transfers().len(), 1);
        assert_eq!(signer.transfers()[0].1, 490);

        let updated = monitor.position("pos1").await.unwrap();
        assert_eq!(updated.unclaimed_fees_a, dec!(0));
        assert_eq!(updated.unclaimed_fees_b, dec!(0));
        assert_eq!(updated.lower_price, dec!(105));
    }

    #[tokio::test]
    async fn test_migration_scan_logs_profitable_target() {
        let home = MockVenueAdapter::new(VenueId::Meteora)
            .with_pools(vec![pool_snapshot(
                VenueId::Meteora,
                "pool1",
                dec!(1000000),
                dec!(100000),
            )])
            .with_price("pool1", dec!(100));
        let rival = MockVenueAdapter::new(VenueId::Orca).with_pools(vec![pool_snapshot(
            VenueId::Orca,
            "orca1",
            dec!(5000000),
            dec!(10000000),
        )]);

        let mut registry = VenueRegistry::new();
        registry.register(Arc::new(home));
        let mut agg_registry = registry.clone();
        agg_registry.register(Arc::new(rival));

        let activity = Arc::new(ActivityLog::new());
        let monitor = PositionMonitor::new(
            MonitorConfig::default(),
            registry,
            Arc::clone(&activity),
            Arc::new(DecisionLog::new()),
        )
        .with_aggregator(Arc::new(PoolAggregator::new(agg_registry)));

        monitor.track(position("pos1", dec!(90), dec!(110))).await;
        monitor.check_position("pos1").await.unwrap();

        let migration_logs: Vec<_> = activity
            .recent()
            .into_iter()
            .filter(|a| a.kind == ActivityKind::MigrationCheck)
            .collect();
        assert_eq!(migration_logs.len(), 1);
        assert!(migration_logs[0].message.contains("orca"));

        // Advisory only: the position itself is untouched.
        let unchanged = monitor.position("pos1").await.unwrap();
        assert_eq!(unchanged.pool, "pool1");
    }

    #[tokio::test]
    async fn test_dust_position_skips_migration_scan() {
        let home = MockVenueAdapter::new(VenueId::Meteora)
            .with_pools(vec![pool_snapshot(
                VenueId::Meteora,
                "pool1",
                dec!(1000000),
                dec!(100000),
            )])
            .with_price("pool1", dec!(100));
        let mut registry = VenueRegistry::new();
        registry.register(Arc::new(home));

        let activity = Arc::new(ActivityLog::new());
        let monitor = PositionMonitor::new(
            MonitorConfig::default(),
            registry.clone(),
            Arc::clone(&activity),
            Arc::new(DecisionLog::new()),
        )
        .with_aggregator(Arc::new(PoolAggregator::new(registry)));

        let mut pos = position("pos1", dec!(90), dec!(110));
        pos.token_a_amount = dec!(2);
        pos.token_b_amount = dec!(3);
        monitor.track(pos).await;
        monitor.check_position("pos1").await.unwrap();

        assert!(activity
            .recent()
            .iter()
            .all(|a| a.kind != ActivityKind::MigrationCheck));
    }

    #[tokio::test]
    async fn test_tick_isolates_per_position_failures() {
        // pos2 points at an unregistered venue; pos1 must still be handled.
        let adapter = MockVenueAdapter::new(VenueId::Meteora).with_price("pool1", dec!(115));
        let (monitor, _, decisions) = monitor_with(adapter);
        monitor.track(position("pos1", dec!(90), dec!(110))).await;
        let mut orphan = position("pos2", dec!(90), dec!(110));
        orphan.venue = VenueId::Raydium;
        monitor.track(orphan).await;

        monitor.tick().await;

        let updated = monitor.position("pos1").await.unwrap();
        assert_eq!(updated.lower_price, dec!(105));
        assert_eq!(decisions.recent().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_position_skipped() {
        let adapter = MockVenueAdapter::new(VenueId::Meteora).with_price("pool1", dec!(115));
        let (monitor, _, decisions) = monitor_with(adapter);
        let mut pos = position("pos1", dec!(90), dec!(110));
        pos.status = PositionStatus::Closed;
        monitor.track(pos).await;

        let result = monitor.check_position("pos1").await.unwrap();
        assert!(result.is_none());
        assert!(decisions.recent().is_empty());
    }

    #[tokio::test]
    async fn test_stop_flag() {
        let adapter = MockVenueAdapter::new(VenueId::Meteora);
        let (monitor, _, _) = monitor_with(adapter);
        assert!(!monitor.is_running());
        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[test]
    fn test_risk_score_components() {
        let now = Utc::now();
        let pos = position("pos1", dec!(90), dec!(110));
        // In range, wide, never rebalanced: baseline.
        assert_eq!(risk_score(&pos, dec!(100), now), 50);
        // Out of range.
        assert_eq!(risk_score(&pos, dec!(120), now), 70);

        let mut tight = position("pos2", dec!(99), dec!(101));
        assert_eq!(risk_score(&tight, dec!(100), now), 65);
        tight.last_rebalance_at = Some(now - ChronoDuration::seconds(120));
        assert_eq!(risk_score(&tight, dec!(100), now), 55);
    }
}
