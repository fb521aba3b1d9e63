//! Cross-venue migration cost/benefit analysis.
//!
//! Pure query: given two pool snapshots and cost assumptions, decide
//! whether moving a position is worth it. Never mutates state or submits
//! transactions — the monitor only logs profitable findings.

use serde::{Deserialize, Serialize};

use crate::domain::{PoolSnapshot, PoolType, VenueId};
use crate::strategy::scoring::yield_proxy_apr;

/// Profitability thresholds. Tuned against production observations;
/// override individual fields rather than re-deriving different numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationThresholds {
    /// Migration must pay for itself within this many days.
    pub max_break_even_days: f64,
    /// Minimum absolute net benefit floor, USD/day.
    pub min_net_benefit_per_day_usd: f64,
    /// Target pools below this TVL are rejected outright, USD.
    pub min_target_tvl_usd: f64,
    /// Transaction cost of a migration (close + open), SOL.
    pub tx_cost_sol: f64,
}

impl Default for MigrationThresholds {
    fn default() -> Self {
        Self {
            max_break_even_days: 7.0,
            min_net_benefit_per_day_usd: 0.5,
            min_target_tvl_usd: 50_000.0,
            tx_cost_sol: 0.01,
        }
    }
}

/// Inputs to a migration analysis.
#[derive(Debug, Clone)]
pub struct MigrationParams<'a> {
    pub current_pool: &'a PoolSnapshot,
    pub target_pool: &'a PoolSnapshot,
    pub position_value_usd: f64,
    pub sol_price_usd: f64,
}

/// Result of a migration profitability analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationAnalysis {
    pub profitable: bool,
    /// Net yield improvement per day in USD after amortized costs.
    pub net_benefit_per_day: f64,
    /// Days until migration costs are recovered; infinite when the target
    /// does not out-yield the current pool.
    pub break_even_days: f64,
    pub reason: String,
    pub target_pool_address: String,
    pub target_venue: VenueId,
    pub target_pool_type: PoolType,
    pub target_tvl: f64,
    pub target_apr: f64,
}

/// Slippage cost of moving `position_value_usd` through a pool of the given
/// depth, charged on both the close and the open leg. Quadratic in position
/// size relative to TVL, capped at 5% per leg.
fn estimate_slippage_cost_usd(position_value_usd: f64, pool_tvl_usd: f64) -> f64 {
    if pool_tvl_usd <= 0.0 {
        // Worst case when depth is unknown.
        return position_value_usd * 0.05;
    }
    let ratio = position_value_usd / pool_tvl_usd;
    let slippage_pct = (ratio * 0.5).min(0.05);
    position_value_usd * slippage_pct * 2.0
}

/// Analyze whether migrating a position from one pool to another pays off.
///
/// Migrating a pool to itself is always unprofitable, both by the explicit
/// identity check and because a zero yield difference gives an infinite
/// breakeven.
pub fn analyze_migration(
    params: &MigrationParams<'_>,
    thresholds: &MigrationThresholds,
) -> MigrationAnalysis {
    let target = params.target_pool;
    let current = params.current_pool;
    let target_tvl = decimal_to_f64(target.tvl);
    let target_apr = yield_proxy_apr(target);

    let base = |profitable: bool, net: f64, break_even: f64, reason: String| MigrationAnalysis {
        profitable,
        net_benefit_per_day: net,
        break_even_days: break_even,
        reason,
        target_pool_address: target.address.clone(),
        target_venue: target.venue,
        target_pool_type: target.pool_type,
        target_tvl,
        target_apr,
    };

    if target.venue == current.venue && target.address == current.address {
        return base(
            false,
            0.0,
            f64::INFINITY,
            "target pool is the current pool".to_string(),
        );
    }

    if target_tvl < thresholds.min_target_tvl_usd {
        return base(
            false,
            0.0,
            f64::INFINITY,
            format!(
                "target pool TVL (${target_tvl:.0}) below minimum (${:.0})",
                thresholds.min_target_tvl_usd
            ),
        );
    }

    // Proxy daily yields scaled to dollars/day on this position.
    let current_apr = yield_proxy_apr(current);
    let current_daily_usd = current_apr / 100.0 / 365.0 * params.position_value_usd;
    let target_daily_usd = target_apr / 100.0 / 365.0 * params.position_value_usd;
    let daily_yield_diff = target_daily_usd - current_daily_usd;

    let tx_cost_usd = thresholds.tx_cost_sol * params.sol_price_usd;
    let slippage_cost_usd = estimate_slippage_cost_usd(params.position_value_usd, target_tvl);
    let migration_cost_usd = tx_cost_usd + slippage_cost_usd;

    let break_even_days = if daily_yield_diff > 0.0 {
        migration_cost_usd / daily_yield_diff
    } else {
        f64::INFINITY
    };

    // Costs amortized over the break-even window give the steady-state
    // daily benefit.
    let amortized_daily_cost = migration_cost_usd / thresholds.max_break_even_days;
    let net_benefit_per_day = daily_yield_diff - amortized_daily_cost;

    let profitable = break_even_days < thresholds.max_break_even_days
        && net_benefit_per_day > thresholds.min_net_benefit_per_day_usd;

    let reason = if profitable {
        format!(
            "migration to {} pool {} recommended: yield improves {current_apr:.1}% -> {target_apr:.1}% APR, \
             net ${net_benefit_per_day:.2}/day after costs, break-even in {break_even_days:.1} days \
             (cost ${migration_cost_usd:.2}: tx ${tx_cost_usd:.2}, slippage ${slippage_cost_usd:.2})",
            target.venue,
            short_address(&target.address),
        )
    } else {
        let mut reasons = Vec::new();
        if daily_yield_diff <= 0.0 {
            reasons.push(format!(
                "target APR ({target_apr:.1}%) not higher than current ({current_apr:.1}%)"
            ));
        }
        if break_even_days >= thresholds.max_break_even_days {
            let be = if break_even_days.is_infinite() {
                "inf".to_string()
            } else {
                format!("{break_even_days:.1}")
            };
            reasons.push(format!(
                "break-even {be} days exceeds {:.0}-day limit",
                thresholds.max_break_even_days
            ));
        }
        if net_benefit_per_day <= thresholds.min_net_benefit_per_day_usd {
            reasons.push(format!(
                "net benefit ${net_benefit_per_day:.2}/day below ${:.2} floor",
                thresholds.min_net_benefit_per_day_usd
            ));
        }
        format!(
            "migration to {} pool {} not recommended: {}",
            target.venue,
            short_address(&target.address),
            reasons.join("; ")
        )
    };

    base(profitable, net_benefit_per_day, break_even_days, reason)
}

// Addresses come straight from venue JSON, so truncate on char
// boundaries rather than bytes.
fn short_address(address: &str) -> &str {
    match address.char_indices().nth(8) {
        Some((idx, _)) => &address[..idx],
        None => address,
    }
}

fn decimal_to_f64(value: rust_decimal::Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TokenRef;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn pool(venue: VenueId, address: &str, fee_bps: u16, tvl: Decimal, volume: Decimal) -> PoolSnapshot {
        PoolSnapshot {
            venue,
            address: address.to_string(),
            token_a: TokenRef::new("mintA", "SOL"),
            token_b: TokenRef::new("mintB", "USDC"),
            current_price: dec!(100),
            fee_bps,
            tvl,
            volume_24h: volume,
            apr_24h: dec!(0),
            pool_type: PoolType::Dlmm,
            tick_spacing: None,
            bin_step: None,
        }
    }

    fn analyze(current: &PoolSnapshot, target: &PoolSnapshot, value: f64) -> MigrationAnalysis {
        analyze_migration(
            &MigrationParams {
                current_pool: current,
                target_pool: target,
                position_value_usd: value,
                sol_price_usd: 150.0,
            },
            &MigrationThresholds::default(),
        )
    }

    #[test]
    fn test_self_migration_never_profitable() {
        let p = pool(VenueId::Meteora, "pool1", 30, dec!(1000000), dec!(500000));
        let analysis = analyze(&p, &p, 10_000.0);
        assert!(!analysis.profitable);
        assert!(analysis.break_even_days.is_infinite());
        assert!(analysis.reason.contains("current pool"));
    }

    #[test]
    fn test_low_tvl_target_rejected() {
        let current = pool(VenueId::Meteora, "pool1", 30, dec!(1000000), dec!(100000));
        let target = pool(VenueId::Orca, "pool2", 100, dec!(10000), dec!(100000));
        let analysis = analyze(&current, &target, 10_000.0);
        assert!(!analysis.profitable);
        assert!(analysis.reason.contains("below minimum"));
    }

    #[test]
    fn test_clearly_better_target_profitable() {
        // Current: 30 bps, turnover 0.1 -> ~11% APR.
        let current = pool(VenueId::Meteora, "pool1", 30, dec!(1000000), dec!(100000));
        // Target: 30 bps, turnover 2.0 -> ~219% APR, deep pool.
        let target = pool(VenueId::Orca, "pool2", 30, dec!(5000000), dec!(10000000));
        let analysis = analyze(&current, &target, 10_000.0);
        assert!(analysis.profitable, "reason: {}", analysis.reason);
        assert!(analysis.net_benefit_per_day > 0.5);
        assert!(analysis.break_even_days < 7.0);
        assert_eq!(analysis.target_venue, VenueId::Orca);
    }

    #[test]
    fn test_worse_target_unprofitable() {
        let current = pool(VenueId::Meteora, "pool1", 30, dec!(1000000), dec!(2000000));
        let target = pool(VenueId::Orca, "pool2", 30, dec!(1000000), dec!(100000));
        let analysis = analyze(&current, &target, 10_000.0);
        assert!(!analysis.profitable);
        assert!(analysis.break_even_days.is_infinite());
        assert!(analysis.reason.contains("not higher than current"));
    }

    #[test]
    fn test_marginal_improvement_blocked_by_floor() {
        // Tiny position: any improvement in dollars stays under the floor.
        let current = pool(VenueId::Meteora, "pool1", 30, dec!(1000000), dec!(100000));
        let target = pool(VenueId::Orca, "pool2", 30, dec!(1000000), dec!(200000));
        let analysis = analyze(&current, &target, 50.0);
        assert!(!analysis.profitable);
    }

    #[test]
    fn test_slippage_scales_with_position_size() {
        let small = estimate_slippage_cost_usd(1_000.0, 1_000_000.0);
        let large = estimate_slippage_cost_usd(100_000.0, 1_000_000.0);
        assert!(large > small);
        // Cap at 5% per leg.
        let capped = estimate_slippage_cost_usd(500_000.0, 1_000_000.0);
        assert!((capped - 500_000.0 * 0.05 * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_tvl_slippage_worst_case() {
        assert!((estimate_slippage_cost_usd(1_000.0, 0.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_thresholds_overridable() {
        let current = pool(VenueId::Meteora, "pool1", 30, dec!(1000000), dec!(100000));
        let target = pool(VenueId::Orca, "pool2", 30, dec!(1000000), dec!(200000));
        // Default floor blocks a $50 position...
        let strict = analyze(&current, &target, 50.0);
        assert!(!strict.profitable);
        // ...a zero floor lets the same improvement through.
        let lenient = analyze_migration(
            &MigrationParams {
                current_pool: &current,
                target_pool: &target,
                position_value_usd: 50.0,
                sol_price_usd: 150.0,
            },
            &MigrationThresholds {
                min_net_benefit_per_day_usd: -10.0,
                max_break_even_days: 10_000.0,
                ..MigrationThresholds::default()
            },
        );
        assert!(lenient.profitable, "reason: {}", lenient.reason);
    }

    #[test]
    fn test_short_address_handles_multibyte_input() {
        assert_eq!(short_address("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM"), "9WzDXwBb");
        assert_eq!(short_address("abc"), "abc");
        // Malformed venue output must truncate, not panic.
        assert_eq!(short_address("ポートフォリオ再配分テスト"), "ポートフォリオ再");
        assert_eq!(short_address(""), "");
    }
}
