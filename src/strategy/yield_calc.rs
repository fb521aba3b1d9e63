//! Range recommendation math for a target daily yield.
//!
//! Key tradeoff: a tighter range concentrates fee capture inversely to its
//! width, but volatility exceeding the range forces proportionally more
//! rebalances. `calculate` solves for the width that hits the target,
//! clamps it to sane bounds, and prices in the expected rebalance gas.
//!
//! Pure math, no I/O. All monetary quantities are `Decimal`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Narrowest recommendable range, as a fraction of price.
pub const MIN_RANGE_WIDTH: Decimal = dec!(0.01);
/// Widest recommendable range; yields diminish beyond this.
pub const MAX_RANGE_WIDTH: Decimal = dec!(0.50);
/// Assumed fraction of time the position stays in range.
const TIME_IN_RANGE: Decimal = dec!(0.9);
/// Approximate gas per rebalance, SOL.
const REBALANCE_GAS_SOL: Decimal = dec!(0.001);
/// Reference SOL price for gas amortization.
const SOL_PRICE_USD: Decimal = dec!(200);
/// Gas is amortized per $1,000 of position value.
const NORMALIZATION_USD: Decimal = dec!(1000);
/// Default horizon over which a rebalance must recoup its gas, days.
pub const DEFAULT_BREAKEVEN_DAYS: Decimal = dec!(2);

/// Inputs to a range recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldCalcInput {
    /// Target daily yield, percent (0.4 = 0.4%/day).
    pub target_daily_yield_pct: Decimal,
    pub current_price: Decimal,
    /// 24h price volatility, percent.
    pub volatility_24h_pct: Decimal,
    pub pool_fee_bps: u16,
    pub volume_24h: Decimal,
    pub tvl: Decimal,
}

/// Recommended range and its expected economics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldCalcOutput {
    pub recommended_lower: Decimal,
    pub recommended_upper: Decimal,
    /// Range width as a percentage of price, within [1, 50].
    pub range_width_pct: Decimal,
    /// Net of amortized rebalance gas, percent per day.
    pub estimated_daily_yield_pct: Decimal,
    pub estimated_rebalances_per_day: f64,
    /// 0-100.
    pub confidence: u8,
}

/// Directional read on recent price action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Momentum {
    Bullish,
    Bearish,
    Neutral,
}

pub struct YieldCalculator;

impl YieldCalculator {
    /// Recommend a price range for the target daily yield.
    ///
    /// Invalid inputs (zero TVL, non-positive target or price) short-circuit
    /// to the widest clamped range with zero estimated yield instead of
    /// letting a division by zero reach the caller.
    pub fn calculate(input: &YieldCalcInput) -> YieldCalcOutput {
        if input.tvl <= Decimal::ZERO
            || input.target_daily_yield_pct <= Decimal::ZERO
            || input.current_price <= Decimal::ZERO
        {
            return Self::degenerate(input.current_price);
        }

        let target_yield = input.target_daily_yield_pct / dec!(100);
        let fee_rate = Decimal::from(input.pool_fee_bps) / dec!(10000);
        // Fee revenue per $ of liquidity per day.
        let daily_fee_revenue = input.volume_24h * fee_rate / input.tvl;

        // Solve target = revenue × time_in_range / width for the width,
        // then clamp. Tighter ranges multiply fee capture by ~1/width.
        let mut width = daily_fee_revenue * TIME_IN_RANGE / target_yield;
        let clamped = width < MIN_RANGE_WIDTH || width > MAX_RANGE_WIDTH;
        width = width.clamp(MIN_RANGE_WIDTH, MAX_RANGE_WIDTH);

        let half_width = width / dec!(2);
        let recommended_lower = input.current_price * (Decimal::ONE - half_width);
        let recommended_upper = input.current_price * (Decimal::ONE + half_width);

        // Volatility above the range width implies proportionally more
        // range resets per day.
        let volatility = input.volatility_24h_pct / dec!(100);
        let volatility_ratio = volatility / width;
        let rebalances_per_day = if volatility_ratio > Decimal::ONE {
            volatility_ratio
        } else if volatility_ratio > dec!(0.5) {
            dec!(0.5)
        } else {
            Decimal::ZERO
        };

        let rebalance_cost_usd = REBALANCE_GAS_SOL * SOL_PRICE_USD * rebalances_per_day;
        let gross_yield = daily_fee_revenue / width * TIME_IN_RANGE;
        let net_yield = gross_yield - rebalance_cost_usd / NORMALIZATION_USD;

        let mut confidence: i32 = 80;
        if clamped {
            confidence -= 20;
        }
        if volatility_ratio > dec!(2) {
            confidence -= 15;
        }
        if input.volume_24h < input.tvl * dec!(0.1) {
            confidence -= 10;
        }

        YieldCalcOutput {
            recommended_lower,
            recommended_upper,
            range_width_pct: width * dec!(100),
            estimated_daily_yield_pct: net_yield * dec!(100),
            estimated_rebalances_per_day: rebalances_per_day.to_f64().unwrap_or(0.0),
            confidence: confidence.clamp(0, 100) as u8,
        }
    }

    fn degenerate(current_price: Decimal) -> YieldCalcOutput {
        // Widest range around the price (or a unit range when the price
        // itself is unusable) keeps lower < upper while signalling zero
        // expected yield.
        let (lower, upper) = if current_price > Decimal::ZERO {
            let half = MAX_RANGE_WIDTH / dec!(2);
            (
                current_price * (Decimal::ONE - half),
                current_price * (Decimal::ONE + half),
            )
        } else {
            (Decimal::ZERO, Decimal::ONE)
        };
        YieldCalcOutput {
            recommended_lower: lower,
            recommended_upper: upper,
            range_width_pct: MAX_RANGE_WIDTH * dec!(100),
            estimated_daily_yield_pct: Decimal::ZERO,
            estimated_rebalances_per_day: 0.0,
            confidence: 0,
        }
    }

    /// Whether a rebalance recoups its gas within `breakeven_horizon_days`.
    ///
    /// A non-improvement (zero or negative yield delta) means an infinite
    /// breakeven and is never profitable.
    pub fn is_rebalance_profitable(
        current_yield_pct: Decimal,
        expected_yield_after_pct: Decimal,
        gas_cost_sol: Decimal,
        position_value_usd: Decimal,
        breakeven_horizon_days: Decimal,
    ) -> bool {
        let improvement = expected_yield_after_pct - current_yield_pct;
        let daily_benefit_usd = position_value_usd * improvement / dec!(100);
        if daily_benefit_usd <= Decimal::ZERO {
            return false;
        }
        let gas_cost_usd = gas_cost_sol * SOL_PRICE_USD;
        let breakeven_days = gas_cost_usd / daily_benefit_usd;
        breakeven_days <= breakeven_horizon_days
    }

    /// Shift a range 10% of its width toward a confirmed trend.
    ///
    /// A directional nudge, not a resize: width is preserved, and anything
    /// short of a >2% confirmed move leaves the range untouched.
    pub fn adjust_range_for_momentum(
        lower: Decimal,
        upper: Decimal,
        price_change_24h_pct: Decimal,
        momentum: Momentum,
    ) -> (Decimal, Decimal) {
        let shift = (upper - lower) * dec!(0.1);
        match momentum {
            Momentum::Bullish if price_change_24h_pct > dec!(2) => (lower + shift, upper + shift),
            Momentum::Bearish if price_change_24h_pct < dec!(-2) => (lower - shift, upper - shift),
            _ => (lower, upper),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(target: Decimal, volatility: Decimal, volume: Decimal, tvl: Decimal) -> YieldCalcInput {
        YieldCalcInput {
            target_daily_yield_pct: target,
            current_price: dec!(100),
            volatility_24h_pct: volatility,
            pool_fee_bps: 30,
            volume_24h: volume,
            tvl,
        }
    }

    #[test]
    fn test_range_brackets_price() {
        let out = YieldCalculator::calculate(&input(dec!(0.4), dec!(5), dec!(500000), dec!(1000000)));
        assert!(out.recommended_lower < dec!(100));
        assert!(out.recommended_upper > dec!(100));
        assert!(out.recommended_lower < out.recommended_upper);
    }

    #[test]
    fn test_width_within_bounds() {
        // Sweep across regimes; width must stay in [1, 50]%.
        let cases = [
            input(dec!(0.01), dec!(1), dec!(10000000), dec!(100000)), // huge revenue -> clamp high
            input(dec!(50), dec!(1), dec!(1000), dec!(100000000)),    // tiny revenue -> clamp low
            input(dec!(0.4), dec!(5), dec!(500000), dec!(1000000)),
        ];
        for case in &cases {
            let out = YieldCalculator::calculate(case);
            assert!(out.range_width_pct >= dec!(1), "width {}", out.range_width_pct);
            assert!(out.range_width_pct <= dec!(50), "width {}", out.range_width_pct);
            assert!(out.recommended_lower < out.recommended_upper);
        }
    }

    #[test]
    fn test_exact_width_solution() {
        // revenue = 500_000 * 0.003 / 1_000_000 = 0.0015/day.
        // width = 0.0015 * 0.9 / 0.004 = 0.3375 -> 33.75%.
        let out = YieldCalculator::calculate(&input(dec!(0.4), dec!(1), dec!(500000), dec!(1000000)));
        assert_eq!(out.range_width_pct, dec!(33.75));
        assert_eq!(out.recommended_lower, dec!(83.1250));
        assert_eq!(out.recommended_upper, dec!(116.8750));
    }

    #[test]
    fn test_rebalance_frequency_tiers() {
        // width 33.75% (from above); volatility 10% -> ratio ~0.30 -> none.
        let calm = YieldCalculator::calculate(&input(dec!(0.4), dec!(10), dec!(500000), dec!(1000000)));
        assert_eq!(calm.estimated_rebalances_per_day, 0.0);

        // volatility 25% -> ratio ~0.74 -> occasional.
        let moderate =
            YieldCalculator::calculate(&input(dec!(0.4), dec!(25), dec!(500000), dec!(1000000)));
        assert_eq!(moderate.estimated_rebalances_per_day, 0.5);

        // volatility 70% -> ratio > 1 -> proportional.
        let wild = YieldCalculator::calculate(&input(dec!(0.4), dec!(70), dec!(500000), dec!(1000000)));
        assert!(wild.estimated_rebalances_per_day > 1.0);
    }

    #[test]
    fn test_confidence_penalties() {
        // Unclamped, calm, healthy volume: full 80.
        let healthy = YieldCalculator::calculate(&input(dec!(0.4), dec!(5), dec!(500000), dec!(1000000)));
        assert_eq!(healthy.confidence, 80);

        // Clamped width loses 20.
        let clamped = YieldCalculator::calculate(&input(dec!(50), dec!(0.1), dec!(500000), dec!(1000000)));
        assert!(clamped.range_width_pct == dec!(1));
        assert_eq!(clamped.confidence, 60);

        // Low volume on top of clamped width loses another 10.
        let thin = YieldCalculator::calculate(&input(dec!(50), dec!(0.1), dec!(50000), dec!(1000000)));
        assert_eq!(thin.confidence, 50);
    }

    #[test]
    fn test_zero_tvl_guard() {
        let out = YieldCalculator::calculate(&input(dec!(0.4), dec!(5), dec!(500000), dec!(0)));
        assert_eq!(out.estimated_daily_yield_pct, Decimal::ZERO);
        assert_eq!(out.confidence, 0);
        assert!(out.recommended_lower < out.recommended_upper);
    }

    #[test]
    fn test_no_improvement_never_profitable() {
        assert!(!YieldCalculator::is_rebalance_profitable(
            dec!(1),
            dec!(1),
            dec!(0.01),
            dec!(1000),
            DEFAULT_BREAKEVEN_DAYS,
        ));
        assert!(!YieldCalculator::is_rebalance_profitable(
            dec!(2),
            dec!(1),
            dec!(0.01),
            dec!(1000),
            DEFAULT_BREAKEVEN_DAYS,
        ));
    }

    #[test]
    fn test_profitable_when_breakeven_within_horizon() {
        // 0.5%/day improvement on $1,000 = $5/day; gas $2 -> breakeven 0.4d.
        assert!(YieldCalculator::is_rebalance_profitable(
            dec!(1),
            dec!(1.5),
            dec!(0.01),
            dec!(1000),
            DEFAULT_BREAKEVEN_DAYS,
        ));
        // Same benefit but 10x the gas -> breakeven 4d > 2d horizon.
        assert!(!YieldCalculator::is_rebalance_profitable(
            dec!(1),
            dec!(1.5),
            dec!(0.1),
            dec!(1000),
            DEFAULT_BREAKEVEN_DAYS,
        ));
    }

    #[test]
    fn test_momentum_shift_bullish() {
        let (lower, upper) = YieldCalculator::adjust_range_for_momentum(
            dec!(90),
            dec!(110),
            dec!(3),
            Momentum::Bullish,
        );
        assert_eq!(lower, dec!(92));
        assert_eq!(upper, dec!(112));
    }

    #[test]
    fn test_momentum_shift_bearish() {
        let (lower, upper) = YieldCalculator::adjust_range_for_momentum(
            dec!(90),
            dec!(110),
            dec!(-3),
            Momentum::Bearish,
        );
        assert_eq!(lower, dec!(88));
        assert_eq!(upper, dec!(108));
    }

    #[test]
    fn test_momentum_unconfirmed_no_shift() {
        // Bullish label without the >2% move: unchanged.
        let (lower, upper) = YieldCalculator::adjust_range_for_momentum(
            dec!(90),
            dec!(110),
            dec!(1.5),
            Momentum::Bullish,
        );
        assert_eq!((lower, upper), (dec!(90), dec!(110)));

        let (lower, upper) = YieldCalculator::adjust_range_for_momentum(
            dec!(90),
            dec!(110),
            dec!(5),
            Momentum::Neutral,
        );
        assert_eq!((lower, upper), (dec!(90), dec!(110)));
    }
}
