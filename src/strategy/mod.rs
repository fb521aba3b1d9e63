//! Strategy Layer - Pure decision math
//!
//! Everything here is synchronous and side-effect free:
//! - `scoring`: yield proxy and composite pool ranking
//! - `yield_calc`: range recommendation for a target daily yield
//! - `migration`: cross-venue migration cost/benefit analysis
//!
//! Computation guards replace error paths: invalid inputs (zero TVL,
//! non-positive targets) short-circuit to safe defaults rather than
//! letting a non-finite number reach a decision.

pub mod migration;
pub mod scoring;
pub mod yield_calc;

pub use migration::{analyze_migration, MigrationAnalysis, MigrationParams, MigrationThresholds};
pub use scoring::{composite_score, yield_proxy_apr};
pub use yield_calc::{
    Momentum, YieldCalcInput, YieldCalcOutput, YieldCalculator, DEFAULT_BREAKEVEN_DAYS,
};
