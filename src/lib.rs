//! Tidepool - Autonomous Concentrated Liquidity Agent Library
//!
//! Manages concentrated liquidity positions across Solana venues: range
//! monitoring, rebalancing, fee collection, and cross-venue migration
//! analysis.
//!
//! # Modules
//!
//! - `domain`: Core business logic (Position, PoolSnapshot, fee model, decisions)
//! - `ports`: Trait abstractions (VenueAdapter, TreasurySigner, Advisor)
//! - `strategy`: Range and migration math (YieldCalculator, migration analysis, scoring)
//! - `adapters`: External implementations (venue REST clients, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Aggregator, monitor loop, fee collector, oracle, event logs

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod strategy;
