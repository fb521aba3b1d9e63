//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Venues: REST clients for Meteora, Orca, and Raydium
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod venues;

pub use cli::CliApp;
pub use venues::{build_registry, MeteoraAdapter, OrcaAdapter, RaydiumAdapter};
