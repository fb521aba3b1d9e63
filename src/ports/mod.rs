//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces the engine consumes without owning:
//! - Venue adapters (pool discovery, price reads, position transactions)
//! - Treasury signer (the core never holds key material)
//! - Optional advisory reasoner
//!
//! `mocks` holds scripted implementations used by unit and integration tests.

pub mod advisor;
pub mod mocks;
pub mod signer;
pub mod venue;

pub use advisor::{Advice, Advisor, AdvisorAction, AdvisorError, MarketContext};
pub use signer::{SignerError, TreasurySigner};
pub use venue::{
    ClosePositionParams, CollectFeesParams, CreatePositionParams, RebalanceParams, TxResult,
    VenueAdapter, VenueError, VenueOp, VenueRegistry,
};
