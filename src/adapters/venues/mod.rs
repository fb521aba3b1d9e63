//! Venue adapters.
//!
//! One adapter per supported venue, all speaking the public REST APIs.
//! `build_registry` wires the enabled set from configuration.

mod http;
pub mod meteora;
pub mod orca;
pub mod raydium;

pub use meteora::MeteoraAdapter;
pub use orca::OrcaAdapter;
pub use raydium::RaydiumAdapter;

use std::sync::Arc;

use crate::domain::VenueId;
use crate::ports::VenueRegistry;

/// Build a registry holding adapters for the requested venues.
pub fn build_registry(enabled: &[VenueId]) -> VenueRegistry {
    let mut registry = VenueRegistry::new();
    for venue in enabled {
        match venue {
            VenueId::Meteora => registry.register(Arc::new(MeteoraAdapter::new())),
            VenueId::Orca => registry.register(Arc::new(OrcaAdapter::new())),
            VenueId::Raydium => registry.register(Arc::new(RaydiumAdapter::new())),
        }
    }
    registry
}
