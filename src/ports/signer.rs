//! Treasury signer port.
//!
//! The engine never holds private key material. Components that need to
//! move funds (the fee collector) depend on this capability instead, and
//! the concrete wallet implementation lives outside the crate.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("transfer failed: {0}")]
    TransferFailed(String),
    #[error("signing rejected: {0}")]
    Rejected(String),
}

/// Minimal signing capability: an identity plus lamport transfers.
#[async_trait]
pub trait TreasurySigner: Send + Sync {
    /// Base58 public key of the operating wallet.
    fn public_key(&self) -> String;

    /// Submit a lamport transfer and return the confirmed signature.
    async fn transfer_lamports(&self, to: &str, lamports: u64) -> Result<String, SignerError>;
}
