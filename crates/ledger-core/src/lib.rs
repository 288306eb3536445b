//! Ledger engine: signed transfers, proof-of-work blocks and a replayed
//! single-chain ledger.

pub mod block;
pub mod chain;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod mine;
pub mod pow;
pub mod transaction;

use std::time::{SystemTime, UNIX_EPOCH};

pub use block::Block;
pub use chain::{Blockchain, LedgerConfig};
pub use crypto::KeyPair;
pub use error::{CryptoError, LedgerError};
pub use transaction::Transaction;

pub type Hash = [u8; constants::HASH_SIZE];

/// Milliseconds since the Unix epoch; 0 if the clock reads before it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
