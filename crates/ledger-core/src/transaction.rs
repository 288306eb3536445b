use crate::constants::REWARD_SENDER_LITERAL;
use crate::crypto::{verify_digest, KeyPair};
use crate::error::{LedgerError, Result};
use crate::{now_millis, Hash};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

/// A value transfer. `from_address == None` marks a reward minted by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub from_address: Option<String>,
    pub to_address: String,
    pub amount: u64,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub signature: String,
}

impl Transaction {
    pub fn new(from_address: Option<String>, to_address: impl Into<String>, amount: u64) -> Self {
        Self {
            from_address,
            to_address: to_address.into(),
            amount,
            timestamp: now_millis(),
            signature: String::new(),
        }
    }

    pub fn transfer(from: impl Into<String>, to: impl Into<String>, amount: u64) -> Self {
        Self::new(Some(from.into()), to, amount)
    }

    pub fn reward(to: impl Into<String>, amount: u64) -> Self {
        Self::new(None, to, amount)
    }

    pub fn is_reward(&self) -> bool {
        self.from_address.is_none()
    }

    pub fn digest(&self) -> Hash {
        let from = self
            .from_address
            .as_deref()
            .unwrap_or(REWARD_SENDER_LITERAL);
        let preimage = format!(
            "{}{}{}{}",
            from, self.to_address, self.amount, self.timestamp
        );
        Sha256::digest(preimage.as_bytes()).into()
    }

    pub fn calculate_hash(&self) -> String {
        hex::encode(self.digest())
    }

    /// Signs with `key_pair`, which must own `from_address`. Rewards are left unsigned.
    pub fn sign(&mut self, key_pair: &KeyPair) -> Result<()> {
        let Some(from) = self.from_address.as_deref() else {
            return Ok(());
        };
        if key_pair.address() != from {
            return Err(LedgerError::Authorization(
                "cannot sign transactions for other wallets".into(),
            ));
        }
        self.signature = key_pair.sign_digest(&self.digest());
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        let Some(from) = self.from_address.as_deref() else {
            return true;
        };
        if self.signature.is_empty() {
            warn!("transaction {} carries no signature", self.calculate_hash());
            return false;
        }
        match verify_digest(from, &self.digest(), &self.signature) {
            Ok(()) => true,
            Err(e) => {
                warn!("transaction {} failed verification: {e}", self.calculate_hash());
                false
            }
        }
    }
}
