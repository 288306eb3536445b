pub mod sled_store;

use anyhow::Result;
use ledger_core::KeyPair;
use serde::{Deserialize, Serialize};

/// Named signing keys. The ledger itself never sees these; only the
/// addresses derived from them.
pub trait WalletStore: Send + Sync {
    fn put_wallet(&self, name: &str, key_pair: &KeyPair) -> Result<()>;
    fn get_wallet(&self, name: &str) -> Result<Option<KeyPair>>;
    /// Wallet names in ascending order.
    fn list_wallets(&self) -> Result<Vec<String>>;
    fn contains(&self, name: &str) -> Result<bool>;
}

/// On-disk form of a wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredWallet {
    pub public_key: String,
    pub secret_key: String,
}

impl From<&KeyPair> for StoredWallet {
    fn from(key_pair: &KeyPair) -> Self {
        Self {
            public_key: key_pair.address(),
            secret_key: key_pair.secret_hex(),
        }
    }
}
