use anyhow::Result;
use ledger_core::{Blockchain, KeyPair};
use ledger_storage::WalletStore;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const GENESIS_WALLET: &str = "genesis";

/// Shared handles for every request. Lock `wallets` before `ledger` when
/// both are needed.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Mutex<Blockchain>>,
    pub wallets: Arc<Mutex<BTreeMap<String, KeyPair>>>,
    pub store: Arc<dyn WalletStore>,
}

impl AppState {
    /// Loads persisted wallets and makes sure a `genesis` wallet exists.
    pub fn load(ledger: Blockchain, store: Arc<dyn WalletStore>) -> Result<Self> {
        let mut wallets = BTreeMap::new();
        for name in store.list_wallets()? {
            match store.get_wallet(&name) {
                Ok(Some(key_pair)) => {
                    wallets.insert(name, key_pair);
                }
                Ok(None) => {}
                Err(e) => warn!("skipping unreadable wallet {name}: {e:#}"),
            }
        }
        if !wallets.contains_key(GENESIS_WALLET) {
            let key_pair = KeyPair::generate();
            store.put_wallet(GENESIS_WALLET, &key_pair)?;
            wallets.insert(GENESIS_WALLET.to_string(), key_pair);
        }
        info!("{} wallet(s) loaded", wallets.len());

        Ok(Self {
            ledger: Arc::new(Mutex::new(ledger)),
            wallets: Arc::new(Mutex::new(wallets)),
            store,
        })
    }
}
