use crate::{StoredWallet, WalletStore};
use anyhow::{bail, Context, Result};
use ledger_core::KeyPair;
use sled::{Db, IVec};
use std::path::Path;
use tracing::info;

const TREE_WALLETS: &str = "wallets";

#[derive(Clone)]
pub struct SledStore {
  db: Db,
  wallets: sled::Tree,
}

impl SledStore {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let db = sled::open(path)?;
    let wallets = db.open_tree(TREE_WALLETS)?;
    info!("sled store opened");
    Ok(Self { db, wallets })
  }

  pub fn flush(&self) -> Result<()> {
    self.db.flush()?;
    Ok(())
  }

  pub fn clear(&self) -> Result<()> {
    self.wallets.clear()?;
    self.flush()
  }

  fn decode(name: &str, bytes: &IVec) -> Result<KeyPair> {
    let stored: StoredWallet =
      bincode::deserialize(bytes).with_context(|| format!("decoding wallet {name}"))?;
    let key_pair = KeyPair::from_secret_hex(&stored.secret_key)
      .with_context(|| format!("restoring key for wallet {name}"))?;
    if key_pair.address() != stored.public_key {
      bail!("wallet {name}: stored public key does not match its secret key");
    }
    Ok(key_pair)
  }
}

impl WalletStore for SledStore {
  fn put_wallet(&self, name: &str, key_pair: &KeyPair) -> Result<()> {
    let bytes = bincode::serialize(&StoredWallet::from(key_pair))?;
    self.wallets.insert(name.as_bytes(), bytes)?;
    self.flush()?;
    info!("wallet {name} saved");
    Ok(())
  }

  fn get_wallet(&self, name: &str) -> Result<Option<KeyPair>> {
    self
      .wallets
      .get(name.as_bytes())?
      .map(|ivec| Self::decode(name, &ivec))
      .transpose()
  }

  fn list_wallets(&self) -> Result<Vec<String>> {
    self
      .wallets
      .iter()
      .keys()
      .map(|key| {
        let key = key?;
        Ok(String::from_utf8(key.to_vec())?)
      })
      .collect()
  }

  fn contains(&self, name: &str) -> Result<bool> {
    Ok(self.wallets.contains_key(name.as_bytes())?)
  }
}
