use crate::constants::GENESIS_PREVIOUS_HASH;
use crate::pow::meets_difficulty;
use crate::{now_millis, Transaction};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    /// Builds an unmined block; `hash` is computed for nonce 0.
    pub fn new(
        index: u64,
        timestamp: u64,
        transactions: Vec<Transaction>,
        previous_hash: impl Into<String>,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            transactions,
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.calculate_hash();
        block
    }

    pub fn genesis() -> Self {
        Self::new(0, now_millis(), vec![], GENESIS_PREVIOUS_HASH)
    }

    pub fn calculate_hash(&self) -> String {
        self.hash_with_nonce(&self.transactions_json(), self.nonce)
    }

    /// Canonical JSON of the transaction list, as it enters the block hash.
    pub(crate) fn transactions_json(&self) -> String {
        // Only strings, integers and null: serialization cannot fail.
        serde_json::to_string(&self.transactions).expect("transactions serialize to JSON")
    }

    pub(crate) fn hash_with_nonce(&self, transactions_json: &str, nonce: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_string());
        hasher.update(&self.previous_hash);
        hasher.update(self.timestamp.to_string());
        hasher.update(transactions_json);
        hasher.update(nonce.to_string());
        hex::encode(hasher.finalize())
    }

    /// Increments `nonce` from its current value until the hash has at least
    /// `difficulty` leading hex zeros. Unbounded.
    pub fn mine_block(&mut self, difficulty: usize) {
        let txs = self.transactions_json();
        loop {
            let hash = self.hash_with_nonce(&txs, self.nonce);
            if meets_difficulty(&hash, difficulty) {
                self.hash = hash;
                return;
            }
            self.nonce = self.nonce.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::count_leading_hex_zeros;

    fn sample_block() -> Block {
        let txs = vec![
            Transaction {
                from_address: Some("alice".into()),
                to_address: "bob".into(),
                amount: 10,
                timestamp: 1_600_000_000_000,
                signature: String::new(),
            },
            Transaction {
                from_address: None,
                to_address: "miner".into(),
                amount: 100,
                timestamp: 1_600_000_000_100,
                signature: String::new(),
            },
        ];
        Block::new(1, 1_600_000_000_200, txs, "00ab")
    }

    #[test]
    fn genesis_block_example() {
        let genesis = Block::genesis();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, "0");
        assert_eq!(genesis.nonce, 0);
        assert!(genesis.transactions.is_empty());
        assert_eq!(genesis.hash, genesis.calculate_hash());
    }

    #[test]
    fn hash_matches_concatenated_preimage() {
        let block = sample_block();
        let preimage = format!(
            "{}{}{}{}{}",
            block.index,
            block.previous_hash,
            block.timestamp,
            serde_json::to_string(&block.transactions).unwrap(),
            block.nonce
        );
        assert_eq!(
            block.calculate_hash(),
            hex::encode(Sha256::digest(preimage.as_bytes()))
        );
    }

    #[test]
    fn hash_stable_across_reserialization() {
        let block = sample_block();
        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back.calculate_hash(), block.calculate_hash());
        assert_eq!(back.hash, block.hash);
    }

    #[test]
    fn hash_changes_with_nonce() {
        let mut block = sample_block();
        let h1 = block.calculate_hash();
        block.nonce += 1;
        assert_ne!(h1, block.calculate_hash());
    }

    #[test]
    fn hash_changes_with_transactions() {
        let mut block = sample_block();
        let h1 = block.calculate_hash();
        block.transactions[0].amount = 11;
        assert_ne!(h1, block.calculate_hash());
    }

    #[test]
    fn mining_meets_difficulty_for_small_targets() {
        for difficulty in 0..=3 {
            let mut block = sample_block();
            block.mine_block(difficulty);
            assert!(count_leading_hex_zeros(&block.hash) >= difficulty);
            assert_eq!(block.hash, block.calculate_hash());
        }
    }

    #[test]
    fn mining_finds_first_satisfying_nonce() {
        let mut block = sample_block();
        block.mine_block(2);
        let txs = block.transactions_json();
        for nonce in 0..block.nonce {
            assert!(!meets_difficulty(&block.hash_with_nonce(&txs, nonce), 2));
        }
    }

    #[test]
    fn mining_is_deterministic() {
        let mut a = sample_block();
        let mut b = sample_block();
        a.mine_block(2);
        b.mine_block(2);
        assert_eq!(a.nonce, b.nonce);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn block_serializes_with_camel_case_fields() {
        let block = sample_block();
        let value = serde_json::to_value(&block).unwrap();
        assert!(value.get("previousHash").is_some());
        assert_eq!(value["transactions"][1]["fromAddress"], serde_json::Value::Null);
    }
}
