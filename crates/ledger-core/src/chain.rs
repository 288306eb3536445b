//! The ledger aggregate: committed blocks plus the pending pool.

use crate::constants::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD};
use crate::error::{LedgerError, Result};
use crate::mine::mine_block_parallel;
use crate::pow::check_difficulty;
use crate::{now_millis, Block, Transaction};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Leading hex zeros a block hash needs.
    pub difficulty: usize,
    pub mining_reward: u64,
    /// Search nonces across the rayon pool instead of on the calling thread.
    pub parallel_mining: bool,
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<()> {
        check_difficulty(self.difficulty).map(|_| ())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            parallel_mining: false,
        }
    }
}

/// Single-writer ledger. Holds no locks; callers serialize mutations.
#[derive(Clone, Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
    pending_transactions: Vec<Transaction>,
    config: LedgerConfig,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl Blockchain {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending_transactions: Vec::new(),
            config,
        }
    }

    /// Like [`Blockchain::new`], but refuses a config whose blocks could never be mined.
    pub fn try_new(config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    pub fn mining_reward(&self) -> u64 {
        self.config.mining_reward
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn latest_block(&self) -> &Block {
        // `chain` always holds at least the genesis block.
        &self.chain[self.chain.len() - 1]
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.chain.get(index)
    }

    /// Admits `tx` to the pending pool.
    ///
    /// The sender's balance is read from committed blocks only; transfers
    /// already waiting in the pool are not netted against it.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        if tx.from_address.is_none() && tx.to_address.is_empty() {
            return Err(LedgerError::Validation(
                "transaction must include from and to address".into(),
            ));
        }
        if tx.amount == 0 {
            return Err(LedgerError::Validation(
                "amount must be a positive number".into(),
            ));
        }

        if let Some(from) = tx.from_address.as_deref() {
            if !tx.is_valid() {
                return Err(LedgerError::Validation(
                    "cannot add invalid transaction to chain".into(),
                ));
            }
            let available = self.balance_of(from);
            if available < i128::from(tx.amount) {
                return Err(LedgerError::InsufficientBalance {
                    required: tx.amount,
                    available,
                });
            }
        }

        debug!(
            "admitted transaction {} ({} -> {})",
            tx.calculate_hash(),
            tx.from_address.as_deref().unwrap_or("reward"),
            tx.to_address
        );
        self.pending_transactions.push(tx);
        Ok(())
    }

    /// Seals the pending pool into a new block and re-seeds the pool with the
    /// miner's reward.
    pub fn mine_pending_transactions(&mut self, reward_address: &str) -> Result<Block> {
        if self.pending_transactions.is_empty() {
            return Err(LedgerError::Validation(
                "no pending transactions to mine".into(),
            ));
        }
        self.config.validate()?;

        let mut block = Block::new(
            self.chain.len() as u64,
            now_millis(),
            self.pending_transactions.clone(),
            self.latest_block().hash.clone(),
        );
        if self.config.parallel_mining {
            mine_block_parallel(&mut block, self.config.difficulty);
        } else {
            block.mine_block(self.config.difficulty);
        }

        info!(
            "Mined block {} with nonce {} and hash {}",
            block.index, block.nonce, block.hash
        );
        self.chain.push(block.clone());
        self.pending_transactions = vec![Transaction::reward(
            reward_address,
            self.config.mining_reward,
        )];
        Ok(block)
    }

    /// Net of every committed transfer into and out of `address`.
    pub fn balance_of(&self, address: &str) -> i128 {
        let mut balance: i128 = 0;
        for tx in self.chain.iter().flat_map(|b| b.transactions.iter()) {
            if tx.from_address.as_deref() == Some(address) {
                balance -= i128::from(tx.amount);
            }
            if tx.to_address == address {
                balance += i128::from(tx.amount);
            }
        }
        balance
    }

    pub fn is_chain_valid(&self) -> bool {
        for (prev, current) in self.chain.iter().zip(self.chain.iter().skip(1)) {
            if current.hash != current.calculate_hash() {
                warn!("block {} has an invalid hash", current.index);
                return false;
            }
            if current.previous_hash != prev.hash {
                warn!(
                    "block {} has an incorrect previous hash reference",
                    current.index
                );
                return false;
            }
            if current
                .transactions
                .iter()
                .any(|tx| !tx.is_reward() && !tx.is_valid())
            {
                warn!("block {} contains an invalid transaction", current.index);
                return false;
            }
        }
        true
    }

    pub fn reset_chain(&mut self) {
        self.chain = vec![Block::genesis()];
        self.pending_transactions.clear();
        info!("chain reset to genesis");
    }

    pub fn total_transactions(&self) -> usize {
        self.chain.iter().map(|b| b.transactions.len()).sum()
    }

    /// Overwrites a committed block's transactions without rehashing it.
    /// Exists so integrity checks can be demonstrated failing.
    #[cfg(any(test, feature = "demo-hooks"))]
    pub fn tamper_with_block(&mut self, index: usize, transactions: Vec<Transaction>) -> Result<()> {
        if index == 0 || index >= self.chain.len() {
            return Err(LedgerError::Validation("invalid block index".into()));
        }
        self.chain[index].transactions = transactions;
        warn!("block {index} has been tampered with");
        Ok(())
    }

    /// Pushes a reward straight into the pending pool, skipping admission.
    #[cfg(any(test, feature = "demo-hooks"))]
    pub fn add_direct_reward(&mut self, to_address: &str, amount: u64) -> Transaction {
        let tx = Transaction::reward(to_address, amount);
        self.pending_transactions.push(tx.clone());
        tx
    }
}
