pub const HASH_SIZE: usize = 32;
/// A hex digest has only this many characters to be zero.
pub const MAX_DIFFICULTY: usize = HASH_SIZE * 2;
pub const DEFAULT_DIFFICULTY: usize = 2;
pub const DEFAULT_MINING_REWARD: u64 = 100;
/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";
/// Sender literal hashed for reward transactions.
pub const REWARD_SENDER_LITERAL: &str = "null";
