use crate::pow::meets_difficulty;
use crate::Block;
use rayon::prelude::*;
use tracing::debug;

/// Parallel counterpart of [`Block::mine_block`]. `find_first` keeps the
/// result identical to the sequential search: the lowest satisfying nonce.
pub fn mine_block_parallel(block: &mut Block, difficulty: usize) {
    let txs = block.transactions_json();
    let template = &*block;

    let found = (template.nonce..u64::MAX)
        .into_par_iter()
        .find_first(|nonce| meets_difficulty(&template.hash_with_nonce(&txs, *nonce), difficulty))
        .expect("nonce space exhausted (practically impossible)");

    block.nonce = found;
    block.hash = block.hash_with_nonce(&txs, found);
    debug!("parallel search settled on nonce {found} for block {}", block.index);
}
