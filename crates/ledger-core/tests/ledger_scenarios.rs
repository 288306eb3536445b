use ledger_core::pow::count_leading_hex_zeros;
use ledger_core::{Blockchain, KeyPair, LedgerConfig, LedgerError, Transaction};

fn signed(from: &KeyPair, to: &str, amount: u64) -> Transaction {
    let mut tx = Transaction::transfer(from.address(), to, amount);
    tx.sign(from).expect("sender owns key");
    tx
}

#[test]
fn wallets_trade_across_blocks() {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let miner = KeyPair::generate();
    let mut ledger = Blockchain::default();

    ledger
        .add_transaction(Transaction::reward(alice.address(), 100))
        .unwrap();
    ledger.mine_pending_transactions(&miner.address()).unwrap();

    ledger
        .add_transaction(signed(&alice, &bob.address(), 50))
        .unwrap();
    ledger.mine_pending_transactions(&miner.address()).unwrap();

    ledger
        .add_transaction(signed(&bob, &alice.address(), 25))
        .unwrap();
    ledger.mine_pending_transactions(&miner.address()).unwrap();

    assert_eq!(ledger.balance_of(&alice.address()), 75);
    assert_eq!(ledger.balance_of(&bob.address()), 25);
    // Two rewards committed; the third is still pending.
    assert_eq!(ledger.balance_of(&miner.address()), 200);
    assert_eq!(ledger.pending_transactions().len(), 1);
    assert_eq!(ledger.chain().len(), 4);
    assert_eq!(ledger.total_transactions(), 5);
    assert!(ledger.is_chain_valid());

    for pair in ledger.chain().windows(2) {
        assert_eq!(pair[1].previous_hash, pair[0].hash);
        assert!(count_leading_hex_zeros(&pair[1].hash) >= ledger.difficulty());
    }
}

#[test]
fn rejected_admission_leaves_pool_untouched() {
    let alice = KeyPair::generate();
    let eve = KeyPair::generate();
    let mut ledger = Blockchain::default();

    let err = ledger
        .add_transaction(signed(&alice, &eve.address(), 1))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

    let mut forged = Transaction::transfer(alice.address(), eve.address(), 1);
    assert!(matches!(
        forged.sign(&eve),
        Err(LedgerError::Authorization(_))
    ));
    assert!(ledger.add_transaction(forged).is_err());
    assert!(ledger.pending_transactions().is_empty());
}

#[test]
fn custom_config_is_honoured() {
    let config = LedgerConfig {
        difficulty: 1,
        mining_reward: 7,
        parallel_mining: false,
    };
    let mut ledger = Blockchain::new(config);
    ledger.add_transaction(Transaction::reward("R", 1)).unwrap();
    ledger.mine_pending_transactions("R").unwrap();
    ledger.mine_pending_transactions("R").unwrap();
    assert_eq!(ledger.balance_of("R"), 8);
    assert_eq!(ledger.config(), &config);
}

#[test]
fn chain_round_trips_through_json() {
    let mut ledger = Blockchain::default();
    ledger.add_transaction(Transaction::reward("R", 5)).unwrap();
    ledger.mine_pending_transactions("R").unwrap();

    let json = serde_json::to_string(ledger.chain()).unwrap();
    let blocks: Vec<ledger_core::Block> = serde_json::from_str(&json).unwrap();
    for block in &blocks {
        assert_eq!(block.hash, block.calculate_hash());
    }
}
