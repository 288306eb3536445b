//! Scripted walk-through of the ledger, run in-process.

use anyhow::Result;
use ledger_core::{Blockchain, KeyPair, Transaction};
use tracing::info;

fn short(address: &str) -> &str {
    &address[..address.len().min(20)]
}

fn signed(from: &KeyPair, to: &KeyPair, amount: u64) -> Result<Transaction> {
    let mut tx = Transaction::transfer(from.address(), to.address(), amount);
    tx.sign(from)?;
    Ok(tx)
}

fn print_chain(ledger: &Blockchain) {
    for block in ledger.chain() {
        println!("  Block #{}", block.index);
        println!("    hash:          {}", block.hash);
        println!("    previous hash: {}", block.previous_hash);
        println!("    nonce:         {}", block.nonce);
        println!("    transactions:  {}", block.transactions.len());
        for tx in &block.transactions {
            let from = tx.from_address.as_deref().map(short).unwrap_or("REWARD");
            println!("      {from}... -> {}... : {}", short(&tx.to_address), tx.amount);
        }
    }
}

fn print_balances(ledger: &Blockchain, wallets: &[(&str, &KeyPair)]) {
    for (name, key) in wallets {
        println!("  {name}: {}", ledger.balance_of(&key.address()));
    }
}

pub fn run(difficulty: usize) -> Result<()> {
    let mut ledger = Blockchain::try_new(ledger_core::LedgerConfig {
        difficulty,
        ..Default::default()
    })?;
    info!("genesis block created");

    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let miner = KeyPair::generate();
    let wallets = [("Alice", &alice), ("Bob", &bob), ("Miner", &miner)];
    println!("Wallets:");
    for (name, key) in &wallets {
        println!("  {name}: {}...", short(&key.address()));
    }

    println!("\nSeeding Alice with a reward and mining...");
    ledger.add_direct_reward(&alice.address(), 100);
    ledger.mine_pending_transactions(&miner.address())?;

    println!("\nAlice sends 50 to Bob, Bob sends 25 back...");
    ledger.add_transaction(signed(&alice, &bob, 50)?)?;
    ledger.mine_pending_transactions(&miner.address())?;
    ledger.add_transaction(signed(&bob, &alice, 25)?)?;
    ledger.mine_pending_transactions(&miner.address())?;

    println!("\nChain:");
    print_chain(&ledger);
    println!("\nBalances:");
    print_balances(&ledger, &wallets);
    println!("\nChain valid: {}", ledger.is_chain_valid());

    println!("\nAttempting to sign a transfer from Alice with Bob's key...");
    let mut forged = Transaction::transfer(alice.address(), bob.address(), 10);
    match forged.sign(&bob) {
        Ok(()) => println!("  unexpectedly signed"),
        Err(e) => println!("  rejected: {e}"),
    }

    println!("\nTampering with block 2...");
    let mut txs = ledger.chain()[2].transactions.clone();
    if let Some(tx) = txs.iter_mut().find(|tx| !tx.is_reward()) {
        tx.amount = 5_000;
    }
    ledger.tamper_with_block(2, txs)?;
    println!("Chain valid after tampering: {}", ledger.is_chain_valid());

    println!("\nResetting...");
    ledger.reset_chain();
    println!(
        "Blocks: {}, pending: {}, valid: {}",
        ledger.chain().len(),
        ledger.pending_transactions().len(),
        ledger.is_chain_valid()
    );
    Ok(())
}
