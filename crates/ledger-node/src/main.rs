mod error;
mod routes;
mod state;

use clap::Parser;
use ledger_core::{Blockchain, LedgerConfig};
use ledger_storage::sled_store::SledStore;
use state::AppState;
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, Level};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:3000
    #[arg(long, default_value = "127.0.0.1:3000")]
    listen: String,

    /// Data directory for the sled wallet store
    #[arg(long, default_value = "./data")]
    data_dir: String,

    /// Leading hex zeros required in a block hash
    #[arg(
        long,
        default_value_t = ledger_core::constants::DEFAULT_DIFFICULTY,
        value_parser = parse_difficulty
    )]
    difficulty: usize,

    /// Amount paid to the miner of each block
    #[arg(long, default_value_t = ledger_core::constants::DEFAULT_MINING_REWARD)]
    mining_reward: u64,

    /// Search nonces on all cores
    #[arg(long)]
    parallel_mining: bool,
}

/// Difficulty flag parser: a count of leading hex zeros a SHA-256 digest can hold.
fn parse_difficulty(s: &str) -> Result<usize, String> {
    let difficulty: usize = s.parse().map_err(|e| format!("{e}"))?;
    ledger_core::pow::check_difficulty(difficulty).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = LedgerConfig {
        difficulty: args.difficulty,
        mining_reward: args.mining_reward,
        parallel_mining: args.parallel_mining,
    };
    let store = Arc::new(SledStore::open(&args.data_dir)?);
    let state = AppState::load(Blockchain::try_new(config)?, store)?;
    info!(
        "ledger ready: difficulty {}, reward {}",
        config.difficulty, config.mining_reward
    );

    let app = routes::router(state);

    let addr: SocketAddr = args.listen.parse()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
