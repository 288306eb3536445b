mod demo;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:3000)
    #[arg(long, global = true, default_value = "http://127.0.0.1:3000")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the whole chain and pending pool
    Chain,
    /// Print chain statistics
    Stats,
    /// Manage wallets held by the node
    Wallet {
        #[command(subcommand)]
        cmd: WalletCommand,
    },
    /// Transfer funds from a node-held wallet
    Send {
        #[arg(long)]
        from: String,
        /// Recipient address (public key hex)
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
    },
    /// Queue a reward straight into the pending pool
    Reward {
        /// Recipient address (public key hex)
        #[arg(long)]
        to: String,
        /// Defaults to the node's mining reward
        #[arg(long)]
        amount: Option<u64>,
    },
    /// Mine the pending pool, paying the given wallet
    Mine {
        #[arg(long)]
        miner: String,
    },
    /// Check chain integrity
    Validate,
    /// Replace a block's transactions without rehashing it
    Tamper {
        #[arg(long)]
        index: u64,
        /// JSON array of transactions
        #[arg(long, default_value = "[]")]
        data: String,
    },
    /// Reset the node to a genesis-only chain
    Reset,
    /// Run the scripted walk-through locally, no node required
    Demo {
        #[arg(
            long,
            default_value_t = ledger_core::constants::DEFAULT_DIFFICULTY,
            value_parser = parse_difficulty
        )]
        difficulty: usize,
    },
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    Create { name: String },
    List,
    Show { name: String },
}

/// Difficulty flag parser: a count of leading hex zeros a SHA-256 digest can hold.
fn parse_difficulty(s: &str) -> Result<usize, String> {
    let difficulty: usize = s.parse().map_err(|e| format!("{e}"))?;
    ledger_core::pow::check_difficulty(difficulty).map_err(|e| e.to_string())
}

async fn get(client: &reqwest::Client, node: &str, path: &str) -> Result<()> {
    let res = client.get(format!("{node}{path}")).send().await?;
    print_response(res).await
}

async fn post(client: &reqwest::Client, node: &str, path: &str, body: Value) -> Result<()> {
    let res = client.post(format!("{node}{path}")).json(&body).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<()> {
    let status = res.status();
    let body: Value = res.json().await.unwrap_or(Value::Null);
    println!("status: {}", status);
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let node = cli.node.trim_end_matches('/');
    match cli.cmd {
        Command::Chain => get(&client, node, "/api/blockchain").await?,
        Command::Stats => get(&client, node, "/api/stats").await?,
        Command::Wallet { cmd } => match cmd {
            WalletCommand::Create { name } => {
                post(&client, node, "/api/wallets", json!({ "name": name })).await?
            }
            WalletCommand::List => get(&client, node, "/api/wallets").await?,
            WalletCommand::Show { name } => {
                get(&client, node, &format!("/api/wallets/{name}")).await?
            }
        },
        Command::Send { from, to, amount } => {
            let body = json!({ "fromWallet": from, "toAddress": to, "amount": amount });
            post(&client, node, "/api/transactions", body).await?
        }
        Command::Reward { to, amount } => {
            let body = json!({ "toAddress": to, "amount": amount });
            post(&client, node, "/api/transactions/direct-reward", body).await?
        }
        Command::Mine { miner } => {
            post(&client, node, "/api/mine", json!({ "minerWallet": miner })).await?
        }
        Command::Validate => get(&client, node, "/api/validate").await?,
        Command::Tamper { index, data } => {
            let new_data: Value = serde_json::from_str(&data)?;
            let body = json!({ "blockIndex": index, "newData": new_data });
            post(&client, node, "/api/tamper", body).await?
        }
        Command::Reset => post(&client, node, "/api/reset", json!({})).await?,
        Command::Demo { difficulty } => demo::run(difficulty)?,
    }
    Ok(())
}
