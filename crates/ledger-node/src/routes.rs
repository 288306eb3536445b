use crate::error::{ApiError, ApiJson, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ledger_core::{now_millis, Block, KeyPair, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/blockchain", get(blockchain))
        .route("/api/blocks/{index}", get(block_by_index))
        .route("/api/stats", get(stats))
        .route("/api/wallets", get(list_wallets).post(create_wallet))
        .route("/api/wallets/{name}", get(wallet_by_name))
        .route("/api/transactions", post(create_transaction))
        .route("/api/transactions/pending", get(pending_transactions))
        .route("/api/transactions/direct-reward", post(direct_reward))
        .route("/api/mine", post(mine))
        .route("/api/validate", get(validate))
        .route("/api/tamper", post(tamper))
        .route("/api/reset", post(reset))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChainView {
    chain: Vec<Block>,
    pending_transactions: Vec<Transaction>,
    difficulty: usize,
    mining_reward: u64,
    total_transactions: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    blocks_count: usize,
    transactions_count: usize,
    pending_transactions_count: usize,
    difficulty: usize,
    mining_reward: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletView {
    public_key: String,
    balance: i128,
}

#[derive(Deserialize)]
struct NewWallet {
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewTransaction {
    from_wallet: Option<String>,
    to_address: Option<String>,
    amount: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectReward {
    to_address: Option<String>,
    amount: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MineRequest {
    miner_wallet: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TamperRequest {
    block_index: Option<Value>,
    new_data: Option<Vec<Transaction>>,
}

/// Reads a block index sent as a number or as a numeric string, taking the
/// leading integer the way a form value is usually parsed (`"2abc"` is 2).
fn parse_block_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim_start();
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, s.strip_prefix('+').unwrap_or(s)),
            };
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            digits[..end].parse::<i64>().ok().map(|n| sign * n)
        }
        _ => None,
    }
}

fn required(field: Option<String>, what: &str) -> ApiResult<String> {
    field
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{what} is required")))
}

async fn wallet_key(state: &AppState, name: &str, what: &str) -> ApiResult<KeyPair> {
    state
        .wallets
        .lock()
        .await
        .get(name)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("{what} not found")))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "timestamp": now_millis() }))
}

async fn blockchain(State(state): State<AppState>) -> Json<ChainView> {
    let ledger = state.ledger.lock().await;
    Json(ChainView {
        chain: ledger.chain().to_vec(),
        pending_transactions: ledger.pending_transactions().to_vec(),
        difficulty: ledger.difficulty(),
        mining_reward: ledger.mining_reward(),
        total_transactions: ledger.total_transactions(),
    })
}

async fn block_by_index(
    State(state): State<AppState>,
    Path(index): Path<String>,
) -> ApiResult<Json<Block>> {
    let index: usize = index
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid block index".into()))?;
    let ledger = state.ledger.lock().await;
    ledger
        .block(index)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("block not found".into()))
}

async fn stats(State(state): State<AppState>) -> Json<Stats> {
    let ledger = state.ledger.lock().await;
    Json(Stats {
        blocks_count: ledger.chain().len(),
        transactions_count: ledger.total_transactions(),
        pending_transactions_count: ledger.pending_transactions().len(),
        difficulty: ledger.difficulty(),
        mining_reward: ledger.mining_reward(),
    })
}

async fn create_wallet(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewWallet>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let name = required(body.name, "wallet name")?;
    let key_pair = KeyPair::generate();
    {
        let mut wallets = state.wallets.lock().await;
        if wallets.contains_key(&name) {
            return Err(ApiError::BadRequest(
                "wallet with this name already exists".into(),
            ));
        }
        wallets.insert(name.clone(), key_pair.clone());
    }

    // sled flushes on every write; keep that off the async workers.
    let store = state.store.clone();
    let (persist_name, persist_key) = (name.clone(), key_pair.clone());
    let persisted =
        tokio::task::spawn_blocking(move || store.put_wallet(&persist_name, &persist_key)).await;
    match persisted {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("could not persist wallet {name}: {e:#}"),
        Err(e) => warn!("wallet {name} persistence task failed: {e}"),
    }

    let body = json!({
        "name": name,
        "publicKey": key_pair.address(),
        "privateKey": key_pair.secret_hex(),
    });
    Ok((StatusCode::CREATED, Json(body)))
}

async fn list_wallets(State(state): State<AppState>) -> Json<BTreeMap<String, WalletView>> {
    let wallets = state.wallets.lock().await;
    let ledger = state.ledger.lock().await;
    let view = wallets
        .iter()
        .map(|(name, key_pair)| {
            let public_key = key_pair.address();
            let balance = ledger.balance_of(&public_key);
            (name.clone(), WalletView { public_key, balance })
        })
        .collect();
    Json(view)
}

async fn wallet_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let public_key = wallet_key(&state, &name, "wallet").await?.address();
    let balance = state.ledger.lock().await.balance_of(&public_key);
    Ok(Json(json!({
        "name": name,
        "publicKey": public_key,
        "balance": balance,
    })))
}

async fn create_transaction(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewTransaction>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let (Some(from_wallet), Some(to_address), Some(amount)) =
        (body.from_wallet, body.to_address, body.amount)
    else {
        return Err(ApiError::BadRequest("missing required parameters".into()));
    };
    if amount == 0 {
        return Err(ApiError::BadRequest(
            "amount must be a positive number".into(),
        ));
    }

    let key_pair = wallet_key(&state, &from_wallet, "source wallet").await?;
    let mut tx = Transaction::transfer(key_pair.address(), to_address, amount);
    tx.sign(&key_pair)?;

    state.ledger.lock().await.add_transaction(tx.clone())?;
    Ok((StatusCode::CREATED, Json(tx)))
}

async fn pending_transactions(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    Json(state.ledger.lock().await.pending_transactions().to_vec())
}

async fn direct_reward(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DirectReward>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let to_address = required(body.to_address, "recipient address")?;
    let mut ledger = state.ledger.lock().await;
    let amount = body.amount.unwrap_or_else(|| ledger.mining_reward());
    let tx = ledger.add_direct_reward(&to_address, amount);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "direct mining reward transaction created",
            "transaction": tx,
        })),
    ))
}

async fn mine(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<MineRequest>,
) -> ApiResult<Json<Value>> {
    let miner = required(body.miner_wallet, "miner wallet name")?;
    let reward_address = wallet_key(&state, &miner, "miner wallet").await?.address();

    // Hold the ledger for the whole search so no request observes a half-mined pool.
    let mut ledger = state.ledger.clone().lock_owned().await;
    let block = tokio::task::spawn_blocking(move || {
        ledger.mine_pending_transactions(&reward_address)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("mining task failed: {e}")))??;

    info!("block {} mined for wallet {miner}", block.index);
    Ok(Json(json!({
        "message": "block mined successfully",
        "latestBlock": block,
    })))
}

async fn validate(State(state): State<AppState>) -> Json<Value> {
    let valid = state.ledger.lock().await.is_chain_valid();
    Json(json!({ "valid": valid }))
}

async fn tamper(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TamperRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(block_index), Some(new_data)) = (body.block_index, body.new_data) else {
        return Err(ApiError::BadRequest(
            "block index and new data are required".into(),
        ));
    };
    let block_index = parse_block_index(&block_index)
        .ok_or_else(|| ApiError::BadRequest("block index must be a number".into()))?;
    let index = usize::try_from(block_index)
        .map_err(|_| ApiError::BadRequest("invalid block index".into()))?;

    state
        .ledger
        .lock()
        .await
        .tamper_with_block(index, new_data)?;
    Ok(Json(json!({
        "message": format!("block {index} has been tampered with"),
    })))
}

async fn reset(State(state): State<AppState>) -> Json<Value> {
    state.ledger.lock().await.reset_chain();
    Json(json!({ "message": "blockchain has been reset successfully" }))
}
