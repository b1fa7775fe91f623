//! Replay driver - feeds a script of gameplay events through the pipeline
//!
//! This is a simple driver for local development that:
//! 1. Reads a JSON-lines script of gameplay operations
//! 2. Applies the client-glue writes to an in-memory store
//! 3. Publishes the resulting document changes to the change feed
//! 4. Drains the feed (including transitive follow-ups) and prints a summary

use anyhow::{anyhow, Context as _, Result};
use clap::Parser;
use orangegrove_pipeline::{check, Feed, FeedHandle, Memory, RateLimitConfig, Store};
use orangegrove_types::game::{BotAsset, LandAsset, LandType, PlayerRecord};
use orangegrove_types::{ChangeEvent, Document, DocumentKey, WalletAddress};
use serde::Deserialize;
use std::fs;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a gameplay script through the progression pipeline")]
struct Args {
    /// Path to a JSON-lines script, one operation per line.
    #[arg(short, long)]
    script: String,

    /// Timestamp (ms) assigned to the first operation; each subsequent
    /// operation advances by one second.
    #[arg(long, default_value = "1000")]
    start_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ScriptOp {
    Register {
        wallet: String,
    },
    Harvest {
        wallet: String,
        amount: u64,
    },
    MintLand {
        wallet: String,
        land: String,
        land_type: LandType,
    },
    MintBot {
        wallet: String,
        bot: String,
    },
    Assign {
        wallet: String,
        bot: String,
        land: Option<String>,
    },
    Auth {
        wallet: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let script = fs::read_to_string(&args.script)
        .with_context(|| format!("reading script {}", args.script))?;

    let store = Memory::default();
    let (mut feed, handle) = Feed::new(store.clone());
    let auth_limit = RateLimitConfig::auth();

    let mut at_ms = args.start_ms;
    for (line_no, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let op: ScriptOp = serde_json::from_str(line)
            .with_context(|| format!("parsing script line {}", line_no + 1))?;
        run_op(&store, &handle, &auth_limit, op, at_ms).await?;
        feed.drain().await;
        at_ms += 1_000;
    }

    let keys = store.keys();
    let players = keys
        .iter()
        .filter(|key| matches!(key, DocumentKey::Player(_)))
        .count();
    info!(
        players,
        documents = keys.len(),
        delivered = feed.delivered(),
        parked = feed.parked(),
        "replay complete"
    );
    for key in keys.iter().filter(|key| matches!(key, DocumentKey::Player(_))) {
        if let Some(doc) = store.get(key).await? {
            info!(key = %key, record = %serde_json::to_string(&doc)?, "final state");
        }
    }

    Ok(())
}

async fn run_op(
    store: &Memory,
    handle: &FeedHandle,
    auth_limit: &RateLimitConfig,
    op: ScriptOp,
    at_ms: u64,
) -> Result<()> {
    match op {
        ScriptOp::Register { wallet } => {
            let wallet = parse_wallet(&wallet)?;
            handle.publish(ChangeEvent {
                key: DocumentKey::Player(wallet),
                before: None,
                after: Some(Document::Player(PlayerRecord::default())),
                at_ms,
            });
        }
        ScriptOp::Harvest { wallet, amount } => {
            let wallet = parse_wallet(&wallet)?;
            let key = DocumentKey::Player(wallet);
            let Some(Document::Player(before)) = store.get(&key).await? else {
                warn!(key = %key, "harvest for unregistered wallet; skipping");
                return Ok(());
            };
            let mut after = before.clone();
            after.stats.current_oranges = after.stats.current_oranges.saturating_add(amount);
            after.stats.lifetime_oranges = after.stats.lifetime_oranges.saturating_add(amount);
            store
                .insert(key.clone(), Document::Player(after.clone()))
                .await?;
            handle.publish(ChangeEvent {
                key,
                before: Some(Document::Player(before)),
                after: Some(Document::Player(after)),
                at_ms,
            });
        }
        ScriptOp::MintLand {
            wallet,
            land,
            land_type,
        } => {
            let wallet = parse_wallet(&wallet)?;
            store
                .insert(
                    DocumentKey::Land(wallet, land),
                    Document::Land(LandAsset::new(land_type)),
                )
                .await?;
        }
        ScriptOp::MintBot { wallet, bot } => {
            let wallet = parse_wallet(&wallet)?;
            store
                .insert(DocumentKey::Bot(wallet, bot), Document::Bot(BotAsset::starter()))
                .await?;
        }
        ScriptOp::Assign { wallet, bot, land } => {
            let wallet = parse_wallet(&wallet)?;
            let key = DocumentKey::Bot(wallet, bot);
            let Some(Document::Bot(before)) = store.get(&key).await? else {
                warn!(key = %key, "assignment for unknown bot; skipping");
                return Ok(());
            };
            let mut after = before.clone();
            after.assigned_land_id = land;
            store
                .insert(key.clone(), Document::Bot(after.clone()))
                .await?;
            handle.publish(ChangeEvent {
                key,
                before: Some(Document::Bot(before)),
                after: Some(Document::Bot(after)),
                at_ms,
            });
        }
        ScriptOp::Auth { wallet } => {
            let wallet = parse_wallet(&wallet)?;
            let identifier = format!("auth:{wallet}");
            let allowed = check(store, &identifier, auth_limit, at_ms).await;
            info!(identifier, allowed, "auth attempt");
        }
    }
    Ok(())
}

fn parse_wallet(raw: &str) -> Result<WalletAddress> {
    WalletAddress::parse(raw).map_err(|err| anyhow!("invalid wallet {raw}: {err}"))
}
