//! Document key space and change-feed envelope.
//!
//! The document store is keyed by [`DocumentKey`]; every stored value is one
//! variant of [`Document`]. Paths are stable across the pipeline:
//!
//! - `players/{wallet}`
//! - `assets/{wallet}/lands/{land_id}`
//! - `assets/{wallet}/bots/{bot_id}`
//! - `activities/{wallet}/events/{event_id}`
//! - `rate_limits/{identifier}`

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::{ActivityEvent, BotAsset, LandAsset, PlayerRecord, RateLimitRecord};
use crate::wallet::WalletAddress;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DocumentKey {
    Player(WalletAddress),
    Land(WalletAddress, String),
    Bot(WalletAddress, String),
    Activity(WalletAddress, String),
    RateLimit(String),
}

impl DocumentKey {
    /// Render the stable document path.
    pub fn path(&self) -> String {
        match self {
            Self::Player(wallet) => format!("players/{wallet}"),
            Self::Land(wallet, id) => format!("assets/{wallet}/lands/{id}"),
            Self::Bot(wallet, id) => format!("assets/{wallet}/bots/{id}"),
            Self::Activity(wallet, id) => format!("activities/{wallet}/events/{id}"),
            Self::RateLimit(identifier) => format!("rate_limits/{identifier}"),
        }
    }

    /// The wallet owning this document, if any (rate limits are keyed by an
    /// arbitrary identifier instead).
    pub fn wallet(&self) -> Option<&WalletAddress> {
        match self {
            Self::Player(wallet)
            | Self::Land(wallet, _)
            | Self::Bot(wallet, _)
            | Self::Activity(wallet, _) => Some(wallet),
            Self::RateLimit(_) => None,
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Document {
    Player(PlayerRecord),
    Land(LandAsset),
    Bot(BotAsset),
    Activity(ActivityEvent),
    RateLimit(RateLimitRecord),
}

impl Document {
    pub fn as_player(&self) -> Option<&PlayerRecord> {
        match self {
            Self::Player(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_land(&self) -> Option<&LandAsset> {
        match self {
            Self::Land(land) => Some(land),
            _ => None,
        }
    }

    pub fn as_bot(&self) -> Option<&BotAsset> {
        match self {
            Self::Bot(bot) => Some(bot),
            _ => None,
        }
    }

    pub fn as_rate_limit(&self) -> Option<&RateLimitRecord> {
        match self {
            Self::RateLimit(record) => Some(record),
            _ => None,
        }
    }
}

/// One observed document mutation, delivered to the pipeline with
/// at-least-once semantics.
///
/// `before`/`after` are the snapshots around the triggering write. The same
/// pair may be delivered more than once (crash-then-retry), so every
/// consumer must treat the diff as a hint and re-check persisted state
/// before producing non-idempotent effects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub key: DocumentKey,
    pub before: Option<Document>,
    pub after: Option<Document>,
    /// Timestamp attached by the platform when the write was first
    /// observed; preserved verbatim on redelivery.
    pub at_ms: u64,
}
