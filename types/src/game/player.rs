use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

use super::{
    level_for, REFERRAL_CODE_LENGTH, STARTER_BOT_SLOTS, STARTER_LAND_SLOTS, STARTER_ORANGES,
    STARTER_WATER,
};
use crate::wallet::WalletAddress;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum PlayerInvariantError {
    #[error("level below minimum (got={got})")]
    LevelBelowMinimum { got: u32 },
    #[error("level behind lifetime oranges (level={level}, lifetime={lifetime})")]
    LevelBehindLifetime { level: u32, lifetime: u64 },
    #[error("rewarded achievement {id} not present in achievement set")]
    RewardedNotUnlocked { id: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    pub current_oranges: u64,
    pub lifetime_oranges: u64,
    pub level: u32,
    pub experience: u64,
    pub water: u64,
    pub land_slots: u32,
    pub bot_slots: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerProgression {
    pub onboarding_step: u32,
    /// Unlocked achievement ids. Append-only: no handler ever removes an
    /// entry.
    pub achievements: BTreeSet<String>,
    /// Achievement ids whose one-time bonus has been paid. Always a subset
    /// of `achievements`; written in the same transaction as the payout so
    /// a redelivered reward trigger cannot pay twice.
    pub rewarded: BTreeSet<String>,
    pub login_streak: u32,
    pub created_at_ms: u64,
    pub last_login_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPreferences {
    pub notifications: bool,
    pub newsletter: bool,
}

impl Default for PlayerPreferences {
    fn default() -> Self {
        Self {
            notifications: true,
            newsletter: false,
        }
    }
}

/// Per-wallet player record, keyed by the normalized wallet address.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub stats: PlayerStats,
    pub progression: PlayerProgression,
    pub referral_code: String,
    pub preferences: PlayerPreferences,
}

impl PlayerRecord {
    /// The fully-seeded record written by the registration handler.
    ///
    /// Every field is a pure function of the wallet and the registration
    /// timestamp, so a retried registration overwrites the document with
    /// identical values.
    pub fn registered(wallet: &WalletAddress, at_ms: u64) -> Self {
        Self {
            stats: PlayerStats {
                current_oranges: STARTER_ORANGES,
                lifetime_oranges: 0,
                level: 1,
                experience: 0,
                water: STARTER_WATER,
                land_slots: STARTER_LAND_SLOTS,
                bot_slots: STARTER_BOT_SLOTS,
            },
            progression: PlayerProgression {
                onboarding_step: 0,
                achievements: BTreeSet::new(),
                rewarded: BTreeSet::new(),
                login_streak: 1,
                created_at_ms: at_ms,
                last_login_ms: at_ms,
            },
            referral_code: referral_code(wallet),
            preferences: PlayerPreferences::default(),
        }
    }

    pub fn validate_invariants(&self) -> Result<(), PlayerInvariantError> {
        if self.stats.level == 0 {
            return Err(PlayerInvariantError::LevelBelowMinimum {
                got: self.stats.level,
            });
        }
        if self.stats.level < level_for(self.stats.lifetime_oranges) {
            return Err(PlayerInvariantError::LevelBehindLifetime {
                level: self.stats.level,
                lifetime: self.stats.lifetime_oranges,
            });
        }
        if let Some(id) = self
            .progression
            .rewarded
            .difference(&self.progression.achievements)
            .next()
        {
            return Err(PlayerInvariantError::RewardedNotUnlocked { id: id.clone() });
        }
        Ok(())
    }
}

const REFERRAL_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Derive a referral code from a wallet address.
///
/// Deterministic so that a retried registration regenerates the same code;
/// uniqueness follows from wallet uniqueness plus the width of the hash.
pub fn referral_code(wallet: &WalletAddress) -> String {
    // FNV-1a over the normalized address bytes.
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in wallet.as_str().bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    let mut code = String::with_capacity(REFERRAL_CODE_LENGTH);
    for _ in 0..REFERRAL_CODE_LENGTH {
        code.push(REFERRAL_ALPHABET[(hash & 31) as usize] as char);
        hash >>= 5;
    }
    code
}
