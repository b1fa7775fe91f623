use serde::{Deserialize, Serialize};

use super::BotType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Registration,
    Harvest,
    Achievement,
    LevelUp,
    Assignment,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Registration => "registration",
            ActivityKind::Harvest => "harvest",
            ActivityKind::Achievement => "achievement",
            ActivityKind::LevelUp => "level_up",
            ActivityKind::Assignment => "assignment",
        }
    }
}

/// Append-only audit record, keyed by `(wallet, document id)`.
///
/// Document ids are deterministic functions of the event content so a
/// redelivered handler run overwrites the same row instead of duplicating
/// it. Entries may land out of chronological order relative to wall-clock
/// time when assignment changes race; acceptable for an audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub message: String,
    pub at_ms: u64,
    doc_id: String,
}

impl ActivityEvent {
    fn new(kind: ActivityKind, message: String, at_ms: u64, slug: String) -> Self {
        let doc_id = format!("{}-{}", kind.as_str(), slug);
        Self {
            kind,
            message,
            at_ms,
            doc_id,
        }
    }

    /// Deterministic document id for this event.
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// The one-time registration entry. Fixed id: at most one per wallet.
    pub fn registration(at_ms: u64) -> Self {
        Self::new(
            ActivityKind::Registration,
            "Joined the grove and received the starter pack".to_string(),
            at_ms,
            "welcome".to_string(),
        )
    }

    /// A harvest credit, keyed by the resulting totals. The trigger is a
    /// `current_oranges` increase, so `current` alone distinguishes credits
    /// that move the balance without moving the lifetime count.
    pub fn harvest(delta: u64, current: u64, lifetime: u64, at_ms: u64) -> Self {
        Self::new(
            ActivityKind::Harvest,
            format!("Harvested {delta} oranges ({current} held, {lifetime} lifetime)"),
            at_ms,
            format!("{lifetime}-{current}"),
        )
    }

    /// An achievement unlock (no bonus attached yet).
    pub fn achievement_unlocked(id: &str, at_ms: u64) -> Self {
        Self::new(
            ActivityKind::Achievement,
            format!("Unlocked achievement {id}"),
            at_ms,
            format!("unlock-{id}"),
        )
    }

    /// An achievement bonus payout.
    pub fn achievement_rewarded(id: &str, bonus: u64, unlocked: usize, at_ms: u64) -> Self {
        Self::new(
            ActivityKind::Achievement,
            format!("Collected {bonus} bonus oranges for {id} ({unlocked} achievements unlocked)"),
            at_ms,
            format!("bonus-{id}"),
        )
    }

    /// A level-up. Keyed by the new level, which is reached at most once.
    pub fn level_up(old_level: u32, new_level: u32, at_ms: u64) -> Self {
        Self::new(
            ActivityKind::LevelUp,
            format!("Reached level {new_level} (was {old_level})"),
            at_ms,
            new_level.to_string(),
        )
    }

    /// A bot assignment transition. Keyed by bot and trigger timestamp so a
    /// redelivered snapshot pair maps to the same row while distinct
    /// transitions stay distinct.
    pub fn assignment(
        bot_id: &str,
        bot_type: BotType,
        land_id: Option<&str>,
        at_ms: u64,
    ) -> Self {
        let message = match land_id {
            Some(land) => format!("Assigned {} bot {bot_id} to land {land}", bot_type.as_str()),
            None => format!("Unassigned {} bot {bot_id}", bot_type.as_str()),
        };
        Self::new(
            ActivityKind::Assignment,
            message,
            at_ms,
            format!("{bot_id}-{at_ms}"),
        )
    }
}
