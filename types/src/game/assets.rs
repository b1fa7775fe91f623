use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandType {
    Small,
    Medium,
    Large,
}

impl LandType {
    /// Default bot capacity for a freshly minted land of this type.
    pub fn default_capacity(&self) -> u32 {
        match self {
            LandType::Small => 4,
            LandType::Medium => 8,
            LandType::Large => 16,
        }
    }
}

/// Per-wallet land asset, keyed by `(wallet, land_id)`.
///
/// `assigned_bot_ids` mirrors the `assigned_land_id` pointer on each bot
/// owned by the same wallet; the assignment handler keeps the two sides
/// consistent. `capacity` is advisory: over-subscription is logged, not
/// rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandAsset {
    pub land_type: LandType,
    pub capacity: u32,
    pub assigned_bot_ids: BTreeSet<String>,
}

impl LandAsset {
    pub fn new(land_type: LandType) -> Self {
        Self {
            land_type,
            capacity: land_type.default_capacity(),
            assigned_bot_ids: BTreeSet::new(),
        }
    }

    /// The land granted on registration.
    pub fn starter() -> Self {
        Self::new(LandType::Small)
    }

    pub fn is_over_capacity(&self) -> bool {
        self.assigned_bot_ids.len() > self.capacity as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotType {
    Sprinkler,
    Harvester,
    Mecha,
}

impl BotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotType::Sprinkler => "sprinkler",
            BotType::Harvester => "harvester",
            BotType::Mecha => "mecha",
        }
    }
}

/// Per-wallet bot asset, keyed by `(wallet, bot_id)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotAsset {
    pub bot_type: BotType,
    /// Oranges produced per hour when assigned.
    pub harvest_rate: u32,
    /// Water consumed per hour when assigned.
    pub water_consumption: u32,
    /// Land this bot works, or `None` when idle. If set, the referenced
    /// land's `assigned_bot_ids` must contain this bot's id.
    pub assigned_land_id: Option<String>,
}

impl BotAsset {
    /// The bot granted on registration.
    pub fn starter() -> Self {
        Self {
            bot_type: BotType::Harvester,
            harvest_rate: 10,
            water_consumption: 2,
            assigned_land_id: None,
        }
    }
}
