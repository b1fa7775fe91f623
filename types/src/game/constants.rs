/// Oranges granted to new players on registration.
pub const STARTER_ORANGES: u64 = 100;

/// Water granted to new players on registration.
pub const STARTER_WATER: u64 = 50;

/// Land slots available to new players.
pub const STARTER_LAND_SLOTS: u32 = 1;

/// Bot slots available to new players.
pub const STARTER_BOT_SLOTS: u32 = 1;

/// Fixed document id for the starter land grant.
///
/// The starter grant writes to this literal id rather than an auto-generated
/// one; re-running registration overwrites the same document with identical
/// values instead of duplicating it. This fixed-id strategy is the
/// idempotency mechanism for the grant and must not be replaced with
/// auto-ids.
pub const STARTER_LAND_ID: &str = "starter-land";

/// Fixed document id for the starter bot grant. See [`STARTER_LAND_ID`].
pub const STARTER_BOT_ID: &str = "starter-bot";

/// Lifetime oranges required per level: `level = lifetime / 1000 + 1`.
pub const ORANGES_PER_LEVEL: u64 = 1_000;

/// Length of generated referral codes.
pub const REFERRAL_CODE_LENGTH: usize = 8;

/// Achievement thresholds, ordered ascending by lifetime oranges.
pub const ACHIEVEMENT_THRESHOLDS: &[(u64, &str)] = &[
    (100, "orchard_novice"),
    (1_000, "grove_keeper"),
    (10_000, "citrus_baron"),
];

/// One-time bonus oranges paid per achievement. Ids absent from this table
/// pay nothing.
pub const ACHIEVEMENT_REWARDS: &[(&str, u64)] = &[
    ("orchard_novice", 50),
    ("grove_keeper", 250),
    ("citrus_baron", 1_000),
];

/// Look up the one-time bonus for an achievement id (0 for unknown ids).
pub fn achievement_bonus(id: &str) -> u64 {
    ACHIEVEMENT_REWARDS
        .iter()
        .find(|(name, _)| *name == id)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0)
}

/// Compute the level implied by a lifetime orange count. Saturates at
/// `u32::MAX` instead of truncating.
pub fn level_for(lifetime_oranges: u64) -> u32 {
    u32::try_from(lifetime_oranges / ORANGES_PER_LEVEL)
        .map(|levels| levels.saturating_add(1))
        .unwrap_or(u32::MAX)
}

/// Achievement ids whose threshold is met by a lifetime orange count.
pub fn achievements_for(lifetime_oranges: u64) -> impl Iterator<Item = &'static str> {
    ACHIEVEMENT_THRESHOLDS
        .iter()
        .take_while(move |(threshold, _)| *threshold <= lifetime_oranges)
        .map(|(_, id)| *id)
}

/// Authentication rate-limit defaults.
pub const AUTH_MAX_ATTEMPTS: u32 = 5;
pub const AUTH_WINDOW_MS: u64 = 60_000;
pub const AUTH_BLOCK_DURATION_MS: u64 = 300_000;
