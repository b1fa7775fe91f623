use serde::{Deserialize, Serialize};

/// Sliding-window rate-limit state, keyed by an arbitrary identifier string
/// (e.g. `auth:<wallet>`).
///
/// Created on first attempt; reset when the window expires or a block
/// period elapses; only an administrative reset deletes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub attempts: u32,
    pub first_attempt_ms: u64,
    pub last_attempt_ms: u64,
    pub blocked: bool,
}

impl RateLimitRecord {
    /// A fresh window opened at `now_ms` with one attempt recorded.
    pub fn opened(now_ms: u64) -> Self {
        Self {
            attempts: 1,
            first_attempt_ms: now_ms,
            last_attempt_ms: now_ms,
            blocked: false,
        }
    }
}
