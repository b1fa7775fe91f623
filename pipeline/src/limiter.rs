use orangegrove_types::game::RateLimitRecord;
use orangegrove_types::{Document, DocumentKey};
use tracing::warn;

use crate::store::Store;

/// Sliding-window rate-limit parameters.
#[derive(Clone, Copy, Debug)]
pub struct RateLimitConfig {
    pub max_attempts: u32,
    pub window_ms: u64,
    pub block_duration_ms: u64,
}

impl RateLimitConfig {
    /// Defaults used for authentication attempts.
    pub fn auth() -> Self {
        Self {
            max_attempts: orangegrove_types::game::AUTH_MAX_ATTEMPTS,
            window_ms: orangegrove_types::game::AUTH_WINDOW_MS,
            block_duration_ms: orangegrove_types::game::AUTH_BLOCK_DURATION_MS,
        }
    }
}

/// State transition for one attempt. Pure: persistence happens in [`check`].
///
/// Returns the record to persist (`None` leaves the stored record
/// untouched) and whether the attempt is allowed.
fn transition(
    current: Option<RateLimitRecord>,
    config: &RateLimitConfig,
    now_ms: u64,
) -> (Option<RateLimitRecord>, bool) {
    let Some(mut record) = current else {
        // absent -> open
        return (Some(RateLimitRecord::opened(now_ms)), true);
    };

    if record.blocked {
        if now_ms < record.last_attempt_ms.saturating_add(config.block_duration_ms) {
            // blocked -> blocked. The stored record keeps the block start
            // time; denied attempts do not extend the block.
            return (None, false);
        }
        // blocked -> open
        return (Some(RateLimitRecord::opened(now_ms)), true);
    }

    if now_ms.saturating_sub(record.first_attempt_ms) >= config.window_ms {
        // open -> open (window reset)
        return (Some(RateLimitRecord::opened(now_ms)), true);
    }

    record.attempts = record.attempts.saturating_add(1);
    record.last_attempt_ms = now_ms;
    if record.attempts > config.max_attempts {
        // open -> blocked; last_attempt_ms records the block start.
        record.blocked = true;
        return (Some(record), false);
    }

    // open -> open
    (Some(record), true)
}

/// Record one attempt against `identifier` and decide whether it is
/// allowed.
///
/// The transition is persisted through a single-document transaction.
/// Fail-open: if the store itself errors the attempt is allowed —
/// availability is preferred over strict limiting, an explicit trade-off.
pub async fn check<S: Store>(
    store: &S,
    identifier: &str,
    config: &RateLimitConfig,
    now_ms: u64,
) -> bool {
    let key = DocumentKey::RateLimit(identifier.to_string());
    let config = *config;
    let result = store
        .update(key, move |doc| {
            let current = doc.and_then(|doc| doc.as_rate_limit().cloned());
            let (next, allowed) = transition(current, &config, now_ms);
            (next.map(Document::RateLimit), allowed)
        })
        .await;

    match result {
        Ok(allowed) => allowed,
        Err(err) => {
            warn!(identifier, ?err, "rate-limit store failure; failing open");
            true
        }
    }
}
