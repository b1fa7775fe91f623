use anyhow::Result;
use orangegrove_types::{ChangeEvent, Document, DocumentKey};
use tracing::{debug, warn};

use crate::store::{Status, Store};

mod assignment;
mod harvest;
mod registration;
mod rewards;


/// Result of applying one delivery: the writes that were committed and the
/// follow-up changes a change feed should deliver next (handler writes to
/// watched documents re-enter the pipeline, e.g. a reward payout re-triggers
/// harvest progression).
#[derive(Debug, Default)]
pub struct Applied {
    pub writes: Vec<(DocumentKey, Status)>,
    pub follow_ups: Vec<ChangeEvent>,
}

impl Applied {
    fn merge(&mut self, other: Applied) {
        self.writes.extend(other.writes);
        self.follow_ups.extend(other.follow_ups);
    }
}

/// Dispatch one observed document change to every handler whose trigger
/// matches.
///
/// Safe to call more than once with the same change (at-least-once
/// delivery): initialization writes use fixed document ids, link updates
/// use set semantics, level/achievement derivation is a pure function of
/// persisted state, and reward payouts re-check persisted state before
/// paying. Store errors during mutating writes propagate so the caller
/// retries the whole delivery.
pub async fn apply_change<S: Store>(store: &S, change: &ChangeEvent) -> Result<Applied> {
    match (&change.key, change.before.as_ref(), change.after.as_ref()) {
        (DocumentKey::Player(wallet), None, Some(Document::Player(_))) => {
            registration::on_player_created(store, wallet, change.at_ms).await
        }
        (
            DocumentKey::Player(wallet),
            Some(Document::Player(before)),
            Some(Document::Player(after)),
        ) => {
            let mut applied =
                harvest::on_player_updated(store, wallet, before, after, change.at_ms).await?;
            applied.merge(
                rewards::on_player_updated(store, wallet, before, after, change.at_ms).await?,
            );
            Ok(applied)
        }
        (DocumentKey::Bot(wallet, bot_id), before, after) => {
            let before = before.and_then(Document::as_bot);
            let after = after.and_then(Document::as_bot);
            if before.is_none() && after.is_none() {
                warn!(key = %change.key, "bot change without snapshot data");
                return Ok(Applied::default());
            }
            assignment::on_bot_written(store, wallet, bot_id, before, after, change.at_ms).await
        }
        (key, None, None) => {
            warn!(key = %key, "change delivered without snapshot data");
            Ok(Applied::default())
        }
        (key, _, _) => {
            debug!(key = %key, "no handler registered for change");
            Ok(Applied::default())
        }
    }
}
