use anyhow::{Context as _, Result};
use orangegrove_types::game::{ActivityEvent, BotAsset};
use orangegrove_types::{Document, DocumentKey, WalletAddress};
use tracing::warn;

use super::Applied;
use crate::batch::Batch;
use crate::store::Store;

/// Keep a land's `assigned_bot_ids` the mirror image of its bots'
/// `assigned_land_id` pointers.
///
/// All mutations use set semantics (difference on the old land, union on
/// the new land), so redelivery and out-of-order delivery converge to the
/// same state. Capacity is advisory: over-subscription logs a warning but
/// the assignment still lands — callers rely on this not rejecting.
pub(super) async fn on_bot_written<S: Store>(
    store: &S,
    wallet: &WalletAddress,
    bot_id: &str,
    before: Option<&BotAsset>,
    after: Option<&BotAsset>,
    at_ms: u64,
) -> Result<Applied> {
    let old_land = before.and_then(|bot| bot.assigned_land_id.as_deref());
    let new_land = after.and_then(|bot| bot.assigned_land_id.as_deref());
    if old_land == new_land {
        return Ok(Applied::default());
    }

    let mut batch = Batch::new(store);

    if let Some(old_id) = old_land {
        let key = DocumentKey::Land(wallet.clone(), old_id.to_string());
        match batch.get(&key).await? {
            Some(Document::Land(mut land)) => {
                if land.assigned_bot_ids.remove(bot_id) {
                    batch.insert(key, Document::Land(land));
                }
            }
            _ => {
                // Nothing to unlink; the pointer was already dangling.
                warn!(wallet = %wallet, bot = bot_id, land = old_id, "old land missing during unassignment");
            }
        }
    }

    if let Some(new_id) = new_land {
        let key = DocumentKey::Land(wallet.clone(), new_id.to_string());
        match batch.get(&key).await? {
            Some(Document::Land(mut land)) => {
                land.assigned_bot_ids.insert(bot_id.to_string());
                if land.is_over_capacity() {
                    warn!(
                        wallet = %wallet,
                        land = new_id,
                        assigned = land.assigned_bot_ids.len(),
                        capacity = land.capacity,
                        "land over capacity"
                    );
                }
                batch.insert(key, Document::Land(land));
            }
            _ => {
                // Must be reconciled out-of-band; abort with no partial
                // writes rather than unlink one side of the pair.
                warn!(wallet = %wallet, bot = bot_id, land = new_id, "assigned land does not exist");
                return Ok(Applied::default());
            }
        }
    }

    let Some(bot_type) = after.or(before).map(|bot| bot.bot_type) else {
        return Ok(Applied::default());
    };
    let activity = ActivityEvent::assignment(bot_id, bot_type, new_land, at_ms);
    batch.insert(
        DocumentKey::Activity(wallet.clone(), activity.doc_id().to_string()),
        Document::Activity(activity),
    );

    let writes = batch
        .commit()
        .await
        .context("committing assignment batch")?;

    Ok(Applied {
        writes,
        follow_ups: Vec::new(),
    })
}
