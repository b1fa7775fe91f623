use anyhow::{Context as _, Result};
use orangegrove_types::game::{achievement_bonus, ActivityEvent, PlayerRecord};
use orangegrove_types::{ChangeEvent, Document, DocumentKey, WalletAddress};
use tracing::{debug, info, warn};

use super::Applied;
use crate::batch::Batch;
use crate::store::{Status, Store};

enum Payout {
    Paid {
        before: PlayerRecord,
        after: PlayerRecord,
        bonus: u64,
        unlocked: usize,
    },
    /// The marker was already set by an earlier delivery. The activity row
    /// still needs restaging: that delivery may have crashed between the
    /// payout transaction and the activity commit.
    AlreadyPaid { bonus: u64, unlocked: usize },
}

/// Pay each newly-unlocked achievement's one-time bonus exactly once.
///
/// The before/after diff only hints at which ids are new: the trigger fires
/// after the unlock is committed, so presence in `achievements` cannot
/// distinguish first delivery from redelivery. The persisted `rewarded`
/// marker can — it is checked and written in the same single-document
/// transaction as the payout, so a replayed delivery (or a racing duplicate)
/// finds the marker and pays nothing. The replay still rewrites the
/// deterministic `bonus-{id}` activity row, which recovers an audit entry
/// lost to a crash between the payout and the activity commit.
pub(super) async fn on_player_updated<S: Store>(
    store: &S,
    wallet: &WalletAddress,
    before: &PlayerRecord,
    after: &PlayerRecord,
    at_ms: u64,
) -> Result<Applied> {
    let added: Vec<String> = after
        .progression
        .achievements
        .difference(&before.progression.achievements)
        .cloned()
        .collect();
    if added.is_empty() {
        return Ok(Applied::default());
    }

    let key = DocumentKey::Player(wallet.clone());
    let mut applied = Applied::default();

    for id in added {
        let payout = store
            .update(key.clone(), |doc| {
                let Some(Document::Player(current)) = doc else {
                    return (None, None);
                };
                if !current.progression.achievements.contains(&id) {
                    // Stale hint; the unlock never committed.
                    return (None, None);
                }
                if current.progression.rewarded.contains(&id) {
                    let reconcile = Payout::AlreadyPaid {
                        bonus: achievement_bonus(&id),
                        unlocked: current.progression.achievements.len(),
                    };
                    return (None, Some(reconcile));
                }
                let mut next = current.clone();
                next.progression.rewarded.insert(id.clone());
                let bonus = achievement_bonus(&id);
                next.stats.current_oranges = next.stats.current_oranges.saturating_add(bonus);
                next.stats.lifetime_oranges = next.stats.lifetime_oranges.saturating_add(bonus);
                let payout = Payout::Paid {
                    before: current,
                    after: next.clone(),
                    bonus,
                    unlocked: next.progression.achievements.len(),
                };
                (Some(Document::Player(next)), Some(payout))
            })
            .await
            .context("paying achievement bonus")?;

        let Some(payout) = payout else {
            continue;
        };

        let (bonus, unlocked) = match &payout {
            Payout::Paid {
                bonus, unlocked, ..
            } => (*bonus, *unlocked),
            Payout::AlreadyPaid { bonus, unlocked } => (*bonus, *unlocked),
        };

        if bonus > 0 {
            let activity = ActivityEvent::achievement_rewarded(&id, bonus, unlocked, at_ms);
            let mut batch = Batch::new(store);
            batch.insert(
                DocumentKey::Activity(wallet.clone(), activity.doc_id().to_string()),
                Document::Activity(activity),
            );
            applied.writes.extend(
                batch
                    .commit()
                    .await
                    .context("committing reward activity")?,
            );
        }

        match payout {
            Payout::Paid { before, after, .. } => {
                if bonus > 0 {
                    info!(wallet = %wallet, achievement = %id, bonus, "achievement bonus paid");
                } else {
                    warn!(wallet = %wallet, achievement = %id, "achievement has no reward table entry");
                }
                applied.writes.push((
                    key.clone(),
                    Status::Update(Document::Player(after.clone())),
                ));
                // Bonus oranges count toward future thresholds: the payout
                // write re-enters the feed as a harvest-progression trigger.
                applied.follow_ups.push(ChangeEvent {
                    key: key.clone(),
                    before: Some(Document::Player(before)),
                    after: Some(Document::Player(after)),
                    at_ms,
                });
            }
            Payout::AlreadyPaid { .. } => {
                if bonus > 0 {
                    debug!(wallet = %wallet, achievement = %id, "rewrote activity row for already-paid bonus");
                }
            }
        }
    }

    Ok(applied)
}
