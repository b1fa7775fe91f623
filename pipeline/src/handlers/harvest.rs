use anyhow::{Context as _, Result};
use orangegrove_types::game::{achievements_for, level_for, ActivityEvent, PlayerRecord};
use orangegrove_types::{ChangeEvent, Document, DocumentKey, WalletAddress};
use tracing::{info, warn};

use super::Applied;
use crate::batch::Batch;
use crate::store::{Status, Store};

struct Progress {
    before: PlayerRecord,
    after: PlayerRecord,
    unlocked: Vec<String>,
    leveled: Option<(u32, u32)>,
}

/// React to a player's orange count increasing: log the harvest, evaluate
/// achievement thresholds, and reconcile the level.
///
/// The achievement-set union and level write happen inside one
/// single-document transaction against the *persisted* player record, not
/// the snapshot: additions are set unions and the level is a pure function
/// of lifetime oranges, so a redelivered invocation converges to the same
/// record. A non-increase produces zero writes.
pub(super) async fn on_player_updated<S: Store>(
    store: &S,
    wallet: &WalletAddress,
    before: &PlayerRecord,
    after: &PlayerRecord,
    at_ms: u64,
) -> Result<Applied> {
    if after.stats.current_oranges <= before.stats.current_oranges {
        return Ok(Applied::default());
    }
    let delta = after.stats.current_oranges - before.stats.current_oranges;

    let key = DocumentKey::Player(wallet.clone());
    let progress = store
        .update(key.clone(), |doc| {
            let Some(Document::Player(current)) = doc else {
                return (None, None);
            };
            let mut next = current.clone();
            let lifetime = next.stats.lifetime_oranges;
            for id in achievements_for(lifetime) {
                next.progression.achievements.insert(id.to_string());
            }
            let level = level_for(lifetime);
            let leveled = (level > next.stats.level).then(|| {
                let old = next.stats.level;
                next.stats.level = level;
                (old, level)
            });
            // Experience mirrors lifetime harvest volume; assigning (rather
            // than incrementing) keeps redelivery idempotent.
            next.stats.experience = lifetime;

            let unlocked: Vec<String> = next
                .progression
                .achievements
                .difference(&current.progression.achievements)
                .cloned()
                .collect();
            let changed = next != current;
            let progress = Progress {
                before: current,
                after: next.clone(),
                unlocked,
                leveled,
            };
            (changed.then_some(Document::Player(next)), Some(progress))
        })
        .await
        .context("reconciling player progression")?;

    let Some(progress) = progress else {
        warn!(wallet = %wallet, "player record missing during harvest");
        return Ok(Applied::default());
    };

    let mut batch = Batch::new(store);
    let activity = ActivityEvent::harvest(
        delta,
        after.stats.current_oranges,
        after.stats.lifetime_oranges,
        at_ms,
    );
    batch.insert(
        DocumentKey::Activity(wallet.clone(), activity.doc_id().to_string()),
        Document::Activity(activity),
    );
    for id in &progress.unlocked {
        info!(wallet = %wallet, achievement = %id, "achievement unlocked");
        let activity = ActivityEvent::achievement_unlocked(id, at_ms);
        batch.insert(
            DocumentKey::Activity(wallet.clone(), activity.doc_id().to_string()),
            Document::Activity(activity),
        );
    }
    if let Some((old_level, new_level)) = progress.leveled {
        info!(wallet = %wallet, old_level, new_level, "level up");
        let activity = ActivityEvent::level_up(old_level, new_level, at_ms);
        batch.insert(
            DocumentKey::Activity(wallet.clone(), activity.doc_id().to_string()),
            Document::Activity(activity),
        );
    }
    let mut writes = batch
        .commit()
        .await
        .context("committing harvest activity batch")?;

    let mut follow_ups = Vec::new();
    if progress.after != progress.before {
        writes.push((key.clone(), Status::Update(Document::Player(progress.after.clone()))));
        follow_ups.push(ChangeEvent {
            key,
            before: Some(Document::Player(progress.before)),
            after: Some(Document::Player(progress.after)),
            at_ms,
        });
    }

    Ok(Applied { writes, follow_ups })
}
