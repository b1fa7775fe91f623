use anyhow::{Context as _, Result};
use orangegrove_types::game::{
    ActivityEvent, BotAsset, LandAsset, PlayerRecord, STARTER_BOT_ID, STARTER_LAND_ID,
};
use orangegrove_types::{Document, DocumentKey, WalletAddress};
use tracing::{debug, info};

use super::Applied;
use crate::batch::Batch;
use crate::store::Store;

/// Initialize a newly-created player: seeded stats, referral code, default
/// preferences, the starter land and bot, and the registration activity
/// entry — all in one atomic batch.
///
/// Idempotency comes from fixed document ids: the player document, the
/// starter assets (`starter-land` / `starter-bot`), and the registration
/// entry are all pure functions of the wallet and the trigger timestamp, so
/// a retried invocation overwrites identical values instead of duplicating
/// records. A store failure propagates; swallowing it would leave the
/// player half-initialized with no retry.
pub(super) async fn on_player_created<S: Store>(
    store: &S,
    wallet: &WalletAddress,
    at_ms: u64,
) -> Result<Applied> {
    // A referral code is only ever written by this handler, so its presence
    // marks a completed grant. Without this guard, a creation event
    // redelivered after later progress would reset the record to starter
    // values.
    let key = DocumentKey::Player(wallet.clone());
    if let Some(Document::Player(existing)) = store.get(&key).await? {
        if !existing.referral_code.is_empty() {
            debug!(wallet = %wallet, "player already initialized; skipping grant");
            return Ok(Applied::default());
        }
    }

    let record = PlayerRecord::registered(wallet, at_ms);
    let referral_code = record.referral_code.clone();

    let mut batch = Batch::new(store);
    batch.insert(
        DocumentKey::Player(wallet.clone()),
        Document::Player(record),
    );
    batch.insert(
        DocumentKey::Land(wallet.clone(), STARTER_LAND_ID.to_string()),
        Document::Land(LandAsset::starter()),
    );
    batch.insert(
        DocumentKey::Bot(wallet.clone(), STARTER_BOT_ID.to_string()),
        Document::Bot(BotAsset::starter()),
    );
    let activity = ActivityEvent::registration(at_ms);
    batch.insert(
        DocumentKey::Activity(wallet.clone(), activity.doc_id().to_string()),
        Document::Activity(activity),
    );

    let writes = batch
        .commit()
        .await
        .context("committing starter grant batch")?;

    info!(wallet = %wallet, referral_code = %referral_code, "initialized player");

    // The seeded write settles the creation event itself; it does not
    // re-enter the feed as an update.
    Ok(Applied {
        writes,
        follow_ups: Vec::new(),
    })
}
