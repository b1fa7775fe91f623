//! Replay tests for at-least-once delivery.
//!
//! These tests verify that redelivering any change — or an entire scenario —
//! produces no double effects: one starter grant, one bonus per achievement,
//! a convergent level, and an activity log without duplicate rows.

use crate::feed::Feed;
use crate::handlers::apply_change;
use crate::store::{Memory, Store};
use orangegrove_types::game::{
    achievement_bonus, ActivityKind, PlayerRecord, ACHIEVEMENT_THRESHOLDS, STARTER_ORANGES,
};
use orangegrove_types::{ChangeEvent, Document, DocumentKey, WalletAddress};

fn wallet() -> WalletAddress {
    WalletAddress::parse("0xfeedfacefeedfacefeedfacefeedfacefeedface").unwrap()
}

fn creation(wallet: &WalletAddress, at_ms: u64) -> ChangeEvent {
    ChangeEvent {
        key: DocumentKey::Player(wallet.clone()),
        before: None,
        after: Some(Document::Player(PlayerRecord::default())),
        at_ms,
    }
}

async fn player(store: &Memory, wallet: &WalletAddress) -> PlayerRecord {
    store
        .get(&DocumentKey::Player(wallet.clone()))
        .await
        .unwrap()
        .and_then(|doc| doc.as_player().cloned())
        .expect("player record present")
}

/// Credit a harvest the way the client glue would and return the change the
/// platform delivers for it.
async fn credit_harvest(
    store: &Memory,
    wallet: &WalletAddress,
    amount: u64,
    at_ms: u64,
) -> ChangeEvent {
    let key = DocumentKey::Player(wallet.clone());
    let before = player(store, wallet).await;
    let mut after = before.clone();
    after.stats.current_oranges += amount;
    after.stats.lifetime_oranges += amount;
    store
        .insert(key.clone(), Document::Player(after.clone()))
        .await
        .unwrap();
    ChangeEvent {
        key,
        before: Some(Document::Player(before)),
        after: Some(Document::Player(after)),
        at_ms,
    }
}

#[tokio::test]
async fn test_scenario_replay_is_stable() {
    let store = Memory::default();
    let (mut feed, handle) = Feed::new(store.clone());
    let w = wallet();

    // Register, then harvest through every threshold.
    handle.publish(creation(&w, 1));
    feed.drain().await;
    let mut deliveries = Vec::new();
    for (i, amount) in [150u64, 900, 9_000].into_iter().enumerate() {
        let change = credit_harvest(&store, &w, amount, 10 + i as u64).await;
        handle.publish(change.clone());
        feed.drain().await;
        deliveries.push(change);
    }

    let settled = player(&store, &w).await;
    settled.validate_invariants().unwrap();
    let keys_settled = store.keys();

    // Redeliver everything, twice, in order.
    for _ in 0..2 {
        handle.publish(creation(&w, 1));
        for change in &deliveries {
            handle.publish(change.clone());
        }
        feed.drain().await;
    }

    assert_eq!(player(&store, &w).await, settled);
    assert_eq!(store.keys(), keys_settled);
    assert_eq!(feed.parked(), 0);
}

#[tokio::test]
async fn test_total_bonus_paid_exactly_once_each() {
    let store = Memory::default();
    let (mut feed, handle) = Feed::new(store.clone());
    let w = wallet();

    handle.publish(creation(&w, 1));
    feed.drain().await;

    // One large harvest unlocks all three achievements at once.
    let harvested: u64 = 20_000;
    let change = credit_harvest(&store, &w, harvested, 2).await;
    for _ in 0..4 {
        handle.publish(change.clone());
    }
    feed.drain().await;

    let expected_bonus: u64 = ACHIEVEMENT_THRESHOLDS
        .iter()
        .map(|(_, id)| achievement_bonus(id))
        .sum();
    let record = player(&store, &w).await;
    assert_eq!(record.stats.lifetime_oranges, harvested + expected_bonus);
    assert_eq!(
        record.stats.current_oranges,
        STARTER_ORANGES + harvested + expected_bonus
    );
    assert_eq!(
        record.progression.rewarded.len(),
        ACHIEVEMENT_THRESHOLDS.len()
    );
    record.validate_invariants().unwrap();
}

#[tokio::test]
async fn test_bonus_oranges_count_toward_thresholds() {
    let store = Memory::default();
    let (mut feed, handle) = Feed::new(store.clone());
    let w = wallet();

    handle.publish(creation(&w, 1));
    feed.drain().await;

    // 990 harvested + the 50-orange novice bonus crosses the 1,000-lifetime
    // threshold, so grove_keeper must unlock from the payout follow-up
    // alone.
    let change = credit_harvest(&store, &w, 990, 2).await;
    handle.publish(change);
    feed.drain().await;

    let record = player(&store, &w).await;
    assert!(record.progression.achievements.contains("grove_keeper"));
    assert!(record.progression.rewarded.contains("grove_keeper"));
    assert_eq!(record.stats.lifetime_oranges, 990 + 50 + 250);
    assert_eq!(record.stats.level, 2);
    record.validate_invariants().unwrap();
}

#[tokio::test]
async fn test_interleaved_wallets_do_not_interact() {
    let store = Memory::default();
    let (mut feed, handle) = Feed::new(store.clone());
    let a = wallet();
    let b = WalletAddress::parse("0x0123456789012345678901234567890123456789").unwrap();

    handle.publish(creation(&a, 1));
    handle.publish(creation(&b, 1));
    feed.drain().await;

    let change_a = credit_harvest(&store, &a, 150, 2).await;
    let change_b = credit_harvest(&store, &b, 9_999, 2).await;
    handle.publish(change_a);
    handle.publish(change_b);
    feed.drain().await;

    let record_a = player(&store, &a).await;
    let record_b = player(&store, &b).await;
    assert_eq!(record_a.progression.achievements.len(), 1);
    assert_eq!(record_b.progression.achievements.len(), 2);
    assert_eq!(record_a.stats.level, 1);
    assert!(record_b.stats.level > 1);
}

#[tokio::test]
async fn test_duplicate_deliveries_do_not_duplicate_activities() {
    let store = Memory::default();
    let (mut feed, handle) = Feed::new(store.clone());
    let w = wallet();

    handle.publish(creation(&w, 1));
    feed.drain().await;
    let change = credit_harvest(&store, &w, 150, 2).await;
    for _ in 0..3 {
        handle.publish(change.clone());
    }
    feed.drain().await;

    let mut counts = std::collections::BTreeMap::new();
    for key in store.keys() {
        if let DocumentKey::Activity(_, _) = &key {
            if let Some(Document::Activity(event)) = store.get(&key).await.unwrap() {
                *counts.entry(event.kind).or_insert(0usize) += 1;
            }
        }
    }
    assert_eq!(counts.get(&ActivityKind::Registration), Some(&1));
    // Two harvest rows: the player's 150 and the 50-orange bonus credit,
    // which re-enters as its own harvest. Redeliveries add none.
    assert_eq!(counts.get(&ActivityKind::Harvest), Some(&2));
    // One unlock row and one bonus row for orchard_novice.
    assert_eq!(counts.get(&ActivityKind::Achievement), Some(&2));
}

#[tokio::test]
async fn test_direct_apply_matches_feed_delivery() {
    // The feed is a convenience; apply_change alone must uphold the same
    // invariants when the platform calls handlers directly.
    let store = Memory::default();
    let w = wallet();

    let change = creation(&w, 1);
    apply_change(&store, &change).await.unwrap();
    apply_change(&store, &change).await.unwrap();

    let record = player(&store, &w).await;
    assert_eq!(record, PlayerRecord::registered(&w, 1));
    assert_eq!(store.keys().len(), 4);
}
