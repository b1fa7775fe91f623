use anyhow::Result;
use orangegrove_types::ChangeEvent;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::backoff::jittered_backoff;
use crate::handlers::apply_change;
use crate::store::Store;

/// Deliveries attempted per change before the event is parked.
pub const FEED_MAX_ATTEMPTS: u32 = 5;

const BACKOFF_BASE: Duration = Duration::from_millis(10);

/// Producer side of the change feed.
#[derive(Clone)]
pub struct FeedHandle {
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

impl FeedHandle {
    /// Enqueue an observed document change. Returns `false` if the feed has
    /// shut down.
    pub fn publish(&self, change: ChangeEvent) -> bool {
        self.sender.send(change).is_ok()
    }
}

/// At-least-once consumer loop over a change feed.
///
/// Each delivery runs [`apply_change`] and then delivers the handlers'
/// follow-up changes depth-first before taking the next external event —
/// this is what drives the reward → harvest feedback loop to quiescence.
/// Failed applications are retried with equal-jitter backoff (idempotency
/// makes the replays safe); an event that exhausts its attempts is parked
/// with an error log for out-of-band reconciliation.
pub struct Feed<S: Store> {
    store: S,
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
    rng: StdRng,
    delivered: u64,
    parked: u64,
}

impl<S: Store> Feed<S> {
    pub fn new(store: S) -> (Self, FeedHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                store,
                receiver,
                rng: StdRng::from_entropy(),
                delivered: 0,
                parked: 0,
            },
            FeedHandle { sender },
        )
    }

    /// Total deliveries applied (external events plus follow-ups).
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Events abandoned after exhausting their retry budget.
    pub fn parked(&self) -> u64 {
        self.parked
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume until every producer handle is dropped.
    pub async fn run(&mut self) {
        while let Some(change) = self.receiver.recv().await {
            self.deliver(change).await;
        }
    }

    /// Consume everything currently queued (including follow-ups) and
    /// return the number of deliveries applied.
    pub async fn drain(&mut self) -> u64 {
        let before = self.delivered;
        while let Ok(change) = self.receiver.try_recv() {
            self.deliver(change).await;
        }
        self.delivered - before
    }

    async fn deliver(&mut self, change: ChangeEvent) {
        let mut queue = VecDeque::from([change]);
        while let Some(next) = queue.pop_front() {
            match self.apply_with_retry(&next).await {
                Ok(follow_ups) => {
                    self.delivered += 1;
                    queue.extend(follow_ups);
                }
                Err(err) => {
                    self.parked += 1;
                    error!(key = %next.key, ?err, "parking change after retries exhausted");
                }
            }
        }
    }

    async fn apply_with_retry(&mut self, change: &ChangeEvent) -> Result<Vec<ChangeEvent>> {
        let mut backoff = BACKOFF_BASE;
        let mut attempt = 1;
        loop {
            // Redelivering the identical snapshot pair is safe: every
            // handler is idempotent under at-least-once delivery.
            match apply_change(&self.store, change).await {
                Ok(applied) => {
                    debug!(
                        key = %change.key,
                        writes = applied.writes.len(),
                        follow_ups = applied.follow_ups.len(),
                        attempt,
                        "change applied"
                    );
                    return Ok(applied.follow_ups);
                }
                Err(err) if attempt < FEED_MAX_ATTEMPTS => {
                    warn!(key = %change.key, ?err, attempt, "delivery failed; retrying");
                    tokio::time::sleep(jittered_backoff(&mut self.rng, backoff)).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
