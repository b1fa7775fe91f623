//! Game-progression event pipeline.
//!
//! This crate contains the reactive handlers that keep the auxiliary
//! off-chain records consistent with the authoritative player state:
//! registration (starter grant), asset-link consistency, harvest
//! progression, achievement rewards, and the sliding-window rate limiter.
//!
//! ## Delivery requirements
//! - Every handler must be safe to run twice with identical before/after
//!   snapshots (at-least-once delivery).
//! - Handlers share no memory; all cross-handler communication happens
//!   through committed document state.
//! - Counter mutations go through single-document transactions
//!   ([`Store::update`]); multi-document writes go through all-or-nothing
//!   batches ([`Store::apply`]).
//!
//! The primary entrypoints are [`apply_change`] for a single delivery and
//! [`Feed`] for the at-least-once consumer loop.

mod backoff;
mod batch;
mod feed;
mod handlers;
mod limiter;
mod store;

#[cfg(test)]
mod idempotency_tests;

pub use batch::Batch;
pub use feed::{Feed, FeedHandle, FEED_MAX_ATTEMPTS};
pub use handlers::{apply_change, Applied};
pub use limiter::{check, RateLimitConfig};
pub use store::{Memory, Status, Store};
