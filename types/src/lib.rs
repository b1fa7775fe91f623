//! Common types for the orangegrove progression pipeline.
//!
//! Everything stored in the document database is defined here: player
//! records, land/bot assets, activity events, rate-limit records, the
//! document key space, and the gameplay constants (thresholds, reward
//! table, starter grant).

pub mod document;
pub mod game;
pub mod wallet;

pub use document::{ChangeEvent, Document, DocumentKey};
pub use wallet::{WalletAddress, WalletAddressError};
