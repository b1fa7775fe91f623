//! Game domain types.
//!
//! Defines the player record, land/bot assets, activity events, rate-limit
//! records, and the gameplay constants used by the progression pipeline.

mod activity;
mod assets;
mod constants;
mod player;
mod rate_limit;

pub use activity::*;
pub use assets::*;
pub use constants::*;
pub use player::*;
pub use rate_limit::*;
