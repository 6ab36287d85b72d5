//! Interactive playback: live market, step controller and ticker.

pub mod controller;
pub mod market;
pub mod ticker;

pub use controller::{PlaybackController, PlaybackSummary, TickOutcome, MAX_SPEED, MIN_SPEED};
pub use market::{LiveMarket, SwapLog, Wallet, MAX_SWAPS};
pub use ticker::{Player, SharedController};
