//! Domain types for the LBP simulator.
//!
//! This module provides:
//! - Sale configuration with boundary validation and partial updates
//! - Buy/sell pressure model parameters
//! - Per-step snapshots produced by the runner
//! - Limit/TWAP orders and swap records
//! - Input fingerprinting used to skip redundant recomputation

pub mod inputs;
pub mod order;
pub mod pressure;
pub mod primitives;
pub mod sale;
pub mod snapshot;

pub use inputs::{validate_steps, SimulationInputs, MAX_STEPS};
pub use order::{LimitOrder, LimitStatus, SwapRecord, TwapOrder, TwapStatus};
pub use pressure::{
    BuyPressureConfig, BuyPressureUpdate, BuyPreset, MagnitudeBase, SellPreset,
    SellPressureConfig, SellPressureUpdate,
};
pub use primitives::{Account, OrderId, Side};
pub use sale::{SaleConfig, SaleConfigError, SaleConfigUpdate};
pub use snapshot::Snapshot;
