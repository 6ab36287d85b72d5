//! Pure computation engines for pool math, pressure curves, and orders.

pub mod curves;
pub mod orders;
pub mod pricing;
pub mod projector;
pub mod runner;

pub use curves::{
    buy_flow_curve, cumulative_buy_curve, fair_value_curve, loyal_sell_schedule,
    sell_pressure_curve, static_price_path, Curves, SoldPoint, StaticPoint,
};
pub use orders::{
    Execution, OrderBook, OrderError, OrderEvent, OrderVenue, TimelineContext, TwapParams,
};
pub use pricing::{spot_price, swap_out_given_in, PoolState, Weights};
pub use projector::{project_price_paths, DEFAULT_SCENARIOS};
pub use runner::{run_simulation, CommunityPosition, SimulationRunner};
