pub mod api;
pub mod compute;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod playback;

pub use compute::{BlockingBackend, ComputeBackend, ComputeClient, ComputeError, MockBackend};
pub use config::Config;
pub use domain::{
    BuyPressureConfig, OrderId, SaleConfig, SaleConfigError, SellPressureConfig, Side,
    SimulationInputs, Snapshot,
};
pub use engine::{run_simulation, OrderError};
pub use error::AppError;
pub use orchestration::Session;
pub use playback::PlaybackController;
