//! Where runner and projector work actually executes.

use std::fmt;

use async_trait::async_trait;

use crate::domain::Snapshot;
use crate::engine::{project_price_paths, run_simulation, DEFAULT_SCENARIOS};

use super::{ComputeError, PricePaths, PricePathsRequest, SimulationRequest};

/// Executes whole-path computations off the async executor.
///
/// Implementations receive already validated requests.
#[async_trait]
pub trait ComputeBackend: Send + Sync + fmt::Debug {
    /// Run the deterministic simulation and return `steps + 1` snapshots.
    async fn simulate(&self, request: SimulationRequest) -> Result<Vec<Snapshot>, ComputeError>;

    /// Project buy-only price paths for each scenario multiplier.
    async fn price_paths(&self, request: PricePathsRequest) -> Result<PricePaths, ComputeError>;
}

/// Runs the engine on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct BlockingBackend {
    default_scenarios: Vec<f64>,
}

impl BlockingBackend {
    pub fn new(default_scenarios: Vec<f64>) -> Self {
        Self { default_scenarios }
    }
}

impl Default for BlockingBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SCENARIOS.to_vec())
    }
}

#[async_trait]
impl ComputeBackend for BlockingBackend {
    async fn simulate(&self, request: SimulationRequest) -> Result<Vec<Snapshot>, ComputeError> {
        tokio::task::spawn_blocking(move || run_simulation(&request))
            .await
            .map_err(|e| ComputeError::Failed(e.to_string()))
    }

    async fn price_paths(&self, request: PricePathsRequest) -> Result<PricePaths, ComputeError> {
        let scenarios = request
            .scenarios
            .clone()
            .unwrap_or_else(|| self.default_scenarios.clone());

        tokio::task::spawn_blocking(move || {
            let paths = project_price_paths(
                &request.config,
                &request.buy_pressure,
                request.steps,
                &scenarios,
            );
            PricePaths { scenarios, paths }
        })
        .await
        .map_err(|e| ComputeError::Failed(e.to_string()))
    }
}
