//! Background computation boundary for the runner and the projector.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    validate_steps, BuyPressureConfig, SaleConfig, SaleConfigError, SimulationInputs,
};

pub mod backend;
pub mod client;
pub mod mock;

pub use backend::{BlockingBackend, ComputeBackend};
pub use client::ComputeClient;
pub use mock::MockBackend;

/// Runner request: the full input set.
pub type SimulationRequest = SimulationInputs;

/// Projector request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePathsRequest {
    pub config: SaleConfig,
    #[serde(rename = "buyPressureConfig", default)]
    pub buy_pressure: BuyPressureConfig,
    pub steps: usize,
    /// Demand multipliers; the configured defaults when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Vec<f64>>,
}

impl PricePathsRequest {
    pub fn validate(&self) -> Result<(), SaleConfigError> {
        self.config.validate()?;
        self.buy_pressure.validate()?;
        validate_steps(self.steps)?;
        if let Some(scenarios) = &self.scenarios {
            if let Some(bad) = scenarios.iter().find(|m| !(m.is_finite() && **m >= 0.0)) {
                return Err(SaleConfigError::InvalidValue(
                    "scenarios",
                    format!("multiplier {} must be a finite number >= 0", bad),
                ));
            }
        }
        Ok(())
    }
}

/// Projected price paths, one per scenario, in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePaths {
    pub scenarios: Vec<f64>,
    pub paths: Vec<Vec<f64>>,
}

/// Wire shape of a computation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ComputeResponse<T> {
    Success { result: T },
    Error { message: String },
}

impl<T> From<Result<T, ComputeError>> for ComputeResponse<T> {
    fn from(result: Result<T, ComputeError>) -> Self {
        match result {
            Ok(result) => ComputeResponse::Success { result },
            Err(e) => ComputeResponse::Error {
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputeError {
    #[error("Computation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Computation superseded by request {latest}")]
    Superseded { generation: u64, latest: u64 },
    #[error("Invalid inputs: {0}")]
    Invalid(#[from] SaleConfigError),
    #[error("Computation failed: {0}")]
    Failed(String),
}
