//! Mock compute backend for testing timeouts and superseded requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{ComputeBackend, ComputeError, PricePaths, PricePathsRequest, SimulationRequest};
use crate::domain::Snapshot;
use crate::engine::{project_price_paths, run_simulation, DEFAULT_SCENARIOS};

/// Backend that computes inline after an optional delay, or fails on demand.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    delay: Option<Duration>,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer every request with `ComputeError::Failed(message)`.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Requests received so far, across clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), ComputeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(ComputeError::Failed(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ComputeBackend for MockBackend {
    async fn simulate(&self, request: SimulationRequest) -> Result<Vec<Snapshot>, ComputeError> {
        self.enter().await?;
        Ok(run_simulation(&request))
    }

    async fn price_paths(&self, request: PricePathsRequest) -> Result<PricePaths, ComputeError> {
        self.enter().await?;
        let scenarios = request
            .scenarios
            .unwrap_or_else(|| DEFAULT_SCENARIOS.to_vec());
        let paths = project_price_paths(
            &request.config,
            &request.buy_pressure,
            request.steps,
            &scenarios,
        );
        Ok(PricePaths { scenarios, paths })
    }
}
