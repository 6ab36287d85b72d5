//! Request gate in front of a [`ComputeBackend`]: validation, timeout and
//! generation tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::Snapshot;

use super::{ComputeBackend, ComputeError, PricePaths, PricePathsRequest, SimulationRequest};

/// Result of a tracked request, tagged with its generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Generational<T> {
    pub generation: u64,
    pub value: T,
}

#[derive(Debug)]
pub struct ComputeClient {
    backend: Arc<dyn ComputeBackend>,
    timeout: Duration,
    generation: AtomicU64,
}

impl ComputeClient {
    pub fn new(backend: Arc<dyn ComputeBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            generation: AtomicU64::new(0),
        }
    }

    /// Latest tracked generation handed out.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    /// Claim a new generation; every older one becomes stale.
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Untracked simulation, bounded by the timeout.
    pub async fn simulate(&self, request: SimulationRequest) -> Result<Vec<Snapshot>, ComputeError> {
        request.validate()?;
        self.bounded(self.backend.simulate(request)).await
    }

    /// Untracked projection, bounded by the timeout.
    pub async fn price_paths(&self, request: PricePathsRequest) -> Result<PricePaths, ComputeError> {
        request.validate()?;
        self.bounded(self.backend.price_paths(request)).await
    }

    /// Accept `value` for `generation` only if nothing newer was started.
    pub fn accept<T>(&self, generation: u64, value: T) -> Result<Generational<T>, ComputeError> {
        if !self.is_current(generation) {
            let latest = self.current_generation();
            tracing::debug!(generation, latest, "discarding superseded result");
            return Err(ComputeError::Superseded { generation, latest });
        }
        Ok(Generational { generation, value })
    }

    async fn bounded<T>(
        &self,
        work: impl std::future::Future<Output = Result<T, ComputeError>>,
    ) -> Result<T, ComputeError> {
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "computation timed out");
                Err(ComputeError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::MockBackend;
    use crate::domain::SaleConfigError;

    fn client(backend: MockBackend, timeout_ms: u64) -> ComputeClient {
        ComputeClient::new(Arc::new(backend), Duration::from_millis(timeout_ms))
    }

    #[tokio::test]
    async fn test_simulate_success() {
        let client = client(MockBackend::new(), 1_000);
        let snapshots = client
            .simulate(SimulationRequest::with_steps(10))
            .await
            .unwrap();
        assert_eq!(snapshots.len(), 11);
    }

    #[tokio::test]
    async fn test_invalid_inputs_never_reach_backend() {
        let backend = MockBackend::new();
        let client = client(backend.clone(), 1_000);
        let mut request = SimulationRequest::with_steps(10);
        request.config.duration = 0.0;

        let result = client.simulate(request).await;
        assert!(matches!(
            result,
            Err(ComputeError::Invalid(SaleConfigError::InvalidValue(..)))
        ));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let client = client(MockBackend::new().with_delay(Duration::from_secs(60)), 30_000);
        let result = client.simulate(SimulationRequest::with_steps(10)).await;
        assert_eq!(result, Err(ComputeError::Timeout(Duration::from_secs(30))));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let client = client(MockBackend::new().with_failure("boom"), 1_000);
        let result = client.simulate(SimulationRequest::with_steps(10)).await;
        assert_eq!(result, Err(ComputeError::Failed("boom".to_string())));
    }

    #[test]
    fn test_accept_rejects_stale_generation() {
        let client = client(MockBackend::new(), 1_000);
        let first = client.next_generation();
        let second = client.next_generation();
        assert!(matches!(
            client.accept(first, ()),
            Err(ComputeError::Superseded { generation: 1, latest: 2 })
        ));
        assert!(client.accept(second, ()).is_ok());
    }
}
