//! Interactive simulation session: inputs, derived curves, playback and compute.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::compute::{ComputeBackend, ComputeClient, ComputeError, PricePaths, PricePathsRequest};
use crate::config::Config;
use crate::domain::{
    BuyPressureUpdate, SaleConfigError, SaleConfigUpdate, SellPressureUpdate, SimulationInputs,
};
use crate::engine::Curves;
use crate::playback::{PlaybackController, Player, SharedController};

/// Session-level knobs taken from the process config.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub steps: usize,
    pub base_interval: Duration,
    pub compute_timeout: Duration,
    pub starting_balance: f64,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            steps: config.sim_steps,
            base_interval: config.playback_base_interval(),
            compute_timeout: config.compute_timeout(),
            starting_balance: config.user_starting_balance,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Partial update of any of the three input groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    #[serde(default)]
    pub config: Option<SaleConfigUpdate>,
    #[serde(default, rename = "buyPressureConfig")]
    pub buy_pressure: Option<BuyPressureUpdate>,
    #[serde(default, rename = "sellPressureConfig")]
    pub sell_pressure: Option<SellPressureUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RecomputeOutcome {
    /// Inputs unchanged and their path already installed.
    Unchanged,
    Installed { generation: u64 },
    /// A newer request started while this one ran; its result was dropped.
    Superseded { generation: u64 },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] SaleConfigError),
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

#[derive(Debug)]
struct SessionState {
    inputs: SimulationInputs,
    fingerprint: String,
    curves: Curves,
    price_paths: Option<PricePaths>,
    /// Fingerprint of the inputs whose path is installed.
    installed: Option<String>,
}

impl SessionState {
    fn new(inputs: SimulationInputs) -> Self {
        Self {
            fingerprint: inputs.fingerprint(),
            curves: Curves::compute(&inputs),
            inputs,
            price_paths: None,
            installed: None,
        }
    }
}

/// One interactive simulation: inputs, derived curves, playback and compute.
#[derive(Debug)]
pub struct Session {
    settings: SessionSettings,
    state: Mutex<SessionState>,
    controller: SharedController,
    player: Player,
    client: ComputeClient,
}

impl Session {
    pub fn new(settings: SessionSettings, backend: Arc<dyn ComputeBackend>) -> Self {
        let inputs = SimulationInputs::with_steps(settings.steps);
        let controller = Arc::new(Mutex::new(PlaybackController::new(
            inputs.config.clone(),
            inputs.safe_steps(),
            settings.starting_balance,
        )));
        let player = Player::new(Arc::clone(&controller), settings.base_interval);
        let client = ComputeClient::new(backend, settings.compute_timeout);

        Self {
            state: Mutex::new(SessionState::new(inputs)),
            settings,
            controller,
            player,
            client,
        }
    }

    pub fn controller(&self) -> &SharedController {
        &self.controller
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn client(&self) -> &ComputeClient {
        &self.client
    }

    pub async fn inputs(&self) -> SimulationInputs {
        self.state.lock().await.inputs.clone()
    }

    pub async fn fingerprint(&self) -> String {
        self.state.lock().await.fingerprint.clone()
    }

    pub async fn curves(&self) -> Curves {
        self.state.lock().await.curves.clone()
    }

    pub async fn price_paths(&self) -> Option<PricePaths> {
        self.state.lock().await.price_paths.clone()
    }

    /// Compute and install the path for the current inputs if it is missing.
    pub async fn initialize(&self) -> Result<RecomputeOutcome, SessionError> {
        self.apply_inputs(|current| Ok(current.clone())).await
    }

    /// Merge partial updates, validate, and recompute when anything changed.
    ///
    /// The merge reads the inputs under the same lock that installs them, so
    /// concurrent updates to different fields compose.
    pub async fn update(&self, update: SessionUpdate) -> Result<RecomputeOutcome, SessionError> {
        self.apply_inputs(|current| {
            let mut next = current.clone();
            if let Some(config) = &update.config {
                next.config = current.config.apply(config)?;
            }
            if let Some(buy) = &update.buy_pressure {
                next.buy_pressure = current.buy_pressure.apply(buy)?;
            }
            if let Some(sell) = &update.sell_pressure {
                next.sell_pressure = current.sell_pressure.apply(sell)?;
            }
            next.validate()?;
            Ok(next)
        })
        .await
    }

    /// Restore defaults: inputs, wallet, orders and playback.
    pub async fn reset(&self) -> Result<RecomputeOutcome, SessionError> {
        self.player.stop();
        let inputs = SimulationInputs::with_steps(self.settings.steps);
        let generation = {
            let mut state = self.state.lock().await;
            *state = SessionState::new(inputs.clone());
            let generation = self.client.next_generation();
            self.controller
                .lock()
                .await
                .reset(inputs.config.clone(), inputs.safe_steps());
            generation
        };
        tracing::info!(generation, "session reset to defaults");
        self.recompute(generation, inputs).await
    }

    async fn apply_inputs<F>(&self, derive: F) -> Result<RecomputeOutcome, SessionError>
    where
        F: FnOnce(&SimulationInputs) -> Result<SimulationInputs, SessionError>,
    {
        let (generation, inputs, fingerprint) = {
            let mut state = self.state.lock().await;
            let inputs = derive(&state.inputs)?;
            let fingerprint = inputs.fingerprint();
            if state.installed.as_deref() == Some(fingerprint.as_str()) {
                tracing::debug!(%fingerprint, "inputs unchanged, skipping recompute");
                return Ok(RecomputeOutcome::Unchanged);
            }
            if state.fingerprint != fingerprint {
                *state = SessionState::new(inputs.clone());
            }
            // Claimed before the reset so a racing install sees itself as stale.
            let generation = self.client.next_generation();
            self.controller
                .lock()
                .await
                .reset_timeline(inputs.config.clone(), inputs.safe_steps());
            // The timeline is empty until this generation installs.
            state.installed = None;
            (generation, inputs, fingerprint)
        };
        tracing::info!(generation, %fingerprint, "recomputing simulation");
        self.recompute(generation, inputs).await
    }

    async fn recompute(
        &self,
        generation: u64,
        inputs: SimulationInputs,
    ) -> Result<RecomputeOutcome, SessionError> {
        let fingerprint = inputs.fingerprint();
        let paths_request = PricePathsRequest {
            config: inputs.config.clone(),
            buy_pressure: inputs.buy_pressure,
            steps: inputs.safe_steps(),
            scenarios: None,
        };

        let (snapshots, paths) = futures::future::join(
            self.client.simulate(inputs),
            self.client.price_paths(paths_request),
        )
        .await;

        let snapshots = match snapshots {
            Ok(snapshots) => snapshots,
            Err(e) => {
                tracing::warn!(generation, error = %e, "simulation failed");
                return Err(e.into());
            }
        };

        let mut state = self.state.lock().await;
        let mut controller = self.controller.lock().await;
        match self.client.accept(generation, snapshots) {
            Ok(accepted) => {
                controller.install_snapshots(accepted.value);
                state.installed = Some(fingerprint);
                state.price_paths = match paths {
                    Ok(paths) => Some(paths),
                    Err(e) => {
                        tracing::warn!(generation, error = %e, "price path projection failed");
                        None
                    }
                };
                Ok(RecomputeOutcome::Installed { generation })
            }
            Err(ComputeError::Superseded { .. }) => Ok(RecomputeOutcome::Superseded { generation }),
            Err(e) => Err(e.into()),
        }
    }
}
