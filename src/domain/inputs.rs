//! The full input set of one simulation run.

use serde::{Deserialize, Serialize};

use super::{BuyPressureConfig, SaleConfig, SaleConfigError, SellPressureConfig};

/// Upper bound on runner granularity.
pub const MAX_STEPS: usize = 10_000;

/// Rejects a step count above [`MAX_STEPS`].
pub fn validate_steps(steps: usize) -> Result<(), SaleConfigError> {
    if steps > MAX_STEPS {
        return Err(SaleConfigError::InvalidValue(
            "steps",
            format!("must be at most {}, got {}", MAX_STEPS, steps),
        ));
    }
    Ok(())
}

/// Everything the runner needs; changing any field invalidates the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationInputs {
    pub config: SaleConfig,
    #[serde(rename = "buyPressureConfig")]
    pub buy_pressure: BuyPressureConfig,
    #[serde(rename = "sellPressureConfig")]
    pub sell_pressure: SellPressureConfig,
    pub steps: usize,
}

impl SimulationInputs {
    pub fn new(
        config: SaleConfig,
        buy_pressure: BuyPressureConfig,
        sell_pressure: SellPressureConfig,
        steps: usize,
    ) -> Self {
        Self {
            config,
            buy_pressure,
            sell_pressure,
            steps,
        }
    }

    /// Default sale and pressure models at the given granularity.
    pub fn with_steps(steps: usize) -> Self {
        Self::new(
            SaleConfig::default(),
            BuyPressureConfig::default(),
            SellPressureConfig::default(),
            steps,
        )
    }

    /// Runner granularity, never below one step.
    pub fn safe_steps(&self) -> usize {
        self.steps.max(1)
    }

    pub fn validate(&self) -> Result<(), SaleConfigError> {
        self.config.validate()?;
        self.buy_pressure.validate()?;
        self.sell_pressure.validate()?;
        validate_steps(self.steps)
    }

    /// Stable hex key of the inputs.
    ///
    /// Two input sets with equal fingerprints produce identical paths.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        // Struct field order is fixed, so the JSON bytes are canonical.
        match serde_json::to_vec(self) {
            Ok(bytes) => hasher.update(&bytes),
            Err(_) => hasher.update(format!("{:?}", self)),
        }
        let hash = hasher.finalize();
        hex::encode(&hash[..16])
    }
}
