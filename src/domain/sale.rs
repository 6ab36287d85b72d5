//! Sale configuration: the immutable per-run pool parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Immutable parameters of one LBP run.
///
/// Weights are percentages. `tkn_balance_in` is always
/// `total_supply * percent_for_sale / 100`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleConfig {
    pub token_name: String,
    pub token_symbol: String,
    pub total_supply: f64,
    pub percent_for_sale: f64,
    pub collateral_token: String,

    pub tkn_balance_in: f64,
    pub tkn_weight_in: f64,
    pub usdc_balance_in: f64,
    pub usdc_weight_in: f64,
    pub tkn_weight_out: f64,
    pub usdc_weight_out: f64,
    /// Hours before trading opens. Informational only.
    pub start_delay: f64,
    /// Sale duration in hours.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_fee: Option<f64>,
    pub creator_fee: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaleConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error("{0} weights must sum to 100, got {1}")]
    WeightSum(&'static str, f64),
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            token_name: "Balancer".to_string(),
            token_symbol: "BAL".to_string(),
            total_supply: 100_000_000.0,
            percent_for_sale: 50.0,
            collateral_token: "USDC".to_string(),
            tkn_balance_in: 50_000_000.0,
            tkn_weight_in: 90.0,
            usdc_balance_in: 1_000_000.0,
            usdc_weight_in: 10.0,
            tkn_weight_out: 10.0,
            usdc_weight_out: 90.0,
            start_delay: 0.0,
            duration: 72.0,
            swap_fee: Some(1.0),
            creator_fee: 5.0,
        }
    }
}

impl SaleConfig {
    /// Check every field the engine relies on.
    ///
    /// The engine itself assumes validated input; this is the only gate.
    pub fn validate(&self) -> Result<(), SaleConfigError> {
        positive_finite("totalSupply", self.total_supply)?;
        positive_finite("usdcBalanceIn", self.usdc_balance_in)?;
        positive_finite("duration", self.duration)?;

        if !(self.percent_for_sale > 0.0 && self.percent_for_sale <= 100.0) {
            return Err(SaleConfigError::InvalidValue(
                "percentForSale",
                format!("must be in (0, 100], got {}", self.percent_for_sale),
            ));
        }

        let expected = self.total_supply * (self.percent_for_sale / 100.0);
        if (self.tkn_balance_in - expected).abs() > expected * 1e-12 {
            return Err(SaleConfigError::InvalidValue(
                "tknBalanceIn",
                format!("must equal totalSupply * percentForSale / 100 ({})", expected),
            ));
        }

        for (name, value) in [
            ("tknWeightIn", self.tkn_weight_in),
            ("usdcWeightIn", self.usdc_weight_in),
            ("tknWeightOut", self.tkn_weight_out),
            ("usdcWeightOut", self.usdc_weight_out),
        ] {
            if !(value.is_finite() && value > 0.0 && value < 100.0) {
                return Err(SaleConfigError::InvalidValue(
                    name,
                    format!("must be in (0, 100), got {}", value),
                ));
            }
        }

        let start_sum = self.tkn_weight_in + self.usdc_weight_in;
        if (start_sum - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(SaleConfigError::WeightSum("Initial", start_sum));
        }
        let end_sum = self.tkn_weight_out + self.usdc_weight_out;
        if (end_sum - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(SaleConfigError::WeightSum("Final", end_sum));
        }

        if !(self.start_delay.is_finite() && self.start_delay >= 0.0) {
            return Err(SaleConfigError::InvalidValue(
                "startDelay",
                format!("must be >= 0, got {}", self.start_delay),
            ));
        }
        percent("creatorFee", self.creator_fee)?;
        if let Some(fee) = self.swap_fee {
            percent("swapFee", fee)?;
        }

        Ok(())
    }

    /// Merge a partial update into a copy of this config and validate it.
    ///
    /// Changing supply or percent-for-sale recomputes `tkn_balance_in`.
    pub fn apply(&self, update: &SaleConfigUpdate) -> Result<SaleConfig, SaleConfigError> {
        let mut next = self.clone();

        if let Some(v) = &update.token_name {
            next.token_name = v.clone();
        }
        if let Some(v) = &update.token_symbol {
            next.token_symbol = v.clone();
        }
        if let Some(v) = &update.collateral_token {
            next.collateral_token = v.clone();
        }
        if let Some(v) = update.total_supply {
            next.total_supply = v;
        }
        if let Some(v) = update.percent_for_sale {
            next.percent_for_sale = v;
        }
        if update.total_supply.is_some() || update.percent_for_sale.is_some() {
            next.tkn_balance_in = next.total_supply * (next.percent_for_sale / 100.0);
        }
        if let Some(v) = update.tkn_weight_in {
            next.tkn_weight_in = v;
        }
        if let Some(v) = update.usdc_balance_in {
            next.usdc_balance_in = v;
        }
        if let Some(v) = update.usdc_weight_in {
            next.usdc_weight_in = v;
        }
        if let Some(v) = update.tkn_weight_out {
            next.tkn_weight_out = v;
        }
        if let Some(v) = update.usdc_weight_out {
            next.usdc_weight_out = v;
        }
        if let Some(v) = update.start_delay {
            next.start_delay = v;
        }
        if let Some(v) = update.duration {
            next.duration = v;
        }
        if let Some(v) = update.swap_fee {
            next.swap_fee = Some(v);
        }
        if let Some(v) = update.creator_fee {
            next.creator_fee = v;
        }

        next.validate()?;
        Ok(next)
    }
}

/// Partial update for [`SaleConfig`]; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleConfigUpdate {
    pub token_name: Option<String>,
    pub token_symbol: Option<String>,
    pub total_supply: Option<f64>,
    pub percent_for_sale: Option<f64>,
    pub collateral_token: Option<String>,
    pub tkn_weight_in: Option<f64>,
    pub usdc_balance_in: Option<f64>,
    pub usdc_weight_in: Option<f64>,
    pub tkn_weight_out: Option<f64>,
    pub usdc_weight_out: Option<f64>,
    pub start_delay: Option<f64>,
    pub duration: Option<f64>,
    pub swap_fee: Option<f64>,
    pub creator_fee: Option<f64>,
}

fn positive_finite(name: &'static str, value: f64) -> Result<(), SaleConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SaleConfigError::InvalidValue(
            name,
            format!("must be a positive number, got {}", value),
        ))
    }
}

fn percent(name: &'static str, value: f64) -> Result<(), SaleConfigError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(SaleConfigError::InvalidValue(
            name,
            format!("must be in [0, 100], got {}", value),
        ))
    }
}
