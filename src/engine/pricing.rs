//! Weighted two-asset pool math (Balancer-style).
//!
//! Every function here is pure. Callers apply balance deltas themselves.

use crate::domain::SaleConfig;

/// Spot price of asset B in units of asset A.
///
/// `(balance_a / weight_a) / (balance_b / weight_b)`. A pool with no B
/// balance or no B weight has a defined price of 0.
pub fn spot_price(balance_a: f64, weight_a: f64, balance_b: f64, weight_b: f64) -> f64 {
    if balance_b == 0.0 || weight_b == 0.0 {
        return 0.0;
    }
    let numer = balance_a / weight_a;
    let denom = balance_b / weight_b;
    numer / denom
}

/// Amount of the out-asset received for `amount_in` of the in-asset.
///
/// `balance_out * (1 - (balance_in / (balance_in + amount_in))^(weight_in / weight_out))`
///
/// Inputs must be finite and non-negative; that is not checked here.
pub fn swap_out_given_in(
    balance_in: f64,
    weight_in: f64,
    balance_out: f64,
    weight_out: f64,
    amount_in: f64,
) -> f64 {
    if amount_in == 0.0 {
        return 0.0;
    }
    let weight_ratio = weight_in / weight_out;
    let base = balance_in / (balance_in + amount_in);
    balance_out * (1.0 - base.powf(weight_ratio))
}

/// Linear interpolation of a weight at `progress` in `[0, 1]`.
pub fn interpolate(start: f64, end: f64, progress: f64) -> f64 {
    start + (end - start) * progress
}

/// Project-token and collateral weights at one point of the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub tkn: f64,
    pub usdc: f64,
}

impl Weights {
    /// Weights at `step` out of `steps` (`steps` must be >= 1).
    pub fn at(config: &SaleConfig, step: usize, steps: usize) -> Self {
        let progress = step as f64 / steps as f64;
        Self {
            tkn: interpolate(config.tkn_weight_in, config.tkn_weight_out, progress),
            usdc: interpolate(config.usdc_weight_in, config.usdc_weight_out, progress),
        }
    }
}

/// Mutable balances of the pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolState {
    pub tkn_balance: f64,
    pub usdc_balance: f64,
}

impl PoolState {
    pub fn from_config(config: &SaleConfig) -> Self {
        Self {
            tkn_balance: config.tkn_balance_in,
            usdc_balance: config.usdc_balance_in,
        }
    }

    /// Collateral per project token under `weights`.
    pub fn price(&self, weights: Weights) -> f64 {
        spot_price(self.usdc_balance, weights.usdc, self.tkn_balance, weights.tkn)
    }

    /// Swap collateral in for tokens. Returns tokens out.
    pub fn buy(&mut self, weights: Weights, amount_usdc: f64) -> f64 {
        let amount_out = swap_out_given_in(
            self.usdc_balance,
            weights.usdc,
            self.tkn_balance,
            weights.tkn,
            amount_usdc,
        );
        self.usdc_balance += amount_usdc;
        self.tkn_balance -= amount_out;
        amount_out
    }

    /// Swap tokens in for collateral. Returns collateral out.
    pub fn sell(&mut self, weights: Weights, amount_tkn: f64) -> f64 {
        let amount_out = swap_out_given_in(
            self.tkn_balance,
            weights.tkn,
            self.usdc_balance,
            weights.usdc,
            amount_tkn,
        );
        self.tkn_balance += amount_tkn;
        self.usdc_balance -= amount_out;
        amount_out
    }
}
