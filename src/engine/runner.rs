//! Deterministic whole-timeline simulation with modeled buy and sell pressure.

use crate::domain::{SellPreset, SellPressureConfig, SimulationInputs, Snapshot};

use super::curves::{buy_flow_curve, loyal_sell_schedule};
use super::pricing::{PoolState, Weights};

/// Sells smaller than this many tokens are skipped.
pub const MIN_SELL_TOKENS: f64 = 1.0;
/// Loyal sell fraction bounds, per step, as a share of holdings.
pub const LOYAL_MIN_FRACTION: f64 = 0.001;
pub const LOYAL_MAX_FRACTION: f64 = 0.10;
/// Loyal sells may exceed the scheduled per-step target by this factor.
pub const LOYAL_TARGET_CAP: f64 = 5.0;
/// Greedy holders above this share of the sale keep leaking tokens.
pub const GREEDY_LEAK_THRESHOLD: f64 = 0.02;
pub const GREEDY_LEAK_MAX_FRACTION: f64 = 0.05;

/// Tokens held by the modeled community and their average cost.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CommunityPosition {
    pub tokens_held: f64,
    /// Weighted-average collateral paid per token (0 when flat).
    pub avg_cost: f64,
}

impl CommunityPosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.tokens_held <= 0.0
    }

    /// Fold a purchase into the weighted-average cost basis.
    pub fn record_buy(&mut self, amount_usdc: f64, amount_tkn: f64) {
        if amount_tkn <= 0.0 {
            return;
        }
        let price_paid = amount_usdc / amount_tkn;
        let new_tokens = self.tokens_held + amount_tkn;
        if new_tokens > 0.0 {
            self.avg_cost = (self.avg_cost * self.tokens_held + price_paid * amount_tkn) / new_tokens;
        }
        self.tokens_held = new_tokens;
    }

    /// Reduce holdings; average cost is unchanged unless the position closes.
    pub fn record_sell(&mut self, amount_tkn: f64) {
        self.tokens_held = (self.tokens_held - amount_tkn).max(0.0);
        if self.tokens_held == 0.0 {
            self.avg_cost = 0.0;
        }
    }
}

/// Steps a pool through the timeline, emitting one snapshot per step.
pub struct SimulationRunner<'a> {
    inputs: &'a SimulationInputs,
    steps: usize,
    pool: PoolState,
    community: CommunityPosition,
    buy_flow: Vec<f64>,
    loyal_schedule: Vec<f64>,

    snapshots: Vec<Snapshot>,
}

impl<'a> SimulationRunner<'a> {
    pub fn new(inputs: &'a SimulationInputs) -> Self {
        let steps = inputs.safe_steps();
        Self {
            inputs,
            steps,
            pool: PoolState::from_config(&inputs.config),
            community: CommunityPosition::new(),
            buy_flow: buy_flow_curve(steps, &inputs.buy_pressure),
            loyal_schedule: loyal_sell_schedule(steps, inputs.sell_pressure.loyal_concentration_pct),
            snapshots: Vec::with_capacity(steps + 1),
        }
    }

    /// Run every step and return the committed path (`steps + 1` snapshots).
    pub fn run(mut self) -> Vec<Snapshot> {
        for step in 0..=self.steps {
            self.process_step(step);
        }
        self.snapshots
    }

    fn process_step(&mut self, step: usize) {
        let inputs: &'a SimulationInputs = self.inputs;
        let config = &inputs.config;
        let progress = step as f64 / self.steps as f64;
        let weights = Weights::at(config, step, self.steps);

        let mut buy_usdc = 0.0;
        let mut buy_tkn = 0.0;

        let flow = self.buy_flow.get(step).copied().unwrap_or(0.0);
        if flow > 0.0 {
            let amount_out = self.pool.buy(weights, flow);
            if amount_out > 0.0 {
                self.community.record_buy(flow, amount_out);
                buy_usdc += flow;
                buy_tkn += amount_out;
            }
        }

        let mut price = self.pool.price(weights);

        let sell_tkn = self.sell_amount(step, price);
        let mut sell_usdc = 0.0;
        if sell_tkn > 0.0 {
            sell_usdc = self.pool.sell(weights, sell_tkn);
            self.community.record_sell(sell_tkn);
            price = self.pool.price(weights);
        }

        self.snapshots.push(Snapshot {
            index: step,
            time: progress * config.duration,
            price,
            tkn_balance: self.pool.tkn_balance,
            usdc_balance: self.pool.usdc_balance,
            tkn_weight: weights.tkn,
            usdc_weight: weights.usdc,
            community_tokens_held: self.community.tokens_held,
            community_avg_cost: self.community.avg_cost,
            buy_volume_usdc: buy_usdc,
            buy_volume_tkn: buy_tkn,
            sell_volume_usdc: sell_usdc,
            sell_volume_tkn: sell_tkn,
        });
    }

    /// Tokens the community sells this step (0 when nothing qualifies).
    fn sell_amount(&self, step: usize, price: f64) -> f64 {
        if self.community.is_flat() {
            return 0.0;
        }
        let sell = &self.inputs.sell_pressure;
        let amount = match sell.preset {
            SellPreset::Loyal => self.loyal_amount(step, sell),
            SellPreset::Greedy => self.greedy_amount(price, sell),
        };
        if amount >= MIN_SELL_TOKENS {
            amount
        } else {
            0.0
        }
    }

    fn loyal_amount(&self, step: usize, sell: &SellPressureConfig) -> f64 {
        let weight = self.loyal_schedule.get(step).copied().unwrap_or(0.0);
        if weight <= 0.0 || sell.loyal_sold_pct <= 0.0 {
            return 0.0;
        }
        let total_target = self.inputs.config.tkn_balance_in * (sell.loyal_sold_pct / 100.0);
        let step_target = total_target * weight;

        // Edge-heavy schedule weights translate into more aggressive steps.
        let fraction = (weight * 100.0).clamp(LOYAL_MIN_FRACTION, LOYAL_MAX_FRACTION);
        (self.community.tokens_held * fraction).min(step_target * LOYAL_TARGET_CAP)
    }

    fn greedy_amount(&self, price: f64, sell: &SellPressureConfig) -> f64 {
        let held = self.community.tokens_held;
        let avg_cost = self.community.avg_cost;

        let mut fraction = 0.0;
        if avg_cost > 0.0 {
            let threshold = avg_cost * (1.0 + sell.greedy_spread_pct / 100.0);
            if price >= threshold {
                fraction = (sell.greedy_sell_pct / 100.0).min(1.0);
            }
        }
        if fraction == 0.0 && held > self.inputs.config.tkn_balance_in * GREEDY_LEAK_THRESHOLD {
            fraction = (sell.greedy_sell_pct / 100.0).min(GREEDY_LEAK_MAX_FRACTION);
        }

        held * fraction
    }
}

/// Run the canonical path for `inputs`.
pub fn run_simulation(inputs: &SimulationInputs) -> Vec<Snapshot> {
    let snapshots = SimulationRunner::new(inputs).run();
    tracing::debug!(
        steps = inputs.safe_steps(),
        final_price = snapshots.last().map(|s| s.price).unwrap_or_default(),
        "simulation path computed"
    );
    snapshots
}
