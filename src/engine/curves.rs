//! Buy-flow and sell-schedule curve generators.
//!
//! All curves have `steps + 1` points (one per snapshot).

use crate::domain::{BuyPressureConfig, SaleConfig, SellPreset, SellPressureConfig};

use super::pricing::{spot_price, Weights};

/// Widest Gaussian used by the loyal schedule (near-uniform selling).
const LOYAL_SIGMA_MAX: f64 = 0.25;
/// Narrowest Gaussian, before the `1/steps` floor.
const LOYAL_SIGMA_MIN: f64 = 0.03;
/// Cap on the share of the sale greedy holders are assumed to dump (preview only).
const GREEDY_PREVIEW_MAX_FRACTION: f64 = 0.35;

/// Cumulative collateral bought from sale start through each step.
///
/// Starts at exactly 0, ends at exactly `buy.end_total()`, never decreases.
pub fn cumulative_buy_curve(steps: usize, buy: &BuyPressureConfig) -> Vec<f64> {
    let safe_steps = steps.max(1);
    let end_total = buy.end_total();
    let exponent = buy.preset.exponent();

    let mut curve: Vec<f64> = (0..=safe_steps)
        .map(|i| {
            let progress = i as f64 / safe_steps as f64;
            end_total * progress.powf(exponent).clamp(0.0, 1.0)
        })
        .collect();

    curve[0] = 0.0;
    curve[safe_steps] = end_total;
    for i in 1..curve.len() {
        curve[i] = curve[i].max(curve[i - 1]);
    }

    curve
}

/// Forward difference of a cumulative curve, floored at 0. `flow[0]` is 0.
pub fn buy_flow_from_cumulative(cumulative: &[f64]) -> Vec<f64> {
    if cumulative.is_empty() {
        return Vec::new();
    }
    let mut flow = Vec::with_capacity(cumulative.len());
    flow.push(0.0);
    flow.extend(cumulative.windows(2).map(|w| (w[1] - w[0]).max(0.0)));
    flow
}

/// Per-step collateral inflow from modeled demand.
pub fn buy_flow_curve(steps: usize, buy: &BuyPressureConfig) -> Vec<f64> {
    buy_flow_from_cumulative(&cumulative_buy_curve(steps, buy))
}

/// Loyal holders' selling weight per step; sums to 1.
///
/// A uniform baseline plus a Gaussian bump at each edge. Higher
/// concentration narrows the bumps and makes them taller.
pub fn loyal_sell_schedule(steps: usize, concentration_pct: f64) -> Vec<f64> {
    let safe_steps = steps.max(1);
    let a = concentration_pct.clamp(0.0, 100.0) / 100.0;

    let sigma_min = (1.0 / safe_steps as f64).max(LOYAL_SIGMA_MIN);
    let sigma = LOYAL_SIGMA_MAX + (sigma_min - LOYAL_SIGMA_MAX) * a;
    let gauss = |t: f64| (-0.5 * (t / sigma).powi(2)).exp();

    let bump_at_edge = gauss(0.0) + gauss(1.0);
    let bump_scale = if bump_at_edge > 0.0 { 1.0 / bump_at_edge } else { 1.0 };

    let weights: Vec<f64> = (0..=safe_steps)
        .map(|i| {
            let x = i as f64 / safe_steps as f64;
            let bump = (gauss(x) + gauss(1.0 - x)) * bump_scale;
            1.0 + a * bump
        })
        .collect();

    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return vec![0.0; safe_steps + 1];
    }
    weights.into_iter().map(|w| w / total).collect()
}

/// Approximate collateral sold per step, for charting.
///
/// Loyal selling is exact in shape. Greedy selling is path-dependent, so
/// this is a rough deterministic stand-in with the same edge-heavy shape.
pub fn sell_pressure_curve(
    config: &SaleConfig,
    schedule: &[f64],
    sell: &SellPressureConfig,
) -> Vec<f64> {
    let initial_price = initial_price(config);

    let total_usdc = match sell.preset {
        SellPreset::Loyal => {
            if sell.loyal_sold_pct <= 0.0 {
                return vec![0.0; schedule.len()];
            }
            config.tkn_balance_in * (sell.loyal_sold_pct / 100.0) * initial_price
        }
        SellPreset::Greedy => {
            let spread_factor = 1.0 / (1.0 + sell.greedy_spread_pct / 10.0);
            let intensity = (sell.greedy_sell_pct / 100.0) * spread_factor;
            config.tkn_balance_in * GREEDY_PREVIEW_MAX_FRACTION * intensity * initial_price
        }
    };

    schedule.iter().map(|w| total_usdc * w).collect()
}

/// One point of the loyal "share sold so far" preview.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldPoint {
    pub time: f64,
    pub sold_pct: f64,
}

/// Cumulative percent of tokens sold by loyal holders over time.
pub fn loyal_sold_preview(duration_hours: f64, steps: usize, sell: &SellPressureConfig) -> Vec<SoldPoint> {
    let safe_steps = steps.max(1);
    let schedule = loyal_sell_schedule(safe_steps, sell.loyal_concentration_pct);
    let mut cumulative = 0.0;
    schedule
        .iter()
        .enumerate()
        .map(|(i, w)| {
            cumulative += w;
            SoldPoint {
                time: (i as f64 / safe_steps as f64) * duration_hours,
                sold_pct: cumulative * sell.loyal_sold_pct,
            }
        })
        .collect()
}

/// Weight-only price path: initial balances, no trades.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticPoint {
    pub time: f64,
    pub price: f64,
    pub tkn_weight: f64,
    pub usdc_weight: f64,
    pub market_cap: f64,
}

pub fn static_price_path(config: &SaleConfig, steps: usize) -> Vec<StaticPoint> {
    let safe_steps = steps.max(1);
    (0..=safe_steps)
        .map(|i| {
            let weights = Weights::at(config, i, safe_steps);
            let price = spot_price(
                config.usdc_balance_in,
                weights.usdc,
                config.tkn_balance_in,
                weights.tkn,
            );
            StaticPoint {
                time: (i as f64 / safe_steps as f64) * config.duration,
                price,
                tkn_weight: weights.tkn,
                usdc_weight: weights.usdc,
                market_cap: price * config.tkn_balance_in,
            }
        })
        .collect()
}

/// Display-only "fair value" anchor decaying from 0.6 towards 0.1.
pub fn fair_value_curve(steps: usize) -> Vec<f64> {
    let safe_steps = steps.max(1);
    (0..=safe_steps)
        .map(|i| {
            let progress = i as f64 / safe_steps as f64;
            0.5 * (-2.0 * progress).exp() + 0.1
        })
        .collect()
}

/// Spot price before any trade.
pub fn initial_price(config: &SaleConfig) -> f64 {
    spot_price(
        config.usdc_balance_in,
        config.usdc_weight_in,
        config.tkn_balance_in,
        config.tkn_weight_in,
    )
}

/// Every curve derived from one set of inputs, computed together.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Curves {
    pub cumulative_buy: Vec<f64>,
    pub buy_flow: Vec<f64>,
    pub sell_schedule: Vec<f64>,
    pub sell_pressure: Vec<f64>,
    pub loyal_sold_preview: Vec<SoldPoint>,
    pub static_path: Vec<StaticPoint>,
    pub fair_value: Vec<f64>,
}

impl Curves {
    pub fn compute(inputs: &crate::domain::SimulationInputs) -> Self {
        let steps = inputs.safe_steps();
        let cumulative_buy = cumulative_buy_curve(steps, &inputs.buy_pressure);
        let buy_flow = buy_flow_from_cumulative(&cumulative_buy);
        let sell_schedule =
            loyal_sell_schedule(steps, inputs.sell_pressure.loyal_concentration_pct);
        let sell_pressure = sell_pressure_curve(&inputs.config, &sell_schedule, &inputs.sell_pressure);

        Self {
            cumulative_buy,
            buy_flow,
            sell_schedule,
            sell_pressure,
            loyal_sold_preview: loyal_sold_preview(inputs.config.duration, 100, &inputs.sell_pressure),
            static_path: static_price_path(&inputs.config, steps),
            fair_value: fair_value_curve(steps),
        }
    }
}
