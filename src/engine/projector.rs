//! What-if price paths under scaled demand, buy side only.

use crate::domain::{BuyPressureConfig, SaleConfig};

use super::curves::buy_flow_curve;
use super::pricing::{PoolState, Weights};

/// Demand multipliers projected when the caller does not choose any.
pub const DEFAULT_SCENARIOS: [f64; 3] = [0.5, 1.0, 1.5];

/// One price per step for each scenario multiplier.
///
/// Each scenario starts from its own copy of the initial balances; nothing
/// here touches a committed path or a live pool.
pub fn project_price_paths(
    config: &SaleConfig,
    buy: &BuyPressureConfig,
    steps: usize,
    scenarios: &[f64],
) -> Vec<Vec<f64>> {
    let safe_steps = steps.max(1);
    let flow = buy_flow_curve(safe_steps, buy);

    scenarios
        .iter()
        .map(|&multiplier| project_one(config, &flow, safe_steps, multiplier))
        .collect()
}

fn project_one(config: &SaleConfig, flow: &[f64], steps: usize, multiplier: f64) -> Vec<f64> {
    let mut pool = PoolState::from_config(config);

    (0..=steps)
        .map(|step| {
            let weights = Weights::at(config, step, steps);
            let flow_usdc = flow.get(step).copied().unwrap_or(0.0) * multiplier;
            if flow_usdc > 0.0 {
                pool.buy(weights, flow_usdc);
            }
            pool.price(weights)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_path_per_scenario() {
        let paths = project_price_paths(
            &SaleConfig::default(),
            &BuyPressureConfig::default(),
            40,
            &DEFAULT_SCENARIOS,
        );
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| p.len() == 41));
    }

    #[test]
    fn test_more_demand_means_higher_final_price() {
        let paths = project_price_paths(
            &SaleConfig::default(),
            &BuyPressureConfig::default(),
            40,
            &DEFAULT_SCENARIOS,
        );
        assert!(paths[0][40] < paths[1][40]);
        assert!(paths[1][40] < paths[2][40]);
    }

    #[test]
    fn test_zero_multiplier_is_weight_only_decay() {
        let config = SaleConfig::default();
        let paths = project_price_paths(&config, &BuyPressureConfig::default(), 20, &[0.0]);
        let expected = crate::engine::curves::static_price_path(&config, 20);
        for (got, want) in paths[0].iter().zip(expected.iter()) {
            assert_eq!(*got, want.price);
        }
    }

    #[test]
    fn test_no_scenarios_no_paths() {
        let paths = project_price_paths(&SaleConfig::default(), &BuyPressureConfig::default(), 10, &[]);
        assert!(paths.is_empty());
    }
}
