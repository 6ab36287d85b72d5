use lbpsim::domain::{
    BuyPressureConfig, BuyPreset, MagnitudeBase, SaleConfig, SellPressureConfig, SimulationInputs,
};
use lbpsim::engine::curves::{buy_flow_from_cumulative, initial_price};
use lbpsim::engine::{
    cumulative_buy_curve, loyal_sell_schedule, project_price_paths, run_simulation,
    swap_out_given_in,
};

fn buy_configs() -> Vec<BuyPressureConfig> {
    let mut configs = Vec::new();
    for preset in [BuyPreset::Bullish, BuyPreset::Bearish] {
        for magnitude_base in [
            MagnitudeBase::TenThousand,
            MagnitudeBase::HundredThousand,
            MagnitudeBase::OneMillion,
        ] {
            for multiplier in [0.0, 0.5, 1.0, 7.0] {
                configs.push(BuyPressureConfig {
                    preset,
                    magnitude_base,
                    multiplier,
                });
            }
        }
    }
    configs
}

#[test]
fn test_first_snapshot_is_initial_spot_price() {
    let inputs = SimulationInputs::with_steps(300);
    let snapshots = run_simulation(&inputs);
    assert_eq!(snapshots[0].price, initial_price(&inputs.config));
    assert_eq!(snapshots[0].tkn_balance, inputs.config.tkn_balance_in);
    assert_eq!(snapshots[0].usdc_balance, inputs.config.usdc_balance_in);
}

#[test]
fn test_cumulative_buy_curve_monotone_with_exact_end() {
    for steps in [1, 2, 17, 300] {
        for buy in buy_configs() {
            let curve = cumulative_buy_curve(steps, &buy);
            assert_eq!(curve.len(), steps + 1);
            assert_eq!(curve[0], 0.0);
            assert_eq!(curve[steps], buy.end_total(), "{:?} steps={}", buy, steps);
            for pair in curve.windows(2) {
                assert!(pair[1] >= pair[0], "{:?} not monotone", buy);
            }
        }
    }
}

#[test]
fn test_buy_flow_non_negative_and_sums_to_cumulative() {
    for buy in buy_configs() {
        let cumulative = cumulative_buy_curve(300, &buy);
        let flow = buy_flow_from_cumulative(&cumulative);
        assert_eq!(flow[0], 0.0);

        let mut running = 0.0;
        for (i, f) in flow.iter().enumerate() {
            assert!(*f >= 0.0);
            running += f;
            let tolerance = 1e-9 * cumulative[i].abs().max(1.0);
            assert!(
                (running - cumulative[i]).abs() <= tolerance,
                "step {}: {} vs {}",
                i,
                running,
                cumulative[i]
            );
        }
    }
}

#[test]
fn test_loyal_schedule_sums_to_one() {
    for steps in [1, 3, 50, 300] {
        for concentration in (0..=100).step_by(5) {
            let schedule = loyal_sell_schedule(steps, concentration as f64);
            assert_eq!(schedule.len(), steps + 1);
            let sum: f64 = schedule.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "steps={} c={} sum={}", steps, concentration, sum);
            assert!(schedule.iter().all(|w| *w >= 0.0));
        }
    }
}

#[test]
fn test_swap_out_monotone_in_amount() {
    assert_eq!(swap_out_given_in(1_000_000.0, 10.0, 50_000_000.0, 90.0, 0.0), 0.0);
    let mut previous = 0.0;
    for amount in [1.0, 10.0, 1_000.0, 50_000.0, 1_000_000.0, 1e9] {
        let out = swap_out_given_in(1_000_000.0, 10.0, 50_000_000.0, 90.0, amount);
        assert!(out > previous);
        assert!(out < 50_000_000.0);
        previous = out;
    }
}

#[test]
fn test_projector_matches_runner_without_sells() {
    let inputs = SimulationInputs::new(
        SaleConfig::default(),
        BuyPressureConfig::default(),
        SellPressureConfig::disabled(),
        300,
    );
    let runner_prices: Vec<f64> = run_simulation(&inputs).iter().map(|s| s.price).collect();
    let paths = project_price_paths(&inputs.config, &inputs.buy_pressure, 300, &[1.0]);

    assert_eq!(paths[0].len(), runner_prices.len());
    for (i, (projected, simulated)) in paths[0].iter().zip(runner_prices.iter()).enumerate() {
        assert!(
            (projected - simulated).abs() <= 1e-12 * simulated.abs(),
            "step {}: {} vs {}",
            i,
            projected,
            simulated
        );
    }
}

#[test]
fn test_weight_shift_alone_strictly_lowers_price() {
    let inputs = SimulationInputs::new(
        SaleConfig::default(),
        BuyPressureConfig::disabled(),
        SellPressureConfig::disabled(),
        300,
    );
    assert_eq!(inputs.config.tkn_weight_in, 90.0);
    assert_eq!(inputs.config.tkn_weight_out, 10.0);
    assert_eq!(inputs.config.duration, 72.0);

    let snapshots = run_simulation(&inputs);
    assert_eq!(snapshots.len(), 301);
    for pair in snapshots.windows(2) {
        assert!(pair[1].price < pair[0].price, "step {}", pair[1].index);
    }
}

#[test]
fn test_community_never_holds_negative_tokens() {
    for sell in [
        SellPressureConfig::default(),
        SellPressureConfig {
            preset: lbpsim::domain::SellPreset::Greedy,
            greedy_spread_pct: 0.0,
            greedy_sell_pct: 100.0,
            ..SellPressureConfig::default()
        },
    ] {
        let inputs = SimulationInputs::new(
            SaleConfig::default(),
            BuyPressureConfig::default(),
            sell,
            200,
        );
        for snapshot in run_simulation(&inputs) {
            assert!(snapshot.community_tokens_held >= 0.0);
            if snapshot.community_tokens_held == 0.0 {
                assert_eq!(snapshot.community_avg_cost, 0.0);
            }
            assert!(snapshot.price.is_finite());
        }
    }
}

#[test]
fn test_simulation_is_deterministic() {
    let inputs = SimulationInputs::with_steps(120);
    assert_eq!(run_simulation(&inputs), run_simulation(&inputs));
    assert_eq!(inputs.fingerprint(), inputs.clone().fingerprint());
}
