use lbpsim::domain::{LimitStatus, SimulationInputs, TwapStatus};
use lbpsim::engine::{run_simulation, OrderError, OrderEvent, TwapParams};
use lbpsim::playback::{PlaybackController, TickOutcome};

fn controller(steps: usize, balance: f64) -> PlaybackController {
    let inputs = SimulationInputs::with_steps(steps);
    let mut controller = PlaybackController::new(inputs.config.clone(), steps, balance);
    controller.install_snapshots(run_simulation(&inputs));
    controller
}

fn play_to_end(controller: &mut PlaybackController) -> Vec<OrderEvent> {
    let mut all = Vec::new();
    loop {
        match controller.advance_one_step() {
            TickOutcome::Advanced { events, .. } => all.extend(events),
            TickOutcome::Ended | TickOutcome::Waiting => break,
        }
    }
    all
}

#[test]
fn test_twap_four_parts_completes() {
    let mut controller = controller(300, 10_000.0);
    let id = controller
        .create_twap_order(TwapParams {
            total_collateral: 4_000.0,
            num_parts: 4,
            total_duration_hours: 24.0,
            price_protection_pct: 1_000.0,
        })
        .unwrap();

    let events = play_to_end(&mut controller);
    let executed = events
        .iter()
        .filter(|e| matches!(e, OrderEvent::TwapPartExecuted { id: eid, .. } if *eid == id))
        .count();
    assert_eq!(executed, 4);

    let order = &controller.orders().twap_orders()[0];
    assert_eq!(order.status, TwapStatus::Completed);
    assert_eq!(order.parts_executed, 4);
    assert_eq!(order.remaining_collateral, 0.0);
    assert!(order.completed_at.is_some());

    let wallet = controller.market().wallet();
    assert!((wallet.collateral - 6_000.0).abs() < 1e-9);
    assert!(wallet.tokens > 0.0);
}

#[test]
fn test_twap_parts_are_spaced() {
    let mut controller = controller(300, 10_000.0);
    controller
        .create_twap_order(TwapParams {
            total_collateral: 1_000.0,
            num_parts: 4,
            total_duration_hours: 24.0,
            price_protection_pct: 1_000.0,
        })
        .unwrap();

    let steps: Vec<usize> = play_to_end(&mut controller)
        .into_iter()
        .filter_map(|e| match e {
            OrderEvent::TwapPartExecuted { step, .. } => Some(step),
            _ => None,
        })
        .collect();
    // 24h of 72h over 300 steps = 100 steps, 25 per part.
    assert_eq!(steps, vec![25, 50, 75, 100]);
}

#[test]
fn test_limit_order_fills_exactly_once() {
    let mut controller = controller(100, 10_000.0);
    let trigger = controller.market().snapshots()[30].price;
    let id = controller.create_limit_order(trigger, 1_000.0).unwrap();

    let events = play_to_end(&mut controller);
    let fills: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            OrderEvent::LimitFilled { id: eid, step, .. } if *eid == id => Some(*step),
            _ => None,
        })
        .collect();
    assert_eq!(fills.len(), 1);

    let order = &controller.orders().limit_orders()[0];
    assert_eq!(order.status, LimitStatus::Filled);
    assert_eq!(order.filled_step, Some(fills[0]));
    assert!(fills[0] <= 30);
    for snapshot in &controller.market().snapshots()[1..fills[0]] {
        assert!(snapshot.price > trigger, "missed trigger at step {}", snapshot.index);
    }
}

#[test]
fn test_limit_order_above_balance_refused() {
    let mut controller = controller(10, 500.0);
    let result = controller.create_limit_order(1.0, 1_000.0);
    assert!(matches!(result, Err(OrderError::InsufficientFunds { .. })));
    assert!(controller.orders().limit_orders().is_empty());
}

#[test]
fn test_earlier_fill_reduces_later_spend() {
    let mut controller = controller(50, 1_000.0);
    let high = controller.market().snapshots()[0].price * 10.0;
    controller.create_limit_order(high, 800.0).unwrap();
    controller.create_limit_order(high, 800.0).unwrap();

    controller.advance_one_step();
    let statuses: Vec<LimitStatus> = controller
        .orders()
        .limit_orders()
        .iter()
        .map(|o| o.status)
        .collect();
    assert_eq!(statuses, vec![LimitStatus::Filled, LimitStatus::Open]);
    assert!((controller.market().wallet().collateral - 200.0).abs() < 1e-9);
}

#[test]
fn test_user_swap_changes_only_current_step() {
    let mut controller = controller(50, 10_000.0);
    controller.set_step_pointer(10);
    let before: Vec<f64> = controller.market().snapshots().iter().map(|s| s.price).collect();
    let version = controller.market().version();

    controller.process_buy(5_000.0).unwrap();

    let after: Vec<f64> = controller.market().snapshots().iter().map(|s| s.price).collect();
    for (i, (a, b)) in before.iter().zip(after.iter()).enumerate() {
        if i == 10 {
            assert!(b > a);
        } else {
            assert_eq!(a, b);
        }
    }
    assert!(controller.market().version() > version);
}

#[test]
fn test_cancelled_order_never_executes() {
    let mut controller = controller(50, 10_000.0);
    let twap = controller
        .create_twap_order(TwapParams {
            total_collateral: 1_000.0,
            num_parts: 2,
            total_duration_hours: 10.0,
            price_protection_pct: 1_000.0,
        })
        .unwrap();
    assert!(controller.cancel_twap_order(twap));
    assert!(!controller.cancel_twap_order(twap));

    let events = play_to_end(&mut controller);
    assert!(events.is_empty());
    assert_eq!(controller.market().wallet().collateral, 10_000.0);
}
