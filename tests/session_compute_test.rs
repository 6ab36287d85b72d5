use std::sync::Arc;
use std::time::Duration;

use lbpsim::compute::{ComputeError, MockBackend};
use lbpsim::domain::{BuyPressureUpdate, SellPressureUpdate};
use lbpsim::engine::run_simulation;
use lbpsim::orchestration::{RecomputeOutcome, Session, SessionError, SessionSettings, SessionUpdate};

fn settings(steps: usize, timeout: Duration) -> SessionSettings {
    SessionSettings {
        steps,
        compute_timeout: timeout,
        ..SessionSettings::default()
    }
}

fn multiplier_update(multiplier: f64) -> SessionUpdate {
    SessionUpdate {
        buy_pressure: Some(BuyPressureUpdate {
            multiplier: Some(multiplier),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_superseded_result_is_discarded() {
    let backend = MockBackend::new().with_delay(Duration::from_millis(100));
    let session = Session::new(settings(40, Duration::from_secs(30)), Arc::new(backend));

    let (first, second) = tokio::join!(
        session.update(multiplier_update(2.0)),
        session.update(multiplier_update(3.0)),
    );

    assert!(matches!(first.unwrap(), RecomputeOutcome::Superseded { .. }));
    assert!(matches!(second.unwrap(), RecomputeOutcome::Installed { .. }));

    let inputs = session.inputs().await;
    assert_eq!(inputs.buy_pressure.multiplier, 3.0);

    let controller = session.controller().lock().await;
    assert_eq!(controller.market().snapshots(), run_simulation(&inputs).as_slice());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_surfaces_and_playback_waits() {
    let backend = MockBackend::new().with_delay(Duration::from_secs(120));
    let session = Session::new(settings(40, Duration::from_secs(30)), Arc::new(backend));

    let result = session.initialize().await;
    assert!(matches!(
        result,
        Err(SessionError::Compute(ComputeError::Timeout(_)))
    ));

    let mut controller = session.controller().lock().await;
    assert_eq!(
        controller.advance_one_step(),
        lbpsim::playback::TickOutcome::Waiting
    );
}

#[tokio::test]
async fn test_failed_compute_is_retried_for_same_inputs() {
    let failing = MockBackend::new().with_failure("worker crashed");
    let session = Session::new(settings(20, Duration::from_secs(5)), Arc::new(failing.clone()));

    assert!(session.initialize().await.is_err());
    let calls = failing.calls();
    // Nothing installed, so identical inputs still trigger a run.
    assert!(session.initialize().await.is_err());
    assert!(failing.calls() > calls);
}

#[tokio::test]
async fn test_installed_inputs_are_not_recomputed() {
    let backend = MockBackend::new();
    let session = Session::new(settings(20, Duration::from_secs(5)), Arc::new(backend.clone()));

    session.initialize().await.unwrap();
    session.update(multiplier_update(2.0)).await.unwrap();
    let calls = backend.calls();

    let outcome = session.update(multiplier_update(2.0)).await.unwrap();
    assert_eq!(outcome, RecomputeOutcome::Unchanged);
    assert_eq!(backend.calls(), calls);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_to_different_fields_compose() {
    for _ in 0..100 {
        let session = Arc::new(Session::new(
            settings(10, Duration::from_secs(5)),
            Arc::new(MockBackend::new()),
        ));

        let buy = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.update(multiplier_update(2.0)).await })
        };
        let sell = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session
                    .update(SessionUpdate {
                        sell_pressure: Some(SellPressureUpdate {
                            loyal_sold_pct: Some(30.0),
                            ..Default::default()
                        }),
                        ..Default::default()
                    })
                    .await
            })
        };
        buy.await.unwrap().unwrap();
        sell.await.unwrap().unwrap();

        let inputs = session.inputs().await;
        assert_eq!(inputs.buy_pressure.multiplier, 2.0);
        assert_eq!(inputs.sell_pressure.loyal_sold_pct, 30.0);
    }
}
