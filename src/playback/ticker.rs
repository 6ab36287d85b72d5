//! Background ticker driving a shared [`PlaybackController`].

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::controller::{PlaybackController, TickOutcome, MAX_SPEED, MIN_SPEED};

/// Shortest tick period, whatever the speed.
const MIN_PERIOD: Duration = Duration::from_millis(1);

pub type SharedController = Arc<Mutex<PlaybackController>>;

/// Owns at most one ticking task for a controller.
#[derive(Debug)]
pub struct Player {
    controller: SharedController,
    base_interval: Duration,
    task: StdMutex<Option<JoinHandle<()>>>,
}

impl Player {
    pub fn new(controller: SharedController, base_interval: Duration) -> Self {
        Self {
            controller,
            base_interval,
            task: StdMutex::new(None),
        }
    }

    /// Tick period at `speed`.
    pub fn period_for(&self, speed: f64) -> Duration {
        self.base_interval
            .div_f64(speed.clamp(MIN_SPEED, MAX_SPEED))
            .max(MIN_PERIOD)
    }

    pub fn is_running(&self) -> bool {
        match self.task.lock() {
            Ok(task) => task.as_ref().map(|h| !h.is_finished()).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Start or stop playback. Starting twice keeps the running task.
    pub async fn set_playing(&self, playing: bool) {
        let speed = {
            let mut controller = self.controller.lock().await;
            controller.set_playing(playing);
            controller.speed()
        };
        if playing {
            if !self.is_running() {
                self.spawn(speed);
                tracing::info!(speed, "playback started");
            }
        } else if self.abort() {
            tracing::info!("playback paused");
        }
    }

    /// Change speed; a running ticker restarts at the new cadence.
    pub async fn set_speed(&self, speed: f64) -> f64 {
        let (speed, playing) = {
            let mut controller = self.controller.lock().await;
            let speed = controller.set_speed(speed);
            (speed, controller.is_playing())
        };
        if playing {
            self.abort();
            self.spawn(speed);
            tracing::info!(speed, "playback speed changed");
        }
        speed
    }

    /// Stop the task without touching the controller.
    pub fn stop(&self) {
        self.abort();
    }

    fn spawn(&self, speed: f64) {
        let period = self.period_for(speed);
        let controller = Arc::clone(&self.controller);
        let handle = tokio::spawn(run_ticker(controller, period));
        if let Ok(mut task) = self.task.lock() {
            if let Some(old) = task.replace(handle) {
                old.abort();
            }
        }
    }

    fn abort(&self) -> bool {
        match self.task.lock() {
            Ok(mut task) => match task.take() {
                Some(handle) => {
                    let was_running = !handle.is_finished();
                    handle.abort();
                    was_running
                }
                None => false,
            },
            Err(_) => false,
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.abort();
    }
}

async fn run_ticker(controller: SharedController, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let mut controller = controller.lock().await;
        if !controller.is_playing() {
            break;
        }
        match controller.advance_one_step() {
            TickOutcome::Waiting => continue,
            TickOutcome::Ended => break,
            TickOutcome::Advanced { reached_end, .. } => {
                if reached_end {
                    tracing::info!(step = controller.current_step(), "playback finished");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SimulationInputs;
    use crate::engine::run_simulation;

    fn shared(steps: usize) -> SharedController {
        let inputs = SimulationInputs::with_steps(steps);
        let mut controller = PlaybackController::new(inputs.config.clone(), steps, 10_000.0);
        controller.install_snapshots(run_simulation(&inputs));
        Arc::new(Mutex::new(controller))
    }

    #[test]
    fn test_period_scales_with_speed() {
        let player = Player::new(shared(3), Duration::from_millis(500));
        assert_eq!(player.period_for(1.0), Duration::from_millis(500));
        assert_eq!(player.period_for(2.0), Duration::from_millis(250));
        assert_eq!(player.period_for(0.5), Duration::from_millis(1000));
    }

    #[test]
    fn test_period_never_zero() {
        let player = Player::new(shared(3), Duration::from_millis(500));
        assert_eq!(player.period_for(1e12), Duration::from_millis(5));
        assert!(player.period_for(f64::MAX) >= MIN_PERIOD);

        let tiny = Player::new(shared(3), Duration::from_micros(10));
        assert_eq!(tiny.period_for(MAX_SPEED), MIN_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_speed_still_plays() {
        let controller = shared(20);
        let player = Player::new(Arc::clone(&controller), Duration::from_millis(100));

        assert_eq!(player.set_speed(1e12).await, MAX_SPEED);
        player.set_playing(true).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let guard = controller.lock().await;
        assert_eq!(guard.current_step(), 20);
        assert!(!guard.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_plays_to_end_and_pauses() {
        let controller = shared(5);
        let player = Player::new(Arc::clone(&controller), Duration::from_millis(100));

        player.set_playing(true).await;
        assert!(player.is_running());

        tokio::time::sleep(Duration::from_millis(2_000)).await;

        let guard = controller.lock().await;
        assert_eq!(guard.current_step(), 5);
        assert!(!guard.is_playing());
        drop(guard);
        assert!(!player.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_advancing() {
        let controller = shared(100);
        let player = Player::new(Arc::clone(&controller), Duration::from_millis(100));

        player.set_playing(true).await;
        tokio::time::sleep(Duration::from_millis(350)).await;
        player.set_playing(false).await;
        let paused_at = controller.lock().await.current_step();
        assert!(paused_at >= 1);

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(controller.lock().await.current_step(), paused_at);
        assert!(!player.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_is_idempotent() {
        let controller = shared(100);
        let player = Player::new(Arc::clone(&controller), Duration::from_millis(100));

        player.set_playing(true).await;
        player.set_playing(true).await;
        tokio::time::sleep(Duration::from_millis(550)).await;

        // One task ticking every 100ms, not two.
        let step = controller.lock().await.current_step();
        assert!(step <= 6, "advanced {} steps", step);
        player.stop();
    }
}
