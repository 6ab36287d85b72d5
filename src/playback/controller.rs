//! Step-by-step playback over a committed path.

use serde::Serialize;

use crate::domain::{LimitOrder, OrderId, SaleConfig, Snapshot, SwapRecord, TwapOrder};
use crate::engine::{
    Execution, OrderBook, OrderError, OrderEvent, PoolState, TimelineContext, TwapParams, Weights,
};

use super::market::{LiveMarket, Wallet};

/// Playback speed floor.
pub const MIN_SPEED: f64 = 0.1;
/// Playback speed ceiling.
pub const MAX_SPEED: f64 = 100.0;

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum TickOutcome {
    /// No path installed yet.
    Waiting,
    /// Already at the last step; playback paused.
    Ended,
    #[serde(rename_all = "camelCase")]
    Advanced {
        step: usize,
        price: f64,
        events: Vec<OrderEvent>,
        /// The reached step is the last one.
        reached_end: bool,
    },
}

/// Read-only view of the controller for the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSummary {
    pub current_step: usize,
    pub last_step: Option<usize>,
    pub total_steps: usize,
    pub playing: bool,
    pub speed: f64,
    pub version: u64,
    pub current: Option<Snapshot>,
    pub market_cap: Option<f64>,
    pub wallet: Wallet,
    pub limit_orders: Vec<LimitOrder>,
    pub twap_orders: Vec<TwapOrder>,
    pub swaps: Vec<SwapRecord>,
}

#[derive(Debug, Clone)]
pub struct PlaybackController {
    sale: SaleConfig,
    total_steps: usize,
    starting_balance: f64,
    market: LiveMarket,
    orders: OrderBook,
    speed: f64,
    playing: bool,
}

impl PlaybackController {
    pub fn new(sale: SaleConfig, total_steps: usize, starting_balance: f64) -> Self {
        Self {
            sale,
            total_steps: total_steps.max(1),
            starting_balance,
            market: LiveMarket::new(starting_balance),
            orders: OrderBook::new(),
            speed: 1.0,
            playing: false,
        }
    }

    pub fn market(&self) -> &LiveMarket {
        &self.market
    }

    pub fn orders(&self) -> &OrderBook {
        &self.orders
    }

    pub fn current_step(&self) -> usize {
        self.market.current_step()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn install_snapshots(&mut self, snapshots: Vec<Snapshot>) {
        tracing::info!(len = snapshots.len(), "simulation path installed");
        self.market.install(snapshots);
    }

    /// Switch to a new sale; the path must be recomputed. Orders and the wallet stay.
    pub fn reset_timeline(&mut self, sale: SaleConfig, total_steps: usize) {
        self.sale = sale;
        self.total_steps = total_steps.max(1);
        self.market.clear_timeline();
    }

    /// Back to a fresh session: no path, no orders, full wallet, paused.
    pub fn reset(&mut self, sale: SaleConfig, total_steps: usize) {
        self.reset_timeline(sale, total_steps);
        self.orders.clear();
        self.market.reset_wallet(self.starting_balance);
        self.playing = false;
        self.speed = 1.0;
    }

    /// Advance exactly one step and evaluate every open order once.
    pub fn advance_one_step(&mut self) -> TickOutcome {
        let Some(last_step) = self.market.last_step() else {
            return TickOutcome::Waiting;
        };
        if self.market.current_step() >= last_step {
            if self.playing {
                tracing::info!(step = last_step, "playback reached end");
            }
            self.playing = false;
            return TickOutcome::Ended;
        }
        let Some(snapshot) = self.market.advance() else {
            return TickOutcome::Ended;
        };

        let step = snapshot.index;
        let events = self
            .orders
            .evaluate(step, snapshot.price, last_step, &mut self.market);

        let reached_end = step >= last_step;
        if reached_end {
            self.playing = false;
        }
        tracing::debug!(step, price = snapshot.price, events = events.len(), "tick");

        TickOutcome::Advanced {
            step,
            price: snapshot.price,
            events,
            reached_end,
        }
    }

    /// Returns the effective speed.
    pub fn set_speed(&mut self, speed: f64) -> f64 {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        self.speed
    }

    /// Returns whether the flag changed.
    pub fn set_playing(&mut self, playing: bool) -> bool {
        let changed = self.playing != playing;
        self.playing = playing;
        changed
    }

    pub fn set_step_pointer(&mut self, step: usize) -> usize {
        self.market.set_step(step)
    }

    pub fn process_buy(&mut self, amount_usdc: f64) -> Result<Execution, OrderError> {
        self.market.user_buy(amount_usdc)
    }

    pub fn process_sell(&mut self, amount_tkn: f64) -> Result<Execution, OrderError> {
        self.market.user_sell(amount_tkn)
    }

    pub fn create_limit_order(
        &mut self,
        trigger_price: f64,
        collateral_amount: f64,
    ) -> Result<OrderId, OrderError> {
        let available = self.market.wallet().collateral;
        self.orders.create_limit_order(
            trigger_price,
            collateral_amount,
            available,
            self.market.current_step(),
        )
    }

    pub fn cancel_limit_order(&mut self, id: OrderId) -> bool {
        self.orders.cancel_limit_order(id)
    }

    pub fn create_twap_order(&mut self, params: TwapParams) -> Result<OrderId, OrderError> {
        let timeline = TimelineContext {
            current_step: self.market.current_step(),
            total_steps: self.total_steps,
            duration_hours: self.sale.duration,
            current_price: self.reference_price(),
        };
        let available = self.market.wallet().collateral;
        self.orders.create_twap_order(params, timeline, available)
    }

    pub fn cancel_twap_order(&mut self, id: OrderId) -> bool {
        self.orders.cancel_twap_order(id)
    }

    /// Current price, or the weight-only price while no path exists.
    fn reference_price(&self) -> f64 {
        match self.market.current() {
            Some(snapshot) => snapshot.price,
            None => {
                let step = self.market.current_step().min(self.total_steps);
                let weights = Weights::at(&self.sale, step, self.total_steps);
                PoolState::from_config(&self.sale).price(weights)
            }
        }
    }

    pub fn summary(&self, swap_limit: usize) -> PlaybackSummary {
        PlaybackSummary {
            current_step: self.market.current_step(),
            last_step: self.market.last_step(),
            total_steps: self.total_steps,
            playing: self.playing,
            speed: self.speed,
            version: self.market.version(),
            current: self.market.current().copied(),
            market_cap: self.market.current().map(|s| s.market_cap()),
            wallet: self.market.wallet(),
            limit_orders: self.orders.limit_orders().to_vec(),
            twap_orders: self.orders.twap_orders().to_vec(),
            swaps: self.market.swaps().recent(swap_limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LimitStatus, SimulationInputs};
    use crate::engine::run_simulation;

    fn controller(steps: usize) -> PlaybackController {
        let inputs = SimulationInputs::with_steps(steps);
        let mut controller = PlaybackController::new(inputs.config.clone(), steps, 10_000.0);
        controller.install_snapshots(run_simulation(&inputs));
        controller
    }

    #[test]
    fn test_tick_without_path_waits() {
        let mut controller = PlaybackController::new(SaleConfig::default(), 10, 10_000.0);
        assert_eq!(controller.advance_one_step(), TickOutcome::Waiting);
        assert_eq!(controller.current_step(), 0);
    }

    #[test]
    fn test_tick_advances_one_step() {
        let mut controller = controller(10);
        match controller.advance_one_step() {
            TickOutcome::Advanced { step, reached_end, .. } => {
                assert_eq!(step, 1);
                assert!(!reached_end);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(controller.current_step(), 1);
    }

    #[test]
    fn test_tick_auto_pauses_at_end() {
        let mut controller = controller(3);
        controller.set_playing(true);
        for _ in 0..3 {
            controller.advance_one_step();
        }
        assert!(!controller.is_playing());
        assert_eq!(controller.current_step(), 3);
        assert_eq!(controller.advance_one_step(), TickOutcome::Ended);
        assert_eq!(controller.current_step(), 3);
    }

    #[test]
    fn test_speed_floor() {
        let mut controller = controller(3);
        assert_eq!(controller.set_speed(0.0), MIN_SPEED);
        assert_eq!(controller.set_speed(4.0), 4.0);
        assert_eq!(controller.set_speed(1e12), MAX_SPEED);
    }

    #[test]
    fn test_set_playing_idempotent() {
        let mut controller = controller(3);
        assert!(controller.set_playing(true));
        assert!(!controller.set_playing(true));
        assert!(controller.set_playing(false));
    }

    #[test]
    fn test_limit_order_fills_once_on_trigger() {
        let mut controller = controller(50);
        // Price decays over the sale; a trigger at the step-10 price must fill.
        let trigger = controller.market().snapshots()[10].price;
        let id = controller.create_limit_order(trigger, 500.0).unwrap();

        let mut filled_at = None;
        for _ in 0..50 {
            if let TickOutcome::Advanced { step, events, .. } = controller.advance_one_step() {
                let fills = events
                    .iter()
                    .filter(|e| matches!(e, OrderEvent::LimitFilled { id: fid, .. } if *fid == id))
                    .count();
                assert!(fills <= 1);
                if fills == 1 {
                    assert!(filled_at.is_none());
                    filled_at = Some(step);
                }
            }
        }

        let order = &controller.orders().limit_orders()[0];
        assert_eq!(order.status, LimitStatus::Filled);
        assert_eq!(order.filled_step, filled_at);
        assert!(filled_at.unwrap() <= 10);
        assert_eq!(controller.market().wallet().collateral, 9_500.0);
    }

    #[test]
    fn test_reset_timeline_keeps_orders_and_wallet() {
        let mut controller = controller(20);
        controller.advance_one_step();
        controller.process_buy(100.0).unwrap();
        controller.create_limit_order(0.0001, 100.0).unwrap();

        controller.reset_timeline(SaleConfig::default(), 20);
        assert!(!controller.market().has_path());
        assert_eq!(controller.current_step(), 0);
        assert!(controller.market().swaps().is_empty());
        assert_eq!(controller.orders().limit_orders().len(), 1);
        assert_eq!(controller.market().wallet().collateral, 9_900.0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut controller = controller(20);
        controller.set_playing(true);
        controller.process_buy(100.0).unwrap();
        controller.create_limit_order(0.0001, 100.0).unwrap();

        controller.reset(SaleConfig::default(), 20);
        assert!(!controller.is_playing());
        assert_eq!(controller.orders().open_count(), 0);
        assert_eq!(controller.market().wallet(), Wallet::new(10_000.0));
    }

    #[test]
    fn test_twap_reference_price_without_path() {
        let mut controller = PlaybackController::new(SaleConfig::default(), 300, 10_000.0);
        controller
            .create_twap_order(TwapParams {
                total_collateral: 1000.0,
                num_parts: 4,
                total_duration_hours: 24.0,
                price_protection_pct: 5.0,
            })
            .unwrap();
        let order = &controller.orders().twap_orders()[0];
        // 72h over 300 steps: 24h => 100 steps, 25 per part.
        assert_eq!(order.part_duration_steps, 25);
        assert!(order.reference_price > 0.0);
    }
}
