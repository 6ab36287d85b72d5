//! Limit and TWAP order life cycles.
//!
//! Orders never touch pool balances directly; every execution goes through
//! an [`OrderVenue`], which applies the swap to the live pool state.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{LimitOrder, LimitStatus, OrderId, Side, TwapOrder, TwapStatus};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: f64, available: f64 },
    #[error("No simulated path available yet")]
    NoPath,
}

/// Result of one buy against the live pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub amount_in: f64,
    pub amount_out: f64,
    /// Spot price after the swap.
    pub price: f64,
}

/// Where orders execute: the user's wallet plus the live pool.
pub trait OrderVenue {
    /// Collateral currently available to the order owner.
    fn collateral_balance(&self) -> f64;

    /// Swap `amount_usdc` of collateral for tokens at the current step.
    ///
    /// Must refuse without side effects if the balance does not cover it.
    fn execute_buy(&mut self, amount_usdc: f64) -> Result<Execution, OrderError>;
}

/// Something that happened to an order during one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OrderEvent {
    #[serde(rename_all = "camelCase")]
    LimitFilled {
        id: OrderId,
        step: usize,
        execution: Execution,
    },
    #[serde(rename_all = "camelCase")]
    TwapPartExecuted {
        id: OrderId,
        step: usize,
        part: u32,
        execution: Execution,
    },
    #[serde(rename_all = "camelCase")]
    TwapSkipped {
        id: OrderId,
        step: usize,
        next_execution_step: usize,
    },
    #[serde(rename_all = "camelCase")]
    TwapCompleted { id: OrderId, step: usize },
}

/// Parameters for a new TWAP program.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwapParams {
    pub total_collateral: f64,
    pub num_parts: u32,
    pub total_duration_hours: f64,
    pub price_protection_pct: f64,
}

/// Timeline facts a TWAP needs at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineContext {
    pub current_step: usize,
    /// Number of steps in the sale (snapshots minus one).
    pub total_steps: usize,
    pub duration_hours: f64,
    pub current_price: f64,
}

impl TimelineContext {
    /// Steps covering `hours` of the sale, at least one.
    pub fn steps_for_hours(&self, hours: f64) -> usize {
        let steps_per_hour = self.total_steps as f64 / self.duration_hours;
        ((hours * steps_per_hour).round() as usize).max(1)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    limit_orders: Vec<LimitOrder>,
    twap_orders: Vec<TwapOrder>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit_orders(&self) -> &[LimitOrder] {
        &self.limit_orders
    }

    pub fn twap_orders(&self) -> &[TwapOrder] {
        &self.twap_orders
    }

    pub fn open_count(&self) -> usize {
        self.limit_orders.iter().filter(|o| o.is_open()).count()
            + self.twap_orders.iter().filter(|o| o.is_open()).count()
    }

    pub fn clear(&mut self) {
        self.limit_orders.clear();
        self.twap_orders.clear();
    }

    pub fn create_limit_order(
        &mut self,
        trigger_price: f64,
        collateral_amount: f64,
        available: f64,
        current_step: usize,
    ) -> Result<OrderId, OrderError> {
        if !(trigger_price.is_finite() && trigger_price > 0.0) {
            return Err(OrderError::InvalidOrder(
                "triggerPrice must be positive".to_string(),
            ));
        }
        if !(collateral_amount.is_finite() && collateral_amount > 0.0) {
            return Err(OrderError::InvalidOrder(
                "collateralAmount must be positive".to_string(),
            ));
        }
        if collateral_amount > available {
            return Err(OrderError::InsufficientFunds {
                needed: collateral_amount,
                available,
            });
        }

        let order = LimitOrder {
            id: OrderId::new(),
            side: Side::Buy,
            trigger_price,
            collateral_amount,
            status: LimitStatus::Open,
            created_at: Utc::now(),
            created_step: current_step,
            filled_at: None,
            filled_step: None,
        };
        let id = order.id;
        tracing::info!(%id, trigger_price, collateral_amount, "limit order created");
        self.limit_orders.push(order);
        Ok(id)
    }

    /// Cancel an open limit order. Unknown or terminal ids are ignored.
    pub fn cancel_limit_order(&mut self, id: OrderId) -> bool {
        match self.limit_orders.iter_mut().find(|o| o.id == id && o.is_open()) {
            Some(order) => {
                order.status = LimitStatus::Cancelled;
                tracing::info!(%id, "limit order cancelled");
                true
            }
            None => false,
        }
    }

    pub fn create_twap_order(
        &mut self,
        params: TwapParams,
        timeline: TimelineContext,
        available: f64,
    ) -> Result<OrderId, OrderError> {
        if !(params.total_collateral.is_finite() && params.total_collateral > 0.0) {
            return Err(OrderError::InvalidOrder(
                "totalCollateral must be positive".to_string(),
            ));
        }
        if params.num_parts < 1 {
            return Err(OrderError::InvalidOrder(
                "numParts must be at least 1".to_string(),
            ));
        }
        if !(params.total_duration_hours.is_finite() && params.total_duration_hours > 0.0) {
            return Err(OrderError::InvalidOrder(
                "totalDurationHours must be positive".to_string(),
            ));
        }
        if !(params.price_protection_pct.is_finite() && params.price_protection_pct >= 0.0) {
            return Err(OrderError::InvalidOrder(
                "priceProtectionPct must be >= 0".to_string(),
            ));
        }
        if available <= 0.0 {
            return Err(OrderError::InsufficientFunds {
                needed: params.total_collateral,
                available,
            });
        }

        let total_duration_steps = timeline.steps_for_hours(params.total_duration_hours);
        let part_duration_steps =
            ((total_duration_steps as f64 / f64::from(params.num_parts)).round() as usize).max(1);

        let order = TwapOrder {
            id: OrderId::new(),
            side: Side::Buy,
            total_collateral: params.total_collateral,
            remaining_collateral: params.total_collateral,
            num_parts: params.num_parts,
            parts_executed: 0,
            total_duration_hours: params.total_duration_hours,
            part_duration_steps,
            next_execution_step: timeline.current_step + part_duration_steps,
            price_protection_pct: params.price_protection_pct,
            reference_price: timeline.current_price,
            status: TwapStatus::Open,
            created_at: Utc::now(),
            completed_at: None,
        };
        let id = order.id;
        tracing::info!(
            %id,
            total = params.total_collateral,
            parts = params.num_parts,
            part_duration_steps,
            "twap order created"
        );
        self.twap_orders.push(order);
        Ok(id)
    }

    /// Cancel an open TWAP order. Unknown or terminal ids are ignored.
    pub fn cancel_twap_order(&mut self, id: OrderId) -> bool {
        match self.twap_orders.iter_mut().find(|o| o.id == id && o.is_open()) {
            Some(order) => {
                order.status = TwapStatus::Cancelled;
                order.completed_at = Some(Utc::now());
                tracing::info!(%id, "twap order cancelled");
                true
            }
            None => false,
        }
    }

    /// Evaluate every open order once against the price of `step`.
    ///
    /// `price` is the snapshot price at the start of the step; orders filled
    /// earlier in the same pass do not move the trigger price for later ones.
    pub fn evaluate(
        &mut self,
        step: usize,
        price: f64,
        last_step: usize,
        venue: &mut dyn OrderVenue,
    ) -> Vec<OrderEvent> {
        let mut events = Vec::new();
        self.evaluate_limits(step, price, venue, &mut events);
        self.evaluate_twaps(step, price, last_step, venue, &mut events);
        events
    }

    fn evaluate_limits(
        &mut self,
        step: usize,
        price: f64,
        venue: &mut dyn OrderVenue,
        events: &mut Vec<OrderEvent>,
    ) {
        for order in self.limit_orders.iter_mut().filter(|o| o.is_open()) {
            if price > order.trigger_price {
                continue;
            }
            if venue.collateral_balance() < order.collateral_amount {
                continue;
            }
            match venue.execute_buy(order.collateral_amount) {
                Ok(execution) => {
                    order.status = LimitStatus::Filled;
                    order.filled_at = Some(Utc::now());
                    order.filled_step = Some(step);
                    tracing::info!(id = %order.id, step, price, "limit order filled");
                    events.push(OrderEvent::LimitFilled {
                        id: order.id,
                        step,
                        execution,
                    });
                }
                Err(e) => {
                    tracing::warn!(id = %order.id, step, error = %e, "limit order fill refused");
                }
            }
        }
    }

    fn evaluate_twaps(
        &mut self,
        step: usize,
        price: f64,
        last_step: usize,
        venue: &mut dyn OrderVenue,
        events: &mut Vec<OrderEvent>,
    ) {
        for order in self.twap_orders.iter_mut().filter(|o| o.is_open()) {
            if step < order.next_execution_step {
                continue;
            }

            if order.is_exhausted() {
                complete_twap(order, step, events);
                continue;
            }

            if price > order.max_allowed_price() {
                order.next_execution_step = step + order.part_duration_steps;
                tracing::debug!(id = %order.id, step, price, "twap part skipped by price protection");
                events.push(OrderEvent::TwapSkipped {
                    id: order.id,
                    step,
                    next_execution_step: order.next_execution_step,
                });
                continue;
            }

            let spend = order
                .ideal_per_part()
                .min(order.remaining_collateral)
                .min(venue.collateral_balance());
            if spend <= 0.0 {
                continue;
            }

            let execution = match venue.execute_buy(spend) {
                Ok(execution) => execution,
                Err(e) => {
                    tracing::warn!(id = %order.id, step, error = %e, "twap part refused");
                    continue;
                }
            };

            order.remaining_collateral -= spend;
            order.parts_executed += 1;
            // Float residue after a full schedule of ideal parts.
            if order.parts_executed >= order.num_parts
                && order.remaining_collateral.abs() <= order.total_collateral * 1e-9
            {
                order.remaining_collateral = 0.0;
            }
            order.next_execution_step = step + order.part_duration_steps;
            events.push(OrderEvent::TwapPartExecuted {
                id: order.id,
                step,
                part: order.parts_executed,
                execution,
            });

            if order.is_exhausted() || step >= last_step {
                complete_twap(order, step, events);
            }
        }
    }
}

fn complete_twap(order: &mut TwapOrder, step: usize, events: &mut Vec<OrderEvent>) {
    order.status = TwapStatus::Completed;
    order.completed_at.get_or_insert_with(Utc::now);
    tracing::info!(
        id = %order.id,
        step,
        parts = order.parts_executed,
        remaining = order.remaining_collateral,
        "twap order completed"
    );
    events.push(OrderEvent::TwapCompleted { id: order.id, step });
}
