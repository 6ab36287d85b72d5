//! The live side of playback: the committed path, the user's wallet, and the
//! swap log.
//!
//! User swaps execute against the balances of the current snapshot and write
//! the resulting balances and price back into that one slot. Later snapshots
//! stay as the runner committed them.

use std::collections::VecDeque;

use chrono::Utc;
use serde::Serialize;

use crate::domain::{Account, OrderId, Side, Snapshot, SwapRecord};
use crate::engine::{Execution, OrderError, OrderVenue, PoolState, Weights};

/// Most recent swaps kept in the activity log.
pub const MAX_SWAPS: usize = 500;

/// Balances of the interactive user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub tokens: f64,
    pub collateral: f64,
}

impl Wallet {
    pub fn new(collateral: f64) -> Self {
        Self {
            tokens: 0.0,
            collateral,
        }
    }
}

/// Bounded swap history, newest first.
#[derive(Debug, Clone, Default)]
pub struct SwapLog {
    records: VecDeque<SwapRecord>,
}

impl SwapLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: SwapRecord) {
        self.records.push_front(record);
        self.records.truncate(MAX_SWAPS);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &SwapRecord> {
        self.records.iter()
    }

    pub fn recent(&self, limit: usize) -> Vec<SwapRecord> {
        self.records.iter().take(limit).cloned().collect()
    }
}

#[derive(Debug, Clone)]
pub struct LiveMarket {
    snapshots: Vec<Snapshot>,
    version: u64,
    current_step: usize,
    wallet: Wallet,
    swaps: SwapLog,
}

impl LiveMarket {
    pub fn new(starting_collateral: f64) -> Self {
        Self {
            snapshots: Vec::new(),
            version: 0,
            current_step: 0,
            wallet: Wallet::new(starting_collateral),
            swaps: SwapLog::new(),
        }
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn has_path(&self) -> bool {
        !self.snapshots.is_empty()
    }

    /// Bumped whenever any snapshot changes.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Highest reachable step, or `None` while no path is installed.
    pub fn last_step(&self) -> Option<usize> {
        self.snapshots.len().checked_sub(1)
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.current_step)
    }

    pub fn wallet(&self) -> Wallet {
        self.wallet
    }

    pub fn swaps(&self) -> &SwapLog {
        &self.swaps
    }

    pub fn install(&mut self, snapshots: Vec<Snapshot>) {
        self.snapshots = snapshots;
        self.current_step = self
            .current_step
            .min(self.snapshots.len().saturating_sub(1));
        self.version += 1;
    }

    /// Drop the path, rewind to step 0 and clear the log. The wallet stays.
    pub fn clear_timeline(&mut self) {
        self.snapshots.clear();
        self.current_step = 0;
        self.swaps.clear();
        self.version += 1;
    }

    pub fn reset_wallet(&mut self, collateral: f64) {
        self.wallet = Wallet::new(collateral);
    }

    /// Move the pointer, clamped to the installed path.
    pub fn set_step(&mut self, step: usize) -> usize {
        self.current_step = step.min(self.last_step().unwrap_or(0));
        self.current_step
    }

    /// Step forward once and log the community trades of the new step.
    ///
    /// Returns the reached snapshot, or `None` at the end of the path.
    pub fn advance(&mut self) -> Option<Snapshot> {
        let next = self.current_step + 1;
        let snapshot = *self.snapshots.get(next)?;
        self.current_step = next;

        if snapshot.had_community_buy() {
            self.swaps.push(record(
                &snapshot,
                Account::Community,
                Side::Buy,
                snapshot.buy_volume_usdc,
                snapshot.buy_volume_tkn,
                snapshot.price,
            ));
        }
        if snapshot.had_community_sell() {
            self.swaps.push(record(
                &snapshot,
                Account::Community,
                Side::Sell,
                snapshot.sell_volume_tkn,
                snapshot.sell_volume_usdc,
                snapshot.price,
            ));
        }
        self.version += 1;
        Some(snapshot)
    }

    /// Spend collateral from the wallet on tokens at the current step.
    pub fn user_buy(&mut self, amount_usdc: f64) -> Result<Execution, OrderError> {
        check_amount("amountUsdc", amount_usdc)?;
        if amount_usdc > self.wallet.collateral {
            return Err(OrderError::InsufficientFunds {
                needed: amount_usdc,
                available: self.wallet.collateral,
            });
        }
        let execution = self.swap(Side::Buy, amount_usdc)?;
        self.wallet.collateral = (self.wallet.collateral - amount_usdc).max(0.0);
        self.wallet.tokens += execution.amount_out;
        Ok(execution)
    }

    /// Sell wallet tokens for collateral at the current step.
    pub fn user_sell(&mut self, amount_tkn: f64) -> Result<Execution, OrderError> {
        check_amount("amountTkn", amount_tkn)?;
        if amount_tkn > self.wallet.tokens {
            return Err(OrderError::InsufficientFunds {
                needed: amount_tkn,
                available: self.wallet.tokens,
            });
        }
        let execution = self.swap(Side::Sell, amount_tkn)?;
        self.wallet.tokens = (self.wallet.tokens - amount_tkn).max(0.0);
        self.wallet.collateral += execution.amount_out;
        Ok(execution)
    }

    fn swap(&mut self, side: Side, amount_in: f64) -> Result<Execution, OrderError> {
        let step = self.current_step;
        let slot = self.snapshots.get_mut(step).ok_or(OrderError::NoPath)?;

        let weights = Weights {
            tkn: slot.tkn_weight,
            usdc: slot.usdc_weight,
        };
        let mut pool = PoolState {
            tkn_balance: slot.tkn_balance,
            usdc_balance: slot.usdc_balance,
        };
        let amount_out = match side {
            Side::Buy => pool.buy(weights, amount_in),
            Side::Sell => pool.sell(weights, amount_in),
        };
        let price = pool.price(weights);

        slot.tkn_balance = pool.tkn_balance;
        slot.usdc_balance = pool.usdc_balance;
        slot.price = price;
        let snapshot = *slot;

        self.swaps
            .push(record(&snapshot, Account::User, side, amount_in, amount_out, price));
        self.version += 1;

        tracing::debug!(step, %side, amount_in, amount_out, price, "user swap executed");
        Ok(Execution {
            amount_in,
            amount_out,
            price,
        })
    }
}

impl OrderVenue for LiveMarket {
    fn collateral_balance(&self) -> f64 {
        self.wallet.collateral
    }

    fn execute_buy(&mut self, amount_usdc: f64) -> Result<Execution, OrderError> {
        self.user_buy(amount_usdc)
    }
}

fn check_amount(name: &str, amount: f64) -> Result<(), OrderError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(OrderError::InvalidOrder(format!("{} must be positive", name)))
    }
}

fn record(
    snapshot: &Snapshot,
    account: Account,
    direction: Side,
    amount_in: f64,
    amount_out: f64,
    price: f64,
) -> SwapRecord {
    SwapRecord {
        id: OrderId::new(),
        step: snapshot.index,
        time: snapshot.time_label(),
        account,
        direction,
        amount_in,
        amount_out,
        price,
        timestamp: Utc::now(),
    }
}
