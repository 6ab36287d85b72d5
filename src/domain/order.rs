//! User order and swap record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::primitives::{Account, OrderId, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitStatus {
    Open,
    Filled,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwapStatus {
    Open,
    Completed,
    Cancelled,
}

/// Buy order that fills once the price drops to the trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrder {
    pub id: OrderId,
    pub side: Side,
    /// Collateral per project token.
    pub trigger_price: f64,
    pub collateral_amount: f64,
    pub status: LimitStatus,
    pub created_at: DateTime<Utc>,
    pub created_step: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_step: Option<usize>,
}

impl LimitOrder {
    pub fn is_open(&self) -> bool {
        self.status == LimitStatus::Open
    }
}

/// Buy program splitting a collateral budget into equal timed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwapOrder {
    pub id: OrderId,
    pub side: Side,
    pub total_collateral: f64,
    pub remaining_collateral: f64,
    pub num_parts: u32,
    pub parts_executed: u32,
    pub total_duration_hours: f64,
    pub part_duration_steps: usize,
    pub next_execution_step: usize,
    pub price_protection_pct: f64,
    /// Price at creation; protection is relative to it.
    pub reference_price: f64,
    pub status: TwapStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TwapOrder {
    pub fn is_open(&self) -> bool {
        self.status == TwapStatus::Open
    }

    /// Collateral each part aims to spend.
    pub fn ideal_per_part(&self) -> f64 {
        self.total_collateral / f64::from(self.num_parts)
    }

    /// Highest price at which a part may still execute.
    pub fn max_allowed_price(&self) -> f64 {
        self.reference_price * (1.0 + self.price_protection_pct / 100.0)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_collateral <= 0.0 || self.parts_executed >= self.num_parts
    }
}

/// One executed swap, as shown in the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRecord {
    pub id: OrderId,
    pub step: usize,
    pub time: String,
    pub account: Account,
    pub direction: Side,
    pub amount_in: f64,
    pub amount_out: f64,
    /// Spot price after the swap.
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twap(total: f64, parts: u32) -> TwapOrder {
        TwapOrder {
            id: OrderId::new(),
            side: Side::Buy,
            total_collateral: total,
            remaining_collateral: total,
            num_parts: parts,
            parts_executed: 0,
            total_duration_hours: 4.0,
            part_duration_steps: 4,
            next_execution_step: 4,
            price_protection_pct: 10.0,
            reference_price: 2.0,
            status: TwapStatus::Open,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_twap_ideal_per_part() {
        assert_eq!(twap(1000.0, 4).ideal_per_part(), 250.0);
    }

    #[test]
    fn test_twap_max_allowed_price() {
        let order = twap(1000.0, 4);
        assert!((order.max_allowed_price() - 2.2).abs() < 1e-12);
    }

    #[test]
    fn test_twap_exhausted() {
        let mut order = twap(1000.0, 2);
        assert!(!order.is_exhausted());
        order.parts_executed = 2;
        assert!(order.is_exhausted());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&LimitStatus::Filled).unwrap(),
            "\"filled\""
        );
        assert_eq!(
            serde_json::to_string(&TwapStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
