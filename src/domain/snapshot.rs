//! Per-step pool snapshot produced by the simulation runner.

use serde::{Deserialize, Serialize};

/// Pool and community state after one step of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub index: usize,
    /// Elapsed hours since the sale started.
    pub time: f64,
    pub price: f64,
    pub tkn_balance: f64,
    pub usdc_balance: f64,
    pub tkn_weight: f64,
    pub usdc_weight: f64,
    pub community_tokens_held: f64,
    /// Weighted-average collateral paid per token held (0 when flat).
    pub community_avg_cost: f64,
    #[serde(rename = "buyVolumeUSDC")]
    pub buy_volume_usdc: f64,
    #[serde(rename = "buyVolumeTKN")]
    pub buy_volume_tkn: f64,
    #[serde(rename = "sellVolumeUSDC")]
    pub sell_volume_usdc: f64,
    #[serde(rename = "sellVolumeTKN")]
    pub sell_volume_tkn: f64,
}

impl Snapshot {
    /// Human label for the elapsed time, e.g. `"12.5h"`.
    pub fn time_label(&self) -> String {
        format!("{:.1}h", self.time)
    }

    /// Price times the tokens left in the pool.
    pub fn market_cap(&self) -> f64 {
        self.price * self.tkn_balance
    }

    pub fn had_community_buy(&self) -> bool {
        self.buy_volume_usdc > 0.0 && self.buy_volume_tkn > 0.0
    }

    pub fn had_community_sell(&self) -> bool {
        self.sell_volume_usdc > 0.0 && self.sell_volume_tkn > 0.0
    }
}
