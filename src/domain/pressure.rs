//! Buy- and sell-pressure model parameters.

use serde::{Deserialize, Serialize};

use super::sale::SaleConfigError;

/// Upper bound applied to the buy multiplier.
pub const MAX_BUY_MULTIPLIER: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuyPreset {
    /// Front-loaded, steady demand.
    #[default]
    Bullish,
    /// Back-loaded demand at 35% of the volume.
    Bearish,
}

impl BuyPreset {
    /// Exponent applied to normalized progress.
    pub fn exponent(&self) -> f64 {
        match self {
            BuyPreset::Bullish => 0.9,
            BuyPreset::Bearish => 1.8,
        }
    }

    /// Fraction of the nominal volume reached at the end of the sale.
    pub fn end_scale(&self) -> f64 {
        match self {
            BuyPreset::Bullish => 1.0,
            BuyPreset::Bearish => 0.35,
        }
    }
}

/// Order of magnitude of the end-of-sale cumulative buy volume (collateral).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u64", into = "u64")]
pub enum MagnitudeBase {
    TenThousand,
    #[default]
    HundredThousand,
    OneMillion,
}

impl MagnitudeBase {
    pub fn value(&self) -> f64 {
        u64::from(*self) as f64
    }
}

impl From<MagnitudeBase> for u64 {
    fn from(base: MagnitudeBase) -> Self {
        match base {
            MagnitudeBase::TenThousand => 10_000,
            MagnitudeBase::HundredThousand => 100_000,
            MagnitudeBase::OneMillion => 1_000_000,
        }
    }
}

impl TryFrom<u64> for MagnitudeBase {
    type Error = String;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            10_000 => Ok(MagnitudeBase::TenThousand),
            100_000 => Ok(MagnitudeBase::HundredThousand),
            1_000_000 => Ok(MagnitudeBase::OneMillion),
            other => Err(format!(
                "magnitudeBase must be 10000, 100000 or 1000000, got {}",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyPressureConfig {
    pub preset: BuyPreset,
    pub magnitude_base: MagnitudeBase,
    pub multiplier: f64,
}

impl Default for BuyPressureConfig {
    fn default() -> Self {
        Self {
            preset: BuyPreset::Bullish,
            magnitude_base: MagnitudeBase::HundredThousand,
            multiplier: 1.0,
        }
    }
}

impl BuyPressureConfig {
    /// No modeled demand at all.
    pub fn disabled() -> Self {
        Self {
            multiplier: 0.0,
            ..Default::default()
        }
    }

    /// Multiplier clamped into `[0, MAX_BUY_MULTIPLIER]`.
    pub fn effective_multiplier(&self) -> f64 {
        if self.multiplier.is_nan() {
            return 0.0;
        }
        self.multiplier.clamp(0.0, MAX_BUY_MULTIPLIER)
    }

    /// Cumulative collateral bought by the end of the sale.
    pub fn end_total(&self) -> f64 {
        self.magnitude_base.value() * self.effective_multiplier() * self.preset.end_scale()
    }

    pub fn validate(&self) -> Result<(), SaleConfigError> {
        if !(self.multiplier.is_finite() && self.multiplier >= 0.0) {
            return Err(SaleConfigError::InvalidValue(
                "multiplier",
                format!("must be a non-negative number, got {}", self.multiplier),
            ));
        }
        Ok(())
    }

    pub fn apply(&self, update: &BuyPressureUpdate) -> Result<BuyPressureConfig, SaleConfigError> {
        let next = BuyPressureConfig {
            preset: update.preset.unwrap_or(self.preset),
            magnitude_base: update.magnitude_base.unwrap_or(self.magnitude_base),
            multiplier: update.multiplier.unwrap_or(self.multiplier),
        };
        next.validate()?;
        Ok(next)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuyPressureUpdate {
    pub preset: Option<BuyPreset>,
    pub magnitude_base: Option<MagnitudeBase>,
    pub multiplier: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SellPreset {
    /// Holders sell a fixed share on a schedule, heavier at the edges.
    #[default]
    Loyal,
    /// Holders take profit above their cost basis.
    Greedy,
}

/// Sell-pressure parameters. Both presets' fields are kept so switching
/// back and forth does not lose settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellPressureConfig {
    pub preset: SellPreset,
    /// Share of held tokens sold over the run (loyal).
    pub loyal_sold_pct: f64,
    /// How strongly selling clusters at the start and end (loyal).
    pub loyal_concentration_pct: f64,
    /// Premium over cost basis that triggers selling (greedy).
    pub greedy_spread_pct: f64,
    /// Share of holdings liquidated per trigger (greedy).
    pub greedy_sell_pct: f64,
}

impl Default for SellPressureConfig {
    fn default() -> Self {
        Self {
            preset: SellPreset::Loyal,
            loyal_sold_pct: 20.0,
            loyal_concentration_pct: 50.0,
            greedy_spread_pct: 10.0,
            greedy_sell_pct: 25.0,
        }
    }
}

impl SellPressureConfig {
    /// Loyal preset that never sells.
    pub fn disabled() -> Self {
        Self {
            preset: SellPreset::Loyal,
            loyal_sold_pct: 0.0,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), SaleConfigError> {
        for (name, value) in [
            ("loyalSoldPct", self.loyal_sold_pct),
            ("loyalConcentrationPct", self.loyal_concentration_pct),
            ("greedySellPct", self.greedy_sell_pct),
        ] {
            if !(value.is_finite() && (0.0..=100.0).contains(&value)) {
                return Err(SaleConfigError::InvalidValue(
                    name,
                    format!("must be in [0, 100], got {}", value),
                ));
            }
        }
        if !(self.greedy_spread_pct.is_finite() && self.greedy_spread_pct >= 0.0) {
            return Err(SaleConfigError::InvalidValue(
                "greedySpreadPct",
                format!("must be >= 0, got {}", self.greedy_spread_pct),
            ));
        }
        Ok(())
    }

    pub fn apply(&self, update: &SellPressureUpdate) -> Result<SellPressureConfig, SaleConfigError> {
        let next = SellPressureConfig {
            preset: update.preset.unwrap_or(self.preset),
            loyal_sold_pct: update.loyal_sold_pct.unwrap_or(self.loyal_sold_pct),
            loyal_concentration_pct: update
                .loyal_concentration_pct
                .unwrap_or(self.loyal_concentration_pct),
            greedy_spread_pct: update.greedy_spread_pct.unwrap_or(self.greedy_spread_pct),
            greedy_sell_pct: update.greedy_sell_pct.unwrap_or(self.greedy_sell_pct),
        };
        next.validate()?;
        Ok(next)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SellPressureUpdate {
    pub preset: Option<SellPreset>,
    pub loyal_sold_pct: Option<f64>,
    pub loyal_concentration_pct: Option<f64>,
    pub greedy_spread_pct: Option<f64>,
    pub greedy_sell_pct: Option<f64>,
}
