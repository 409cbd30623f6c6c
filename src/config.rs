//! Immutable run configuration.

use crate::errors::{Error, Result};
use crate::strategy::{Strategy, StrategyKind};

/// How a reversal (long to short or short to long) is written to the journal.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReversalLog {
    /// Two records: the close of the old position, then the open of the new one.
    #[default]
    Chained,
    /// A single `REVERSE_TO_*` record.
    Combined,
}

/// Parameters of one backtest run.
///
/// ```
/// use bts_signal::prelude::*;
///
/// let config = BacktestConfig::default()
///     .with_initial_capital(1_000.0)
///     .with_fee_rate(0.001)
///     .with_strategy(StrategyKind::RsiThreshold(RsiThreshold::default()));
/// assert!(config.validate().is_ok());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Traded instrument, only used for reporting.
    pub symbol: String,
    /// Cash at the start of the run.
    pub initial_capital: f64,
    /// Fixed size of every fill.
    pub quantity: f64,
    /// Fee charged on each leg, as a fraction of the notional.
    pub fee_rate: f64,
    /// Journal layout of reversals.
    pub reversal: ReversalLog,
    /// Strategy driving the run.
    pub strategy: StrategyKind,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_owned(),
            initial_capital: 10_000.0,
            quantity: 0.1,
            fee_rate: 0.00075,
            reversal: ReversalLog::default(),
            strategy: StrategyKind::default(),
        }
    }
}

impl BacktestConfig {
    /// Sets the symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Sets the starting cash.
    pub fn with_initial_capital(mut self, initial_capital: f64) -> Self {
        self.initial_capital = initial_capital;
        self
    }

    /// Sets the fill size.
    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the fee rate.
    pub fn with_fee_rate(mut self, fee_rate: f64) -> Self {
        self.fee_rate = fee_rate;
        self
    }

    /// Sets how reversals are journaled.
    pub fn with_reversal(mut self, reversal: ReversalLog) -> Self {
        self.reversal = reversal;
        self
    }

    /// Sets the strategy.
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Checks every parameter, strategy included.
    pub fn validate(&self) -> Result<()> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(Error::NegZeroBalance(self.initial_capital));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(Error::InvalidQuantity(self.quantity));
        }
        if !(0.0..1.0).contains(&self.fee_rate) {
            return Err(Error::InvalidFeeRate(self.fee_rate));
        }
        self.strategy.validate()
    }
}
