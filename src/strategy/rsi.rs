use ta::indicators::RelativeStrengthIndex;

use super::{Signal, Strategy, closes, previous, replay, warmup};
use crate::engine::Candle;
use crate::errors::{Error, Result};

/// Where an RSI value sits relative to the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Oversold,
    Overbought,
    Neutral,
    Between,
}

/// RSI threshold strategy.
///
/// Goes long when the RSI drops below `oversold`, short when it rises above
/// `overbought` and asks to close once it comes back into
/// `[neutral_low, neutral_high]`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct RsiThreshold {
    /// RSI period.
    pub period: usize,
    /// Level under which the market is oversold.
    pub oversold: f64,
    /// Level above which the market is overbought.
    pub overbought: f64,
    /// Lower bound of the neutral band.
    pub neutral_low: f64,
    /// Upper bound of the neutral band.
    pub neutral_high: f64,
}

impl Default for RsiThreshold {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
            neutral_low: 45.0,
            neutral_high: 55.0,
        }
    }
}

impl RsiThreshold {
    /// Creates the strategy with the default 45-55 neutral band.
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        Self {
            period,
            oversold,
            overbought,
            ..Default::default()
        }
    }

    /// Sets the neutral band.
    pub fn neutral_band(mut self, low: f64, high: f64) -> Self {
        self.neutral_low = low;
        self.neutral_high = high;
        self
    }

    fn zone(&self, history: &[Candle]) -> Option<Zone> {
        if history.len() < self.min_history() {
            return None;
        }
        let rsi = replay(
            RelativeStrengthIndex::new(self.period).ok()?,
            closes(warmup(history, self.period)),
        )?;
        let zone = if rsi < self.oversold {
            Zone::Oversold
        } else if rsi > self.overbought {
            Zone::Overbought
        } else if (self.neutral_low..=self.neutral_high).contains(&rsi) {
            Zone::Neutral
        } else {
            Zone::Between
        };
        Some(zone)
    }
}

impl Strategy for RsiThreshold {
    fn name(&self) -> &'static str {
        "rsi_threshold"
    }

    fn min_history(&self) -> usize {
        self.period + 1
    }

    fn signal(&self, history: &[Candle]) -> Signal {
        let Some(current) = self.zone(history) else {
            return Signal::Hold;
        };
        let previous = self.zone(previous(history));
        match (previous, current) {
            (prev, Zone::Oversold) if prev != Some(Zone::Oversold) => Signal::Long,
            (prev, Zone::Overbought) if prev != Some(Zone::Overbought) => Signal::Short,
            (Some(prev), Zone::Neutral) if prev != Zone::Neutral => Signal::Close,
            _ => Signal::Hold,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.period == 0 {
            return Err(Error::InvalidParameter("RSI period must be positive".into()));
        }
        let levels = [
            self.oversold,
            self.neutral_low,
            self.neutral_high,
            self.overbought,
        ];
        let ordered = levels.windows(2).all(|w| w[0] <= w[1]);
        if !ordered || self.oversold <= 0.0 || self.overbought >= 100.0 || self.oversold >= self.overbought {
            return Err(Error::InvalidParameter(format!(
                "RSI levels must satisfy 0 < oversold ({}) <= neutral band ({}..{}) <= overbought ({}) < 100",
                self.oversold, self.neutral_low, self.neutral_high, self.overbought
            )));
        }
        Ok(())
    }
}
