use ta::indicators::{ExponentialMovingAverage, SimpleMovingAverage};

use super::{Relation, Signal, Strategy, closes, previous, replay, trend_signal, warmup};
use crate::engine::Candle;
use crate::errors::{Error, Result};

/// Mean of the last `period` closes.
fn sma(history: &[Candle], period: usize) -> Option<f64> {
    let start = history.len().checked_sub(period)?;
    replay(SimpleMovingAverage::new(period).ok()?, closes(&history[start..]))
}

/// EMA of the closes, replayed over the warm-up window.
fn ema(history: &[Candle], period: usize) -> Option<f64> {
    replay(ExponentialMovingAverage::new(period).ok()?, closes(warmup(history, period)))
}

fn check_pair(fast: usize, slow: usize) -> Result<()> {
    if fast == 0 || slow == 0 {
        return Err(Error::InvalidParameter(format!("periods must be positive (got {fast}/{slow})")));
    }
    if fast >= slow {
        return Err(Error::InvalidParameter(format!(
            "fast period ({fast}) must be shorter than slow period ({slow})"
        )));
    }
    Ok(())
}

/// Simple moving average crossover.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageCrossover {
    /// Period of the fast average.
    pub short: usize,
    /// Period of the slow average.
    pub long: usize,
}

impl Default for MovingAverageCrossover {
    fn default() -> Self {
        Self { short: 3, long: 7 }
    }
}

impl MovingAverageCrossover {
    /// Creates a crossover of a `short` and a `long` period SMA.
    pub fn new(short: usize, long: usize) -> Self {
        Self { short, long }
    }

    fn relation(&self, history: &[Candle]) -> Option<Relation> {
        if history.len() < self.long {
            return None;
        }
        Some(Relation::of(sma(history, self.short)?, sma(history, self.long)?))
    }
}

impl Strategy for MovingAverageCrossover {
    fn name(&self) -> &'static str {
        "sma_crossover"
    }

    fn min_history(&self) -> usize {
        self.long
    }

    fn signal(&self, history: &[Candle]) -> Signal {
        if history.len() < self.min_history() {
            return Signal::Hold;
        }
        trend_signal(self.relation(previous(history)), self.relation(history))
    }

    fn validate(&self) -> Result<()> {
        check_pair(self.short, self.long)
    }
}

/// Exponential moving average crossover.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialCrossover {
    /// Period of the fast EMA.
    pub fast: usize,
    /// Period of the slow EMA.
    pub slow: usize,
}

impl Default for ExponentialCrossover {
    fn default() -> Self {
        Self { fast: 9, slow: 26 }
    }
}

impl ExponentialCrossover {
    /// Creates a crossover of a `fast` and a `slow` period EMA.
    pub fn new(fast: usize, slow: usize) -> Self {
        Self { fast, slow }
    }

    fn relation(&self, history: &[Candle]) -> Option<Relation> {
        if history.len() < self.slow {
            return None;
        }
        Some(Relation::of(ema(history, self.fast)?, ema(history, self.slow)?))
    }
}

impl Strategy for ExponentialCrossover {
    fn name(&self) -> &'static str {
        "ema_crossover"
    }

    fn min_history(&self) -> usize {
        self.slow
    }

    fn signal(&self, history: &[Candle]) -> Signal {
        if history.len() < self.min_history() {
            return Signal::Hold;
        }
        trend_signal(self.relation(previous(history)), self.relation(history))
    }

    fn validate(&self) -> Result<()> {
        check_pair(self.fast, self.slow)
    }
}

/// Close price crossing its own EMA.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct PriceEmaCross {
    /// Period of the EMA.
    pub period: usize,
}

impl Default for PriceEmaCross {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl PriceEmaCross {
    /// Creates a close/EMA crossing strategy.
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    fn relation(&self, history: &[Candle]) -> Option<Relation> {
        if history.len() < self.period {
            return None;
        }
        let close = history.last()?.close();
        Some(Relation::of(close, ema(history, self.period)?))
    }
}

impl Strategy for PriceEmaCross {
    fn name(&self) -> &'static str {
        "price_ema_cross"
    }

    fn min_history(&self) -> usize {
        self.period
    }

    fn signal(&self, history: &[Candle]) -> Signal {
        if history.len() < self.min_history() {
            return Signal::Hold;
        }
        trend_signal(self.relation(previous(history)), self.relation(history))
    }

    fn validate(&self) -> Result<()> {
        if self.period == 0 {
            return Err(Error::InvalidParameter("EMA period must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{candles_from_closes, signals};

    #[test]
    fn sma_holds_until_long_window_is_full() {
        let strategy = MovingAverageCrossover::new(2, 3);
        let history = candles_from_closes(&[100.0, 102.0]);
        assert_eq!(strategy.signal(&history), Signal::Hold);
    }

    #[test]
    fn sma_upward_cross_then_downward_cross() {
        let strategy = MovingAverageCrossover::new(2, 3);
        let history = candles_from_closes(&[100.0, 102.0, 104.0, 101.0, 99.0]);
        // short 103 > long 102 once both are populated, then 100 < 101.33
        assert_eq!(
            signals(&strategy, &history),
            vec![Signal::Hold, Signal::Hold, Signal::Long, Signal::Hold, Signal::Short]
        );
    }

    #[test]
    fn sma_no_repeated_signal_while_trend_lasts() {
        let strategy = MovingAverageCrossover::new(2, 3);
        let history = candles_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let longs = signals(&strategy, &history).into_iter().filter(|s| *s == Signal::Long).count();
        assert_eq!(longs, 1);
    }

    #[test]
    fn sma_invalid_periods() {
        assert!(MovingAverageCrossover::new(3, 3).validate().is_err());
        assert!(MovingAverageCrossover::new(0, 3).validate().is_err());
        assert!(MovingAverageCrossover::new(2, 3).validate().is_ok());
    }

    #[test]
    fn ema_crossover_follows_trend_change() {
        let strategy = ExponentialCrossover::new(2, 4);
        let mut closes = vec![100.0; 4];
        closes.extend([95.0, 90.0, 85.0, 90.0, 100.0, 110.0]);
        let history = candles_from_closes(&closes);

        let emitted: Vec<_> = signals(&strategy, &history)
            .into_iter()
            .filter(|s| *s != Signal::Hold)
            .collect();
        assert_eq!(emitted, vec![Signal::Short, Signal::Long]);
    }

    #[test]
    fn price_ema_cross() {
        let strategy = PriceEmaCross::new(3);
        let history = candles_from_closes(&[100.0, 100.0, 100.0, 104.0, 106.0, 96.0]);
        assert_eq!(
            signals(&strategy, &history),
            vec![Signal::Hold, Signal::Hold, Signal::Hold, Signal::Long, Signal::Hold, Signal::Short]
        );
    }

    #[test]
    fn same_history_same_signal() {
        let strategy = ExponentialCrossover::default();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.4).sin() * 5.0).collect();
        let history = candles_from_closes(&closes);
        assert_eq!(signals(&strategy, &history), signals(&strategy, &history));
    }
}
