//! Signal-producing strategies.
//!
//! A strategy looks at the candle history up to and including the current candle
//! and recommends one [`Signal`]. Strategies keep no state between calls: every
//! indicator is rebuilt from the history it is given, so the same history always
//! yields the same signal.
//!
//! | Strategy | Long | Short | Close |
//! |----------|------|-------|-------|
//! | [`MovingAverageCrossover`] | short SMA crosses above long SMA | short SMA crosses below long SMA | - |
//! | [`ExponentialCrossover`] | fast EMA crosses above slow EMA | fast EMA crosses below slow EMA | - |
//! | [`PriceEmaCross`] | close crosses above its EMA | close crosses below its EMA | - |
//! | [`RsiThreshold`] | RSI crosses below oversold | RSI crosses above overbought | RSI enters the neutral band |
//! | [`BollingerReversion`] | close crosses below the lower band | close crosses above the upper band | close crosses the middle band |

mod bollinger;
mod crossover;
mod rsi;

use std::fmt;

use ta::Next;

use crate::engine::Candle;
use crate::errors::Result;

pub use bollinger::*;
pub use crossover::*;
pub use rsi::*;

/// Recommended action for the current candle.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Be long.
    Long,
    /// Be short.
    Short,
    /// Be flat.
    Close,
    /// Keep whatever is open.
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Long => "LONG",
            Self::Short => "SHORT",
            Self::Close => "CLOSE",
            Self::Hold => "HOLD",
        };
        f.write_str(name)
    }
}

/// Contract shared by every strategy.
pub trait Strategy {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Number of candles needed before anything but [`Signal::Hold`] can be produced.
    fn min_history(&self) -> usize;

    /// Computes the signal for the last candle of `history`.
    ///
    /// Must return [`Signal::Hold`] while `history` is shorter than [`Strategy::min_history`].
    fn signal(&self, history: &[Candle]) -> Signal;

    /// Checks the parameters of the strategy.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// The strategies shipped with the crate, selected once per backtest.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyKind {
    /// Simple moving average crossover.
    MovingAverageCrossover(MovingAverageCrossover),
    /// Exponential moving average crossover.
    ExponentialCrossover(ExponentialCrossover),
    /// Close price crossing a single EMA.
    PriceEmaCross(PriceEmaCross),
    /// RSI overbought/oversold thresholds.
    RsiThreshold(RsiThreshold),
    /// Bollinger bands mean reversion.
    BollingerReversion(BollingerReversion),
}

impl Default for StrategyKind {
    fn default() -> Self {
        Self::MovingAverageCrossover(MovingAverageCrossover::default())
    }
}

impl StrategyKind {
    fn inner(&self) -> &dyn Strategy {
        match self {
            Self::MovingAverageCrossover(s) => s,
            Self::ExponentialCrossover(s) => s,
            Self::PriceEmaCross(s) => s,
            Self::RsiThreshold(s) => s,
            Self::BollingerReversion(s) => s,
        }
    }
}

impl Strategy for StrategyKind {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn min_history(&self) -> usize {
        self.inner().min_history()
    }

    fn signal(&self, history: &[Candle]) -> Signal {
        self.inner().signal(history)
    }

    fn validate(&self) -> Result<()> {
        self.inner().validate()
    }
}

/// Position of one value relative to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Relation {
    Above,
    Below,
    Equal,
}

impl Relation {
    pub(crate) fn of(value: f64, reference: f64) -> Self {
        if value > reference {
            Self::Above
        } else if value < reference {
            Self::Below
        } else {
            Self::Equal
        }
    }
}

/// Returns the side `current` has just crossed to, if any.
///
/// An undefined `previous` relation (indicators not yet populated one candle
/// earlier) counts as not being on either side.
pub(crate) fn crossing(previous: Option<Relation>, current: Relation) -> Option<Relation> {
    match current {
        Relation::Equal => None,
        side if previous != Some(side) => Some(side),
        _ => None,
    }
}

/// Maps a crossing to the signal of a trend-following strategy.
pub(crate) fn trend_signal(previous: Option<Relation>, current: Option<Relation>) -> Signal {
    match current.and_then(|current| crossing(previous, current)) {
        Some(Relation::Above) => Signal::Long,
        Some(Relation::Below) => Signal::Short,
        _ => Signal::Hold,
    }
}

/// Periods an exponential indicator is replayed over. Older closes weigh about
/// `exp(-40)` in the result.
pub(crate) const WARMUP_PERIODS: usize = 20;

/// Tail of `history` an exponential indicator of `period` is replayed over.
pub(crate) fn warmup(history: &[Candle], period: usize) -> &[Candle] {
    let start = history.len().saturating_sub(period.saturating_mul(WARMUP_PERIODS));
    &history[start..]
}

/// Feeds `inputs` to a fresh indicator and returns its last output.
pub(crate) fn replay<N, I>(mut indicator: N, inputs: I) -> Option<N::Output>
where
    N: Next<f64>,
    I: IntoIterator<Item = f64>,
{
    inputs.into_iter().map(|input| indicator.next(input)).last()
}

pub(crate) fn closes(history: &[Candle]) -> impl Iterator<Item = f64> + '_ {
    history.iter().map(Candle::close)
}

/// History without its last candle, i.e. as it was one candle earlier.
pub(crate) fn previous(history: &[Candle]) -> &[Candle] {
    &history[..history.len().saturating_sub(1)]
}

#[cfg(test)]
pub(crate) fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    use chrono::{DateTime, Duration};

    let start = DateTime::from_timestamp_secs(1515151515).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle::new(start + Duration::minutes(i as i64), close, close, close, close, 1.0))
        .collect()
}

/// Signals produced on each prefix of `history`, starting with the first candle.
#[cfg(test)]
pub(crate) fn signals<S: Strategy>(strategy: &S, history: &[Candle]) -> Vec<Signal> {
    (1..=history.len()).map(|end| strategy.signal(&history[..end])).collect()
}
