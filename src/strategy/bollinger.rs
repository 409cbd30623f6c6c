use ta::indicators::BollingerBands;

use super::{Relation, Signal, Strategy, closes, crossing, previous, replay};
use crate::engine::Candle;
use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Below,
    Inside,
    Above,
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    band: Band,
    // close relative to the middle band
    middle: Relation,
}

/// Bollinger bands mean reversion.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerReversion {
    /// Number of closes the bands are computed on.
    pub period: usize,
    /// Distance of the outer bands, in standard deviations.
    pub width: f64,
}

impl Default for BollingerReversion {
    fn default() -> Self {
        Self {
            period: 20,
            width: 2.0,
        }
    }
}

impl BollingerReversion {
    /// Creates the strategy.
    pub fn new(period: usize, width: f64) -> Self {
        Self { period, width }
    }

    fn placement(&self, history: &[Candle]) -> Option<Placement> {
        let start = history.len().checked_sub(self.period)?;
        let bands = BollingerBands::new(self.period, self.width).ok()?;
        let out = replay(bands, closes(&history[start..]))?;
        let close = history.last()?.close();

        let band = if close < out.lower {
            Band::Below
        } else if close > out.upper {
            Band::Above
        } else {
            Band::Inside
        };
        Some(Placement {
            band,
            middle: Relation::of(close, out.average),
        })
    }
}

impl Strategy for BollingerReversion {
    fn name(&self) -> &'static str {
        "bollinger_reversion"
    }

    fn min_history(&self) -> usize {
        self.period
    }

    fn signal(&self, history: &[Candle]) -> Signal {
        let Some(current) = self.placement(history) else {
            return Signal::Hold;
        };
        let previous = self.placement(previous(history));
        let entered = |band: Band| current.band == band && previous.map(|p| p.band) != Some(band);

        if entered(Band::Below) {
            Signal::Long
        } else if entered(Band::Above) {
            Signal::Short
        } else if current.band == Band::Inside
            && previous.is_some_and(|p| crossing(Some(p.middle), current.middle).is_some())
        {
            Signal::Close
        } else {
            Signal::Hold
        }
    }

    fn validate(&self) -> Result<()> {
        if self.period < 2 {
            return Err(Error::InvalidParameter(format!(
                "bollinger period must be at least 2 (got {})",
                self.period
            )));
        }
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "bollinger width must be positive (got {})",
                self.width
            )));
        }
        Ok(())
    }
}
