use chrono::{DateTime, Utc};

use crate::errors::{Error, Result};

/// One OHLCV sample for a fixed time interval.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

type C = (DateTime<Utc>, f64, f64, f64, f64, f64);
impl From<C> for Candle {
    fn from((timestamp, open, high, low, close, volume): C) -> Self {
        Self::new(timestamp, open, high, low, close, volume)
    }
}

impl Candle {
    /// Creates a candle without validating it.
    ///
    /// Use [`CandleBuilder`] to get a validated candle; feeds built with `new` are
    /// checked by [`validate_feed`] before a backtest starts.
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns the opening time of the candle.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the open price.
    pub fn open(&self) -> f64 {
        self.open
    }

    /// Returns the highest price.
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Returns the lowest price.
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Returns the close price.
    pub fn close(&self) -> f64 {
        self.close
    }

    /// Returns the traded volume.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Returns the name of the first invalid field, if any.
    pub(crate) fn malformed_field(&self) -> Option<&'static str> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (field, price) in prices {
            if !price.is_finite() || price <= 0.0 {
                return Some(field);
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Some("volume");
        }
        if self.high < self.low {
            return Some("high");
        }
        None
    }
}

/// Checks every candle of the feed up front.
///
/// Fails on the first malformed candle so that a bad feed is reported before the
/// simulation starts rather than halfway through it.
pub fn validate_feed(candles: &[Candle]) -> Result<()> {
    if candles.is_empty() {
        return Err(Error::CandleDataEmpty);
    }
    for (index, candle) in candles.iter().enumerate() {
        if let Some(field) = candle.malformed_field() {
            return Err(Error::MalformedCandle { index, field });
        }
    }
    Ok(())
}

/// Builder for [`Candle`] that rejects missing and malformed values.
#[derive(Debug, Default)]
pub struct CandleBuilder {
    timestamp: Option<DateTime<Utc>>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

impl CandleBuilder {
    /// Starts an empty builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Sets the opening time.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the open price.
    pub fn open(mut self, open: f64) -> Self {
        self.open = Some(open);
        self
    }

    /// Sets the highest price.
    pub fn high(mut self, high: f64) -> Self {
        self.high = Some(high);
        self
    }

    /// Sets the lowest price.
    pub fn low(mut self, low: f64) -> Self {
        self.low = Some(low);
        self
    }

    /// Sets the close price.
    pub fn close(mut self, close: f64) -> Self {
        self.close = Some(close);
        self
    }

    /// Sets the volume.
    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Builds the candle.
    pub fn build(self) -> Result<Candle> {
        let candle = Candle::new(
            self.timestamp.ok_or(Error::MissingField("timestamp"))?,
            self.open.ok_or(Error::MissingField("open"))?,
            self.high.ok_or(Error::MissingField("high"))?,
            self.low.ok_or(Error::MissingField("low"))?,
            self.close.ok_or(Error::MissingField("close"))?,
            self.volume.ok_or(Error::MissingField("volume"))?,
        );
        match candle.malformed_field() {
            Some(field) => Err(Error::InvalidCandle(field)),
            None => Ok(candle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time() -> DateTime<Utc> {
        DateTime::from_timestamp_secs(1515151515).unwrap()
    }

    #[test]
    fn build_valid_candle() {
        let candle = CandleBuilder::builder()
            .timestamp(time())
            .open(100.0)
            .high(110.0)
            .low(95.0)
            .close(105.0)
            .volume(1.0)
            .build()
            .unwrap();

        assert_eq!(candle.close(), 105.0);
        assert_eq!(candle.timestamp(), time());
    }

    #[test]
    fn build_missing_field() {
        let result = CandleBuilder::builder().timestamp(time()).open(100.0).build();
        assert!(matches!(result, Err(Error::MissingField("high"))));
    }

    #[test]
    fn build_rejects_nan_close() {
        let result = CandleBuilder::builder()
            .timestamp(time())
            .open(100.0)
            .high(110.0)
            .low(95.0)
            .close(f64::NAN)
            .volume(1.0)
            .build();
        assert!(matches!(result, Err(Error::InvalidCandle("close"))));
    }

    #[test]
    fn feed_reports_first_malformed_index() {
        let good = Candle::new(time(), 100.0, 101.0, 99.0, 100.0, 1.0);
        let inverted = Candle::new(time(), 100.0, 90.0, 99.0, 100.0, 1.0);
        let negative_volume = Candle::new(time(), 100.0, 101.0, 99.0, 100.0, -1.0);

        assert!(validate_feed(&[good, good]).is_ok());
        assert!(matches!(
            validate_feed(&[good, inverted, negative_volume]),
            Err(Error::MalformedCandle { index: 1, field: "high" })
        ));
        assert!(matches!(
            validate_feed(&[good, negative_volume]),
            Err(Error::MalformedCandle { index: 1, field: "volume" })
        ));
    }

    #[test]
    fn feed_empty() {
        assert!(matches!(validate_feed(&[]), Err(Error::CandleDataEmpty)));
    }
}
