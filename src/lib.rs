//! # BTS Signal: signal-driven backtesting on candlestick data
//!
//! **BTS Signal** replays historical OHLCV candles against a trading strategy, simulates
//! the resulting fills on a single-instrument exchange and produces a trade log and a
//! performance summary.
//!
//! At every candle the strategy sees the history up to that candle and answers one of
//! `LONG`, `SHORT`, `CLOSE` or `HOLD`. The simulated exchange turns the signal into
//! zero, one or two fills at the candle close, charging a fixed fee rate on each leg.
//! Whatever is still open at the end of the feed is closed on the last candle.
//!
//! ## Core Components
//! | Component   | Description                                                                                     |
//! |-------------|-------------------------------------------------------------------------------------------------|
//! | **`Candle`** | OHLCV (Open, High, Low, Close, Volume) data for a single time period.                         |
//! | **`Strategy`** | Pure function of the candle history returning a `Signal`.                                   |
//! | **`SimulatedExchange`** | Position and cash bookkeeping, fees and reversals.                                 |
//! | **`Journal`** | Append-only log of every executed fill.                                                       |
//! | **`Summary`** | P&L, drawdown, profit factor and win rate, computed from the journal.                        |
//! | **`Optimizer`** | Parallel parameter search *(feature `optimizer`)*.                                          |
//! | **`Backtest`** | The engine that drives everything over historical data.                                     |
//!
//! ## Strategies
//! | Strategy                   | Indicators                        |
//! |----------------------------|-----------------------------------|
//! | **`MovingAverageCrossover`** | Two simple moving averages      |
//! | **`ExponentialCrossover`**   | Two exponential moving averages |
//! | **`PriceEmaCross`**          | Close price and one EMA         |
//! | **`RsiThreshold`**           | Relative strength index         |
//! | **`BollingerReversion`**     | Bollinger bands                 |
//!
//! Indicators are computed with the [`ta`](https://crates.io/crates/ta) crate.
//!
//! ## Getting Started
//! ```rust
//! use bts_signal::prelude::*;
//! use chrono::{DateTime, Duration};
//!
//! let start = DateTime::from_timestamp_secs(1515151515).unwrap();
//! let candles = [100.0, 102.0, 104.0, 101.0, 99.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &close)| {
//!         CandleBuilder::builder()
//!             .timestamp(start + Duration::minutes(i as i64))
//!             .open(close)
//!             .high(close)
//!             .low(close)
//!             .close(close)
//!             .volume(1.0)
//!             .build()
//!     })
//!     .collect::<Result<Vec<_>>>()
//!     .unwrap();
//!
//! let config = BacktestConfig::default()
//!     .with_quantity(1.0)
//!     .with_fee_rate(0.0)
//!     .with_strategy(StrategyKind::MovingAverageCrossover(MovingAverageCrossover::new(2, 3)));
//!
//! let mut backtest = Backtest::new(candles, config).unwrap();
//! let report = backtest.run().unwrap();
//!
//! // long at 104, closed at 99 on the last candle
//! assert_eq!(report.records().len(), 2);
//! assert_eq!(report.summary().net_pnl(), -5.0);
//! println!("{}", report.summary());
//! ```
//!
//! ### Output:
//! ```bash
//! === Backtest Summary ===
//! Initial Balance: 10000.00
//! Final Balance: 9995.00
//! Net P&L: -5.00 (-0.05%)
//! Fees paid: 0.00
//!
//! Trades: 1 (0 won)
//! Win Rate: 0.00%
//! Max Drawdown: 0.05%
//! Profit Factor: 0.00
//! ```
//!
//! ## Features
//! | Feature      | Description                                                           |
//! |--------------|-----------------------------------------------------------------------|
//! | `serde`      | `Serialize`/`Deserialize` for candles, records, configuration, reports. |
//! | `csv`        | CSV candle loading and trade log export ([`feed`]).                   |
//! | `optimizer`  | Parallel parameter optimization with [`rayon`](https://crates.io/crates/rayon). |
//! | `cli`        | The `bts-signal` command line tool *(default)*.                       |
//!
//! ## Error Handling
//! Invalid feeds and configurations are rejected by [`engine::Backtest::new`], before
//! anything is simulated. A fill the cash cannot cover is skipped and counted in
//! [`metrics::Report::rejections`].
//!
//! ## License
//! MIT
#![warn(missing_docs)]

/// Core simulation components: candles, positions, wallet, exchange and backtest loop.
pub mod engine;

/// Error types for the library.
pub mod errors;

/// Run configuration.
pub mod config;

/// Trade journal.
pub mod journal;

/// Performance summary: drawdown, profit factor, win rate, etc.
pub mod metrics;

/// Signal-producing strategies.
pub mod strategy;

/// CSV input and output.
#[cfg(feature = "csv")]
pub mod feed;

/// Strategy parameter optimization.
#[cfg(feature = "optimizer")]
pub mod optimizer;

/// Re-exports of commonly used types and traits for convenience.
pub mod prelude {
    pub use super::*;
    pub use crate::config::*;
    pub use crate::engine::*;
    pub use crate::errors::*;
    pub use crate::journal::*;
    pub use crate::metrics::*;
    pub use crate::strategy::*;

    #[cfg(feature = "csv")]
    pub use crate::feed::*;

    #[cfg(feature = "optimizer")]
    pub use crate::optimizer::*;
}

use std::ops::{Div, Mul, Sub};

/// Trait for performing percentage-based calculations.
pub trait PercentCalculus<Rhs = Self> {
    /// Calculates the percentage change between two values.
    ///
    /// ### Arguments
    /// * `new` - The new value to compare with.
    ///
    /// ### Returns
    /// The percentage change from the original value to the new value.
    fn change(self, new: Rhs) -> Self;
}

impl PercentCalculus for f64 {
    fn change(self, new: Self) -> Self {
        new.sub(self).div(self).mul(100.0)
    }
}
