//! Core simulation components.
//!
//! This module provides the fundamental types for backtesting:
//! - `Candle`: OHLCV data for backtesting.
//! - `Position`: the single open trade, if any.
//! - `Wallet`: tracks cash, fees and realized P&L.
//! - `SimulatedExchange`: turns signals into fills.
//! - `Backtest`: replays a candle feed against a strategy.

mod candle;
mod decision;
mod exchange;
mod position;
mod wallet;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::BacktestConfig;
use crate::errors::{Error, Result};
use crate::journal::{Journal, TradeRecord};
use crate::metrics::{Report, Summary};
use crate::strategy::Strategy;

pub use candle::*;
pub use decision::*;
pub use exchange::*;
pub use position::*;
pub use wallet::*;

#[cfg(test)]
mod bt;

/// Backtesting engine for signal-driven strategies.
///
/// Owns the candle feed, a [`SimulatedExchange`] and the [`Journal`] of the
/// current run. Derefs to the [`Wallet`] of the exchange.
#[derive(Debug)]
pub struct Backtest {
    data: Arc<[Candle]>,
    config: BacktestConfig,
    exchange: SimulatedExchange,
    journal: Journal,
    rejections: usize,
}

impl std::ops::Deref for Backtest {
    type Target = Wallet;

    fn deref(&self) -> &Self::Target {
        self.exchange.wallet()
    }
}

impl Backtest {
    /// Creates a new backtest instance.
    ///
    /// ### Arguments
    /// * `data` - Candle feed, oldest first.
    /// * `config` - Capital, fill size, fees and strategy of the run.
    ///
    /// ### Errors
    /// The whole feed and the configuration are checked here, so nothing can
    /// fail on bad input once a run has started:
    /// - [`Error::CandleDataEmpty`] and [`Error::MalformedCandle`] for the feed.
    /// - [`Error::LookbackTooLong`] if the strategy needs as many candles as the feed holds.
    /// - Any error of [`BacktestConfig::validate`].
    pub fn new(data: impl Into<Arc<[Candle]>>, config: BacktestConfig) -> Result<Self> {
        let data = data.into();
        validate_feed(&data)?;
        config.validate()?;
        check_lookback(config.strategy.min_history(), data.len())?;

        Ok(Self {
            exchange: SimulatedExchange::from_config(&config)?,
            journal: Journal::new(),
            rejections: 0,
            config,
            data,
        })
    }

    /// Returns the candle feed.
    pub fn data(&self) -> &[Candle] {
        &self.data
    }

    #[cfg(feature = "optimizer")]
    pub(crate) fn shared_data(&self) -> Arc<[Candle]> {
        Arc::clone(&self.data)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Returns the exchange.
    pub fn exchange(&self) -> &SimulatedExchange {
        &self.exchange
    }

    /// Returns the open position, if any.
    pub fn position(&self) -> Option<&Position> {
        self.exchange.position()
    }

    /// Returns the journal of the last run.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Returns the number of fills rejected during the last run.
    pub fn rejections(&self) -> usize {
        self.rejections
    }

    /// Runs the configured strategy over the whole feed.
    pub fn run(&mut self) -> Result<Report> {
        let strategy = self.config.strategy.clone();
        self.run_with(&strategy)
    }

    /// Runs `strategy` over the whole feed.
    ///
    /// The strategy sees the history up to and including candle `i` and its
    /// signal fills at the close of candle `i`. The first evaluated candle is
    /// the one completing [`Strategy::min_history`]. The last candle only
    /// settles: any position still open is force-closed at its close, and a
    /// loss beyond the cash shows up as [`Summary::shortfall`].
    ///
    /// Every run starts from the initial state, so running twice gives the
    /// same report.
    pub fn run_with<S: Strategy + ?Sized>(&mut self, strategy: &S) -> Result<Report> {
        self.reset();
        strategy.validate()?;
        let lookback = strategy.min_history().max(1);
        check_lookback(lookback, self.data.len())?;

        info!(
            strategy = strategy.name(),
            candles = self.data.len(),
            balance = self.initial_balance(),
            "backtest started"
        );

        let data = Arc::clone(&self.data);
        for index in lookback - 1..data.len() - 1 {
            let signal = strategy.signal(&data[..=index]);
            for leg in self.exchange.execute(signal, &data[index]) {
                self.record(index, leg)?;
            }
        }

        let last = data.last().ok_or(Error::CandleDataEmpty)?;
        if let Some(leg) = self.exchange.force_close(last).transpose() {
            self.record(data.len() - 1, leg)?;
        }

        let records = self.journal.all_records().to_vec();
        let summary = Summary::from_records(self.initial_balance(), &records);
        info!(
            trades = summary.total_trades(),
            net_pnl = summary.net_pnl(),
            balance = summary.final_balance(),
            rejections = self.rejections,
            "backtest finished"
        );

        Ok(Report::new(summary, records, self.rejections))
    }

    fn record(&mut self, index: usize, leg: Result<TradeRecord>) -> Result<()> {
        match leg {
            Ok(record) => self.journal.append(record),
            Err(Error::InsufficientFunds(required, available)) => {
                self.rejections += 1;
                warn!(index, required, available, "fill rejected: insufficient funds");
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    /// Resets the backtest to its initial state.
    pub fn reset(&mut self) {
        self.exchange.reset();
        self.journal = Journal::new();
        self.rejections = 0;
    }
}

fn check_lookback(lookback: usize, candles: usize) -> Result<()> {
    if lookback >= candles {
        return Err(Error::LookbackTooLong { lookback, candles });
    }
    Ok(())
}
