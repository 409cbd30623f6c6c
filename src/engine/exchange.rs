use tracing::{debug, warn};

use super::{Candle, Decision, Exposure, Position, PositionSide, Wallet, decide};
use crate::config::{BacktestConfig, ReversalLog};
use crate::errors::{Error, Result};
use crate::journal::{TradeAction, TradeRecord};
use crate::strategy::Signal;

/// Single-instrument exchange filling every order at the candle close.
///
/// Holds the cash account and at most one open position. Each fill is charged
/// `price * quantity * fee_rate`.
#[derive(Debug, Clone)]
pub struct SimulatedExchange {
    quantity: f64,
    fee_rate: f64,
    reversal: ReversalLog,
    wallet: Wallet,
    position: Option<Position>,
}

impl SimulatedExchange {
    /// Creates a flat exchange holding `initial_capital` in cash.
    pub fn new(initial_capital: f64, quantity: f64, fee_rate: f64, reversal: ReversalLog) -> Result<Self> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(Error::InvalidQuantity(quantity));
        }
        if !(0.0..1.0).contains(&fee_rate) {
            return Err(Error::InvalidFeeRate(fee_rate));
        }

        Ok(Self {
            quantity,
            fee_rate,
            reversal,
            wallet: Wallet::new(initial_capital)?,
            position: None,
        })
    }

    /// Creates the exchange described by a run configuration.
    pub fn from_config(config: &BacktestConfig) -> Result<Self> {
        Self::new(config.initial_capital, config.quantity, config.fee_rate, config.reversal)
    }

    /// Returns the open position, `None` when flat.
    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Returns the current exposure.
    pub fn exposure(&self) -> Exposure {
        Exposure::from(self.position())
    }

    /// Returns the cash account.
    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Applies `signal` at the close of `candle`.
    ///
    /// Returns one result per attempted leg: nothing for a no-op, one for an
    /// open or a close, two for a chained reversal. A failed leg leaves the
    /// account as it was before that leg.
    pub fn execute(&mut self, signal: Signal, candle: &Candle) -> Vec<Result<TradeRecord>> {
        match decide(self.exposure(), signal) {
            Decision::Nothing => Vec::new(),
            Decision::Open(side) => vec![self.open(side, candle)],
            Decision::Close => vec![self.close(candle, false)],
            Decision::Reverse(side) => self.reverse(side, candle),
        }
    }

    /// Closes the open position, if any, and marks the record as forced.
    ///
    /// The close always settles: a loss larger than the cash empties the
    /// account and the uncovered part is reported as the record's shortfall.
    pub fn force_close(&mut self, candle: &Candle) -> Result<Option<TradeRecord>> {
        if self.position.is_none() {
            return Ok(None);
        }
        self.close(candle, true).map(Some)
    }

    /// Opens a position of the configured quantity.
    pub fn open(&mut self, side: PositionSide, candle: &Candle) -> Result<TradeRecord> {
        if self.position.is_some() {
            return Err(Error::PositionAlreadyOpen);
        }
        let price = fill_price(candle)?;
        let notional = price * self.quantity;
        let fee = notional * self.fee_rate;

        let balance = self.wallet.debit(notional, fee)?;
        self.position = Some(Position::new(side, price, self.quantity, fee));
        debug!(%side, price, fee, balance, "position opened");

        Ok(TradeRecord::new(
            candle.timestamp(),
            TradeAction::open(side),
            price,
            self.quantity,
            fee,
            None,
            balance,
            false,
        ))
    }

    /// Closes the open position.
    ///
    /// A regular close that would leave negative cash is rejected, a `forced`
    /// one liquidates the account instead.
    pub fn close(&mut self, candle: &Candle, forced: bool) -> Result<TradeRecord> {
        let position = self.position.ok_or(Error::PositionNotFound)?;
        let price = fill_price(candle)?;
        let fee = price * position.size() * self.fee_rate;
        let gross = position.gross_pnl(price);
        let pnl = gross - position.entry_fee() - fee;

        // the cost locked at entry comes back together with the gross result
        let amount = position.cost() + gross;
        let (balance, shortfall) = if forced {
            self.wallet.liquidate(amount, fee, pnl)
        } else {
            (self.wallet.credit(amount, fee, pnl)?, 0.0)
        };
        self.position = None;
        debug!(side = %position.side(), price, pnl, balance, forced, "position closed");
        if shortfall > 0.0 {
            warn!(side = %position.side(), price, shortfall, "loss exceeds the available cash");
        }

        let record = TradeRecord::new(
            candle.timestamp(),
            TradeAction::close(position.side()),
            price,
            position.size(),
            fee,
            Some(pnl),
            balance,
            forced,
        );
        Ok(record.with_shortfall(shortfall))
    }

    fn reverse(&mut self, to: PositionSide, candle: &Candle) -> Vec<Result<TradeRecord>> {
        let close = match self.close(candle, false) {
            Ok(close) => close,
            Err(err) => return vec![Err(err)],
        };
        match (self.reversal, self.open(to, candle)) {
            (ReversalLog::Combined, Ok(open)) => vec![Ok(TradeRecord::reversal(&close, &open, to))],
            (_, open) => vec![Ok(close), open],
        }
    }

    /// Goes back to a flat account holding the initial capital.
    pub fn reset(&mut self) {
        self.wallet.reset();
        self.position = None;
    }
}

fn fill_price(candle: &Candle) -> Result<f64> {
    let price = candle.close();
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::InvalidPrice(price));
    }
    Ok(price)
}
