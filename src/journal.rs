//! Append-only trade journal.
//!
//! Every fill that changes the account produces exactly one [`TradeRecord`], in
//! execution order. A fresh [`Journal`] is used for every backtest run.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::engine::PositionSide;

/// Kind of state transition a record describes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    /// Flat to long.
    OpenLong,
    /// Flat to short.
    OpenShort,
    /// Long to flat.
    CloseLong,
    /// Short to flat.
    CloseShort,
    /// Short to long in a single record.
    ReverseToLong,
    /// Long to short in a single record.
    ReverseToShort,
}

impl TradeAction {
    pub(crate) fn open(side: PositionSide) -> Self {
        match side {
            PositionSide::Long => Self::OpenLong,
            PositionSide::Short => Self::OpenShort,
        }
    }

    pub(crate) fn close(side: PositionSide) -> Self {
        match side {
            PositionSide::Long => Self::CloseLong,
            PositionSide::Short => Self::CloseShort,
        }
    }

    pub(crate) fn reverse(to: PositionSide) -> Self {
        match to {
            PositionSide::Long => Self::ReverseToLong,
            PositionSide::Short => Self::ReverseToShort,
        }
    }

    /// True for actions that leave a position open: opens and reversals.
    pub fn is_open(self) -> bool {
        !matches!(self, Self::CloseLong | Self::CloseShort)
    }

    /// True for actions that realize profit or loss: closes and reversals.
    pub fn is_close(self) -> bool {
        !matches!(self, Self::OpenLong | Self::OpenShort)
    }

    /// Order side sent to the market: `Buy` or `Sell`.
    pub fn order_side(self) -> &'static str {
        match self {
            Self::OpenLong | Self::CloseShort | Self::ReverseToLong => "Buy",
            Self::OpenShort | Self::CloseLong | Self::ReverseToShort => "Sell",
        }
    }

    /// Stable upper-case name used in exported logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenLong => "OPEN_LONG",
            Self::OpenShort => "OPEN_SHORT",
            Self::CloseLong => "CLOSE_LONG",
            Self::CloseShort => "CLOSE_SHORT",
            Self::ReverseToLong => "REVERSE_TO_LONG",
            Self::ReverseToShort => "REVERSE_TO_SHORT",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed, balance-affecting transition.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeRecord {
    timestamp: DateTime<Utc>,
    action: TradeAction,
    price: f64,
    size: f64,
    fee: f64,
    realized_pnl: Option<f64>,
    balance: f64,
    forced: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    shortfall: f64,
}

impl TradeRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        timestamp: DateTime<Utc>,
        action: TradeAction,
        price: f64,
        size: f64,
        fee: f64,
        realized_pnl: Option<f64>,
        balance: f64,
        forced: bool,
    ) -> Self {
        Self {
            timestamp,
            action,
            price,
            size,
            fee,
            realized_pnl,
            balance,
            forced,
            shortfall: 0.0,
        }
    }

    pub(crate) fn with_shortfall(mut self, shortfall: f64) -> Self {
        self.shortfall = shortfall;
        self
    }

    /// Merges the two legs of a reversal into a single record.
    pub(crate) fn reversal(close: &Self, open: &Self, to: PositionSide) -> Self {
        Self {
            timestamp: open.timestamp,
            action: TradeAction::reverse(to),
            price: open.price,
            size: open.size,
            fee: close.fee + open.fee,
            realized_pnl: close.realized_pnl,
            balance: open.balance,
            forced: false,
            shortfall: 0.0,
        }
    }

    /// Time of the candle the fill happened on.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// What the fill did.
    pub fn action(&self) -> TradeAction {
        self.action
    }

    /// Fill price.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Filled quantity.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Fee charged on this record.
    pub fn fee(&self) -> f64 {
        self.fee
    }

    /// Realized profit or loss, net of entry and exit fees. `None` for opens.
    pub fn realized_pnl(&self) -> Option<f64> {
        self.realized_pnl
    }

    /// Cash balance right after the fill.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Part of a forced close's loss the cash could not cover, `0` otherwise.
    pub fn shortfall(&self) -> f64 {
        self.shortfall
    }

    /// True when the engine closed the position at the end of the replay.
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Status column of the exported log.
    pub fn status(&self) -> &'static str {
        match self.action {
            _ if self.forced => "CLOSED_AT_END",
            TradeAction::OpenLong | TradeAction::OpenShort => "EXECUTED",
            TradeAction::CloseLong | TradeAction::CloseShort => "CLOSED",
            TradeAction::ReverseToLong | TradeAction::ReverseToShort => "REVERSED",
        }
    }
}

/// Ordered, append-only collection of [`TradeRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    records: Vec<TradeRecord>,
}

impl Journal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record at the end of the journal.
    pub fn append(&mut self, record: TradeRecord) {
        self.records.push(record);
    }

    /// Returns every record in execution order.
    pub fn all_records(&self) -> &[TradeRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing was executed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the journal, returning its records.
    pub fn into_records(self) -> Vec<TradeRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(action: TradeAction, price: f64, pnl: Option<f64>) -> TradeRecord {
        TradeRecord::new(DateTime::default(), action, price, 1.0, 0.1, pnl, 1000.0, false)
    }

    #[test]
    fn append_keeps_order() {
        let mut journal = Journal::new();
        assert!(journal.is_empty());

        journal.append(record(TradeAction::OpenLong, 100.0, None));
        journal.append(record(TradeAction::CloseLong, 110.0, Some(9.8)));
        journal.append(record(TradeAction::OpenLong, 100.0, None));

        let actions: Vec<_> = journal.all_records().iter().map(|r| r.action()).collect();
        assert_eq!(
            actions,
            vec![TradeAction::OpenLong, TradeAction::CloseLong, TradeAction::OpenLong]
        );
        assert_eq!(journal.len(), 3);
        assert_eq!(journal.into_records()[1].price(), 110.0);
    }

    #[test]
    fn action_sides() {
        assert_eq!(TradeAction::OpenLong.order_side(), "Buy");
        assert_eq!(TradeAction::CloseLong.order_side(), "Sell");
        assert_eq!(TradeAction::OpenShort.order_side(), "Sell");
        assert_eq!(TradeAction::CloseShort.order_side(), "Buy");
        assert_eq!(TradeAction::ReverseToShort.to_string(), "REVERSE_TO_SHORT");
        assert!(TradeAction::ReverseToLong.is_close());
        assert!(TradeAction::ReverseToLong.is_open());
        assert!(!TradeAction::OpenShort.is_close());
        assert!(!TradeAction::CloseShort.is_open());
    }

    #[test]
    fn reversal_merges_legs() {
        let close = TradeRecord::new(DateTime::default(), TradeAction::CloseLong, 110.0, 1.0, 0.11, Some(9.79), 1009.79, false);
        let open = TradeRecord::new(DateTime::default(), TradeAction::OpenShort, 110.0, 1.0, 0.11, None, 899.68, false);

        let merged = TradeRecord::reversal(&close, &open, PositionSide::Short);
        assert_eq!(merged.action(), TradeAction::ReverseToShort);
        assert_eq!(merged.fee(), 0.11 + 0.11);
        assert_eq!(merged.realized_pnl(), Some(9.79));
        assert_eq!(merged.balance(), 899.68);
        assert_eq!(merged.status(), "REVERSED");
    }

    #[test]
    fn forced_status() {
        let forced = TradeRecord::new(DateTime::default(), TradeAction::CloseShort, 99.0, 1.0, 0.0, Some(1.0), 1001.0, true);
        assert_eq!(forced.status(), "CLOSED_AT_END");
        assert_eq!(record(TradeAction::OpenShort, 99.0, None).status(), "EXECUTED");
    }
}
