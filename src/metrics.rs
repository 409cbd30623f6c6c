//! Performance summary of a finished backtest.
//!
//! Everything is computed once, from the full trade journal:
//! - Net P&L and return
//! - Max drawdown on the realized equity curve
//! - Profit factor
//! - Win rate

use std::fmt;

use crate::PercentCalculus;
use crate::journal::TradeRecord;

/// Key figures of a run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    initial_balance: f64,
    final_balance: f64,
    net_pnl: f64,
    total_trades: usize,
    wins: usize,
    max_drawdown: f64,
    gross_profit: f64,
    gross_loss: f64,
    total_fees: f64,
    shortfall: f64,
}

impl Summary {
    /// Computes the summary of the records produced by a run that started with
    /// `initial_balance` in cash.
    pub fn from_records(initial_balance: f64, records: &[TradeRecord]) -> Self {
        let mut equity = initial_balance;
        let mut peak = initial_balance;
        let mut max_drawdown: f64 = 0.0;
        let mut gross_profit = 0.0;
        let mut gross_loss = 0.0;
        let mut total_trades = 0;
        let mut wins = 0;

        for pnl in records.iter().filter_map(TradeRecord::realized_pnl) {
            total_trades += 1;
            if pnl > 0.0 {
                wins += 1;
                gross_profit += pnl;
            } else {
                gross_loss += pnl.abs();
            }

            equity += pnl;
            peak = peak.max(equity);
            if peak > 0.0 {
                max_drawdown = max_drawdown.max((peak - equity) / peak);
            }
        }

        Self {
            initial_balance,
            final_balance: records.last().map_or(initial_balance, TradeRecord::balance),
            net_pnl: gross_profit - gross_loss,
            total_trades,
            wins,
            max_drawdown: max_drawdown * 100.0,
            gross_profit,
            gross_loss,
            total_fees: records.iter().map(TradeRecord::fee).sum(),
            shortfall: records.iter().map(TradeRecord::shortfall).sum(),
        }
    }

    /// Returns the starting cash.
    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    /// Returns the cash after the last record.
    pub fn final_balance(&self) -> f64 {
        self.final_balance
    }

    /// Returns the sum of realized profits and losses, fees included.
    pub fn net_pnl(&self) -> f64 {
        self.net_pnl
    }

    /// Returns the number of closed trades (closes and reversals).
    pub fn total_trades(&self) -> usize {
        self.total_trades
    }

    /// Returns the number of trades closed with a profit.
    pub fn wins(&self) -> usize {
        self.wins
    }

    /// Returns the percentage of winning trades, `0` without trades.
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        (self.wins as f64 / self.total_trades as f64) * 100.0
    }

    /// Returns the largest peak-to-trough decline of realized equity, in percent.
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    /// Returns gross profits over gross losses, infinite without losses.
    pub fn profit_factor(&self) -> f64 {
        if self.gross_loss == 0.0 {
            return f64::INFINITY;
        }
        self.gross_profit / self.gross_loss
    }

    /// Returns the fees paid on every leg.
    pub fn total_fees(&self) -> f64 {
        self.total_fees
    }

    /// Returns the loss a forced close could not cover with cash.
    ///
    /// `final_balance = initial_balance + net_pnl + shortfall`.
    pub fn shortfall(&self) -> f64 {
        self.shortfall
    }

    /// Returns the change of the balance over the run, in percent.
    pub fn return_pct(&self) -> f64 {
        self.initial_balance.change(self.final_balance)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Backtest Summary ===")?;
        writeln!(f, "Initial Balance: {:.2}", self.initial_balance)?;
        writeln!(f, "Final Balance: {:.2}", self.final_balance)?;
        writeln!(f, "Net P&L: {:.2} ({:.2}%)", self.net_pnl, self.return_pct())?;
        writeln!(f, "Fees paid: {:.2}", self.total_fees)?;
        if self.shortfall > 0.0 {
            writeln!(f, "Uncovered loss: {:.2}", self.shortfall)?;
        }
        #[allow(clippy::writeln_empty_string)]
        writeln!(f, "")?;
        writeln!(f, "Trades: {} ({} won)", self.total_trades, self.wins)?;
        writeln!(f, "Win Rate: {:.2}%", self.win_rate())?;
        writeln!(f, "Max Drawdown: {:.2}%", self.max_drawdown)?;
        write!(f, "Profit Factor: {:.2}", self.profit_factor())
    }
}

/// Outcome of [`Backtest::run`](crate::engine::Backtest::run).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    summary: Summary,
    records: Vec<TradeRecord>,
    rejections: usize,
}

impl Report {
    pub(crate) fn new(summary: Summary, records: Vec<TradeRecord>, rejections: usize) -> Self {
        Self {
            summary,
            records,
            rejections,
        }
    }

    /// Returns the summary.
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Returns every record, in execution order.
    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    /// Returns the number of fills rejected for lack of funds.
    pub fn rejections(&self) -> usize {
        self.rejections
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary)?;
        write!(f, "Rejected fills: {}", self.rejections)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::journal::TradeAction;

    fn open(balance: f64) -> TradeRecord {
        TradeRecord::new(DateTime::default(), TradeAction::OpenLong, 100.0, 1.0, 0.5, None, balance, false)
    }

    fn close(pnl: f64, balance: f64) -> TradeRecord {
        TradeRecord::new(DateTime::default(), TradeAction::CloseLong, 100.0, 1.0, 0.5, Some(pnl), balance, false)
    }

    #[test]
    fn empty_journal() {
        let summary = Summary::from_records(10_000.0, &[]);
        assert_eq!(summary.final_balance(), 10_000.0);
        assert_eq!(summary.net_pnl(), 0.0);
        assert_eq!(summary.total_trades(), 0);
        assert_eq!(summary.win_rate(), 0.0);
        assert_eq!(summary.max_drawdown(), 0.0);
        assert_eq!(summary.profit_factor(), f64::INFINITY);
        assert_eq!(summary.return_pct(), 0.0);
    }

    #[test]
    fn max_drawdown() {
        let records = [
            open(9_900.0),
            close(2_000.0, 12_000.0),
            open(11_900.0),
            close(-3_000.0, 9_000.0),
            open(8_900.0),
            close(2_000.0, 11_000.0),
        ];
        let summary = Summary::from_records(10_000.0, &records);
        assert_eq!(summary.max_drawdown(), 25.0); // (12000 - 9000) / 12000
        assert_eq!(summary.final_balance(), 11_000.0);
        assert_eq!(summary.net_pnl(), 1_000.0);
        assert_eq!(summary.return_pct(), 10.0);
    }

    #[test]
    fn profit_factor_and_win_rate() {
        let records = [open(0.0), close(20.0, 0.0), open(0.0), close(-10.0, 0.0)];
        let summary = Summary::from_records(10_000.0, &records);
        assert_eq!(summary.profit_factor(), 2.0);
        assert_eq!(summary.total_trades(), 2);
        assert_eq!(summary.wins(), 1);
        assert_eq!(summary.win_rate(), 50.0);
        assert_eq!(summary.total_fees(), 2.0);
    }

    #[test]
    fn break_even_is_not_a_win() {
        let summary = Summary::from_records(1_000.0, &[open(900.0), close(0.0, 1_000.0)]);
        assert_eq!(summary.wins(), 0);
        assert_eq!(summary.win_rate(), 0.0);
    }

    #[test]
    fn shortfall_is_summed() {
        let liquidated = TradeRecord::new(DateTime::default(), TradeAction::CloseShort, 250.0, 1.0, 0.0, Some(-150.0), 0.0, true)
            .with_shortfall(49.0);
        let records = [open(1.0), liquidated];
        let summary = Summary::from_records(101.0, &records);
        assert_eq!(summary.net_pnl(), -150.0);
        assert_eq!(summary.final_balance(), 0.0);
        assert_eq!(summary.shortfall(), 49.0);
        assert_eq!(summary.initial_balance() + summary.net_pnl() + summary.shortfall(), summary.final_balance());
        assert!(summary.to_string().contains("Uncovered loss: 49.00"));
    }

    #[test]
    fn display() {
        let summary = Summary::from_records(1_000.0, &[open(900.0), close(10.0, 1_010.0)]);
        let text = summary.to_string();
        assert!(text.starts_with("=== Backtest Summary ==="));
        assert!(text.contains("Final Balance: 1010.00"));
        assert!(text.contains("Win Rate: 100.00%"));
        assert!(!text.contains("Uncovered loss"));
    }
}
