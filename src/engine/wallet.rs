#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Cash account of a simulated exchange.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Wallet {
    // Initial balance used for reset
    initial_balance: f64,
    // Available cash
    balance: f64,
    // Profit/loss realized by closed positions, fees included
    realized_pnl: f64,
    // Cumulative fees paid
    fees: f64,
}

impl Wallet {
    /// Creates a new wallet with the given initial balance.
    /// Negative balances are rejected.
    pub fn new(balance: f64) -> Result<Self> {
        if balance <= 0.0 || !balance.is_finite() {
            return Err(Error::NegZeroBalance(balance));
        }

        Ok(Self {
            balance,
            fees: 0.0,
            realized_pnl: 0.0,
            initial_balance: balance,
        })
    }

    /// Returns the balance the wallet started with.
    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    /// Returns the cash balance.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Returns the realized profit and loss.
    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Returns the fees paid to the market.
    pub fn fees_paid(&self) -> f64 {
        self.fees
    }

    /// Pays `amount` plus `fee` out of the balance.
    /// Nothing changes if the balance cannot cover both.
    pub(crate) fn debit(&mut self, amount: f64, fee: f64) -> Result<f64> {
        let required = amount + fee;
        if required > self.balance {
            return Err(Error::InsufficientFunds(required, self.balance));
        }
        self.balance -= required;
        self.fees += fee;
        Ok(self.balance)
    }

    /// Receives `amount` minus `fee` and books `pnl` as realized.
    /// Nothing changes if the result would be negative.
    pub(crate) fn credit(&mut self, amount: f64, fee: f64, pnl: f64) -> Result<f64> {
        let balance = self.balance + amount - fee;
        if balance < 0.0 {
            return Err(Error::InsufficientFunds(fee - amount, self.balance));
        }
        self.balance = balance;
        self.fees += fee;
        self.realized_pnl += pnl;
        Ok(self.balance)
    }

    /// Receives `amount` minus `fee` and books `pnl` as realized, whatever the
    /// outcome. The balance stops at zero: returns it together with the part
    /// of the loss the cash could not cover.
    pub(crate) fn liquidate(&mut self, amount: f64, fee: f64, pnl: f64) -> (f64, f64) {
        let balance = self.balance + amount - fee;
        self.balance = balance.max(0.0);
        self.fees += fee;
        self.realized_pnl += pnl;
        (self.balance, (-balance).max(0.0))
    }

    /// Resets the wallet to its initial balance.
    pub(crate) fn reset(&mut self) {
        self.fees = 0.0;
        self.realized_pnl = 0.0;
        self.balance = self.initial_balance;
    }
}

#[cfg(test)]
#[test]
fn new_wallet_valid_balance() {
    let wallet = Wallet::new(100.0).unwrap();
    assert_eq!(wallet.balance(), 100.0);
    assert_eq!(wallet.initial_balance(), 100.0);
    assert_eq!(wallet.fees_paid(), 0.0);
}

#[cfg(test)]
#[test]
fn new_wallet_invalid_balance() {
    let result = Wallet::new(0.0);
    assert!(matches!(result, Err(Error::NegZeroBalance(_))));

    let result = Wallet::new(-10.0);
    assert!(matches!(result, Err(Error::NegZeroBalance(_))));

    let result = Wallet::new(f64::NAN);
    assert!(matches!(result, Err(Error::NegZeroBalance(_))));
}

#[cfg(test)]
#[test]
fn debit_funds() {
    let mut wallet = Wallet::new(100.0).unwrap();
    let balance = wallet.debit(20.0, 0.5).unwrap();
    assert_eq!(balance, 79.5);
    assert_eq!(wallet.fees_paid(), 0.5);
}

#[cfg(test)]
#[test]
fn debit_insufficient_funds() {
    let mut wallet = Wallet::new(100.0).unwrap();
    let result = wallet.debit(100.0, 0.1);
    assert!(matches!(result, Err(Error::InsufficientFunds(_, _))));
    assert_eq!(wallet.balance(), 100.0);
    assert_eq!(wallet.fees_paid(), 0.0);
}

#[cfg(test)]
#[test]
fn credit_funds() {
    let mut wallet = Wallet::new(100.0).unwrap();
    wallet.debit(50.0, 0.0).unwrap();
    // close profitable position
    let balance = wallet.credit(60.0, 1.0, 9.0).unwrap(); // 50.0 (cost) + 10.0 (profit) - 1.0 (fee)
    assert_eq!(balance, 109.0);
    assert_eq!(wallet.realized_pnl(), 9.0);
    assert_eq!(wallet.fees_paid(), 1.0);
}

#[cfg(test)]
#[test]
fn credit_cannot_overdraw() {
    let mut wallet = Wallet::new(10.0).unwrap();
    // short squeezed far beyond twice its entry
    let result = wallet.credit(-15.0, 0.0, -15.0);
    assert!(matches!(result, Err(Error::InsufficientFunds(_, _))));
    assert_eq!(wallet.balance(), 10.0);
    assert_eq!(wallet.realized_pnl(), 0.0);
}

#[cfg(test)]
#[test]
fn liquidate_reports_shortfall() {
    let mut wallet = Wallet::new(101.0).unwrap();
    wallet.debit(100.0, 0.0).unwrap();
    // short from 100 closed at 250
    let (balance, shortfall) = wallet.liquidate(100.0 - 150.0, 0.0, -150.0);
    assert_eq!(balance, 0.0);
    assert_eq!(shortfall, 49.0);
    assert_eq!(wallet.balance(), 0.0);
    assert_eq!(wallet.realized_pnl(), -150.0);

    let mut wallet = Wallet::new(100.0).unwrap();
    assert_eq!(wallet.liquidate(10.0, 1.0, 9.0), (109.0, 0.0));
}

#[cfg(test)]
#[test]
fn reset_wallet() {
    let mut wallet = Wallet::new(100.0).unwrap();
    wallet.debit(20.0, 0.2).unwrap();
    wallet.credit(10.0, 0.1, -10.3).unwrap();

    wallet.reset();
    assert_eq!(wallet.fees_paid(), 0.0);
    assert_eq!(wallet.realized_pnl(), 0.0);
    assert_eq!(wallet.balance(), 100.0);
}
