/// Direction of an open position.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSide {
    /// Profits when the price rises.
    Long,
    /// Profits when the price falls.
    Short,
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => f.write_str("LONG"),
            Self::Short => f.write_str("SHORT"),
        }
    }
}

/// Current exposure of the account, `Flat` when no position is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    /// No open position.
    Flat,
    /// A long position is open.
    Long,
    /// A short position is open.
    Short,
}

impl From<Option<&Position>> for Exposure {
    fn from(position: Option<&Position>) -> Self {
        match position.map(Position::side) {
            None => Self::Flat,
            Some(PositionSide::Long) => Self::Long,
            Some(PositionSide::Short) => Self::Short,
        }
    }
}

/// An open position. A flat account holds no `Position` at all.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    side: PositionSide,
    entry_price: f64,
    size: f64,
    // fee paid on the entry leg, realized when the position closes
    entry_fee: f64,
}

impl Position {
    pub(crate) fn new(side: PositionSide, entry_price: f64, size: f64, entry_fee: f64) -> Self {
        Self {
            side,
            entry_price,
            size,
            entry_fee,
        }
    }

    /// Returns the side of the position.
    pub fn side(&self) -> PositionSide {
        self.side
    }

    /// Returns the quantity held.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Returns the fill price of the entry.
    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    /// Returns the fee paid when the position was opened.
    pub fn entry_fee(&self) -> f64 {
        self.entry_fee
    }

    /// Returns the notional value at entry (price * size).
    pub fn cost(&self) -> f64 {
        self.entry_price * self.size
    }

    /// Profit or loss of the position at `exit_price`, before fees.
    pub fn gross_pnl(&self, exit_price: f64) -> f64 {
        match self.side {
            PositionSide::Long => (exit_price - self.entry_price) * self.size,
            PositionSide::Short => (self.entry_price - exit_price) * self.size,
        }
    }
}

#[cfg(test)]
#[test]
fn long_gross_pnl() {
    let position = Position::new(PositionSide::Long, 100.0, 2.0, 0.0);
    assert_eq!(position.gross_pnl(110.0), 20.0);
    assert_eq!(position.gross_pnl(95.0), -10.0);
    assert_eq!(position.cost(), 200.0);
}

#[cfg(test)]
#[test]
fn short_gross_pnl() {
    let position = Position::new(PositionSide::Short, 100.0, 2.0, 0.0);
    assert_eq!(position.gross_pnl(90.0), 20.0);
    assert_eq!(position.gross_pnl(105.0), -10.0);
}

#[cfg(test)]
#[test]
fn exposure_from_position() {
    let long = Position::new(PositionSide::Long, 100.0, 1.0, 0.0);
    let short = Position::new(PositionSide::Short, 100.0, 1.0, 0.0);
    assert_eq!(Exposure::from(None::<&Position>), Exposure::Flat);
    assert_eq!(Exposure::from(Some(&long)), Exposure::Long);
    assert_eq!(Exposure::from(Some(&short)), Exposure::Short);
}
