use super::{Exposure, PositionSide};
use crate::strategy::Signal;

/// What the exchange has to do for a signal, given the current exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No fill.
    Nothing,
    /// Open a position on the given side.
    Open(PositionSide),
    /// Close the open position.
    Close,
    /// Close the open position, then open one on the given side.
    Reverse(PositionSide),
}

/// Decision table of the simulated exchange.
///
/// A signal agreeing with the open position, `Hold`, and `Close` while flat are
/// all no-ops.
pub fn decide(exposure: Exposure, signal: Signal) -> Decision {
    match (exposure, signal) {
        (_, Signal::Hold) => Decision::Nothing,
        (Exposure::Flat, Signal::Long) => Decision::Open(PositionSide::Long),
        (Exposure::Flat, Signal::Short) => Decision::Open(PositionSide::Short),
        (Exposure::Flat, Signal::Close) => Decision::Nothing,
        (Exposure::Long, Signal::Long) | (Exposure::Short, Signal::Short) => Decision::Nothing,
        (Exposure::Long, Signal::Short) => Decision::Reverse(PositionSide::Short),
        (Exposure::Short, Signal::Long) => Decision::Reverse(PositionSide::Long),
        (Exposure::Long | Exposure::Short, Signal::Close) => Decision::Close,
    }
}

#[cfg(test)]
#[test]
fn decision_table() {
    use Decision::*;
    use PositionSide::{Long, Short};

    let table = [
        (Exposure::Flat, Signal::Long, Open(Long)),
        (Exposure::Flat, Signal::Short, Open(Short)),
        (Exposure::Flat, Signal::Close, Nothing),
        (Exposure::Flat, Signal::Hold, Nothing),
        (Exposure::Long, Signal::Long, Nothing),
        (Exposure::Long, Signal::Short, Reverse(Short)),
        (Exposure::Long, Signal::Close, Close),
        (Exposure::Long, Signal::Hold, Nothing),
        (Exposure::Short, Signal::Long, Reverse(Long)),
        (Exposure::Short, Signal::Short, Nothing),
        (Exposure::Short, Signal::Close, Close),
        (Exposure::Short, Signal::Hold, Nothing),
    ];

    for (exposure, signal, expected) in table {
        assert_eq!(decide(exposure, signal), expected, "{exposure:?} + {signal}");
    }
}
