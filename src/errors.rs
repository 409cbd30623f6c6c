/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring, validating or running a backtest.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The candle data provided is empty. Backtesting requires at least one candle.
    #[error("Candle data is empty: backtesting requires at least one candle")]
    CandleDataEmpty,

    /// A candle carries a missing, non-finite or inconsistent value.
    #[error("Malformed candle at index {index}: invalid `{field}`")]
    MalformedCandle {
        /// Position of the candle in the feed.
        index: usize,
        /// Name of the offending field.
        field: &'static str,
    },

    /// A candle built on its own carries a non-finite or inconsistent value.
    #[error("Invalid candle: invalid `{0}`")]
    InvalidCandle(&'static str),

    /// A required field was not given to the candle builder.
    #[error("Missing candle field: `{0}`")]
    MissingField(&'static str),

    /// A timestamp could not be parsed.
    #[error("Unrecognized timestamp: {0}")]
    Timestamp(String),

    /// The initial or current balance is not positive. Trading requires a positive balance.
    #[error("Balance must be positive (got: {0})")]
    NegZeroBalance(f64),

    /// The per-order quantity is not positive.
    #[error("Trade quantity must be positive (got: {0})")]
    InvalidQuantity(f64),

    /// The fee rate is outside `[0, 1)`.
    #[error("Fee rate must be within [0, 1) (got: {0})")]
    InvalidFeeRate(f64),

    /// A strategy parameter (period, threshold, width) is invalid.
    #[error("Invalid strategy parameter: {0}")]
    InvalidParameter(String),

    /// The strategy needs more history than the feed holds.
    #[error("Strategy lookback ({lookback}) must be shorter than the feed ({candles} candles)")]
    LookbackTooLong {
        /// Candles the strategy needs before it can signal.
        lookback: usize,
        /// Candles in the feed.
        candles: usize,
    },

    /// The wallet does not have enough funds to execute the fill.
    /// Expected: {0}, Available: {1}
    #[error("Insufficient funds: required {0}, available {1}")]
    InsufficientFunds(f64, f64),

    /// Execution price is not a positive finite number.
    #[error("Execution price must be positive and finite (got: {0})")]
    InvalidPrice(f64),

    /// An order tried to open a position while one is already open.
    #[error("A position is already open")]
    PositionAlreadyOpen,

    /// The position was not found.
    #[error("Position not found")]
    PositionNotFound,

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV reading/writing error occurred.
    #[cfg(feature = "csv")]
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}
