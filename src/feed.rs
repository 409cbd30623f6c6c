//! CSV candle feeds and trade log export.
//!
//! Candle files need a header row. Column names are matched in either case
//! (`Timestamp` or `timestamp`, `Close` or `close`, ...); extra columns are
//! ignored. Timestamps may be RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` (UTC) or
//! integer milliseconds since the epoch.

use std::io;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ReaderBuilder, Trim, Writer};
use serde::{Deserialize, Serialize};

use crate::engine::Candle;
use crate::errors::{Error, Result};
use crate::journal::TradeRecord;

/// Column order of the exported trade log.
pub const TRADE_LOG_HEADER: [&str; 10] = [
    "timestamp", "symbol", "action", "side", "quantity", "price", "fee", "pnl", "balance", "status",
];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Debug, Deserialize)]
struct CandleRow {
    #[serde(alias = "Timestamp", alias = "time", alias = "Time", alias = "date", alias = "Date")]
    timestamp: Option<String>,
    #[serde(alias = "Open")]
    open: Option<String>,
    #[serde(alias = "High")]
    high: Option<String>,
    #[serde(alias = "Low")]
    low: Option<String>,
    #[serde(alias = "Close")]
    close: Option<String>,
    #[serde(alias = "Volume")]
    volume: Option<String>,
}

impl CandleRow {
    fn into_candle(self, index: usize) -> Result<Candle> {
        let price = |value: Option<String>, field: &'static str| -> Result<f64> {
            value
                .as_deref()
                .and_then(|v| v.parse::<f64>().ok())
                .ok_or(Error::MalformedCandle { index, field })
        };

        let timestamp = self
            .timestamp
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or(Error::MalformedCandle {
                index,
                field: "timestamp",
            })?;

        let candle = Candle::new(
            parse_timestamp(timestamp)?,
            price(self.open, "open")?,
            price(self.high, "high")?,
            price(self.low, "low")?,
            price(self.close, "close")?,
            price(self.volume, "volume")?,
        );
        match candle.malformed_field() {
            Some(field) => Err(Error::MalformedCandle { index, field }),
            None => Ok(candle),
        }
    }
}

/// Parses a feed timestamp.
///
/// ```
/// use bts_signal::feed::parse_timestamp;
///
/// let a = parse_timestamp("2024-01-01 00:00:00").unwrap();
/// let b = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
/// let c = parse_timestamp("1704067200000").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(b, c);
/// ```
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(millis) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis).ok_or_else(|| Error::Timestamp(value.to_owned()));
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&Utc));
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::Timestamp(value.to_owned()))
}

/// Reads candles from CSV data, sorted by timestamp.
///
/// A row with a missing or unparsable value fails with
/// [`Error::MalformedCandle`], indexed by its position in the input.
pub fn read_candles<R: io::Read>(reader: R) -> Result<Vec<Candle>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut candles = Vec::new();

    for (index, row) in reader.deserialize::<CandleRow>().enumerate() {
        candles.push(row?.into_candle(index)?);
    }

    // stable: rows sharing a timestamp keep their file order
    candles.sort_by_key(Candle::timestamp);
    Ok(candles)
}

/// Loads candles from a CSV file, sorted by timestamp.
pub fn load_candles<P: AsRef<Path>>(path: P) -> Result<Vec<Candle>> {
    let file = std::fs::File::open(path)?;
    read_candles(file)
}

#[derive(Debug, Serialize)]
struct LogRow<'a> {
    timestamp: String,
    symbol: &'a str,
    action: &'static str,
    side: &'static str,
    quantity: f64,
    price: f64,
    fee: f64,
    pnl: Option<f64>,
    balance: f64,
    status: &'static str,
}

impl<'a> LogRow<'a> {
    fn new(symbol: &'a str, record: &TradeRecord) -> Self {
        Self {
            timestamp: record.timestamp().format("%Y-%m-%d %H:%M:%S").to_string(),
            symbol,
            action: record.action().as_str(),
            side: record.action().order_side(),
            quantity: record.size(),
            price: record.price(),
            fee: record.fee(),
            pnl: record.realized_pnl(),
            balance: record.balance(),
            status: record.status(),
        }
    }
}

/// Writes the trade log as CSV, header first. Opening records leave `pnl` empty.
pub fn write_trade_log<W: io::Write>(writer: W, symbol: &str, records: &[TradeRecord]) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    if records.is_empty() {
        // serialize only writes the header along with the first row
        writer.write_record(TRADE_LOG_HEADER)?;
    }
    for record in records {
        writer.serialize(LogRow::new(symbol, record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Saves the trade log to a CSV file.
pub fn save_trade_log<P: AsRef<Path>>(path: P, symbol: &str, records: &[TradeRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_trade_log(file, symbol, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::TradeAction;

    const FEED: &str = "\
Timestamp,Open,High,Low,Close,Volume
2024-01-01 00:02:00,101,103,100,102,5
2024-01-01 00:00:00,100,101,99,100.5,3
2024-01-01 00:01:00,100.5,102,100,101,4
";

    #[test]
    fn reads_and_sorts() {
        let candles = read_candles(FEED.as_bytes()).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].close(), 100.5);
        assert_eq!(candles[2].close(), 102.0);
        assert!(candles.windows(2).all(|w| w[0].timestamp() < w[1].timestamp()));
    }

    #[test]
    fn lowercase_header_and_millis() {
        let data = "timestamp,open,high,low,close,volume,extra\n1704067200000,1,2,0.5,1.5,10,x\n";
        let candles = read_candles(data.as_bytes()).unwrap();
        assert_eq!(candles[0].timestamp(), parse_timestamp("2024-01-01T00:00:00Z").unwrap());
    }

    #[test]
    fn missing_value_is_malformed() {
        let data = "Timestamp,Open,High,Low,Close,Volume\n\
                    2024-01-01 00:00:00,100,101,99,100,1\n\
                    2024-01-01 00:01:00,100,101,99,,1\n";
        assert!(matches!(
            read_candles(data.as_bytes()),
            Err(Error::MalformedCandle { index: 1, field: "close" })
        ));
    }

    #[test]
    fn inverted_range_is_malformed() {
        let data = "Timestamp,Open,High,Low,Close,Volume\n2024-01-01 00:00:00,100,90,99,100,1\n";
        assert!(matches!(
            read_candles(data.as_bytes()),
            Err(Error::MalformedCandle { index: 0, field: "high" })
        ));
    }

    #[test]
    fn bad_timestamp() {
        assert!(matches!(parse_timestamp("yesterday"), Err(Error::Timestamp(_))));
        assert!(parse_timestamp("2024-01-01 00:00:00.250").is_ok());
    }

    #[test]
    fn trade_log_columns() {
        let time = parse_timestamp("2024-01-01 00:00:00").unwrap();
        let records = [
            TradeRecord::new(time, TradeAction::OpenLong, 100.0, 0.1, 0.0075, None, 989.9925, false),
            TradeRecord::new(time, TradeAction::CloseLong, 99.0, 0.1, 0.0074, Some(-0.1149), 999.8851, true),
        ];

        let mut out = Vec::new();
        write_trade_log(&mut out, "BTCUSDT", &records).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], TRADE_LOG_HEADER.join(","));
        assert_eq!(lines[1], "2024-01-01 00:00:00,BTCUSDT,OPEN_LONG,Buy,0.1,100.0,0.0075,,989.9925,EXECUTED");
        assert!(lines[2].starts_with("2024-01-01 00:00:00,BTCUSDT,CLOSE_LONG,Sell,0.1,99.0,"));
        assert!(lines[2].ends_with(",CLOSED_AT_END"));
    }

    #[test]
    fn empty_trade_log_has_header() {
        let mut out = Vec::new();
        write_trade_log(&mut out, "BTCUSDT", &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim_end(), TRADE_LOG_HEADER.join(","));
    }

    #[test]
    fn round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.csv");
        std::fs::write(&path, FEED).unwrap();

        let candles = load_candles(&path).unwrap();
        assert_eq!(candles.len(), 3);

        let log = dir.path().join("trades.csv");
        save_trade_log(&log, "BTCUSDT", &[]).unwrap();
        assert!(std::fs::read_to_string(log).unwrap().starts_with("timestamp,symbol"));
    }
}
