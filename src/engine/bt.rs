use chrono::{DateTime, Duration};

use super::*;
use crate::config::ReversalLog;
use crate::journal::TradeAction;
use crate::strategy::{MovingAverageCrossover, Signal, StrategyKind};

fn get_data(closes: &[f64]) -> Vec<Candle> {
    let start = DateTime::from_timestamp_secs(1515151515).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle::from((start + Duration::minutes(i as i64), close, close, close, close, 1.0)))
        .collect()
}

fn config(capital: f64, fee_rate: f64) -> BacktestConfig {
    BacktestConfig::default()
        .with_initial_capital(capital)
        .with_quantity(1.0)
        .with_fee_rate(fee_rate)
        .with_strategy(StrategyKind::MovingAverageCrossover(MovingAverageCrossover::new(1, 2)))
}

/// Plays back a fixed signal per candle index.
struct Scripted(Vec<Signal>);

impl Strategy for Scripted {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn min_history(&self) -> usize {
        1
    }

    fn signal(&self, history: &[Candle]) -> Signal {
        self.0.get(history.len() - 1).copied().unwrap_or(Signal::Hold)
    }
}

fn actions(report: &Report) -> Vec<TradeAction> {
    report.records().iter().map(|r| r.action()).collect()
}

fn assert_near(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
}

#[test]
fn sma_scenario_forces_final_close() {
    let data = get_data(&[100.0, 102.0, 104.0, 101.0, 99.0]);
    let config = config(10_000.0, 0.0)
        .with_strategy(StrategyKind::MovingAverageCrossover(MovingAverageCrossover::new(2, 3)));
    let mut bt = Backtest::new(data, config).unwrap();

    let report = bt.run().unwrap();
    assert_eq!(actions(&report), vec![TradeAction::OpenLong, TradeAction::CloseLong]);

    let (open, close) = (&report.records()[0], &report.records()[1]);
    assert_eq!(open.price(), 104.0);
    assert_eq!(close.price(), 99.0);
    assert!(close.is_forced());
    assert_eq!(report.summary().net_pnl(), 99.0 - open.price());
    assert_eq!(report.summary().final_balance(), 10_000.0 - 5.0);
    assert!(bt.position().is_none());
}

#[test]
fn always_hold_leaves_account_untouched() {
    let data = get_data(&[100.0, 101.0, 102.0, 103.0]);
    let mut bt = Backtest::new(data, config(1_000.0, 0.001)).unwrap();

    let report = bt.run_with(&Scripted(vec![])).unwrap();
    assert!(report.records().is_empty());
    assert_eq!(report.summary().final_balance(), 1_000.0);
    assert_eq!(bt.balance(), 1_000.0);
    assert!(bt.journal().is_empty());
}

#[test]
fn reversal_records_both_legs_in_one_step() {
    let data = get_data(&[100.0, 110.0, 105.0]);
    let mut bt = Backtest::new(data, config(1_000.0, 0.001)).unwrap();

    let report = bt.run_with(&Scripted(vec![Signal::Long, Signal::Short])).unwrap();
    assert_eq!(
        actions(&report),
        vec![
            TradeAction::OpenLong,
            TradeAction::CloseLong,
            TradeAction::OpenShort,
            TradeAction::CloseShort
        ]
    );

    let records = report.records();
    assert_eq!(records[1].timestamp(), records[2].timestamp());
    assert_near(records[1].balance(), 1_009.79);
    assert_near(records[2].balance(), 899.68);
    // short 110 -> 105: +5 - 0.11 - 0.105
    assert_near(records[3].realized_pnl().unwrap(), 4.785);
    assert_near(report.summary().total_fees(), 0.1 + 0.11 + 0.11 + 0.105);
}

#[test]
fn combined_reversal_is_one_record() {
    let data = get_data(&[100.0, 110.0, 105.0]);
    let config = config(1_000.0, 0.001).with_reversal(ReversalLog::Combined);
    let mut bt = Backtest::new(data, config).unwrap();

    let report = bt.run_with(&Scripted(vec![Signal::Long, Signal::Short])).unwrap();
    assert_eq!(
        actions(&report),
        vec![TradeAction::OpenLong, TradeAction::ReverseToShort, TradeAction::CloseShort]
    );
    assert_eq!(report.summary().total_trades(), 2);
}

#[test]
fn insufficient_capital_skips_the_fill() {
    let data = get_data(&[100.0, 101.0, 102.0]);
    let mut bt = Backtest::new(data, config(50.0, 0.001)).unwrap();

    let report = bt.run_with(&Scripted(vec![Signal::Long])).unwrap();
    assert!(report.records().is_empty());
    assert_eq!(report.rejections(), 1);
    assert_eq!(bt.balance(), 50.0);
}

#[test]
fn forced_close_settles_a_squeezed_short() {
    let data = get_data(&[100.0, 150.0, 250.0]);
    let mut bt = Backtest::new(data, config(101.0, 0.0)).unwrap();

    let report = bt.run_with(&Scripted(vec![Signal::Short])).unwrap();
    assert_eq!(actions(&report), vec![TradeAction::OpenShort, TradeAction::CloseShort]);
    assert_eq!(report.rejections(), 0);
    assert!(bt.position().is_none());

    let close = &report.records()[1];
    assert!(close.is_forced());
    assert_eq!(close.shortfall(), 49.0);

    let summary = report.summary();
    assert_eq!(summary.net_pnl(), -150.0);
    assert_eq!(summary.final_balance(), 0.0);
    assert_eq!(summary.shortfall(), 49.0);
    assert_eq!(bt.balance(), 0.0);
}

#[test]
fn combined_reversals_count_as_open_and_close() {
    let data = get_data(&[100.0, 110.0, 105.0, 104.0]);
    let config = config(1_000.0, 0.0).with_reversal(ReversalLog::Combined);
    let mut bt = Backtest::new(data, config).unwrap();

    let report = bt
        .run_with(&Scripted(vec![Signal::Long, Signal::Short, Signal::Long]))
        .unwrap();
    assert_eq!(
        actions(&report),
        vec![
            TradeAction::OpenLong,
            TradeAction::ReverseToShort,
            TradeAction::ReverseToLong,
            TradeAction::CloseLong
        ]
    );
    let opens = report.records().iter().filter(|r| r.action().is_open()).count();
    let closes = report.records().iter().filter(|r| r.action().is_close()).count();
    assert_eq!((opens, closes), (3, 3));
}

#[test]
fn last_candle_only_settles() {
    let data = get_data(&[100.0, 101.0, 102.0]);
    let mut bt = Backtest::new(data, config(1_000.0, 0.0)).unwrap();

    let report = bt
        .run_with(&Scripted(vec![Signal::Hold, Signal::Hold, Signal::Long]))
        .unwrap();
    assert!(report.records().is_empty());
}

#[test]
fn close_signal_flattens() {
    let data = get_data(&[100.0, 104.0, 102.0, 103.0]);
    let mut bt = Backtest::new(data, config(1_000.0, 0.0)).unwrap();

    let report = bt
        .run_with(&Scripted(vec![Signal::Short, Signal::Close, Signal::Close]))
        .unwrap();
    assert_eq!(actions(&report), vec![TradeAction::OpenShort, TradeAction::CloseShort]);
    assert!(!report.records()[1].is_forced());
    assert_eq!(report.summary().net_pnl(), -4.0);
}

#[test]
fn runs_are_repeatable() {
    let closes: Vec<f64> = (0..120).map(|i| 100.0 + (i as f64 * 0.3).sin() * 8.0).collect();
    let mut bt = Backtest::new(get_data(&closes), config(10_000.0, 0.00075)).unwrap();

    let first = bt.run().unwrap();
    let second = bt.run().unwrap();
    assert!(!first.records().is_empty());
    assert_eq!(first, second);
}

#[test]
fn lookback_must_fit_the_feed() {
    let data = get_data(&[100.0, 101.0, 102.0]);
    let result = Backtest::new(data, BacktestConfig::default());
    assert!(matches!(
        result,
        Err(Error::LookbackTooLong { lookback: 7, candles: 3 })
    ));
}

#[test]
fn malformed_feed_is_rejected_up_front() {
    let mut data = get_data(&[100.0; 10]);
    data[4] = Candle::new(data[4].timestamp(), 100.0, 100.0, 100.0, f64::NAN, 1.0);
    assert!(matches!(
        Backtest::new(data, config(1_000.0, 0.0)),
        Err(Error::MalformedCandle { index: 4, field: "close" })
    ));
    assert!(matches!(
        Backtest::new(Vec::<Candle>::new(), config(1_000.0, 0.0)),
        Err(Error::CandleDataEmpty)
    ));
}
