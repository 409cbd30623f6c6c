//! Command line backtester.
//!
//! ```bash
//! # SMA 3/7 crossover with the default account
//! bts-signal --data data/btcusdt_1m.csv
//!
//! # RSI thresholds from a config file, trade log written next to it
//! bts-signal --data data/btcusdt_1m.csv --config backtest.toml --strategy rsi --log trades.csv
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use bts_signal::feed::{load_candles, save_trade_log};
use bts_signal::prelude::*;
use clap::{Parser, ValueEnum};
use tracing::info;

#[derive(Parser)]
#[command(name = "bts-signal")]
#[command(about = "Replay a candle feed against a trading strategy", long_about = None)]
#[command(version)]
struct Cli {
    /// Candle CSV file (Timestamp,Open,High,Low,Close,Volume)
    #[arg(short, long)]
    data: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Strategy to run with its default parameters, overrides the configuration
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Where to write the trade log CSV
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Print the full report as JSON instead of the summary
    #[arg(long, default_value = "false")]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Sma,
    Ema,
    PriceEma,
    Rsi,
    Bollinger,
}

impl From<StrategyArg> for StrategyKind {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Sma => Self::MovingAverageCrossover(MovingAverageCrossover::default()),
            StrategyArg::Ema => Self::ExponentialCrossover(ExponentialCrossover::default()),
            StrategyArg::PriceEma => Self::PriceEmaCross(PriceEmaCross::default()),
            StrategyArg::Rsi => Self::RsiThreshold(RsiThreshold::default()),
            StrategyArg::Bollinger => Self::BollingerReversion(BollingerReversion::default()),
        }
    }
}

fn load_config(cli: &Cli) -> Result<BacktestConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("Invalid config: {}", path.display()))?
        }
        None => BacktestConfig::default(),
    };
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy.into();
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "bts_signal=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let symbol = config.symbol.clone();

    let candles =
        load_candles(&cli.data).with_context(|| format!("Failed to load candles: {}", cli.data.display()))?;
    info!(path = %cli.data.display(), candles = candles.len(), "feed loaded");

    let mut backtest = Backtest::new(candles, config).context("Invalid backtest setup")?;
    let report = backtest.run().context("Backtest failed")?;

    if let Some(path) = &cli.log {
        save_trade_log(path, &symbol, report.records())
            .with_context(|| format!("Failed to write trade log: {}", path.display()))?;
        info!(path = %path.display(), records = report.records().len(), "trade log written");
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    Ok(())
}
