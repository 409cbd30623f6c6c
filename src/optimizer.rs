//! Strategy parameter optimization.
//!
//! The `Optimizer` runs one independent backtest per parameter combination, in
//! parallel, over a shared candle feed. The `ParameterCombination` trait defines
//! the grid to explore.

use std::marker::PhantomData;
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::BacktestConfig;
use crate::engine::{Backtest, Candle};
use crate::errors::Result;
use crate::metrics::Summary;
use crate::strategy::StrategyKind;

/// Trait defining how to generate parameter combinations for optimization.
///
/// Implement this trait for your parameter types to define how combinations should be generated.
pub trait ParameterCombination: Sync {
    /// Type representing a single parameter combination (e.g., `(usize, usize)`).
    type Output: Clone + Send + Sync;

    /// Generates all the parameter combinations to test.
    fn generate() -> Vec<Self::Output>;
}

/// Runs a backtest for every parameter combination of `PC`.
///
/// Every backtest uses the same candles and configuration; only the strategy
/// changes. Results come back in the order of [`ParameterCombination::generate`].
pub struct Optimizer<PC: ParameterCombination> {
    data: Arc<[Candle]>,
    config: BacktestConfig,
    _marker: PhantomData<PC>,
}

impl<PC: ParameterCombination> From<&Backtest> for Optimizer<PC> {
    fn from(value: &Backtest) -> Self {
        Self {
            data: value.shared_data(),
            config: value.config().clone(),
            _marker: PhantomData,
        }
    }
}

impl<PC: ParameterCombination> Optimizer<PC> {
    /// Creates a new `Optimizer` over `data`, using `config` for capital, fees
    /// and fill size.
    pub fn new(data: impl Into<Arc<[Candle]>>, config: BacktestConfig) -> Self {
        Self {
            data: data.into(),
            config,
            _marker: PhantomData,
        }
    }

    /// Backtests the strategy built by `combinator` for every combination.
    ///
    /// # Errors
    /// Fails on the first invalid feed, configuration or strategy.
    pub fn with<C>(&self, combinator: C) -> Result<Vec<(PC::Output, Summary)>>
    where
        C: Fn(&PC::Output) -> Result<StrategyKind> + Sync,
    {
        let combinations = PC::generate();
        let chunk_size = combinations.len().div_ceil(num_cpus::get()).max(1);

        combinations
            .par_chunks(chunk_size)
            .map(|par_combinations| -> Result<Vec<_>> {
                let mut backtest = Backtest::new(Arc::clone(&self.data), self.config.clone())?;
                let mut local_results = Vec::with_capacity(par_combinations.len());

                for param_set in par_combinations {
                    let strategy = combinator(param_set)?;
                    let report = backtest.run_with(&strategy)?;
                    local_results.push((param_set.clone(), report.summary().clone()));
                }

                Ok(local_results)
            })
            .collect::<Result<Vec<_>>>()
            .map(|chunks| chunks.into_iter().flatten().collect())
    }
}
