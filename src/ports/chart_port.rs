//! Chart rendering port trait.
//!
//! `ChartData` is everything a renderer needs for one ticker: the price and
//! average series on the left axis, entry/exit markers placed on the fast
//! average, and the portfolio value on the right axis.

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmacrossError;
use crate::domain::signal::Transition;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub ticker: String,
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    pub sma_fast: Vec<Option<f64>>,
    pub sma_slow: Vec<Option<f64>>,
    pub fast_label: String,
    pub slow_label: String,
    pub entries: Vec<(NaiveDate, f64)>,
    pub exits: Vec<(NaiveDate, f64)>,
    pub portfolio: Vec<f64>,
}

impl ChartData {
    pub fn from_result(result: &BacktestResult) -> Self {
        let markers = |transition: Transition| -> Vec<(NaiveDate, f64)> {
            result
                .signals
                .indices_of(transition)
                .into_iter()
                .filter_map(|i| {
                    result
                        .indicators
                        .fast
                        .value_at(i)
                        .map(|v| (result.bars[i].date, v))
                })
                .collect()
        };

        ChartData {
            ticker: result.ticker.clone(),
            dates: result.bars.iter().map(|b| b.date).collect(),
            close: result.bars.iter().map(|b| b.close).collect(),
            sma_fast: result.indicators.fast.values.iter().map(|p| p.value).collect(),
            sma_slow: result.indicators.slow.values.iter().map(|p| p.value).collect(),
            fast_label: result.indicators.fast.indicator_type.to_string(),
            slow_label: result.indicators.slow.indicator_type.to_string(),
            entries: markers(Transition::Entry),
            exits: markers(Transition::Exit),
            portfolio: result.portfolio.points.iter().map(|p| p.value).collect(),
        }
    }

    pub fn title(&self) -> String {
        format!(
            "Moving Average Crossover Strategy with Risk Management for {}",
            self.ticker
        )
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Port for producing a chart from computed series.
pub trait ChartPort {
    /// Render one ticker's chart, returning the path written.
    fn render(&self, chart: &ChartData) -> Result<PathBuf, SmacrossError>;
}
