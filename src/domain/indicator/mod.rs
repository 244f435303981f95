//! Moving-average indicators over the close series.
//!
//! - `IndicatorPoint`: one value in an indicator time series, absent during warmup
//! - `IndicatorSeries`: a trailing SMA series for one window length
//! - `IndicatorFrame`: the fast and slow series aligned to a price series

pub mod sma;

use chrono::NaiveDate;
use std::fmt;

use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|p| p.value)
    }

    /// Index of the first defined value, if any.
    pub fn first_valid_index(&self) -> Option<usize> {
        self.values.iter().position(|p| p.value.is_some())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub fast: IndicatorSeries,
    pub slow: IndicatorSeries,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fast.is_empty()
    }
}

pub fn compute_indicator_frame(
    bars: &[OhlcvBar],
    fast_window: usize,
    slow_window: usize,
) -> IndicatorFrame {
    IndicatorFrame {
        fast: sma::calculate_sma(bars, fast_window),
        slow: sma::calculate_sma(bars, slow_window),
    }
}
