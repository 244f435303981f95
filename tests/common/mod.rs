#![allow(dead_code)]

use chrono::NaiveDate;
use smacross::domain::backtest::BacktestConfig;
use smacross::domain::error::SmacrossError;
pub use smacross::domain::ohlcv::OhlcvBar;
use smacross::ports::data_port::DataPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub requested: RefCell<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requested: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SmacrossError> {
        self.requested.borrow_mut().push(ticker.to_string());
        if let Some(reason) = self.errors.get(ticker) {
            return Err(SmacrossError::DataFetch {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub fn make_bar(ticker: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        ticker: ticker.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 1000,
    }
}

/// One bar per calendar day starting at `start_date`.
pub fn bars_from_closes(ticker: &str, start_date: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            ticker: ticker.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1000,
        })
        .collect()
}

pub fn generate_bars(ticker: &str, start_date: &str, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + i as f64).collect();
    bars_from_closes(ticker, start_date, &closes)
}

/// Fifty flat bars followed by a rally: golden cross on index 50.
pub fn golden_cross_closes() -> Vec<f64> {
    let mut closes = vec![10.0; 50];
    closes.extend([12.0, 13.0, 14.0]);
    closes
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date(2022, 1, 1),
        end_date: date(2024, 12, 31),
        initial_capital: 5000.0,
        risk_per_trade: 0.08,
        stop_loss_pct: 0.12,
        fast_window: 20,
        slow_window: 50,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
