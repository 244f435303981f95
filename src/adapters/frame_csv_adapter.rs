//! Per-ticker frame export as CSV.
//!
//! Columns: `date,close,sma_fast,sma_slow,trend_state,transition,portfolio_value`.
//! Warmup values are written as empty cells.

use std::fs;
use std::path::PathBuf;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmacrossError;
use crate::ports::report_port::ReportPort;

const HEADER: [&str; 7] = [
    "date",
    "close",
    "sma_fast",
    "sma_slow",
    "trend_state",
    "transition",
    "portfolio_value",
];

pub struct FrameCsvAdapter {
    output_dir: PathBuf,
}

impl FrameCsvAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn frame_path(&self, ticker: &str) -> PathBuf {
        self.output_dir.join(format!("{}_frame.csv", ticker))
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

fn csv_error(err: csv::Error) -> SmacrossError {
    SmacrossError::Io(std::io::Error::other(err))
}

impl ReportPort for FrameCsvAdapter {
    fn write(&self, result: &BacktestResult) -> Result<PathBuf, SmacrossError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.frame_path(&result.ticker);
        let mut wtr = csv::Writer::from_path(&path).map_err(csv_error)?;

        wtr.write_record(HEADER).map_err(csv_error)?;

        for (i, bar) in result.bars.iter().enumerate() {
            let signal = result.signals.points.get(i);
            let trend_state = signal.map(|s| s.trend_state()).unwrap_or(0);
            let transition = result.signals.transition_at(i).value();
            let value = result.portfolio.points.get(i).map(|p| p.value);

            wtr.write_record([
                bar.date.format("%Y-%m-%d").to_string(),
                format!("{:.6}", bar.close),
                optional(result.indicators.fast.value_at(i)),
                optional(result.indicators.slow.value_at(i)),
                trend_state.to_string(),
                transition.to_string(),
                optional(value),
            ])
            .map_err(csv_error)?;
        }

        wtr.flush()?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{BacktestConfig, run_backtest};
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn result() -> BacktestResult {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let closes = [10.0, 10.0, 10.0, 12.0, 13.0];
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                ticker: "BA".into(),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 10,
            })
            .collect();
        let config = BacktestConfig {
            start_date: start,
            end_date: start + chrono::Duration::days(10),
            initial_capital: 5000.0,
            risk_per_trade: 0.08,
            stop_loss_pct: 0.12,
            fast_window: 1,
            slow_window: 3,
        };
        run_backtest("BA", bars, &config)
    }

    #[test]
    fn writes_one_row_per_bar() {
        let dir = TempDir::new().unwrap();
        let adapter = FrameCsvAdapter::new(dir.path().join("frames"));
        let path = adapter.write(&result()).unwrap();

        assert_eq!(path, dir.path().join("frames").join("BA_frame.csv"));
        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(
            lines[0],
            "date,close,sma_fast,sma_slow,trend_state,transition,portfolio_value"
        );
        // Slow SMA(3) is undefined for the first two bars.
        assert_eq!(lines[1], "2024-03-01,10.000000,10.000000,,0,0,5000.000000");
        assert!(lines[4].starts_with("2024-03-04,12.000000,12.000000,10.666667,1,1,"));
    }
}
