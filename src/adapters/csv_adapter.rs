//! CSV file data adapter.
//!
//! One file per ticker: `<base>/<TICKER>.csv` with header
//! `date,open,high,low,close,volume` and ISO dates.

use crate::domain::error::SmacrossError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    ticker: &str,
) -> Result<&'r str, SmacrossError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| SmacrossError::DataFetch {
            ticker: ticker.to_string(),
            reason: format!("missing {} column", name),
        })
}

fn parse_f64(value: &str, name: &str, ticker: &str) -> Result<f64, SmacrossError> {
    value.parse().map_err(|e| SmacrossError::DataFetch {
        ticker: ticker.to_string(),
        reason: format!("invalid {} value '{}': {}", name, value, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SmacrossError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| SmacrossError::DataFetch {
            ticker: ticker.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SmacrossError::DataFetch {
                ticker: ticker.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = field(&record, 0, "date", ticker)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                SmacrossError::DataFetch {
                    ticker: ticker.to_string(),
                    reason: format!("invalid date format '{}': {}", date_str, e),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let open = parse_f64(field(&record, 1, "open", ticker)?, "open", ticker)?;
            let high = parse_f64(field(&record, 2, "high", ticker)?, "high", ticker)?;
            let low = parse_f64(field(&record, 3, "low", ticker)?, "low", ticker)?;
            let close = parse_f64(field(&record, 4, "close", ticker)?, "close", ticker)?;
            // Some exports write volume as a float.
            let volume = parse_f64(field(&record, 5, "volume", ticker)?, "volume", ticker)? as i64;

            bars.push(OhlcvBar {
                ticker: ticker.to_string(),
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn name(&self) -> &str {
        "csv"
    }
}
