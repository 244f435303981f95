//! Yahoo Finance chart API data adapter.
//!
//! Queries `/v8/finance/chart/<TICKER>` with `interval=1d` over the requested
//! range and converts the parallel quote arrays into bars. Rows with any
//! null field (halts, partial sessions) are dropped.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::config_validation::DEFAULT_TIMEOUT_SECS;
use crate::domain::error::SmacrossError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = concat!("smacross/", env!("CARGO_PKG_VERSION"));

pub struct YahooAdapter {
    http: reqwest::blocking::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl YahooAdapter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SmacrossError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SmacrossError::DataFetch {
                ticker: "*".to_string(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Reads `[data] base_url` and `[data] timeout_secs`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SmacrossError> {
        let base_url = config
            .get_non_empty("data", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = config
            .get_int("data", "timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .max(1) as u64;
        Self::new(base_url, Duration::from_secs(timeout))
    }

    fn chart_url(&self, ticker: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, ticker)
    }
}

/// Unix seconds at 00:00 UTC on `date`.
fn unix_midnight(ticker: &str, date: NaiveDate) -> Result<i64, SmacrossError> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| fetch_error(ticker, format!("cannot build timestamp for {}", date)))
}

fn fetch_error(ticker: &str, reason: impl Into<String>) -> SmacrossError {
    SmacrossError::DataFetch {
        ticker: ticker.to_string(),
        reason: reason.into(),
    }
}

fn parse_chart_response(ticker: &str, body: &str) -> Result<Vec<OhlcvBar>, SmacrossError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| fetch_error(ticker, format!("invalid chart response: {}", e)))?;

    if let Some(err) = envelope.chart.error {
        return Err(fetch_error(ticker, format!("{}: {}", err.code, err.description)));
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| fetch_error(ticker, "chart response has no result"))?;

    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let row = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = row else {
            continue;
        };
        let Some(local) = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0) else {
            continue;
        };
        let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0) as i64;

        bars.push(OhlcvBar {
            ticker: ticker.to_string(),
            date: local.date_naive(),
            open,
            high,
            low,
            close,
            volume,
        });
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    Ok(bars)
}

impl DataPort for YahooAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SmacrossError> {
        let period1 = unix_midnight(ticker, start_date)?;
        // period2 is exclusive.
        let period2 = unix_midnight(ticker, end_date)? + 86_400;

        let response = self
            .http
            .get(self.chart_url(ticker))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .map_err(|e| fetch_error(ticker, format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| fetch_error(ticker, format!("failed to read response: {}", e)))?;

        // Unknown symbols come back as 404 with a JSON error body.
        if !status.is_success() && !body.trim_start().starts_with('{') {
            return Err(fetch_error(ticker, format!("HTTP {}", status)));
        }

        let bars = parse_chart_response(ticker, &body)?;
        Ok(bars
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect())
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "chart": {
        "result": [{
          "meta": { "symbol": "MSFT", "gmtoffset": -14400 },
          "timestamp": [1662039000, 1662125400, 1662471000],
          "indicators": {
            "quote": [{
              "open":   [258.87, 261.70, null],
              "high":   [260.89, 264.74, 255.30],
              "low":    [255.41, 254.47, 250.10],
              "close":  [256.06, 256.06, 253.25],
              "volume": [21558700, 22855400, 21328200]
            }]
          }
        }],
        "error": null
      }
    }"#;

    #[test]
    fn parses_quote_arrays_and_drops_null_rows() {
        let bars = parse_chart_response("MSFT", SAMPLE).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2022, 9, 1).unwrap());
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2022, 9, 2).unwrap());
        assert_eq!(bars[0].ticker, "MSFT");
        assert_eq!(bars[0].open, 258.87);
        assert_eq!(bars[0].close, 256.06);
        assert_eq!(bars[1].volume, 22855400);
    }

    #[test]
    fn api_error_is_fetch_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart_response("NOPE", body).unwrap_err();

        assert!(matches!(err, SmacrossError::DataFetch { ref ticker, .. } if ticker == "NOPE"));
        assert!(err.to_string().contains("symbol may be delisted"));
    }

    #[test]
    fn malformed_body_is_fetch_error() {
        assert!(parse_chart_response("MSFT", "<html>").is_err());
    }

    #[test]
    fn empty_result_without_timestamps() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse_chart_response("MSFT", body).unwrap().is_empty());
    }

    #[test]
    fn unix_midnight_epoch() {
        let day = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(unix_midnight("MSFT", day).unwrap(), 86_400);
        assert!(unix_midnight("MSFT", NaiveDate::MIN).is_ok_and(|ts| ts < 0));
    }
}
