//! Configuration validation.
//!
//! Validates all config fields before any ticker is fetched. Every failure
//! here is fatal at startup.

use crate::domain::error::SmacrossError;
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 5000.0;
pub const DEFAULT_RISK_PER_TRADE: f64 = 0.08;
pub const DEFAULT_STOP_LOSS: f64 = 0.12;
pub const DEFAULT_FAST_WINDOW: i64 = 20;
pub const DEFAULT_SLOW_WINDOW: i64 = 50;
pub const DEFAULT_CHART_WIDTH: i64 = 1400;
pub const DEFAULT_CHART_HEIGHT: i64 = 700;
pub const DEFAULT_TIMEOUT_SECS: i64 = 30;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    validate_data_config(config)?;
    validate_chart_config(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    validate_tickers(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    validate_risk_per_trade(config)?;
    validate_stop_loss(config)?;
    validate_windows(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> SmacrossError {
    SmacrossError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let value = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SmacrossError> {
    match value {
        None => Err(SmacrossError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                &format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    match config.get_string("backtest", "tickers") {
        None => Err(SmacrossError::ConfigMissing {
            section: "backtest".to_string(),
            key: "tickers".to_string(),
        }),
        Some(s) => parse_tickers(&s)
            .map(|_| ())
            .map_err(|e| invalid("backtest", "tickers", &e.to_string())),
    }
}

fn validate_risk_per_trade(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let value = config.get_double("strategy", "risk_per_trade", DEFAULT_RISK_PER_TRADE)?;
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid(
            "strategy",
            "risk_per_trade",
            "risk_per_trade must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_stop_loss(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let value = config.get_double("strategy", "stop_loss", DEFAULT_STOP_LOSS)?;
    if !(value > 0.0 && value < 1.0) {
        return Err(invalid(
            "strategy",
            "stop_loss",
            "stop_loss must be in (0, 1)",
        ));
    }
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let fast = config.get_int("strategy", "fast_window", DEFAULT_FAST_WINDOW)?;
    let slow = config.get_int("strategy", "slow_window", DEFAULT_SLOW_WINDOW)?;

    if fast < 1 {
        return Err(invalid(
            "strategy",
            "fast_window",
            "fast_window must be at least 1",
        ));
    }
    if slow <= fast {
        return Err(invalid(
            "strategy",
            "slow_window",
            "slow_window must be greater than fast_window",
        ));
    }
    Ok(())
}

fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.trim().to_lowercase().as_str() {
        "csv" | "yahoo" => {}
        other => {
            return Err(invalid(
                "data",
                "source",
                &format!("unknown data source '{}', expected csv or yahoo", other),
            ));
        }
    }

    if config.get_int("data", "timeout_secs", DEFAULT_TIMEOUT_SECS)? < 1 {
        return Err(invalid(
            "data",
            "timeout_secs",
            "timeout_secs must be at least 1",
        ));
    }
    Ok(())
}

fn validate_chart_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    for (key, default) in [("width", DEFAULT_CHART_WIDTH), ("height", DEFAULT_CHART_HEIGHT)] {
        let value = config.get_int("chart", key, default)?;
        if !(1..=u32::MAX as i64).contains(&value) {
            return Err(invalid("chart", key, &format!("{} must be a positive pixel count", key)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID: &str = r#"
[backtest]
tickers = MSFT,INTC,LMT
start_date = 2022-09-01
end_date = 2024-09-23
initial_capital = 5000

[strategy]
fast_window = 20
slow_window = 50
risk_per_trade = 0.08
stop_loss = 0.12
"#;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn with_replaced(from: &str, to: &str) -> FileConfigAdapter {
        adapter(&VALID.replace(from, to))
    }

    fn invalid_key(err: SmacrossError) -> String {
        match err {
            SmacrossError::ConfigInvalid { key, .. } | SmacrossError::ConfigMissing { key, .. } => {
                key
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config(&adapter(VALID)).is_ok());
    }

    #[test]
    fn defaults_are_valid() {
        let ini = "[backtest]\ntickers = AAPL\nstart_date = 2022-09-01\nend_date = 2024-09-23\n";
        assert!(validate_config(&adapter(ini)).is_ok());
    }

    #[test]
    fn rejects_zero_stop_loss() {
        let err = validate_config(&with_replaced("stop_loss = 0.12", "stop_loss = 0")).unwrap_err();
        assert_eq!(invalid_key(err), "stop_loss");
    }

    #[test]
    fn rejects_negative_stop_loss() {
        let err =
            validate_config(&with_replaced("stop_loss = 0.12", "stop_loss = -0.1")).unwrap_err();
        assert_eq!(invalid_key(err), "stop_loss");
    }

    #[test]
    fn rejects_risk_out_of_range() {
        let err = validate_config(&with_replaced("risk_per_trade = 0.08", "risk_per_trade = 1.5"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "risk_per_trade");

        let err = validate_config(&with_replaced("risk_per_trade = 0.08", "risk_per_trade = 0"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "risk_per_trade");
    }

    #[test]
    fn accepts_full_risk() {
        assert!(
            validate_config(&with_replaced("risk_per_trade = 0.08", "risk_per_trade = 1")).is_ok()
        );
    }

    #[test]
    fn rejects_empty_ticker_list() {
        let err =
            validate_config(&with_replaced("tickers = MSFT,INTC,LMT", "tickers = ")).unwrap_err();
        assert_eq!(invalid_key(err), "tickers");
    }

    #[test]
    fn rejects_missing_tickers() {
        let err = validate_config(&with_replaced("tickers = MSFT,INTC,LMT", "")).unwrap_err();
        assert!(matches!(err, SmacrossError::ConfigMissing { key, .. } if key == "tickers"));
    }

    #[test]
    fn rejects_slow_not_above_fast() {
        let err =
            validate_config(&with_replaced("slow_window = 50", "slow_window = 20")).unwrap_err();
        assert_eq!(invalid_key(err), "slow_window");
    }

    #[test]
    fn rejects_zero_fast_window() {
        let err =
            validate_config(&with_replaced("fast_window = 20", "fast_window = 0")).unwrap_err();
        assert_eq!(invalid_key(err), "fast_window");
    }

    #[test]
    fn rejects_reversed_dates() {
        let err = validate_config(&with_replaced("end_date = 2024-09-23", "end_date = 2021-01-01"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "start_date");
    }

    #[test]
    fn rejects_bad_date_format() {
        let err = validate_config(&with_replaced("start_date = 2022-09-01", "start_date = 09/01/2022"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "start_date");
    }

    #[test]
    fn rejects_non_positive_capital() {
        let err = validate_config(&with_replaced("initial_capital = 5000", "initial_capital = 0"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "initial_capital");
    }

    #[test]
    fn rejects_unknown_data_source() {
        let ini = format!("{}\n[data]\nsource = bloomberg\n", VALID);
        let err = validate_config(&adapter(&ini)).unwrap_err();
        assert_eq!(invalid_key(err), "source");
    }

    #[test]
    fn rejects_malformed_stop_loss() {
        let err =
            validate_config(&with_replaced("stop_loss = 0.12", "stop_loss = 12%")).unwrap_err();
        assert!(matches!(err, SmacrossError::ConfigInvalid { ref key, .. } if key == "stop_loss"));
    }

    #[test]
    fn rejects_fractional_fast_window() {
        let err =
            validate_config(&with_replaced("fast_window = 20", "fast_window = 20.5")).unwrap_err();
        assert!(
            matches!(err, SmacrossError::ConfigInvalid { ref key, .. } if key == "fast_window")
        );
    }

    #[test]
    fn rejects_malformed_capital() {
        let err = validate_config(&with_replaced("initial_capital = 5000", "initial_capital = 5k"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "initial_capital");
    }

    #[test]
    fn rejects_bad_chart_size() {
        let ini = format!("{}\n[chart]\nwidth = wide\n", VALID);
        assert_eq!(invalid_key(validate_config(&adapter(&ini)).unwrap_err()), "width");

        let ini = format!("{}\n[chart]\nheight = 0\n", VALID);
        assert_eq!(invalid_key(validate_config(&adapter(&ini)).unwrap_err()), "height");
    }

    #[test]
    fn rejects_bad_timeout() {
        let ini = format!("{}\n[data]\ntimeout_secs = soon\n", VALID);
        assert_eq!(invalid_key(validate_config(&adapter(&ini)).unwrap_err()), "timeout_secs");
    }
}
