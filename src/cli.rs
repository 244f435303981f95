//! CLI definition and dispatch.
//!
//! The backtest command runs in three stages: compute every ticker
//! sequentially (failures are logged and skipped), then hand the results to
//! the optional consumers (chart, frame export), then print a summary.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::frame_csv_adapter::FrameCsvAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestResult, run_backtest};
use crate::domain::config_validation::{
    DEFAULT_FAST_WINDOW, DEFAULT_INITIAL_CAPITAL, DEFAULT_RISK_PER_TRADE, DEFAULT_SLOW_WINDOW,
    DEFAULT_STOP_LOSS, parse_date, validate_config,
};
use crate::domain::error::SmacrossError;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::validate_series;
use crate::domain::universe::{SkipReason, SkippedTicker, parse_tickers};
use crate::ports::chart_port::{ChartData, ChartPort};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "smacross", about = "Moving-average crossover backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the backtest over the configured tickers
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Run a single ticker instead of the configured list
        #[arg(long)]
        ticker: Option<String>,
        /// Directory for chart output
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Directory for per-ticker frame CSV files
        #[arg(long)]
        frames_dir: Option<PathBuf>,
        /// Skip chart rendering
        #[arg(long)]
        no_chart: bool,
    },
    /// Validate a configuration file and print the resolved settings
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Fetch one ticker and print its bar count and date range
    Fetch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
    },
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            ticker,
            output_dir,
            frames_dir,
            no_chart,
        } => run_backtest_command(
            &config,
            ticker.as_deref(),
            output_dir.as_ref(),
            frames_dir.as_ref(),
            no_chart,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Fetch { config, ticker } => run_fetch(&config, &ticker),
    }
}

fn fail(err: &SmacrossError) -> ExitCode {
    error!("{err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| fail(&e))?;
    validate_config(&adapter).map_err(|e| fail(&e))?;
    Ok(adapter)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SmacrossError> {
    let start_date = parse_date(
        config.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        config.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL)?,
        risk_per_trade: config.get_double("strategy", "risk_per_trade", DEFAULT_RISK_PER_TRADE)?,
        stop_loss_pct: config.get_double("strategy", "stop_loss", DEFAULT_STOP_LOSS)?,
        fast_window: config.get_int("strategy", "fast_window", DEFAULT_FAST_WINDOW)? as usize,
        slow_window: config.get_int("strategy", "slow_window", DEFAULT_SLOW_WINDOW)? as usize,
    })
}

pub fn resolve_tickers(
    ticker_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, SmacrossError> {
    let raw = match ticker_override {
        Some(t) => t.to_string(),
        None => config
            .get_string("backtest", "tickers")
            .ok_or_else(|| SmacrossError::ConfigMissing {
                section: "backtest".into(),
                key: "tickers".into(),
            })?,
    };

    parse_tickers(&raw).map_err(|e| SmacrossError::ConfigInvalid {
        section: "backtest".into(),
        key: "tickers".into(),
        reason: e.to_string(),
    })
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, SmacrossError> {
    let source = config
        .get_non_empty("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match source.as_str() {
        "csv" => {
            let dir = config
                .get_non_empty("data", "csv_dir")
                .unwrap_or_else(|| "data".to_string());
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        #[cfg(feature = "yahoo")]
        "yahoo" => {
            use crate::adapters::yahoo_adapter::YahooAdapter;
            Ok(Box::new(YahooAdapter::from_config(config)?))
        }
        other => Err(SmacrossError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("data source '{}' is not available in this build", other),
        }),
    }
}

/// Fetch, validate and backtest one ticker.
///
/// Short histories are not an error: the ticker runs all-flat and a warning
/// is logged.
pub fn backtest_ticker(
    data_port: &dyn DataPort,
    ticker: &str,
    config: &BacktestConfig,
) -> Result<BacktestResult, SmacrossError> {
    let bars = data_port.fetch_ohlcv(ticker, config.start_date, config.end_date)?;
    if bars.is_empty() {
        return Err(SmacrossError::NoData {
            ticker: ticker.to_string(),
        });
    }
    validate_series(ticker, &bars)?;

    debug!(ticker, bars = bars.len(), "running backtest");
    let result = run_backtest(ticker, bars, config);

    if !result.has_full_history() {
        let short = SmacrossError::InsufficientHistory {
            ticker: ticker.to_string(),
            bars: result.bars.len(),
            minimum: config.slow_window,
        };
        warn!("{short}; no trades possible");
    }
    Ok(result)
}

#[derive(Debug, Default)]
pub struct BatchResult {
    pub results: Vec<BacktestResult>,
    pub skipped: Vec<SkippedTicker>,
}

fn skip_reason(err: &SmacrossError) -> SkipReason {
    match err {
        SmacrossError::NoData { .. } => SkipReason::NoData,
        SmacrossError::InvalidBar { .. } => SkipReason::InvalidData(err.to_string()),
        _ => SkipReason::FetchFailed(err.to_string()),
    }
}

/// Backtest every ticker in order. One ticker's failure never stops the rest.
pub fn run_batch(
    data_port: &dyn DataPort,
    tickers: &[String],
    config: &BacktestConfig,
) -> BatchResult {
    let mut batch = BatchResult::default();

    for ticker in tickers {
        match backtest_ticker(data_port, ticker, config) {
            Ok(result) => {
                info!(
                    ticker = %ticker,
                    bars = result.bars.len(),
                    events = result.events.len(),
                    "backtest complete"
                );
                batch.results.push(result);
            }
            Err(e) => {
                warn!(ticker = %ticker, "skipping: {e}");
                batch.skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason: skip_reason(&e),
                });
            }
        }
    }

    batch
}

/// Render every result; failures are logged per ticker.
pub fn render_all(chart_port: &dyn ChartPort, results: &[BacktestResult]) -> usize {
    let mut rendered = 0;
    for result in results {
        match chart_port.render(&ChartData::from_result(result)) {
            Ok(path) => {
                info!(ticker = %result.ticker, path = %path.display(), "chart written");
                rendered += 1;
            }
            Err(e) => warn!(ticker = %result.ticker, "{e}"),
        }
    }
    rendered
}

/// Export every result; failures are logged per ticker.
pub fn export_all(report_port: &dyn ReportPort, results: &[BacktestResult]) -> usize {
    let mut written = 0;
    for result in results {
        match report_port.write(result) {
            Ok(path) => {
                info!(ticker = %result.ticker, path = %path.display(), "frame written");
                written += 1;
            }
            Err(e) => warn!(ticker = %result.ticker, "frame export failed: {e}"),
        }
    }
    written
}

fn format_profit_factor(pf: f64) -> String {
    if pf.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.2}", pf)
    }
}

pub fn format_summary(batch: &BatchResult, initial_capital: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<8} {:>6} {:>12} {:>9} {:>9} {:>8} {:>7} {:>5} {:>5} {:>6} {:>9} {:>7} {:>5}\n",
        "TICKER", "BARS", "FINAL", "RETURN", "MAX DD", "DD BARS", "TRADES", "WON", "LOST",
        "STOPS", "WIN RATE", "PF", "OPEN"
    ));

    for result in &batch.results {
        let m = Metrics::compute(result, initial_capital);
        out.push_str(&format!(
            "{:<8} {:>6} {:>12.2} {:>8.2}% {:>8.1}% {:>8} {:>7} {:>5} {:>5} {:>6} {:>8.1}% {:>7} {:>5}\n",
            result.ticker,
            result.bars.len(),
            m.final_value,
            m.total_return * 100.0,
            m.max_drawdown * 100.0,
            m.max_drawdown_duration,
            m.total_trades,
            m.trades_won,
            m.trades_lost,
            m.stop_loss_exits,
            m.win_rate * 100.0,
            format_profit_factor(m.profit_factor),
            if m.position_open { "yes" } else { "no" },
        ));
    }

    for skipped in &batch.skipped {
        out.push_str(&format!("{:<8} skipped ({})\n", skipped.ticker, skipped.reason));
    }

    out
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    chart_port: Option<&dyn ChartPort>,
    report_port: Option<&dyn ReportPort>,
    config: &BacktestConfig,
    tickers: &[String],
) -> ExitCode {
    info!(
        tickers = tickers.len(),
        source = data_port.name(),
        start = %config.start_date,
        end = %config.end_date,
        "running backtest"
    );

    // Stage 1: compute
    let batch = run_batch(data_port, tickers, config);

    // Stage 2: consumers
    if let Some(port) = chart_port {
        render_all(port, &batch.results);
    }
    if let Some(port) = report_port {
        export_all(port, &batch.results);
    }

    // Stage 3: summary
    print!("{}", format_summary(&batch, config.initial_capital));

    if batch.results.is_empty() {
        error!("no tickers could be backtested");
        return ExitCode::from(5);
    }
    ExitCode::SUCCESS
}

#[cfg(feature = "chart")]
fn build_chart_port(
    config: &dyn ConfigPort,
    output_override: Option<&PathBuf>,
) -> Result<Option<Box<dyn ChartPort>>, SmacrossError> {
    use crate::adapters::svg_chart_adapter::SvgChartAdapter;
    use crate::domain::config_validation::{DEFAULT_CHART_HEIGHT, DEFAULT_CHART_WIDTH};

    let dir = output_override.cloned().unwrap_or_else(|| {
        PathBuf::from(
            config
                .get_non_empty("chart", "output_dir")
                .unwrap_or_else(|| "charts".to_string()),
        )
    });
    let width = config.get_int("chart", "width", DEFAULT_CHART_WIDTH)?.max(1) as u32;
    let height = config.get_int("chart", "height", DEFAULT_CHART_HEIGHT)?.max(1) as u32;
    Ok(Some(Box::new(SvgChartAdapter::new(dir, width, height))))
}

#[cfg(not(feature = "chart"))]
fn build_chart_port(
    _config: &dyn ConfigPort,
    _output_override: Option<&PathBuf>,
) -> Result<Option<Box<dyn ChartPort>>, SmacrossError> {
    warn!("chart feature is disabled; skipping chart rendering");
    Ok(None)
}

fn run_backtest_command(
    config_path: &Path,
    ticker_override: Option<&str>,
    output_override: Option<&PathBuf>,
    frames_override: Option<&PathBuf>,
    no_chart: bool,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let tickers = match resolve_tickers(ticker_override, &adapter) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let chart_enabled = !no_chart && adapter.get_bool("chart", "enabled", true);
    let chart_port = if chart_enabled {
        match build_chart_port(&adapter, output_override) {
            Ok(port) => port,
            Err(e) => return fail(&e),
        }
    } else {
        None
    };

    let frames_dir = frames_override.cloned().or_else(|| {
        adapter
            .get_non_empty("output", "frames_dir")
            .map(PathBuf::from)
    });
    let report_port = frames_dir.map(FrameCsvAdapter::new);

    run_backtest_pipeline(
        data_port.as_ref(),
        chart_port.as_deref(),
        report_port.as_ref().map(|p| p as &dyn ReportPort),
        &bt_config,
        &tickers,
    )
}

pub fn describe_config(config: &BacktestConfig, tickers: &[String]) -> String {
    format!(
        "tickers:         {}\n\
         date range:      {} to {}\n\
         initial capital: {:.2}\n\
         risk per trade:  {:.2}%\n\
         stop loss:       {:.2}%\n\
         averages:        SMA({}) / SMA({})\n",
        tickers.join(", "),
        config.start_date,
        config.end_date,
        config.initial_capital,
        config.risk_per_trade * 100.0,
        config.stop_loss_pct * 100.0,
        config.fast_window,
        config.slow_window,
    )
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let tickers = match resolve_tickers(None, &adapter) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };

    print!("{}", describe_config(&bt_config, &tickers));
    info!("configuration is valid");
    ExitCode::SUCCESS
}

fn run_fetch(config_path: &Path, ticker: &str) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let ticker = ticker.trim().to_uppercase();
    match data_port.fetch_ohlcv(&ticker, bt_config.start_date, bt_config.end_date) {
        Ok(bars) => match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => {
                println!(
                    "{}: {} bars, {} to {}",
                    ticker,
                    bars.len(),
                    first.date,
                    last.date
                );
                ExitCode::SUCCESS
            }
            _ => fail(&SmacrossError::NoData { ticker }),
        },
        Err(e) => fail(&e),
    }
}
