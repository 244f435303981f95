//! Per-ticker backtest pipeline.
//!
//! bars -> indicator frame -> signal frame -> simulation. Pure: the result
//! depends only on the bars and the config.

use chrono::NaiveDate;

use super::indicator::{IndicatorFrame, compute_indicator_frame};
use super::ohlcv::OhlcvBar;
use super::portfolio::{PortfolioFrame, PortfolioState, TradeEvent};
use super::position::{ClosedTrade, Position};
use super::signal::{SignalFrame, generate_signals};
use super::simulator::{SimulationParams, simulate};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub risk_per_trade: f64,
    pub stop_loss_pct: f64,
    pub fast_window: usize,
    pub slow_window: usize,
}

impl BacktestConfig {
    pub fn simulation_params(&self) -> SimulationParams {
        SimulationParams {
            initial_capital: self.initial_capital,
            risk_per_trade: self.risk_per_trade,
            stop_loss_pct: self.stop_loss_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub ticker: String,
    pub bars: Vec<OhlcvBar>,
    pub indicators: IndicatorFrame,
    pub signals: SignalFrame,
    pub portfolio: PortfolioFrame,
    pub events: Vec<TradeEvent>,
    pub trades: Vec<ClosedTrade>,
    pub open_position: Option<Position>,
    pub final_state: PortfolioState,
}

impl BacktestResult {
    /// False when the slow average never became defined, so no trade was possible.
    pub fn has_full_history(&self) -> bool {
        self.indicators.slow.first_valid_index().is_some()
    }
}

pub fn run_backtest(ticker: &str, bars: Vec<OhlcvBar>, config: &BacktestConfig) -> BacktestResult {
    let indicators = compute_indicator_frame(&bars, config.fast_window, config.slow_window);
    let signals = generate_signals(&indicators, config.fast_window);
    let sim = simulate(ticker, &bars, &signals, &config.simulation_params());

    BacktestResult {
        ticker: ticker.to_string(),
        bars,
        indicators,
        signals,
        portfolio: sim.portfolio,
        events: sim.events,
        trades: sim.trades,
        open_position: sim.open_position,
        final_state: sim.final_state,
    }
}
