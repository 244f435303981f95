//! Per-ticker performance summary.

use super::backtest::BacktestResult;
use super::portfolio::EquityPoint;
use super::position::{ClosedTrade, ExitReason};

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub stop_loss_exits: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub position_open: bool,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, initial_capital: f64) -> Self {
        let final_value = result.portfolio.final_value().unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&result.portfolio.points);
        let (trades_won, trades_lost, profit_factor) = trade_stats(&result.trades);
        let total_trades = result.trades.len();

        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let stop_loss_exits = result
            .trades
            .iter()
            .filter(|t| t.reason == ExitReason::StopLoss)
            .count();

        Metrics {
            initial_capital,
            final_value,
            total_return,
            max_drawdown,
            max_drawdown_duration,
            total_trades,
            trades_won,
            trades_lost,
            stop_loss_exits,
            win_rate,
            profit_factor,
            position_open: result.open_position.is_some(),
        }
    }
}

fn trade_stats(trades: &[ClosedTrade]) -> (usize, usize, f64) {
    let mut won = 0usize;
    let mut lost = 0usize;
    let mut total_wins = 0.0_f64;
    let mut total_losses = 0.0_f64;

    for trade in trades {
        if trade.pnl > 0.0 {
            won += 1;
            total_wins += trade.pnl;
        } else if trade.pnl < 0.0 {
            lost += 1;
            total_losses += trade.pnl.abs();
        }
    }

    let profit_factor = if total_losses > 0.0 {
        total_wins / total_losses
    } else if total_wins > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    (won, lost, profit_factor)
}

/// Largest peak-to-trough decline as a fraction of the peak, and the longest
/// run of bars spent below a prior peak.
fn compute_drawdown(curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.value;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut duration = 0usize;

    for point in curve {
        if point.value >= peak {
            peak = point.value;
            duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.value) / peak);
            duration += 1;
            max_duration = max_duration.max(duration);
        }
    }

    (max_dd, max_duration)
}
