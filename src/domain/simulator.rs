//! Single-position portfolio simulation.
//!
//! The walk is a fold over the bars: each step takes the previous
//! `PortfolioState` by value and returns the next one plus at most one
//! `TradeEvent`. Rules per bar, in precedence order:
//! 1. Entry on a +1 transition while flat. Size is risk-based:
//!    `(cash * risk_per_trade) / (close * stop_loss_pct)` shares.
//! 2. Exit on a -1 transition, or when long and `close < entry * (1 - stop_loss_pct)`.
//! 3. Hold.

use chrono::NaiveDate;

use super::ohlcv::OhlcvBar;
use super::portfolio::{PortfolioFrame, PortfolioState, TradeEvent};
use super::position::{ClosedTrade, ExitReason, Position};
use super::signal::{SignalFrame, Transition};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub initial_capital: f64,
    /// Fraction of current cash risked on each entry.
    pub risk_per_trade: f64,
    /// Fractional drop from entry that forces an exit. Must be > 0.
    pub stop_loss_pct: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            initial_capital: 5000.0,
            risk_per_trade: 0.08,
            stop_loss_pct: 0.12,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub portfolio: PortfolioFrame,
    pub events: Vec<TradeEvent>,
    pub trades: Vec<ClosedTrade>,
    pub open_position: Option<Position>,
    pub final_state: PortfolioState,
}

/// Position size for a given cash balance and entry price.
pub fn risk_based_size(cash: f64, price: f64, params: &SimulationParams) -> f64 {
    let risk_amount = cash * params.risk_per_trade;
    risk_amount / (price * params.stop_loss_pct)
}

/// Advance the portfolio by one bar.
pub fn step(
    state: PortfolioState,
    index: usize,
    date: NaiveDate,
    close: f64,
    transition: Transition,
    params: &SimulationParams,
) -> (PortfolioState, Option<TradeEvent>) {
    // A +1 transition can only follow a -1 (which always exits), so an
    // entry signal never arrives while long.
    if transition == Transition::Entry && state.is_flat() {
        let size = risk_based_size(state.cash, close, params);
        let next = PortfolioState {
            cash: state.cash - size * close,
            position_size: size,
            entry_price: close,
        };
        let event = TradeEvent::Entry {
            index,
            date,
            price: close,
            size,
        };
        return (next, Some(event));
    }

    if transition == Transition::Entry {
        return (state, None);
    }

    let stopped = state.should_stop_loss(close, params.stop_loss_pct);
    let signalled = transition == Transition::Exit;

    if (signalled || stopped) && state.is_long() {
        let next = PortfolioState {
            cash: state.cash + state.position_size * close,
            position_size: 0.0,
            entry_price: state.entry_price,
        };
        let reason = if signalled {
            ExitReason::Signal
        } else {
            ExitReason::StopLoss
        };
        let event = TradeEvent::Exit {
            index,
            date,
            price: close,
            size: state.position_size,
            reason,
        };
        return (next, Some(event));
    }

    (state, None)
}

struct Walk {
    state: PortfolioState,
    portfolio: PortfolioFrame,
    events: Vec<TradeEvent>,
    trades: Vec<ClosedTrade>,
    open: Option<Position>,
}

/// Run the simulation over aligned bars and signals.
///
/// Bars beyond the signal frame are treated as carrying no transition.
pub fn simulate(
    ticker: &str,
    bars: &[OhlcvBar],
    signals: &SignalFrame,
    params: &SimulationParams,
) -> Simulation {
    let init = Walk {
        state: PortfolioState::new(params.initial_capital),
        portfolio: PortfolioFrame {
            points: Vec::with_capacity(bars.len()),
        },
        events: Vec::new(),
        trades: Vec::new(),
        open: None,
    };

    let walk = bars.iter().enumerate().fold(init, |mut walk, (i, bar)| {
        let transition = signals.transition_at(i);
        let (state, event) = step(walk.state, i, bar.date, bar.close, transition, params);

        match &event {
            Some(TradeEvent::Entry {
                date, price, size, ..
            }) => {
                walk.open = Some(Position {
                    size: *size,
                    entry_price: *price,
                    entry_date: *date,
                });
            }
            Some(TradeEvent::Exit {
                date,
                price,
                reason,
                ..
            }) => {
                if let Some(position) = walk.open.take() {
                    walk.trades.push(ClosedTrade {
                        ticker: ticker.to_string(),
                        size: position.size,
                        entry_price: position.entry_price,
                        exit_price: *price,
                        entry_date: position.entry_date,
                        exit_date: *date,
                        pnl: position.unrealized_pnl(*price),
                        reason: *reason,
                    });
                }
            }
            None => {}
        }
        if let Some(event) = event {
            walk.events.push(event);
        }

        walk.portfolio.record(bar.date, state.value(bar.close));
        walk.state = state;
        walk
    });

    Simulation {
        portfolio: walk.portfolio,
        events: walk.events,
        trades: walk.trades,
        open_position: walk.open,
        final_state: walk.state,
    }
}
