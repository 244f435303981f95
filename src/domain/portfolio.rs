//! Portfolio state and per-bar valuation.

use chrono::NaiveDate;

use super::position::ExitReason;

/// Cash and holdings threaded through the simulation, one bar at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    /// Shares held; 0 when flat.
    pub position_size: f64,
    /// Price of the last entry. Stale while flat.
    pub entry_price: f64,
}

impl PortfolioState {
    pub fn new(initial_capital: f64) -> Self {
        PortfolioState {
            cash: initial_capital,
            position_size: 0.0,
            entry_price: 0.0,
        }
    }

    pub fn is_long(&self) -> bool {
        self.position_size > 0.0
    }

    pub fn is_flat(&self) -> bool {
        !self.is_long()
    }

    /// Price strictly below which the open position is stopped out.
    pub fn stop_price(&self, stop_loss_pct: f64) -> f64 {
        self.entry_price * (1.0 - stop_loss_pct)
    }

    /// True only while long and `price` is strictly below the stop price.
    pub fn should_stop_loss(&self, price: f64, stop_loss_pct: f64) -> bool {
        self.is_long() && price < self.stop_price(stop_loss_pct)
    }

    /// Mark-to-market value: cash plus the open position at `price`.
    pub fn value(&self, price: f64) -> f64 {
        if self.is_long() {
            self.cash + self.position_size * price
        } else {
            self.cash
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortfolioFrame {
    pub points: Vec<EquityPoint>,
}

impl PortfolioFrame {
    pub fn record(&mut self, date: NaiveDate, value: f64) {
        self.points.push(EquityPoint { date, value });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn final_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TradeEvent {
    Entry {
        index: usize,
        date: NaiveDate,
        price: f64,
        size: f64,
    },
    Exit {
        index: usize,
        date: NaiveDate,
        price: f64,
        size: f64,
        reason: ExitReason,
    },
}

impl TradeEvent {
    pub fn index(&self) -> usize {
        match self {
            TradeEvent::Entry { index, .. } | TradeEvent::Exit { index, .. } => *index,
        }
    }
}
