//! Crossover signal generation.
//!
//! trend_state[i] = 1 when SMA(fast) > SMA(slow), 0 otherwise or while either
//! average is still warming up. Indices below `fast_window` are forced to 0.
//! transition[i] = trend_state[i] - trend_state[i-1], 0 at index 0.

use chrono::NaiveDate;

use super::indicator::IndicatorFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Above,
    NotAbove,
}

impl Trend {
    pub fn state(self) -> i8 {
        match self {
            Trend::Above => 1,
            Trend::NotAbove => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entry,
    Exit,
    None,
}

impl Transition {
    pub fn from_delta(delta: i8) -> Self {
        match delta {
            1 => Transition::Entry,
            -1 => Transition::Exit,
            _ => Transition::None,
        }
    }

    pub fn value(self) -> i8 {
        match self {
            Transition::Entry => 1,
            Transition::Exit => -1,
            Transition::None => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalPoint {
    pub date: NaiveDate,
    /// `None` while the averages are undefined or inside the forced-flat prefix.
    pub trend: Option<Trend>,
    pub transition: Transition,
}

impl SignalPoint {
    pub fn trend_state(&self) -> i8 {
        self.trend.map(Trend::state).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalFrame {
    pub points: Vec<SignalPoint>,
}

impl SignalFrame {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn transition_at(&self, index: usize) -> Transition {
        self.points
            .get(index)
            .map(|p| p.transition)
            .unwrap_or(Transition::None)
    }

    /// Indices of bars carrying the given transition.
    pub fn indices_of(&self, transition: Transition) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.transition == transition)
            .map(|(i, _)| i)
            .collect()
    }
}

pub fn generate_signals(frame: &IndicatorFrame, fast_window: usize) -> SignalFrame {
    let mut points = Vec::with_capacity(frame.len());
    let mut prev_state = 0i8;

    for i in 0..frame.len() {
        let trend = if i < fast_window {
            None
        } else {
            match (frame.fast.value_at(i), frame.slow.value_at(i)) {
                (Some(fast), Some(slow)) if fast > slow => Some(Trend::Above),
                (Some(_), Some(_)) => Some(Trend::NotAbove),
                _ => None,
            }
        };

        let state = trend.map(Trend::state).unwrap_or(0);
        let transition = if i == 0 {
            Transition::None
        } else {
            Transition::from_delta(state - prev_state)
        };
        prev_state = state;

        points.push(SignalPoint {
            date: frame.fast.values[i].date,
            trend,
            transition,
        });
    }

    SignalFrame { points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

    fn series(period: usize, values: &[Option<f64>]) -> IndicatorSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        IndicatorSeries {
            indicator_type: IndicatorType::Sma(period),
            values: values
                .iter()
                .enumerate()
                .map(|(i, &value)| IndicatorPoint {
                    date: start + chrono::Duration::days(i as i64),
                    value,
                })
                .collect(),
        }
    }

    fn frame(fast: &[Option<f64>], slow: &[Option<f64>]) -> IndicatorFrame {
        IndicatorFrame {
            fast: series(1, fast),
            slow: series(2, slow),
        }
    }

    #[test]
    fn cross_above_then_below() {
        let f = frame(
            &[Some(1.0), Some(3.0), Some(3.0), Some(1.0)],
            &[Some(2.0), Some(2.0), Some(2.0), Some(2.0)],
        );
        let signals = generate_signals(&f, 0);

        let states: Vec<i8> = signals.points.iter().map(|p| p.trend_state()).collect();
        assert_eq!(states, vec![0, 1, 1, 0]);
        assert_eq!(signals.transition_at(0), Transition::None);
        assert_eq!(signals.transition_at(1), Transition::Entry);
        assert_eq!(signals.transition_at(2), Transition::None);
        assert_eq!(signals.transition_at(3), Transition::Exit);
    }

    #[test]
    fn undefined_slow_is_flat() {
        let f = frame(&[Some(5.0), Some(5.0), Some(5.0)], &[None, None, Some(1.0)]);
        let signals = generate_signals(&f, 0);

        assert_eq!(signals.points[0].trend, None);
        assert_eq!(signals.points[1].trend, None);
        assert_eq!(signals.points[2].trend, Some(Trend::Above));
        assert_eq!(signals.transition_at(2), Transition::Entry);
    }

    #[test]
    fn equal_averages_are_not_above() {
        let f = frame(&[Some(2.0)], &[Some(2.0)]);
        let signals = generate_signals(&f, 0);
        assert_eq!(signals.points[0].trend, Some(Trend::NotAbove));
        assert_eq!(signals.points[0].trend_state(), 0);
    }

    #[test]
    fn forced_flat_prefix_suppresses_early_transitions() {
        let f = frame(
            &[Some(3.0), Some(3.0), Some(3.0), Some(3.0)],
            &[Some(1.0), Some(1.0), Some(1.0), Some(1.0)],
        );
        let signals = generate_signals(&f, 3);

        assert_eq!(signals.indices_of(Transition::Entry), vec![3]);
        assert!(signals.points[..3].iter().all(|p| p.trend.is_none()));
    }

    #[test]
    fn transition_values() {
        assert_eq!(Transition::from_delta(1).value(), 1);
        assert_eq!(Transition::from_delta(-1).value(), -1);
        assert_eq!(Transition::from_delta(0).value(), 0);
    }

    #[test]
    fn empty_frame() {
        let f = frame(&[], &[]);
        assert!(generate_signals(&f, 20).is_empty());
    }
}
