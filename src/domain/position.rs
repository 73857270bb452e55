//! Position direction and trailing stop state.

use chrono::NaiveDateTime;

use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Long,
    Short,
}

impl From<Direction> for PositionState {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Long => PositionState::Long,
            Direction::Short => PositionState::Short,
        }
    }
}

/// Ratcheting stop for one open position.
///
/// The stop only ever moves toward the favourable side: up for longs,
/// down for shorts.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailingStopState {
    pub direction: Direction,
    pub stop_price: f64,
    pub entry_price: f64,
    pub initial_risk_per_unit: f64,
    pub opened_at: NaiveDateTime,
}

impl TrailingStopState {
    pub fn open(
        direction: Direction,
        entry_price: f64,
        initial_risk_per_unit: f64,
        opened_at: NaiveDateTime,
    ) -> Self {
        Self {
            direction,
            stop_price: entry_price - direction.sign() * initial_risk_per_unit,
            entry_price,
            initial_risk_per_unit,
            opened_at,
        }
    }

    /// Tighten toward `high - distance` (long) or `low + distance` (short).
    pub fn ratchet(&mut self, bar: &Bar, distance: f64) {
        if distance.is_nan() {
            return;
        }
        self.stop_price = match self.direction {
            Direction::Long => self.stop_price.max(bar.high - distance),
            Direction::Short => self.stop_price.min(bar.low + distance),
        };
    }

    pub fn is_triggered(&self, close: f64) -> bool {
        match self.direction {
            Direction::Long => close <= self.stop_price,
            Direction::Short => close >= self.stop_price,
        }
    }

    pub fn profit_per_unit(&self, exit_price: f64) -> f64 {
        self.direction.sign() * (exit_price - self.entry_price)
    }

    /// None when the initial risk is zero.
    pub fn r_multiple(&self, exit_price: f64) -> Option<f64> {
        if self.initial_risk_per_unit == 0.0 {
            return None;
        }
        Some(self.profit_per_unit(exit_price) / self.initial_risk_per_unit)
    }
}
