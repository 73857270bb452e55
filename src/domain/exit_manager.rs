//! Trailing-stop exit state machine.
//!
//! Flat -> Long/Short on `open`; each later bar ratchets the stop with a
//! freshly measured ATR, then closes the position when the bar's close
//! crosses it. The stop state is dropped on exit.

use chrono::NaiveDateTime;

use crate::domain::ohlcv::Bar;
use crate::domain::position::{Direction, PositionState, TrailingStopState};

/// A position closed by its trailing stop.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitSignal {
    pub timestamp: NaiveDateTime,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub stop_price: f64,
    pub initial_risk_per_unit: f64,
    /// None when the entry carried zero risk.
    pub r_multiple: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ExitManager {
    atr_multiple: f64,
    stop: Option<TrailingStopState>,
}

impl ExitManager {
    pub fn new(atr_multiple: f64) -> Self {
        Self {
            atr_multiple,
            stop: None,
        }
    }

    pub fn state(&self) -> PositionState {
        match &self.stop {
            Some(stop) => stop.direction.into(),
            None => PositionState::Flat,
        }
    }

    pub fn stop(&self) -> Option<&TrailingStopState> {
        self.stop.as_ref()
    }

    /// Start tracking a new position entered at `entry_price`.
    ///
    /// Initial risk per unit is `atr * atr_multiple`; any existing stop is
    /// replaced.
    pub fn open(
        &mut self,
        direction: Direction,
        entry_price: f64,
        atr: f64,
        opened_at: NaiveDateTime,
    ) -> &TrailingStopState {
        let initial_risk = atr * self.atr_multiple;
        self.stop
            .insert(TrailingStopState::open(direction, entry_price, initial_risk, opened_at))
    }

    /// Evaluate one bar. `atr` is the current reading; when it is unavailable
    /// the stop is held where it is and only the trigger is checked.
    pub fn on_bar(&mut self, bar: &Bar, atr: Option<f64>) -> Option<ExitSignal> {
        let stop = self.stop.as_mut()?;

        if let Some(atr) = atr {
            stop.ratchet(bar, self.atr_multiple * atr);
        }

        if !stop.is_triggered(bar.close) {
            return None;
        }

        let closed = self.stop.take()?;
        Some(ExitSignal {
            timestamp: bar.timestamp,
            direction: closed.direction,
            entry_price: closed.entry_price,
            exit_price: bar.close,
            stop_price: closed.stop_price,
            initial_risk_per_unit: closed.initial_risk_per_unit,
            r_multiple: closed.r_multiple(bar.close),
        })
    }

    pub fn reset(&mut self) {
        self.stop = None;
    }
}
