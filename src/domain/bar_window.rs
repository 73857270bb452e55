//! Rolling bar window with on-demand SMA and ATR.
//!
//! Holds the most recent `capacity` bars. Readiness is driven by a warm-up
//! length declared at construction, never by whichever indicator was queried
//! last, so `inited` flips at the same bar on every run.
//!
//! SMA(n, lag) = mean of closes[newest - lag - n + 1 ..= newest - lag]
//! ATR(n): true ranges over the held bars (the oldest bar has no previous
//! close and is skipped), seeded with the mean of the first n, then
//! ATR = (prev * (n - 1) + TR) / n for each later true range.

use std::collections::VecDeque;

use chrono::NaiveDateTime;

use crate::domain::error::CoreError;
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone)]
pub struct BarWindow {
    bars: VecDeque<Bar>,
    capacity: usize,
    warmup: usize,
    bars_seen: usize,
    inited: bool,
    last_timestamp: Option<NaiveDateTime>,
}

impl BarWindow {
    /// A zero capacity is treated as 1.
    pub fn new(capacity: usize, warmup: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            bars: VecDeque::with_capacity(capacity),
            capacity,
            warmup,
            bars_seen: 0,
            inited: warmup == 0,
            last_timestamp: None,
        }
    }

    /// Append a bar, evicting the oldest when full.
    ///
    /// Timestamps must be strictly increasing; anything else is rejected and
    /// leaves the window untouched.
    pub fn update(&mut self, bar: Bar) -> Result<(), CoreError> {
        if let Some(previous) = self.last_timestamp {
            if bar.timestamp <= previous {
                return Err(CoreError::OutOfOrder {
                    previous,
                    received: bar.timestamp,
                });
            }
        }

        if self.bars.len() == self.capacity {
            self.bars.pop_front();
        }
        self.last_timestamp = Some(bar.timestamp);
        self.bars.push_back(bar);
        self.bars_seen += 1;
        if self.bars_seen >= self.warmup {
            self.inited = true;
        }
        Ok(())
    }

    pub fn inited(&self) -> bool {
        self.inited
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn warmup(&self) -> usize {
        self.warmup
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.back()
    }

    /// Bar `lag` positions back from the newest (0 = newest).
    pub fn get(&self, lag: usize) -> Option<&Bar> {
        self.bars.len().checked_sub(lag + 1).and_then(|i| self.bars.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }

    pub fn sma(&self, length: usize, lag: usize) -> Result<f64, CoreError> {
        let required = length + lag;
        if length == 0 || self.bars.len() < required {
            return Err(CoreError::NotReady {
                required,
                available: self.bars.len(),
            });
        }

        let end = self.bars.len() - lag;
        let start = end - length;
        let sum: f64 = self.bars.range(start..end).map(|b| b.close).sum();
        Ok(sum / length as f64)
    }

    pub fn atr(&self, length: usize) -> Result<f64, CoreError> {
        let required = length + 1;
        if length == 0 || self.bars.len() < required {
            return Err(CoreError::NotReady {
                required,
                available: self.bars.len(),
            });
        }

        let tr_values: Vec<f64> = self
            .bars
            .iter()
            .zip(self.bars.iter().skip(1))
            .map(|(prev, bar)| bar.true_range(prev.close))
            .collect();

        let seed = tr_values[..length].iter().sum::<f64>() / length as f64;
        let atr = tr_values[length..].iter().fold(seed, |prev, tr| {
            (prev * (length - 1) as f64 + tr) / length as f64
        });
        Ok(atr)
    }

    /// Drop all bars and readiness; capacity and warm-up are kept.
    pub fn clear(&mut self) {
        self.bars.clear();
        self.bars_seen = 0;
        self.inited = self.warmup == 0;
        self.last_timestamp = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + Duration::minutes(i as i64)
    }

    fn bar(i: usize, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: ts(i),
            open: close,
            high,
            low,
            close,
            volume: 100.0,
        }
    }

    fn window_from_closes(capacity: usize, closes: &[f64]) -> BarWindow {
        let mut window = BarWindow::new(capacity, 0);
        for (i, &c) in closes.iter().enumerate() {
            window.update(bar(i, c, c, c)).unwrap();
        }
        window
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let window = window_from_closes(3, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(window.len(), 3);
        assert_eq!(window.bars_seen(), 4);
        assert_relative_eq!(window.get(2).unwrap().close, 2.0);
        assert_relative_eq!(window.latest().unwrap().close, 4.0);
    }

    #[test]
    fn inited_after_warmup_and_sticky() {
        let mut window = BarWindow::new(3, 5);
        for i in 0..4 {
            window.update(bar(i, 1.0, 1.0, 1.0)).unwrap();
            assert!(!window.inited());
        }
        window.update(bar(4, 1.0, 1.0, 1.0)).unwrap();
        assert!(window.inited());
        window.update(bar(5, 1.0, 1.0, 1.0)).unwrap();
        assert!(window.inited());
    }

    #[test]
    fn zero_warmup_is_inited_immediately() {
        let window = BarWindow::new(5, 0);
        assert!(window.inited());
    }

    #[test]
    fn sma_current_and_lagged() {
        let window = window_from_closes(10, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_relative_eq!(window.sma(3, 0).unwrap(), 4.0);
        assert_relative_eq!(window.sma(3, 1).unwrap(), 3.0);
        assert_relative_eq!(window.sma(5, 0).unwrap(), 3.0);
    }

    #[test]
    fn sma_not_ready_when_short() {
        let window = window_from_closes(10, &[1.0, 2.0, 3.0]);
        assert!(matches!(
            window.sma(3, 1),
            Err(CoreError::NotReady {
                required: 4,
                available: 3
            })
        ));
        assert!(window.sma(0, 0).is_err());
    }

    #[test]
    fn atr_excludes_first_bar() {
        let mut window = BarWindow::new(10, 0);
        window.update(bar(0, 200.0, 0.0, 100.0)).unwrap();
        window.update(bar(1, 102.0, 98.0, 100.0)).unwrap();
        window.update(bar(2, 103.0, 99.0, 101.0)).unwrap();
        // TRs: 4, 4; the 200-point first bar never contributes
        assert_relative_eq!(window.atr(2).unwrap(), 4.0);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let mut window = BarWindow::new(10, 0);
        window.update(bar(0, 101.0, 99.0, 100.0)).unwrap();
        window.update(bar(1, 102.0, 100.0, 101.0)).unwrap(); // TR 2
        window.update(bar(2, 105.0, 101.0, 104.0)).unwrap(); // TR 4
        window.update(bar(3, 110.0, 104.0, 108.0)).unwrap(); // TR 6
        let seed = (2.0 + 4.0) / 2.0;
        let expected = (seed * 1.0 + 6.0) / 2.0;
        assert_relative_eq!(window.atr(2).unwrap(), expected);
    }

    #[test]
    fn atr_needs_length_plus_one() {
        let window = window_from_closes(10, &[1.0, 2.0, 3.0]);
        assert!(window.atr(3).is_err());
        assert!(window.atr(2).is_ok());
    }

    #[test]
    fn rejects_out_of_order_and_duplicate() {
        let mut window = BarWindow::new(5, 0);
        window.update(bar(3, 1.0, 1.0, 1.0)).unwrap();
        assert!(matches!(
            window.update(bar(3, 2.0, 2.0, 2.0)),
            Err(CoreError::OutOfOrder { .. })
        ));
        assert!(window.update(bar(1, 2.0, 2.0, 2.0)).is_err());
        assert_eq!(window.len(), 1);
        assert_relative_eq!(window.latest().unwrap().close, 1.0);
    }

    #[test]
    fn clear_resets_readiness() {
        let mut window = BarWindow::new(5, 2);
        window.update(bar(0, 1.0, 1.0, 1.0)).unwrap();
        window.update(bar(1, 1.0, 1.0, 1.0)).unwrap();
        assert!(window.inited());
        window.clear();
        assert!(!window.inited());
        assert!(window.is_empty());
        // earlier timestamps are accepted again after a clear
        window.update(bar(0, 1.0, 1.0, 1.0)).unwrap();
    }
}
