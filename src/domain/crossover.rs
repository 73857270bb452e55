//! Fast/slow SMA crossover signal.
//!
//! Bullish cross: fast[0] > slow[0] and fast[1] <= slow[1].
//! Bearish cross: fast[0] < slow[0] and fast[1] >= slow[1].
//! Needs slow + 1 bars; fewer bars yield no signal rather than an error.

use crate::domain::bar_window::BarWindow;
use crate::domain::signal::Bias;

#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverSignal {
    pub fast: usize,
    pub slow: usize,
}

impl CrossoverSignal {
    pub fn new(fast: usize, slow: usize) -> Self {
        Self { fast, slow }
    }

    pub fn lookback(&self) -> usize {
        self.fast.max(self.slow) + 1
    }

    pub fn signal(&self, window: &BarWindow) -> Bias {
        let (Ok(fast_now), Ok(slow_now), Ok(fast_prev), Ok(slow_prev)) = (
            window.sma(self.fast, 0),
            window.sma(self.slow, 0),
            window.sma(self.fast, 1),
            window.sma(self.slow, 1),
        ) else {
            return Bias::Neutral;
        };

        if fast_now > slow_now && fast_prev <= slow_prev {
            Bias::Bullish
        } else if fast_now < slow_now && fast_prev >= slow_prev {
            Bias::Bearish
        } else {
            Bias::Neutral
        }
    }
}
