//! Three-SMA trend filter.
//!
//! Bullish when SMA(fast) > SMA(mid) > SMA(slow), bearish on the reverse
//! strict ordering, neutral otherwise (any tie is neutral).

use crate::domain::bar_window::BarWindow;
use crate::domain::signal::Bias;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendFilter {
    pub fast: usize,
    pub mid: usize,
    pub slow: usize,
}

impl TrendFilter {
    pub fn new(fast: usize, mid: usize, slow: usize) -> Self {
        Self { fast, mid, slow }
    }

    /// Lengths scaled by `multiplier`, used to approximate a higher timeframe
    /// on a finer window.
    pub fn scaled(fast: usize, mid: usize, slow: usize, multiplier: usize) -> Self {
        Self::new(fast * multiplier, mid * multiplier, slow * multiplier)
    }

    pub fn lookback(&self) -> usize {
        self.fast.max(self.mid).max(self.slow)
    }

    /// Neutral when any average is unavailable.
    pub fn regime(&self, window: &BarWindow) -> Bias {
        let (Ok(fast), Ok(mid), Ok(slow)) = (
            window.sma(self.fast, 0),
            window.sma(self.mid, 0),
            window.sma(self.slow, 0),
        ) else {
            return Bias::Neutral;
        };

        if fast > mid && mid > slow {
            Bias::Bullish
        } else if fast < mid && mid < slow {
            Bias::Bearish
        } else {
            Bias::Neutral
        }
    }
}
