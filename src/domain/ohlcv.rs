//! OHLCV bar representation.

use chrono::NaiveDateTime;

use crate::domain::error::CoreError;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Reject bars whose prices cannot describe a real trading interval:
    /// non-finite or non-positive prices, negative volume, or open/close
    /// outside [low, high].
    pub fn check(&self) -> Result<(), CoreError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(self.invalid("prices must be finite and positive"));
        }
        if !(self.volume >= 0.0) {
            return Err(self.invalid("volume must be non-negative"));
        }
        if self.low > self.high {
            return Err(self.invalid("low above high"));
        }
        if [self.open, self.close]
            .iter()
            .any(|p| *p < self.low || *p > self.high)
        {
            return Err(self.invalid("open/close outside the high-low range"));
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> CoreError {
        CoreError::Data {
            reason: format!("{}: {}", self.timestamp.format("%Y-%m-%d %H:%M:%S"), reason),
        }
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}
