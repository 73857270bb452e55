//! Volatility-normalised position sizing.
//!
//! risk_amount   = capital * risk_fraction
//! risk_per_unit = atr * atr_multiple
//! size          = min(floor(risk_amount / risk_per_unit), cap), floored at 0
//!
//! A non-positive risk per unit (flat market, zero ATR) sizes to 0.

use crate::domain::error::CoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSizer {
    pub risk_fraction: f64,
    pub atr_multiple: f64,
    pub cap: Option<u64>,
}

impl PositionSizer {
    pub fn new(risk_fraction: f64, atr_multiple: f64, cap: Option<u64>) -> Self {
        Self {
            risk_fraction,
            atr_multiple,
            cap,
        }
    }

    /// Per-unit risk for `atr`, or `DegenerateRisk` when it is not positive.
    pub fn risk_per_unit(&self, atr: f64) -> Result<f64, CoreError> {
        let risk_per_unit = atr * self.atr_multiple;
        if risk_per_unit > 0.0 && risk_per_unit.is_finite() {
            Ok(risk_per_unit)
        } else {
            Err(CoreError::DegenerateRisk { atr, risk_per_unit })
        }
    }

    pub fn size(&self, capital: f64, atr: f64) -> u64 {
        size(capital, atr, self.risk_fraction, self.atr_multiple, self.cap)
    }
}

/// Units to trade for the given risk budget; 0 means no order.
pub fn size(
    account_risk_capital: f64,
    atr: f64,
    risk_fraction: f64,
    atr_multiple: f64,
    cap: Option<u64>,
) -> u64 {
    let risk_per_unit = atr * atr_multiple;
    if risk_per_unit.is_nan() || risk_per_unit <= 0.0 {
        return 0;
    }

    let risk_amount = account_risk_capital * risk_fraction;
    let raw = (risk_amount / risk_per_unit).floor();
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }

    // saturating float-to-int cast
    let raw = raw as u64;
    match cap {
        Some(cap) => raw.min(cap),
        None => raw,
    }
}
