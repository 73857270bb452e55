//! Strategy parameters and capital injection.

use std::fmt;

use crate::domain::crossover::CrossoverSignal;
use crate::domain::sizing::PositionSizer;
use crate::domain::trend_filter::TrendFilter;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub fast_window: usize,
    pub slow_window: usize,
    pub filter_fast: usize,
    pub filter_mid: usize,
    pub filter_slow: usize,
    pub filter_multiplier: usize,
    /// Resample into buckets of this many bars before filtering.
    pub aggregation_multiple: Option<u32>,
    pub bar_interval_secs: u32,
    pub window_capacity: usize,
    /// Explicit warm-up; derived from the lookbacks when unset.
    pub warmup_bars: Option<usize>,
    pub atr_window: usize,
    pub atr_multiple: f64,
    pub risk_fraction: f64,
    pub position_cap: Option<u64>,
    pub price_offset: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            fast_window: 5,
            slow_window: 10,
            filter_fast: 5,
            filter_mid: 10,
            filter_slow: 20,
            filter_multiplier: 5,
            aggregation_multiple: None,
            bar_interval_secs: 60,
            window_capacity: 150,
            warmup_bars: None,
            atr_window: 14,
            atr_multiple: 3.0,
            risk_fraction: 0.01,
            position_cap: None,
            price_offset: 1.0,
        }
    }
}

impl StrategyConfig {
    pub fn crossover(&self) -> CrossoverSignal {
        CrossoverSignal::new(self.fast_window, self.slow_window)
    }

    pub fn trend_filter(&self) -> TrendFilter {
        TrendFilter::scaled(
            self.filter_fast,
            self.filter_mid,
            self.filter_slow,
            self.filter_multiplier,
        )
    }

    pub fn sizer(&self) -> PositionSizer {
        PositionSizer::new(self.risk_fraction, self.atr_multiple, self.position_cap)
    }

    /// True when the trend filter runs on the primary window.
    pub fn filters_on_primary(&self) -> bool {
        self.aggregation_multiple.is_none()
    }

    /// Bars the trend filter needs on whichever window it runs on.
    pub fn filter_lookback(&self) -> usize {
        self.trend_filter().lookback()
    }

    /// Longest lookback requested against the primary window.
    pub fn primary_lookback(&self) -> usize {
        let mut lookback = self.crossover().lookback().max(self.atr_window + 1);
        if self.filters_on_primary() {
            lookback = lookback.max(self.filter_lookback());
        }
        lookback
    }

    pub fn warmup_bars(&self) -> usize {
        self.warmup_bars.unwrap_or_else(|| self.primary_lookback())
    }
}

/// Where the sizing capital comes from, fixed at construction.
pub enum CapitalSource {
    Fixed(f64),
    Provider(Box<dyn Fn() -> f64 + Send>),
}

impl CapitalSource {
    pub fn provider<F>(f: F) -> Self
    where
        F: Fn() -> f64 + Send + 'static,
    {
        CapitalSource::Provider(Box::new(f))
    }

    pub fn current(&self) -> f64 {
        match self {
            CapitalSource::Fixed(capital) => *capital,
            CapitalSource::Provider(f) => f(),
        }
    }
}

impl fmt::Debug for CapitalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapitalSource::Fixed(capital) => f.debug_tuple("Fixed").field(capital).finish(),
            CapitalSource::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

/// How the replay host feeds capital to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapitalMode {
    /// Initial capital for every decision.
    Fixed,
    /// Initial capital plus realised PnL so far.
    Equity,
}

impl std::str::FromStr for CapitalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" | "static" => Ok(CapitalMode::Fixed),
            "equity" | "dynamic" => Ok(CapitalMode::Equity),
            other => Err(format!("unknown capital mode '{other}'")),
        }
    }
}
