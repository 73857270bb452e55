#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tharptrader::domain::config_validation::RunConfig;
pub use tharptrader::domain::ohlcv::Bar;
use tharptrader::domain::strategy::{CapitalMode, StrategyConfig};

/// 2024-01-02 09:00 plus `i` minutes.
pub fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
        + Duration::minutes(i as i64)
}

/// One-minute bar with a unit high-low range around `close`.
pub fn bar(i: usize, close: f64) -> Bar {
    Bar {
        timestamp: ts(i),
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 100.0,
    }
}

pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| bar(i, c))
        .collect()
}

/// Short lookbacks so scenarios fit in a handful of bars.
/// Warm-up is max(slow + 1, atr + 1, filter_slow) = 5.
pub fn small_config() -> StrategyConfig {
    StrategyConfig {
        fast_window: 2,
        slow_window: 4,
        filter_fast: 2,
        filter_mid: 3,
        filter_slow: 4,
        filter_multiplier: 1,
        window_capacity: 20,
        atr_window: 3,
        atr_multiple: 2.0,
        risk_fraction: 0.01,
        ..StrategyConfig::default()
    }
}

pub fn small_run_config(capital_mode: CapitalMode) -> RunConfig {
    RunConfig {
        strategy: small_config(),
        capital: 100_000.0,
        capital_mode,
    }
}

pub const SMALL_INI: &str = r#"
[strategy]
fast_window = 2
slow_window = 4
filter_fast = 2
filter_mid = 3
filter_slow = 4
filter_multiplier = 1
window_capacity = 20

[risk]
atr_window = 3
atr_multiple = 2.0
risk_fraction = 0.01
capital = 100000
"#;

/// Five flat bars, a breakout to 101 (long entry), a push to 102 that
/// lifts the stop to 99.9444, then a close at 99 that hits it.
pub const LONG_LOSER: [f64; 8] = [100.0, 100.0, 100.0, 100.0, 100.0, 101.0, 102.0, 99.0];

/// Mirror image of [`LONG_LOSER`] for a short.
pub const SHORT_LOSER: [f64; 8] = [100.0, 100.0, 100.0, 100.0, 100.0, 99.0, 98.0, 101.0];

pub fn csv_from_bars(bars: &[Bar]) -> String {
    let mut out = String::from("datetime,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}
