//! Configuration loading and validation.
//!
//! Builds a validated [`StrategyConfig`] and host settings from any
//! [`ConfigPort`]. Missing keys fall back to the reference defaults;
//! present-but-unparsable keys are errors, never silently defaulted.

use std::str::FromStr;

use crate::domain::error::CoreError;
use crate::domain::strategy::{CapitalMode, StrategyConfig};
use crate::ports::config_port::ConfigPort;

const STRATEGY: &str = "strategy";
const RISK: &str = "risk";

/// Everything the replay host needs to build a core.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub strategy: StrategyConfig,
    pub capital: f64,
    pub capital_mode: CapitalMode,
}

pub fn build_run_config(config: &dyn ConfigPort) -> Result<RunConfig, CoreError> {
    for section in [STRATEGY, RISK] {
        if !config.has_section(section) {
            tracing::warn!(section, "config section missing, using defaults");
        }
    }
    let strategy = build_strategy_config(config)?;

    let capital = parse_or(config, RISK, "capital", 100_000.0)?;
    if !(capital > 0.0) {
        return Err(CoreError::invalid(RISK, "capital", "capital must be positive"));
    }

    let capital_mode = match config.get_string(RISK, "capital_mode") {
        Some(raw) => raw
            .parse::<CapitalMode>()
            .map_err(|reason| CoreError::invalid(RISK, "capital_mode", reason))?,
        None => CapitalMode::Fixed,
    };

    Ok(RunConfig {
        strategy,
        capital,
        capital_mode,
    })
}

pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, CoreError> {
    let defaults = StrategyConfig::default();
    let strategy = StrategyConfig {
        fast_window: parse_or(config, STRATEGY, "fast_window", defaults.fast_window)?,
        slow_window: parse_or(config, STRATEGY, "slow_window", defaults.slow_window)?,
        filter_fast: parse_or(config, STRATEGY, "filter_fast", defaults.filter_fast)?,
        filter_mid: parse_or(config, STRATEGY, "filter_mid", defaults.filter_mid)?,
        filter_slow: parse_or(config, STRATEGY, "filter_slow", defaults.filter_slow)?,
        filter_multiplier: parse_or(
            config,
            STRATEGY,
            "filter_multiplier",
            defaults.filter_multiplier,
        )?,
        aggregation_multiple: parse_opt(config, STRATEGY, "aggregation_multiple")?,
        bar_interval_secs: parse_or(
            config,
            STRATEGY,
            "bar_interval_secs",
            defaults.bar_interval_secs,
        )?,
        window_capacity: parse_or(
            config,
            STRATEGY,
            "window_capacity",
            defaults.window_capacity,
        )?,
        warmup_bars: parse_opt(config, STRATEGY, "warmup_bars")?,
        atr_window: parse_or(config, RISK, "atr_window", defaults.atr_window)?,
        atr_multiple: parse_or(config, RISK, "atr_multiple", defaults.atr_multiple)?,
        risk_fraction: parse_or(config, RISK, "risk_fraction", defaults.risk_fraction)?,
        position_cap: parse_opt(config, RISK, "position_cap")?,
        price_offset: parse_or(config, RISK, "price_offset", defaults.price_offset)?,
    };
    validate_strategy_config(&strategy)?;
    Ok(strategy)
}

pub fn validate_strategy_config(c: &StrategyConfig) -> Result<(), CoreError> {
    validate_windows(c)?;
    validate_filter(c)?;
    validate_risk(c)?;
    validate_capacity(c)?;
    Ok(())
}

fn validate_windows(c: &StrategyConfig) -> Result<(), CoreError> {
    if c.fast_window == 0 {
        return Err(CoreError::invalid(STRATEGY, "fast_window", "fast_window must be at least 1"));
    }
    if c.slow_window <= c.fast_window {
        return Err(CoreError::invalid(
            STRATEGY,
            "slow_window",
            "slow_window must be greater than fast_window",
        ));
    }
    if c.atr_window == 0 {
        return Err(CoreError::invalid(RISK, "atr_window", "atr_window must be at least 1"));
    }
    Ok(())
}

fn validate_filter(c: &StrategyConfig) -> Result<(), CoreError> {
    if c.filter_fast == 0 {
        return Err(CoreError::invalid(STRATEGY, "filter_fast", "filter_fast must be at least 1"));
    }
    if !(c.filter_fast < c.filter_mid && c.filter_mid < c.filter_slow) {
        return Err(CoreError::invalid(
            STRATEGY,
            "filter_mid",
            "filter lengths must satisfy filter_fast < filter_mid < filter_slow",
        ));
    }
    if c.filter_multiplier == 0 {
        return Err(CoreError::invalid(
            STRATEGY,
            "filter_multiplier",
            "filter_multiplier must be at least 1",
        ));
    }
    if c.aggregation_multiple == Some(0) {
        return Err(CoreError::invalid(
            STRATEGY,
            "aggregation_multiple",
            "aggregation_multiple must be at least 1",
        ));
    }
    if c.bar_interval_secs == 0 {
        return Err(CoreError::invalid(
            STRATEGY,
            "bar_interval_secs",
            "bar_interval_secs must be at least 1",
        ));
    }
    Ok(())
}

fn validate_risk(c: &StrategyConfig) -> Result<(), CoreError> {
    if !(c.atr_multiple > 0.0) || !c.atr_multiple.is_finite() {
        return Err(CoreError::invalid(RISK, "atr_multiple", "atr_multiple must be positive"));
    }
    if !(c.risk_fraction > 0.0 && c.risk_fraction <= 1.0) {
        return Err(CoreError::invalid(
            RISK,
            "risk_fraction",
            "risk_fraction must be in (0, 1]",
        ));
    }
    if !(c.price_offset >= 0.0) || !c.price_offset.is_finite() {
        return Err(CoreError::invalid(
            RISK,
            "price_offset",
            "price_offset must be non-negative",
        ));
    }
    Ok(())
}

fn validate_capacity(c: &StrategyConfig) -> Result<(), CoreError> {
    let lookback = c.primary_lookback();
    if c.window_capacity < lookback {
        return Err(CoreError::invalid(
            STRATEGY,
            "window_capacity",
            format!(
                "window_capacity {} is below the longest lookback {}",
                c.window_capacity, lookback
            ),
        ));
    }
    if let Some(warmup) = c.warmup_bars {
        if warmup < lookback {
            return Err(CoreError::invalid(
                STRATEGY,
                "warmup_bars",
                format!("warmup_bars {warmup} is below the longest lookback {lookback}"),
            ));
        }
    }
    Ok(())
}

fn parse_opt<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, CoreError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            CoreError::invalid(section, key, format!("cannot parse '{}'", raw.trim()))
        }),
    }
}

fn parse_or<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    Ok(parse_opt(config, section, key)?.unwrap_or(default))
}
