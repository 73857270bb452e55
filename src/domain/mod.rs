//! Core domain types and logic.

pub mod ohlcv;
pub mod bar_window;
pub mod aggregator;
pub mod signal;
pub mod trend_filter;
pub mod crossover;
pub mod sizing;
pub mod position;
pub mod exit_manager;
pub mod order;
pub mod outcome;
pub mod event;
pub mod strategy;
pub mod core;
pub mod config_validation;
pub mod error;
