//! tharptrader: trend-filtered moving-average crossover strategy core.
//!
//! Hexagonal architecture: bar-driven decision logic in [`domain`], host-facing
//! traits in [`ports`], file-based implementations in [`adapters`], and the
//! replay binary's dispatch in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
