//! In-memory strategy event log, readable by the host after a run.

use std::fmt;

use chrono::NaiveDateTime;

use crate::domain::order::OrderSide;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AtrUnavailable,
    DegenerateRisk,
    ZeroSize,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AtrUnavailable => write!(f, "atr unavailable"),
            SkipReason::DegenerateRisk => write!(f, "degenerate risk"),
            SkipReason::ZeroSize => write!(f, "risk budget below one unit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Initialized {
        warmup_bars: usize,
    },
    Entered {
        side: OrderSide,
        size: u64,
        price: f64,
        stop_price: f64,
    },
    Exited {
        side: OrderSide,
        size: u64,
        price: f64,
        r_multiple: Option<f64>,
    },
    EntrySkipped {
        reason: SkipReason,
    },
    Stopped,
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyEvent {
    /// Bar time; None for lifecycle events.
    pub timestamp: Option<NaiveDateTime>,
    pub kind: EventKind,
}

impl fmt::Display for StrategyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timestamp {
            Some(ts) => write!(f, "{} - ", ts.format("%Y-%m-%d %H:%M:%S"))?,
            None => write!(f, "- ")?,
        }
        match &self.kind {
            EventKind::Initialized { warmup_bars } => {
                write!(f, "initialized, warm-up {warmup_bars} bars")
            }
            EventKind::Entered {
                side,
                size,
                price,
                stop_price,
            } => write!(f, "{side} {size} @ {price:.4}, stop {stop_price:.4}"),
            EventKind::Exited {
                side,
                size,
                price,
                r_multiple,
            } => match r_multiple {
                Some(r) => write!(f, "{side} {size} @ {price:.4}, {r:.4}R"),
                None => write!(f, "{side} {size} @ {price:.4}, no R (zero risk)"),
            },
            EventKind::EntrySkipped { reason } => write!(f, "entry skipped: {reason}"),
            EventKind::Stopped => write!(f, "stopped"),
            EventKind::Reset => write!(f, "reset"),
        }
    }
}
