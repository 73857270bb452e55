//! Order intents handed to the host.
//!
//! Price hints cross the spread by a fixed offset from the triggering close
//! so a simulated fill is guaranteed: buy/cover above, sell/short below.

use std::fmt;

use chrono::NaiveDateTime;

use crate::domain::position::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderSide {
    Buy,
    Sell,
    Short,
    Cover,
}

impl OrderSide {
    pub fn opening(direction: Direction) -> Self {
        match direction {
            Direction::Long => OrderSide::Buy,
            Direction::Short => OrderSide::Short,
        }
    }

    pub fn closing(direction: Direction) -> Self {
        match direction {
            Direction::Long => OrderSide::Sell,
            Direction::Short => OrderSide::Cover,
        }
    }

    /// +1 for sides that pay up (buy, cover), -1 for sides that hit the bid.
    fn offset_sign(self) -> f64 {
        match self {
            OrderSide::Buy | OrderSide::Cover => 1.0,
            OrderSide::Sell | OrderSide::Short => -1.0,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
            OrderSide::Short => write!(f, "short"),
            OrderSide::Cover => write!(f, "cover"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderIntent {
    pub timestamp: NaiveDateTime,
    pub side: OrderSide,
    pub price_hint: f64,
    pub size: u64,
}

impl OrderIntent {
    pub fn new(
        timestamp: NaiveDateTime,
        side: OrderSide,
        close: f64,
        offset: f64,
        size: u64,
    ) -> Self {
        Self {
            timestamp,
            side,
            price_hint: close + side.offset_sign() * offset,
            size,
        }
    }
}

impl fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ {:.4}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.side,
            self.size,
            self.price_hint
        )
    }
}
