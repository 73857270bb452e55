//! Directional bias shared by the trend filter and the crossover signal.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bias {
    Bullish,
    Neutral,
    Bearish,
}

impl Bias {
    /// +1 bullish, 0 neutral, -1 bearish.
    pub fn signum(self) -> i8 {
        match self {
            Bias::Bullish => 1,
            Bias::Neutral => 0,
            Bias::Bearish => -1,
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::Bullish => write!(f, "bullish"),
            Bias::Neutral => write!(f, "neutral"),
            Bias::Bearish => write!(f, "bearish"),
        }
    }
}
