//! Bar source port trait.

use crate::domain::error::CoreError;
use crate::domain::ohlcv::Bar;

pub trait DataPort {
    /// All bars for `symbol`, oldest first.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, CoreError>;

    fn list_symbols(&self) -> Result<Vec<String>, CoreError>;
}
