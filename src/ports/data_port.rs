//! Bar source port trait.

use crate::domain::error::SwingtraderError;
use crate::domain::ohlcv::Bar;

pub trait DataPort {
    /// All bars for `source`, oldest first.
    fn fetch_bars(&self, source: &str) -> Result<Vec<Bar>, SwingtraderError>;
}
