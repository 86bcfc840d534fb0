//! OHLCV bar representation.
//!
//! Bars are addressed by their position in the series everywhere in the
//! engine; `time` is only read when a trade record is emitted.

use chrono::NaiveDateTime;

use super::error::SwingtraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Check that a series is non-empty, has at least `minimum` bars and
/// strictly increasing times.
pub fn validate_series(bars: &[Bar], minimum: usize) -> Result<(), SwingtraderError> {
    if bars.is_empty() {
        return Err(SwingtraderError::EmptyInput);
    }
    if bars.len() < minimum {
        return Err(SwingtraderError::InsufficientData {
            bars: bars.len(),
            minimum,
        });
    }
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].time <= pair[0].time {
            return Err(SwingtraderError::NonMonotonicTime { index: i + 1 });
        }
    }
    Ok(())
}
