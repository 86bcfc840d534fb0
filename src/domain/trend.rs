//! Trend filter series.
//!
//! The engine accepts any series aligned 1:1 with the bars, where `None`
//! marks a value that is not yet defined. Two moving averages of the close
//! are provided for building one.

use std::fmt;

use super::error::SwingtraderError;
use super::ohlcv::Bar;

/// One optional value per bar.
pub type TrendSeries = Vec<Option<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaType {
    Sma,
    Ema,
}

impl MaType {
    pub fn from_name(name: &str) -> Result<Self, SwingtraderError> {
        match name.trim().to_uppercase().as_str() {
            "SMA" => Ok(MaType::Sma),
            "EMA" => Ok(MaType::Ema),
            other => Err(SwingtraderError::invalid_parameter(
                "ma_type",
                format!("unknown moving average '{other}'"),
            )),
        }
    }
}

impl fmt::Display for MaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaType::Sma => write!(f, "SMA"),
            MaType::Ema => write!(f, "EMA"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendConfig {
    pub ma_type: MaType,
    pub period: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            ma_type: MaType::Ema,
            period: 50,
        }
    }
}

impl TrendConfig {
    pub fn compute(&self, bars: &[Bar]) -> TrendSeries {
        match self.ma_type {
            MaType::Sma => sma(bars, self.period),
            MaType::Ema => ema(bars, self.period),
        }
    }
}

/// Rolling mean of closes. The first `period - 1` values are undefined.
pub fn sma(bars: &[Bar], period: usize) -> TrendSeries {
    if period == 0 {
        return vec![None; bars.len()];
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        sum += bar.close;
        if i >= period {
            sum -= bars[i - period].close;
        }
        if i + 1 >= period {
            values.push(Some(sum / period as f64));
        } else {
            values.push(None);
        }
    }
    values
}

/// k = 2/(n+1), seeded with the first close: EMA[0] = C[0],
/// EMA[i] = C[i]*k + EMA[i-1]*(1-k). Defined from the first bar.
pub fn ema(bars: &[Bar], period: usize) -> TrendSeries {
    if period == 0 {
        return vec![None; bars.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(bars.len());
    let mut prev: Option<f64> = None;
    for bar in bars {
        let next = match prev {
            None => bar.close,
            Some(ema) => bar.close * k + ema * (1.0 - k),
        };
        prev = Some(next);
        values.push(prev);
    }
    values
}
