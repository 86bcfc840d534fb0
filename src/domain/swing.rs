//! Swing point detection and the swing sequence.
//!
//! Three detectors are provided. The two window detectors (local extrema and
//! fractal) look at bars on both sides of a candidate, so a swing is only
//! known once `lookback` later bars exist. The zigzag detector is causal: it
//! walks the series once and commits a turning point only after price has
//! retraced by the configured deviation, and the final open leg is never
//! emitted.

use std::fmt;

use super::error::SwingtraderError;
use super::ohlcv::{validate_series, Bar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwingKind {
    High,
    Low,
}

impl fmt::Display for SwingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwingKind::High => write!(f, "high"),
            SwingKind::Low => write!(f, "low"),
        }
    }
}

/// A confirmed turning point. `price` is the bar's high for a swing high and
/// its low for a swing low.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoint {
    pub index: usize,
    pub kind: SwingKind,
    pub price: f64,
}

/// Detector selection together with its numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwingMethod {
    LocalExtrema { lookback: usize },
    Zigzag { deviation_pct: f64 },
    Fractal { window: usize },
}

impl SwingMethod {
    /// Build a method from its config name and a single numeric parameter.
    /// Window sizes must be whole numbers.
    pub fn from_name(name: &str, param: f64) -> Result<Self, SwingtraderError> {
        let method = match name.trim().to_lowercase().as_str() {
            "local_extrema" => SwingMethod::LocalExtrema {
                lookback: window_param("lookback", param)?,
            },
            "fractal" => SwingMethod::Fractal {
                window: window_param("window", param)?,
            },
            "zigzag" => SwingMethod::Zigzag {
                deviation_pct: param,
            },
            other => {
                return Err(SwingtraderError::invalid_parameter(
                    "swing_method",
                    format!("unknown method '{other}'"),
                ))
            }
        };
        method.validate()?;
        Ok(method)
    }

    pub fn validate(&self) -> Result<(), SwingtraderError> {
        match *self {
            SwingMethod::LocalExtrema { lookback: 0 } => Err(SwingtraderError::invalid_parameter(
                "lookback",
                "must be at least 1",
            )),
            SwingMethod::Fractal { window: 0 } => Err(SwingtraderError::invalid_parameter(
                "window",
                "must be at least 1",
            )),
            SwingMethod::Zigzag { deviation_pct }
                if !deviation_pct.is_finite() || deviation_pct <= 0.0 || deviation_pct >= 1.0 =>
            {
                Err(SwingtraderError::invalid_parameter(
                    "deviation_pct",
                    "must be a fraction between 0 and 1",
                ))
            }
            _ => Ok(()),
        }
    }

    /// Fewest bars the detector can work with.
    pub fn minimum_bars(&self) -> usize {
        match *self {
            SwingMethod::LocalExtrema { lookback } => 2 * lookback + 1,
            SwingMethod::Fractal { window } => 2 * window + 1,
            SwingMethod::Zigzag { .. } => 2,
        }
    }
}

impl fmt::Display for SwingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwingMethod::LocalExtrema { lookback } => write!(f, "local_extrema({lookback})"),
            SwingMethod::Zigzag { deviation_pct } => write!(f, "zigzag({deviation_pct})"),
            SwingMethod::Fractal { window } => write!(f, "fractal({window})"),
        }
    }
}

fn window_param(name: &str, param: f64) -> Result<usize, SwingtraderError> {
    if !param.is_finite() || param < 1.0 || param.fract() != 0.0 {
        return Err(SwingtraderError::invalid_parameter(
            name,
            "must be a whole number of bars, at least 1",
        ));
    }
    Ok(param as usize)
}

/// Raw detector output: ascending bar indices of swing highs and lows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwingIndices {
    pub highs: Vec<usize>,
    pub lows: Vec<usize>,
}

/// Run the selected detector after validating the series against it.
pub fn detect_swings(
    bars: &[Bar],
    method: SwingMethod,
) -> Result<SwingIndices, SwingtraderError> {
    method.validate()?;
    validate_series(bars, method.minimum_bars())?;

    let mut swings = match method {
        SwingMethod::LocalExtrema { lookback } => local_extrema(bars, lookback),
        SwingMethod::Fractal { window } => fractal(bars, window),
        SwingMethod::Zigzag { deviation_pct } => zigzag(bars, deviation_pct),
    };
    swings.highs.sort_unstable();
    swings.lows.sort_unstable();
    Ok(swings)
}

/// Index `i` is a swing high when its high equals the maximum high over
/// `[i - lookback, i + lookback]`, and a swing low symmetrically. Every bar
/// sharing the window extreme qualifies; equal highs are not collapsed.
pub fn local_extrema(bars: &[Bar], lookback: usize) -> SwingIndices {
    window_extrema(bars, lookback)
}

/// Same rule as [`local_extrema`], normally run with a small window (2-3).
pub fn fractal(bars: &[Bar], window: usize) -> SwingIndices {
    window_extrema(bars, window)
}

fn window_extrema(bars: &[Bar], half_width: usize) -> SwingIndices {
    let mut swings = SwingIndices::default();
    if bars.len() < 2 * half_width + 1 {
        return swings;
    }

    for i in half_width..bars.len() - half_width {
        let window = &bars[i - half_width..=i + half_width];
        let max_high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let min_low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        if bars[i].high == max_high {
            swings.highs.push(i);
        }
        if bars[i].low == min_low {
            swings.lows.push(i);
        }
    }
    swings
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Up,
    Down,
}

/// Percentage-deviation zigzag. Starts in an up leg anchored on bar 0.
///
/// In an up leg the running high is extended while bars make new highs; once
/// a bar's low falls below `running_high * (1 - deviation_pct)` the running
/// high is committed as a swing high and a down leg starts from that bar's
/// low. Down legs mirror this with `running_low * (1 + deviation_pct)`.
pub fn zigzag(bars: &[Bar], deviation_pct: f64) -> SwingIndices {
    let mut swings = SwingIndices::default();
    let Some(first) = bars.first() else {
        return swings;
    };

    let mut leg = Leg::Up;
    let (mut high_price, mut high_idx) = (first.high, 0usize);
    let (mut low_price, mut low_idx) = (first.low, 0usize);

    for (i, bar) in bars.iter().enumerate().skip(1) {
        match leg {
            Leg::Up => {
                if bar.high > high_price {
                    high_price = bar.high;
                    high_idx = i;
                } else if bar.low < high_price * (1.0 - deviation_pct) {
                    swings.highs.push(high_idx);
                    leg = Leg::Down;
                    low_price = bar.low;
                    low_idx = i;
                }
            }
            Leg::Down => {
                if bar.low < low_price {
                    low_price = bar.low;
                    low_idx = i;
                } else if bar.high > low_price * (1.0 + deviation_pct) {
                    swings.lows.push(low_idx);
                    leg = Leg::Up;
                    high_price = bar.high;
                    high_idx = i;
                }
            }
        }
    }
    swings
}

/// Merge highs and lows into one list ordered by bar index.
///
/// Highs are laid down before lows and the sort is stable, so a high and a
/// low on the same bar keep that order.
pub fn build_swing_sequence(bars: &[Bar], swings: &SwingIndices) -> Vec<SwingPoint> {
    let mut points: Vec<SwingPoint> = swings
        .highs
        .iter()
        .filter_map(|&index| {
            bars.get(index).map(|bar| SwingPoint {
                index,
                kind: SwingKind::High,
                price: bar.high,
            })
        })
        .chain(swings.lows.iter().filter_map(|&index| {
            bars.get(index).map(|bar| SwingPoint {
                index,
                kind: SwingKind::Low,
                price: bar.low,
            })
        }))
        .collect();
    points.sort_by_key(|p| p.index);
    points
}
