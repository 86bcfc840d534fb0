#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io::Write;
pub use swingtrader::domain::ohlcv::Bar;
use swingtrader::domain::backtest::BacktestConfig;
use swingtrader::domain::error::SwingtraderError;
use swingtrader::domain::strategy::PlanConfig;
use swingtrader::domain::swing::SwingMethod;
use swingtrader::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, source: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(source.to_string(), bars);
        self
    }

    pub fn with_error(mut self, source: &str, reason: &str) -> Self {
        self.errors.insert(source.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, source: &str) -> Result<Vec<Bar>, SwingtraderError> {
        if let Some(reason) = self.errors.get(source) {
            return Err(SwingtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(source).cloned().unwrap_or_default())
    }
}

pub fn hour(h: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::hours(h)
}

pub fn make_bar(h: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        time: hour(h),
        open,
        high,
        low,
        close,
        volume: 1000.0,
    }
}

/// Hourly bars from `(high, low)` pairs; open and close sit at the midpoint.
pub fn bars_from_high_low(hl: &[(f64, f64)]) -> Vec<Bar> {
    hl.iter()
        .enumerate()
        .map(|(i, &(high, low))| {
            let mid = (high + low) / 2.0;
            make_bar(i as i64, mid, high, low, mid)
        })
        .collect()
}

/// Hourly bars from `(open, high, low, close)` tuples.
pub fn bars_from_ohlc(ohlc: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    ohlc.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| make_bar(i as i64, o, h, l, c))
        .collect()
}

/// Triangle wave of midpoints: `cycles` rises and falls of `half_period`
/// bars each, drifting upward by `drift` per cycle.
pub fn wave_bars(cycles: usize, half_period: usize, step: f64, drift: f64) -> Vec<Bar> {
    let period = half_period * 2;
    (0..cycles * period)
        .map(|i| {
            let phase = i % period;
            let level = if phase < half_period {
                phase
            } else {
                period - phase
            };
            let mid = 100.0 + level as f64 * step + (i / period) as f64 * drift;
            make_bar(i as i64, mid, mid + step * 0.3, mid - step * 0.3, mid)
        })
        .collect()
}

pub fn bars_to_csv(bars: &[Bar]) -> String {
    let mut out = String::from("time,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.time.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}

pub fn write_temp_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn unfiltered_config(method: SwingMethod, plan: PlanConfig) -> BacktestConfig {
    BacktestConfig {
        swing_method: method,
        plan,
        trend_filter_enabled: false,
        parallel: false,
    }
}

/// A clean up-swing then down-swing over 20 bars: trough at bar 2 (low
/// 100), peak at bar 10 (high 120).
pub const UP_THEN_DOWN: [(f64, f64); 20] = [
    (104.0, 102.0),
    (103.0, 101.0),
    (102.0, 100.0),
    (104.0, 102.0),
    (106.0, 104.0),
    (108.0, 106.0),
    (110.0, 108.0),
    (112.0, 110.0),
    (114.0, 112.0),
    (116.0, 114.0),
    (120.0, 117.0),
    (118.0, 115.0),
    (116.0, 113.0),
    (114.0, 111.0),
    (112.0, 109.0),
    (110.0, 107.0),
    (108.0, 105.0),
    (106.0, 103.0),
    (105.0, 102.0),
    (104.0, 101.0),
];

/// Mirror image of [`UP_THEN_DOWN`]: peak at bar 2 (high 120), trough at
/// bar 10 (low 100).
pub const DOWN_THEN_UP: [(f64, f64); 20] = [
    (118.0, 116.0),
    (119.0, 117.0),
    (120.0, 118.0),
    (118.0, 116.0),
    (116.0, 114.0),
    (114.0, 112.0),
    (112.0, 110.0),
    (110.0, 108.0),
    (108.0, 106.0),
    (106.0, 104.0),
    (103.0, 100.0),
    (105.0, 102.0),
    (107.0, 104.0),
    (109.0, 106.0),
    (111.0, 108.0),
    (113.0, 110.0),
    (115.0, 112.0),
    (117.0, 114.0),
    (118.0, 115.0),
    (119.0, 116.0),
];
