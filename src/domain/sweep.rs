//! Swing-detector parameter sweep.
//!
//! Runs the full backtest once per swing method and ranks the runs by win
//! rate.

use std::cmp::Ordering;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::warn;

use super::backtest::{run_backtest, BacktestConfig};
use super::error::SwingtraderError;
use super::ohlcv::Bar;
use super::swing::SwingMethod;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    pub method: SwingMethod,
    pub swings: usize,
    pub trades: usize,
    pub win_rate: f64,
    pub total_return_pct: f64,
    pub max_drawdown: f64,
}

/// Build one method per parameter value.
pub fn sweep_methods(name: &str, params: &[f64]) -> Result<Vec<SwingMethod>, SwingtraderError> {
    params
        .iter()
        .map(|&param| SwingMethod::from_name(name, param))
        .collect()
}

/// Rows sorted by win rate, highest first. Ties keep `methods` order.
/// A method whose run fails is logged and left out.
pub fn run_sweep(
    bars: &[Bar],
    trend: Option<&[Option<f64>]>,
    base: &BacktestConfig,
    methods: &[SwingMethod],
) -> Vec<SweepRow> {
    let run = |method: &SwingMethod| -> Option<SweepRow> {
        let config = BacktestConfig {
            swing_method: *method,
            parallel: false,
            ..base.clone()
        };
        match run_backtest(bars, trend, &config) {
            Ok(result) => Some(SweepRow {
                method: *method,
                swings: result.swing_points.len(),
                trades: result.stats.trade_count,
                win_rate: result.stats.win_rate,
                total_return_pct: result.stats.total_return_pct,
                max_drawdown: result.stats.max_drawdown,
            }),
            Err(e) => {
                warn!(%method, error = %e, "sweep run skipped");
                None
            }
        }
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<Option<SweepRow>> = if base.parallel {
        methods.par_iter().map(run).collect()
    } else {
        methods.iter().map(run).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Option<SweepRow>> = methods.iter().map(run).collect();

    let mut rows: Vec<SweepRow> = rows.into_iter().flatten().collect();
    rows.sort_by(|a, b| b.win_rate.partial_cmp(&a.win_rate).unwrap_or(Ordering::Equal));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::PlanConfig;
    use chrono::{Duration, NaiveDate};

    fn wave_bars(cycles: usize) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..cycles * 10)
            .map(|i| {
                let phase = i % 10;
                let step = if phase < 5 { phase } else { 10 - phase };
                let mid = 100.0 + step as f64 * 1.5;
                Bar {
                    time: base + Duration::hours(i as i64),
                    open: mid,
                    high: mid + 0.4,
                    low: mid - 0.4,
                    close: mid,
                    volume: 1.0,
                }
            })
            .collect()
    }

    fn base() -> BacktestConfig {
        BacktestConfig {
            swing_method: SwingMethod::LocalExtrema { lookback: 1 },
            plan: PlanConfig::default(),
            trend_filter_enabled: false,
            parallel: false,
        }
    }

    #[test]
    fn methods_from_params() {
        let methods = sweep_methods("fractal", &[2.0, 3.0]).unwrap();
        assert_eq!(
            methods,
            vec![
                SwingMethod::Fractal { window: 2 },
                SwingMethod::Fractal { window: 3 }
            ]
        );
        assert!(sweep_methods("zigzag", &[0.01, 2.0]).is_err());
    }

    #[test]
    fn fractional_window_fails_the_sweep() {
        assert!(matches!(
            sweep_methods("fractal", &[2.5, 2.0]),
            Err(SwingtraderError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn rows_sorted_by_win_rate() {
        let bars = wave_bars(6);
        let methods = sweep_methods("local_extrema", &[1.0, 2.0, 3.0]).unwrap();
        let rows = run_sweep(&bars, None, &base(), &methods);
        assert_eq!(rows.len(), 3);
        for pair in rows.windows(2) {
            assert!(pair[0].win_rate >= pair[1].win_rate);
        }
    }

    #[test]
    fn failing_methods_are_dropped() {
        let bars = wave_bars(2);
        // 20 bars cannot support a 15-bar lookback
        let methods = vec![
            SwingMethod::LocalExtrema { lookback: 2 },
            SwingMethod::LocalExtrema { lookback: 15 },
        ];
        let rows = run_sweep(&bars, None, &base(), &methods);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].method, SwingMethod::LocalExtrema { lookback: 2 });
    }

    #[test]
    fn parallel_sweep_matches_sequential() {
        let bars = wave_bars(6);
        let methods = sweep_methods("fractal", &[1.0, 2.0]).unwrap();
        let sequential = run_sweep(&bars, None, &base(), &methods);
        let parallel = run_sweep(
            &bars,
            None,
            &BacktestConfig {
                parallel: true,
                ..base()
            },
            &methods,
        );
        assert_eq!(sequential, parallel);
    }
}
