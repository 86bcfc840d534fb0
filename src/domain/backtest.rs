//! Backtest pipeline.
//!
//! bars -> swings -> swing sequence -> plans -> fills -> equity/statistics.
//! Every stage is a pure transformation; the only output is the returned
//! [`SimulationResult`].

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info};

use super::error::SwingtraderError;
use super::execution::{simulate_plan, RealizedTrade};
use super::metrics::{build_equity_curve, EquityPoint, Statistics};
use super::ohlcv::{validate_series, Bar};
use super::plan::{build_plans, SkippedPair, TradePlan};
use super::strategy::PlanConfig;
use super::swing::{build_swing_sequence, detect_swings, SwingMethod, SwingPoint};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub swing_method: SwingMethod,
    pub plan: PlanConfig,
    pub trend_filter_enabled: bool,
    /// Simulate plans on the rayon pool. Results keep swing-pair order.
    pub parallel: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            swing_method: SwingMethod::LocalExtrema { lookback: 5 },
            plan: PlanConfig::default(),
            trend_filter_enabled: true,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub swing_points: Vec<SwingPoint>,
    /// Plans handed to the simulator.
    pub plans: usize,
    pub skipped: Vec<SkippedPair>,
    /// Plans whose entry never triggered.
    pub unfilled: usize,
    pub trades: Vec<RealizedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub stats: Statistics,
}

/// Run the whole pipeline over `bars`.
///
/// `trend` must be aligned with `bars` when the trend filter is enabled and
/// is ignored otherwise.
pub fn run_backtest(
    bars: &[Bar],
    trend: Option<&[Option<f64>]>,
    config: &BacktestConfig,
) -> Result<SimulationResult, SwingtraderError> {
    config.swing_method.validate()?;
    config.plan.validate()?;
    validate_series(bars, config.swing_method.minimum_bars())?;

    let trend = if config.trend_filter_enabled {
        let series = trend.ok_or(SwingtraderError::MissingTrend)?;
        if series.len() != bars.len() {
            return Err(SwingtraderError::TrendLengthMismatch {
                bars: bars.len(),
                trend: series.len(),
            });
        }
        Some(series)
    } else {
        None
    };

    let swings = detect_swings(bars, config.swing_method)?;
    let swing_points = build_swing_sequence(bars, &swings);
    debug!(
        method = %config.swing_method,
        highs = swings.highs.len(),
        lows = swings.lows.len(),
        "swings detected"
    );

    let partition = build_plans(bars, &swing_points, trend, &config.plan);
    let outcomes = simulate_all(bars, &partition.plans, config.parallel);

    let mut trades = Vec::with_capacity(outcomes.len());
    let mut unfilled = 0usize;
    for (plan, outcome) in partition.plans.iter().zip(outcomes) {
        match outcome {
            Some(trade) => trades.push(trade),
            None => {
                unfilled += 1;
                debug!(pair_index = plan.pair_index, "plan never filled");
            }
        }
    }

    let equity_curve = build_equity_curve(&trades);
    let stats = Statistics::compute(&trades, &equity_curve);

    info!(
        method = %config.swing_method,
        kind = %config.plan.kind(),
        swings = swing_points.len(),
        plans = partition.plans.len(),
        skipped = partition.skipped.len(),
        unfilled,
        trades = stats.trade_count,
        win_rate = stats.win_rate,
        total_return_pct = stats.total_return_pct,
        "backtest complete"
    );

    Ok(SimulationResult {
        swing_points,
        plans: partition.plans.len(),
        skipped: partition.skipped,
        unfilled,
        trades,
        equity_curve,
        stats,
    })
}

/// One outcome per plan, in plan order.
#[cfg(feature = "parallel")]
fn simulate_all(bars: &[Bar], plans: &[TradePlan], parallel: bool) -> Vec<Option<RealizedTrade>> {
    if parallel {
        plans.par_iter().map(|plan| simulate_plan(bars, plan)).collect()
    } else {
        plans.iter().map(|plan| simulate_plan(bars, plan)).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn simulate_all(bars: &[Bar], plans: &[TradePlan], parallel: bool) -> Vec<Option<RealizedTrade>> {
    if parallel {
        debug!("built without the parallel feature, simulating sequentially");
    }
    plans.iter().map(|plan| simulate_plan(bars, plan)).collect()
}
