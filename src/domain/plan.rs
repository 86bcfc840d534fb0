//! Trade plans built from consecutive swing pairs.
//!
//! Every pair `(points[i], points[i + 1])` either becomes a [`TradePlan`] or
//! is recorded as a [`SkippedPair`] with the reason it was dropped. Skipping
//! is ordinary control flow, never an error.

use std::fmt;

use tracing::debug;

use super::ohlcv::Bar;
use super::strategy::{BreakoutParams, PlanConfig, PlanKind, RetracementParams};
use super::swing::{SwingKind, SwingPoint};

/// Pairs between progress events while partitioning.
const PROGRESS_INTERVAL: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Fractional return of a move from `entry` to `exit`.
    pub fn return_pct(self, entry: f64, exit: f64) -> f64 {
        match self {
            Direction::Long => (exit - entry) / entry,
            Direction::Short => (entry - exit) / entry,
        }
    }

    /// True once a favourable level has been traded through on this bar.
    pub(crate) fn reaches_target(self, bar: &Bar, level: f64) -> bool {
        match self {
            Direction::Long => bar.high >= level,
            Direction::Short => bar.low <= level,
        }
    }

    pub(crate) fn reaches_stop(self, bar: &Bar, level: f64) -> bool {
        match self {
            Direction::Long => bar.low <= level,
            Direction::Short => bar.high >= level,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// How the entry level is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrder {
    /// Fills when price trades back to the level (retracement).
    Limit,
    /// Fills when price trades strictly through the level (breakout).
    Stop,
}

impl From<PlanKind> for EntryOrder {
    fn from(kind: PlanKind) -> Self {
        match kind {
            PlanKind::Retracement => EntryOrder::Limit,
            PlanKind::Breakout => EntryOrder::Stop,
        }
    }
}

/// First target of a retracement plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialExit {
    pub price: f64,
    pub fraction: f64,
    /// Stop that applies to the remainder once the partial has been taken.
    pub relocated_stop: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradePlan {
    pub pair_index: usize,
    pub anchor_a: SwingPoint,
    pub anchor_b: SwingPoint,
    pub kind: PlanKind,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    pub partial: Option<PartialExit>,
    /// Fee per side, charged twice on every exit leg.
    pub fee_rate: f64,
    pub valid_from: usize,
    pub valid_to: usize,
}

impl TradePlan {
    pub fn entry_order(&self) -> EntryOrder {
        self.kind.into()
    }

    /// Exit levels in the order they are worked, with the fraction of the
    /// position each one closes. Fractions sum to 1.
    pub fn targets(&self) -> Vec<(f64, f64)> {
        match self.partial {
            Some(p) => vec![(p.price, p.fraction), (self.target_price, 1.0 - p.fraction)],
            None => vec![(self.target_price, 1.0)],
        }
    }

    /// Distance between entry and the initial stop.
    pub fn risk(&self) -> f64 {
        (self.entry_price - self.stop_price).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The trend series has no value at the second point.
    UndefinedTrend,
    /// The pair's direction disagrees with the trend.
    TrendMismatch,
    /// Both points have the same kind.
    NotAlternating,
    /// The second point is not beyond the first in the swing's direction.
    PriceInconsistent,
    /// Zero swing range or zero risk.
    DegenerateRisk,
    /// The validity window is empty or starts past the last bar.
    NoRoomToFill,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::UndefinedTrend => "undefined trend",
            SkipReason::TrendMismatch => "trend mismatch",
            SkipReason::NotAlternating => "not alternating",
            SkipReason::PriceInconsistent => "price inconsistent",
            SkipReason::DegenerateRisk => "degenerate risk",
            SkipReason::NoRoomToFill => "no room to fill",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedPair {
    pub pair_index: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanPartition {
    pub plans: Vec<TradePlan>,
    pub skipped: Vec<SkippedPair>,
}

/// Bars on which the plan for pair `pair_index` may fill: from the bar after
/// the second point up to the next swing point, or the last bar.
pub fn validity_window(
    points: &[SwingPoint],
    pair_index: usize,
    bar_count: usize,
) -> Option<(usize, usize)> {
    let b = points.get(pair_index + 1)?;
    let from = b.index + 1;
    if from >= bar_count {
        return None;
    }
    let to = points
        .get(pair_index + 2)
        .map(|p| p.index)
        .unwrap_or(bar_count - 1)
        .min(bar_count - 1);
    if to < from {
        return None;
    }
    Some((from, to))
}

/// Retracement levels between `a` and `b`.
///
/// A high followed by a lower low gives a Short whose levels are measured up
/// from the low; a low followed by a higher high gives a Long measured down
/// from the high. The plan is returned with an empty window; callers set it.
pub fn build_retracement_plan(
    a: &SwingPoint,
    b: &SwingPoint,
    params: &RetracementParams,
) -> Result<TradePlan, SkipReason> {
    let direction = pair_direction(a, b)?;
    let diff = (a.price - b.price).abs();
    if diff.is_nan() || diff <= 0.0 {
        return Err(SkipReason::DegenerateRisk);
    }

    let level = |ratio: f64| match direction {
        Direction::Short => b.price + ratio * diff,
        Direction::Long => b.price - ratio * diff,
    };

    let entry_price = level(params.entry_ratio);
    let partial = params.partial_target_ratio.map(|ratio| PartialExit {
        price: level(ratio),
        fraction: params.partial_fraction,
        relocated_stop: match params.post_partial_stop_ratio {
            Some(stop_ratio) => Some(level(stop_ratio)),
            None if params.move_stop_to_breakeven => Some(entry_price),
            None => None,
        },
    });

    Ok(TradePlan {
        pair_index: 0,
        anchor_a: *a,
        anchor_b: *b,
        kind: PlanKind::Retracement,
        direction,
        entry_price,
        stop_price: level(params.stop_ratio),
        target_price: level(params.target_ratio),
        partial,
        fee_rate: 0.0,
        valid_from: 0,
        valid_to: 0,
    })
}

/// Breakout of the first point's level with the stop at the second point.
///
/// A high followed by a low is a Long triggered above the high; a low
/// followed by a high is a Short triggered below the low.
pub fn build_breakout_plan(
    a: &SwingPoint,
    b: &SwingPoint,
    params: &BreakoutParams,
) -> Result<TradePlan, SkipReason> {
    let direction = match (a.kind, b.kind) {
        (SwingKind::High, SwingKind::Low) => Direction::Long,
        (SwingKind::Low, SwingKind::High) => Direction::Short,
        _ => return Err(SkipReason::NotAlternating),
    };

    let entry_price = a.price;
    let stop_price = b.price;
    let risk = match direction {
        Direction::Long => entry_price - stop_price,
        Direction::Short => stop_price - entry_price,
    };
    if risk.is_nan() || risk <= 0.0 {
        return Err(SkipReason::DegenerateRisk);
    }
    let target_price = match direction {
        Direction::Long => entry_price + params.r_multiple * risk,
        Direction::Short => entry_price - params.r_multiple * risk,
    };

    Ok(TradePlan {
        pair_index: 0,
        anchor_a: *a,
        anchor_b: *b,
        kind: PlanKind::Breakout,
        direction,
        entry_price,
        stop_price,
        target_price,
        partial: None,
        fee_rate: params.fee_rate,
        valid_from: 0,
        valid_to: 0,
    })
}

/// Build a plan for every consecutive swing pair.
///
/// With `trend` set, the close at the second point must be strictly above
/// the trend value for a Long and strictly below it for a Short; an
/// undefined value skips the pair before anything else is checked.
pub fn build_plans(
    bars: &[Bar],
    points: &[SwingPoint],
    trend: Option<&[Option<f64>]>,
    config: &PlanConfig,
) -> PlanPartition {
    let mut partition = PlanPartition::default();
    let pair_count = points.len().saturating_sub(1);

    for pair_index in 0..pair_count {
        if pair_index > 0 && pair_index % PROGRESS_INTERVAL == 0 {
            debug!(pair_index, pair_count, "building plans");
        }

        match plan_for_pair(bars, points, pair_index, trend, config) {
            Ok(plan) => partition.plans.push(plan),
            Err(reason) => {
                debug!(pair_index, %reason, "swing pair skipped");
                partition.skipped.push(SkippedPair { pair_index, reason });
            }
        }
    }

    partition
}

fn plan_for_pair(
    bars: &[Bar],
    points: &[SwingPoint],
    pair_index: usize,
    trend: Option<&[Option<f64>]>,
    config: &PlanConfig,
) -> Result<TradePlan, SkipReason> {
    let a = &points[pair_index];
    let b = &points[pair_index + 1];

    let trend_at_b = match trend {
        Some(series) => Some(
            series
                .get(b.index)
                .copied()
                .flatten()
                .ok_or(SkipReason::UndefinedTrend)?,
        ),
        None => None,
    };

    let mut plan = match config {
        PlanConfig::Retracement(params) => build_retracement_plan(a, b, params)?,
        PlanConfig::Breakout(params) => build_breakout_plan(a, b, params)?,
    };

    if let Some(trend_value) = trend_at_b {
        let close = bars.get(b.index).map(|bar| bar.close).unwrap_or(f64::NAN);
        let allowed = match plan.direction {
            Direction::Long => close > trend_value,
            Direction::Short => close < trend_value,
        };
        if !allowed {
            return Err(SkipReason::TrendMismatch);
        }
    }

    let (valid_from, valid_to) =
        validity_window(points, pair_index, bars.len()).ok_or(SkipReason::NoRoomToFill)?;
    plan.pair_index = pair_index;
    plan.valid_from = valid_from;
    plan.valid_to = valid_to;
    Ok(plan)
}

fn pair_direction(a: &SwingPoint, b: &SwingPoint) -> Result<Direction, SkipReason> {
    match (a.kind, b.kind) {
        (SwingKind::High, SwingKind::Low) if b.price < a.price => Ok(Direction::Short),
        (SwingKind::Low, SwingKind::High) if b.price > a.price => Ok(Direction::Long),
        (SwingKind::High, SwingKind::Low) | (SwingKind::Low, SwingKind::High) => {
            Err(SkipReason::PriceInconsistent)
        }
        _ => Err(SkipReason::NotAlternating),
    }
}
