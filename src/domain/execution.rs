//! Fill simulation for a single trade plan.
//!
//! A plan is stepped bar by bar over its validity window through
//! `Pending -> Open -> Closed`. The entry bar only fills the order; exits are
//! checked from the following bar on. When stop and target are both touched
//! on one bar the stop is taken.

use std::fmt;

use chrono::NaiveDateTime;

use super::ohlcv::Bar;
use super::plan::{Direction, EntryOrder, TradePlan};
use super::strategy::PlanKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    PartialTarget,
    Stop,
    Target,
    WindowEnd,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::PartialTarget => write!(f, "partial_target"),
            ExitReason::Stop => write!(f, "stop"),
            ExitReason::Target => write!(f, "target"),
            ExitReason::WindowEnd => write!(f, "window_end"),
        }
    }
}

/// One realized portion of a position.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitLeg {
    pub fraction: f64,
    /// Fractional return of this leg, net of fees.
    pub return_pct: f64,
    pub price: f64,
    pub index: usize,
    pub time: NaiveDateTime,
    pub reason: ExitReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RealizedTrade {
    pub pair_index: usize,
    pub kind: PlanKind,
    pub direction: Direction,
    pub anchor_a_index: usize,
    pub anchor_a_time: NaiveDateTime,
    pub anchor_b_index: usize,
    pub anchor_b_time: NaiveDateTime,
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_index: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub legs: Vec<ExitLeg>,
}

impl RealizedTrade {
    /// `(fraction, return_pct)` per leg, in the order the legs were realized.
    pub fn realized_fraction_returns(&self) -> Vec<(f64, f64)> {
        self.legs
            .iter()
            .map(|leg| (leg.fraction, leg.return_pct))
            .collect()
    }

    /// Position-weighted return over all legs.
    pub fn realized_pct(&self) -> f64 {
        self.legs.iter().map(|leg| leg.fraction * leg.return_pct).sum()
    }

    pub fn is_win(&self) -> bool {
        self.realized_pct() > 0.0
    }
}

/// `Closed` is reached by returning the realized trade.
enum FillState {
    Pending,
    Open(OpenPosition),
}

struct OpenPosition {
    entry_index: usize,
    stop: f64,
    remaining: f64,
    partial_taken: bool,
    legs: Vec<ExitLeg>,
}

impl OpenPosition {
    fn realize(
        &mut self,
        plan: &TradePlan,
        fraction: f64,
        price: f64,
        index: usize,
        bar: &Bar,
        reason: ExitReason,
    ) {
        self.legs.push(ExitLeg {
            fraction,
            return_pct: plan.direction.return_pct(plan.entry_price, price) - 2.0 * plan.fee_rate,
            price,
            index,
            time: bar.time,
            reason,
        });
        self.remaining -= fraction;
    }

    fn into_trade(self, plan: &TradePlan, bars: &[Bar]) -> Option<RealizedTrade> {
        let last = self.legs.last()?;
        let (exit_index, exit_time, exit_price) = (last.index, last.time, last.price);
        Some(RealizedTrade {
            pair_index: plan.pair_index,
            kind: plan.kind,
            direction: plan.direction,
            anchor_a_index: plan.anchor_a.index,
            anchor_a_time: bars.get(plan.anchor_a.index)?.time,
            anchor_b_index: plan.anchor_b.index,
            anchor_b_time: bars.get(plan.anchor_b.index)?.time,
            entry_index: self.entry_index,
            entry_time: bars.get(self.entry_index)?.time,
            entry_price: plan.entry_price,
            exit_index,
            exit_time,
            exit_price,
            legs: self.legs,
        })
    }
}

fn entry_triggered(plan: &TradePlan, bar: &Bar) -> bool {
    match (plan.entry_order(), plan.direction) {
        (EntryOrder::Limit, Direction::Long) => bar.low <= plan.entry_price,
        (EntryOrder::Limit, Direction::Short) => bar.high >= plan.entry_price,
        (EntryOrder::Stop, Direction::Long) => bar.high > plan.entry_price,
        (EntryOrder::Stop, Direction::Short) => bar.low < plan.entry_price,
    }
}

/// Step an open position through one bar. Returns the closing reason and
/// price when the remainder is exited.
fn step_open(
    position: &mut OpenPosition,
    plan: &TradePlan,
    index: usize,
    bar: &Bar,
) -> Option<(ExitReason, f64)> {
    if let Some(partial) = plan.partial {
        if !position.partial_taken && plan.direction.reaches_target(bar, partial.price) {
            position.realize(
                plan,
                partial.fraction,
                partial.price,
                index,
                bar,
                ExitReason::PartialTarget,
            );
            position.partial_taken = true;
            if let Some(stop) = partial.relocated_stop {
                position.stop = stop;
            }
        }
    }

    if plan.direction.reaches_stop(bar, position.stop) {
        Some((ExitReason::Stop, position.stop))
    } else if plan.direction.reaches_target(bar, plan.target_price) {
        Some((ExitReason::Target, plan.target_price))
    } else {
        None
    }
}

/// Simulate one plan over its validity window.
///
/// Returns `None` when the entry never triggers inside the window.
pub fn simulate_plan(bars: &[Bar], plan: &TradePlan) -> Option<RealizedTrade> {
    let last = plan.valid_to.min(bars.len().checked_sub(1)?);
    let mut state = FillState::Pending;

    for (index, bar) in bars.iter().enumerate().take(last + 1).skip(plan.valid_from) {
        state = match state {
            FillState::Pending if entry_triggered(plan, bar) => FillState::Open(OpenPosition {
                entry_index: index,
                stop: plan.stop_price,
                remaining: 1.0,
                partial_taken: false,
                legs: Vec::with_capacity(2),
            }),
            FillState::Pending => FillState::Pending,
            FillState::Open(mut position) => match step_open(&mut position, plan, index, bar) {
                Some((reason, price)) => {
                    let fraction = position.remaining;
                    position.realize(plan, fraction, price, index, bar, reason);
                    return position.into_trade(plan, bars);
                }
                None => FillState::Open(position),
            },
        };
    }

    match state {
        FillState::Pending => None,
        FillState::Open(mut position) => {
            let bar = bars.get(last)?;
            let fraction = position.remaining;
            position.realize(plan, fraction, bar.close, last, bar, ExitReason::WindowEnd);
            position.into_trade(plan, bars)
        }
    }
}
