//! Equity curve and trade statistics.
//!
//! Equity starts at 1.0 and compounds by `1 + fraction * return_pct` for
//! every exit leg, in the order trades are supplied (swing-pair order) and
//! leg order within a trade.

use chrono::NaiveDateTime;

use super::execution::RealizedTrade;

const INITIAL_EQUITY: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    /// Position of the trade in the processed sequence.
    pub trade_number: usize,
    pub time: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Winning share of trades, 0.0..=1.0.
    pub win_rate: f64,
    /// `(final_equity - 1) * 100`.
    pub total_return_pct: f64,
    pub final_equity: f64,
    /// Largest peak-to-trough drop as a fraction of the peak.
    pub max_drawdown: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl Default for Statistics {
    fn default() -> Self {
        Statistics {
            trade_count: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            total_return_pct: 0.0,
            final_equity: INITIAL_EQUITY,
            max_drawdown: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            largest_win: 0.0,
            largest_loss: 0.0,
        }
    }
}

/// One point per exit leg.
pub fn build_equity_curve(trades: &[RealizedTrade]) -> Vec<EquityPoint> {
    let mut equity = INITIAL_EQUITY;
    let mut curve = Vec::with_capacity(trades.len() * 2);
    for (trade_number, trade) in trades.iter().enumerate() {
        for leg in &trade.legs {
            equity *= 1.0 + leg.fraction * leg.return_pct;
            curve.push(EquityPoint {
                trade_number,
                time: leg.time,
                equity,
            });
        }
    }
    curve
}

impl Statistics {
    pub fn compute(trades: &[RealizedTrade], equity_curve: &[EquityPoint]) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(INITIAL_EQUITY);

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        // a flat trade counts as a loss
        for trade in trades {
            let pct = trade.realized_pct();
            if pct > 0.0 {
                winning_trades += 1;
                total_wins += pct;
                if pct > largest_win {
                    largest_win = pct;
                }
            } else {
                losing_trades += 1;
                total_losses += pct;
                if pct < largest_loss {
                    largest_loss = pct;
                }
            }
        }

        let trade_count = trades.len();
        let win_rate = if trade_count > 0 {
            winning_trades as f64 / trade_count as f64
        } else {
            0.0
        };

        let avg_win = if winning_trades > 0 {
            total_wins / winning_trades as f64
        } else {
            0.0
        };

        let avg_loss = if losing_trades > 0 {
            total_losses / losing_trades as f64
        } else {
            0.0
        };

        Statistics {
            trade_count,
            winning_trades,
            losing_trades,
            win_rate,
            total_return_pct: (final_equity - INITIAL_EQUITY) * 100.0,
            final_equity,
            max_drawdown: compute_drawdown(equity_curve),
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
        }
    }
}

/// The running peak starts at the initial equity, so a first losing leg
/// already counts as drawdown.
pub fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = INITIAL_EQUITY;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::{ExitLeg, ExitReason};
    use crate::domain::plan::Direction;
    use crate::domain::strategy::PlanKind;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn time(hour: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::hours(hour)
    }

    fn leg(fraction: f64, return_pct: f64, hour: i64) -> ExitLeg {
        ExitLeg {
            fraction,
            return_pct,
            price: 100.0,
            index: hour as usize,
            time: time(hour),
            reason: ExitReason::Target,
        }
    }

    fn trade(legs: Vec<ExitLeg>) -> RealizedTrade {
        let last = legs.last().cloned().unwrap();
        RealizedTrade {
            pair_index: 0,
            kind: PlanKind::Retracement,
            direction: Direction::Long,
            anchor_a_index: 0,
            anchor_a_time: time(0),
            anchor_b_index: 1,
            anchor_b_time: time(1),
            entry_index: 2,
            entry_time: time(2),
            entry_price: 100.0,
            exit_index: last.index,
            exit_time: last.time,
            exit_price: last.price,
            legs,
        }
    }

    #[test]
    fn empty_trades() {
        let curve = build_equity_curve(&[]);
        let stats = Statistics::compute(&[], &curve);
        assert!(curve.is_empty());
        assert_eq!(stats, Statistics::default());
    }

    #[test]
    fn three_trades_compound() {
        let trades = vec![
            trade(vec![leg(1.0, 0.10, 3)]),
            trade(vec![leg(1.0, -0.20, 5)]),
            trade(vec![leg(1.0, 0.05, 7)]),
        ];
        let curve = build_equity_curve(&trades);
        let stats = Statistics::compute(&trades, &curve);

        assert_eq!(curve.len(), 3);
        assert_relative_eq!(stats.final_equity, 1.1 * 0.8 * 1.05, epsilon = 1e-12);
        // peak 1.10, trough 0.88
        assert_relative_eq!(stats.max_drawdown, 0.2, epsilon = 1e-12);
        assert_relative_eq!(stats.total_return_pct, -7.6, epsilon = 1e-9);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 1);
        assert_relative_eq!(stats.win_rate, 2.0 / 3.0);
        assert_relative_eq!(stats.avg_win, 0.075, epsilon = 1e-12);
        assert_relative_eq!(stats.avg_loss, -0.20, epsilon = 1e-12);
        assert_relative_eq!(stats.largest_win, 0.10);
        assert_relative_eq!(stats.largest_loss, -0.20);
    }

    #[test]
    fn legs_compound_separately() {
        let trades = vec![trade(vec![leg(0.5, 0.04, 3), leg(0.5, -0.02, 4)])];
        let curve = build_equity_curve(&trades);
        assert_eq!(curve.len(), 2);
        assert_eq!(curve[0].trade_number, 0);
        assert_relative_eq!(curve[0].equity, 1.02, epsilon = 1e-12);
        assert_relative_eq!(curve[1].equity, 1.02 * 0.99, epsilon = 1e-12);

        let stats = Statistics::compute(&trades, &curve);
        assert_eq!(stats.winning_trades, 1);
    }

    #[test]
    fn breakeven_trade_is_a_loss() {
        let trades = vec![trade(vec![leg(1.0, 0.0, 3)])];
        let curve = build_equity_curve(&trades);
        let stats = Statistics::compute(&trades, &curve);
        assert_eq!(stats.losing_trades, 1);
        assert_relative_eq!(stats.win_rate, 0.0);
    }

    #[test]
    fn drawdown_from_initial_equity() {
        let trades = vec![trade(vec![leg(1.0, -0.10, 3)])];
        let curve = build_equity_curve(&trades);
        assert_relative_eq!(compute_drawdown(&curve), 0.10, epsilon = 1e-12);
    }
}
