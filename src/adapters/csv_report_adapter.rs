//! CSV trade log adapter implementing ReportPort.
//!
//! One row per realized trade, in the order the trades were processed.

use std::path::Path;

use crate::domain::backtest::SimulationResult;
use crate::domain::error::SwingtraderError;
use crate::ports::report_port::ReportPort;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const HEADER: [&str; 13] = [
    "pair_index",
    "kind",
    "direction",
    "anchor_a_time",
    "anchor_b_time",
    "entry_time",
    "entry_price",
    "exit_time",
    "exit_price",
    "exit_reason",
    "realized_pct",
    "legs",
    "equity",
];

pub struct CsvReportAdapter;

fn report_error(e: impl std::fmt::Display) -> SwingtraderError {
    SwingtraderError::Report {
        reason: e.to_string(),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &SimulationResult, output_path: &Path) -> Result<(), SwingtraderError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| {
            report_error(format!("failed to create {}: {e}", output_path.display()))
        })?;
        wtr.write_record(HEADER).map_err(report_error)?;

        // the curve has one point per leg; take the last point of each trade
        let mut equity_after = vec![1.0; result.trades.len()];
        for point in &result.equity_curve {
            if let Some(slot) = equity_after.get_mut(point.trade_number) {
                *slot = point.equity;
            }
        }

        for (trade, equity) in result.trades.iter().zip(equity_after) {
            let exit_reason = trade
                .legs
                .last()
                .map(|leg| leg.reason.to_string())
                .unwrap_or_default();
            wtr.write_record([
                trade.pair_index.to_string(),
                trade.kind.to_string(),
                trade.direction.to_string(),
                trade.anchor_a_time.format(TIME_FORMAT).to_string(),
                trade.anchor_b_time.format(TIME_FORMAT).to_string(),
                trade.entry_time.format(TIME_FORMAT).to_string(),
                format!("{:.5}", trade.entry_price),
                trade.exit_time.format(TIME_FORMAT).to_string(),
                format!("{:.5}", trade.exit_price),
                exit_reason,
                format!("{:.4}", trade.realized_pct() * 100.0),
                trade.legs.len().to_string(),
                format!("{:.6}", equity),
            ])
            .map_err(report_error)?;
        }

        wtr.flush().map_err(report_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::{ExitLeg, ExitReason, RealizedTrade};
    use crate::domain::metrics::{build_equity_curve, Statistics};
    use crate::domain::plan::Direction;
    use crate::domain::strategy::PlanKind;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use tempfile::TempDir;

    fn time(hour: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::hours(hour)
    }

    fn sample_result() -> SimulationResult {
        let trade = RealizedTrade {
            pair_index: 3,
            kind: PlanKind::Retracement,
            direction: Direction::Short,
            anchor_a_index: 1,
            anchor_a_time: time(1),
            anchor_b_index: 4,
            anchor_b_time: time(4),
            entry_index: 6,
            entry_time: time(6),
            entry_price: 105.0,
            exit_index: 9,
            exit_time: time(9),
            exit_price: 101.0,
            legs: vec![
                ExitLeg {
                    fraction: 0.5,
                    return_pct: 0.02,
                    price: 103.0,
                    index: 7,
                    time: time(7),
                    reason: ExitReason::PartialTarget,
                },
                ExitLeg {
                    fraction: 0.5,
                    return_pct: 0.04,
                    price: 101.0,
                    index: 9,
                    time: time(9),
                    reason: ExitReason::Target,
                },
            ],
        };
        let trades = vec![trade];
        let equity_curve = build_equity_curve(&trades);
        let stats = Statistics::compute(&trades, &equity_curve);
        SimulationResult {
            swing_points: Vec::new(),
            plans: 1,
            skipped: Vec::new(),
            unfilled: 0,
            trades,
            equity_curve,
            stats,
        }
    }

    #[test]
    fn writes_one_row_per_trade() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        CsvReportAdapter.write(&sample_result(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("pair_index,kind,direction"));
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields[0], "3");
        assert_eq!(fields[1], "retracement");
        assert_eq!(fields[2], "SHORT");
        assert_eq!(fields[5], "2024-05-01 06:00:00");
        assert_eq!(fields[9], "target");
        assert_eq!(fields[10], "3.0000");
        assert_eq!(fields[11], "2");
        assert_eq!(fields[12], "1.030200");
    }

    #[test]
    fn unwritable_path_is_a_report_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing_dir").join("trades.csv");
        assert!(matches!(
            CsvReportAdapter.write(&sample_result(), &path),
            Err(SwingtraderError::Report { .. })
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_flush_is_a_report_error() {
        // rows stay buffered until flush, which fails on a full device
        let result = CsvReportAdapter.write(&sample_result(), Path::new("/dev/full"));
        assert!(matches!(result, Err(SwingtraderError::Report { .. })));
    }
}
