//! Trade log port trait.

use std::path::Path;

use crate::domain::backtest::SimulationResult;
use crate::domain::error::SwingtraderError;

/// Port for writing the realized trades of a backtest.
pub trait ReportPort {
    fn write(&self, result: &SimulationResult, output_path: &Path) -> Result<(), SwingtraderError>;
}
