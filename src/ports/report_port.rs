//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::VoltargetError;
use std::path::Path;

/// Port for writing backtest results.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), VoltargetError>;
}
