//! Report output port.

use crate::domain::error::TrendQuestError;
use crate::domain::report::ReportInput;

/// Port for persisting a rendered backtest report.
pub trait ReportPort {
    fn write(&self, report: &ReportInput, output_path: &str) -> Result<(), TrendQuestError>;
}
