//! Report output port.

use crate::domain::analysis::Analysis;
use crate::domain::error::ReplayError;

/// Port for writing analysis results.
pub trait ReportPort {
    fn write(&self, analysis: &Analysis, output_path: &str) -> Result<(), ReplayError>;
}
