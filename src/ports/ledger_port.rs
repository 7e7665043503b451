//! Trade ledger source port.

use crate::domain::error::{ReplayError, SkippedRecord};
use crate::domain::trade::Trade;

/// Trades read from a source, in source order, plus the records that
/// could not be turned into trades.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerLoad {
    pub trades: Vec<Trade>,
    pub skipped: Vec<SkippedRecord>,
}

pub trait LedgerPort {
    /// Fails only when the source as a whole cannot be read.
    fn load_trades(&self) -> Result<LedgerLoad, ReplayError>;
}
