//! Time-ordered trade ledger.

use super::error::ReplayError;
use super::trade::Trade;

/// Trades sorted by timestamp, ties kept in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    /// Build a ledger, refusing an empty trade list.
    pub fn new(mut trades: Vec<Trade>) -> Result<Self, ReplayError> {
        if trades.is_empty() {
            return Err(ReplayError::EmptyLedger);
        }
        // sort_by_key is stable
        trades.sort_by_key(|t| t.timestamp());
        Ok(Self { trades })
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trade> {
        self.trades.iter()
    }

    pub fn first_timestamp(&self) -> Option<chrono::NaiveDateTime> {
        self.trades.first().map(|t| t.timestamp())
    }

    pub fn last_timestamp(&self) -> Option<chrono::NaiveDateTime> {
        self.trades.last().map(|t| t.timestamp())
    }
}

impl<'a> IntoIterator for &'a TradeLedger {
    type Item = &'a Trade;
    type IntoIter = std::slice::Iter<'a, Trade>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.iter()
    }
}
