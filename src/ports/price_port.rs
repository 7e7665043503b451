//! Price series source port.

use crate::domain::error::{ReplayError, SkippedRecord};
use crate::domain::price::PriceSeries;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceLoad {
    pub series: PriceSeries,
    pub skipped: Vec<SkippedRecord>,
}

pub trait PricePort {
    /// Fetch bars, keeping only `symbol` when one is given.
    ///
    /// Malformed records are skipped and reported, never fatal.
    fn fetch_bars(&self, symbol: Option<&str>) -> Result<PriceLoad, ReplayError>;
}
