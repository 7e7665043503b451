//! Price bars for the traded instrument.

use chrono::NaiveDateTime;

/// Account-currency conversion factor used when a feed record has none.
pub const DEFAULT_CONVERSION_FX: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub conversion_fx: f64,
}

/// Bars sorted by timestamp.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    symbol: Option<String>,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Sorts bars stably by timestamp.
    pub fn new(symbol: Option<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        Self { symbol, bars }
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}
