//! Replay engine: walks the ledger and the price series in lockstep and
//! marks the open position to market on every bar.
//!
//! Each bar first absorbs every trade stamped at or before it (ledger order
//! on ties), then emits one [`ValuationRecord`]. Trades stamped after the
//! last bar are handled per [`TrailingTrades`].

use chrono::NaiveDateTime;
use std::iter::Peekable;
use std::str::FromStr;
use tracing::{debug, warn};

use super::error::ReplayError;
use super::ledger::TradeLedger;
use super::position::{ClosePolicy, PositionModel, DEFAULT_LOT_NOTIONAL};
use super::price::{PriceBar, PriceSeries};
use super::trade::Trade;

/// What to do with trades stamped after the last price bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingTrades {
    /// Never apply them; they are counted in [`ReplayOutcome::dropped`].
    #[default]
    Drop,
    /// Apply them and emit one extra record per distinct trade timestamp,
    /// valued at the last bar's close and conversion factor.
    Extend,
}

impl FromStr for TrailingTrades {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(TrailingTrades::Drop),
            "extend" => Ok(TrailingTrades::Extend),
            other => Err(format!("unknown trailing trade policy '{other}' (expected drop or extend)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    pub lot_notional: f64,
    pub close_policy: ClosePolicy,
    pub trailing_trades: TrailingTrades,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            lot_notional: DEFAULT_LOT_NOTIONAL,
            close_policy: ClosePolicy::default(),
            trailing_trades: TrailingTrades::default(),
        }
    }
}

/// Mark-to-market state at one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationRecord {
    pub timestamp: NaiveDateTime,
    pub position: f64,
    pub closed_pnl: f64,
    pub average_entry_price: f64,
    pub bar_close: f64,
    pub conversion_fx: f64,
    pub floating_pnl: f64,
    pub total_pnl: f64,
}

impl ValuationRecord {
    fn capture(model: &PositionModel, timestamp: NaiveDateTime, bar: &PriceBar) -> Self {
        let average_entry_price = model.average_entry_price();
        let floating_pnl = model.floating_pnl(bar.close, bar.conversion_fx);
        let closed_pnl = model.closed_pnl();
        ValuationRecord {
            timestamp,
            position: model.net_position(),
            closed_pnl,
            average_entry_price,
            bar_close: bar.close,
            conversion_fx: bar.conversion_fx,
            floating_pnl,
            total_pnl: floating_pnl + closed_pnl,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    pub records: Vec<ValuationRecord>,
    /// Trades applied to the position model.
    pub applied: usize,
    /// Trades never applied because they fall after the last bar.
    pub dropped: usize,
}

impl ReplayOutcome {
    pub fn final_record(&self) -> Option<&ValuationRecord> {
        self.records.last()
    }
}

pub fn run_replay(
    ledger: &TradeLedger,
    series: &PriceSeries,
    config: &ReplayConfig,
) -> Result<ReplayOutcome, ReplayError> {
    let mut model = PositionModel::new(config.lot_notional).with_policy(config.close_policy);
    let mut pending = ledger.iter().peekable();
    let mut records = Vec::with_capacity(series.len());
    let mut applied = 0usize;

    for bar in series.bars() {
        applied += apply_until(&mut model, &mut pending, bar.timestamp)?;
        records.push(ValuationRecord::capture(&model, bar.timestamp, bar));
    }

    let mut dropped = 0usize;
    match (config.trailing_trades, series.last()) {
        (TrailingTrades::Extend, Some(last_bar)) => {
            while let Some(next) = pending.peek() {
                let timestamp = next.timestamp();
                applied += apply_until(&mut model, &mut pending, timestamp)?;
                records.push(ValuationRecord::capture(&model, timestamp, last_bar));
            }
        }
        _ => {
            dropped = pending.count();
            if dropped > 0 {
                warn!(dropped, "trades after the last price bar were not applied");
            }
        }
    }

    debug!(
        bars = series.len(),
        records = records.len(),
        applied,
        dropped,
        "replay complete"
    );

    Ok(ReplayOutcome {
        records,
        applied,
        dropped,
    })
}

/// Apply every pending trade stamped at or before `until`.
fn apply_until<'a, I>(
    model: &mut PositionModel,
    pending: &mut Peekable<I>,
    until: NaiveDateTime,
) -> Result<usize, ReplayError>
where
    I: Iterator<Item = &'a Trade>,
{
    let mut count = 0;
    while let Some(trade) = pending.next_if(|t| t.timestamp() <= until) {
        model.apply(trade)?;
        count += 1;
    }
    Ok(count)
}
