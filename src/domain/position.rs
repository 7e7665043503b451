//! Open-position model: FIFO lots, average entry price, floating P&L.

use std::collections::BTreeMap;
use tracing::debug;

use super::error::ReplayError;
use super::trade::{Trade, TradeKind};

/// Contract size of one lot, in units of the base currency.
pub const DEFAULT_LOT_NOTIONAL: f64 = 100_000.0;

/// Net positions smaller than this are treated as flat.
pub const POSITION_TOLERANCE: f64 = 0.001;

/// How a closing trade is matched against open lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClosePolicy {
    /// A close removes the oldest open lot entirely, whatever its size or
    /// direction. Partial closes, and closes spanning several lots, are not
    /// modeled: the net position moves by the close's own lot size while
    /// the whole head lot leaves the queue.
    #[default]
    FifoSingleLotClose,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenLot {
    pub id: u64,
    /// Positive for long, negative for short.
    pub signed_lots: f64,
    pub entry_price: f64,
}

/// Mutable position state for a single replay run.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionModel {
    open_lots: BTreeMap<u64, OpenLot>,
    next_id: u64,
    net_position: f64,
    closed_pnl: f64,
    lot_notional: f64,
    policy: ClosePolicy,
}

impl Default for PositionModel {
    fn default() -> Self {
        Self::new(DEFAULT_LOT_NOTIONAL)
    }
}

impl PositionModel {
    pub fn new(lot_notional: f64) -> Self {
        PositionModel {
            open_lots: BTreeMap::new(),
            next_id: 0,
            net_position: 0.0,
            closed_pnl: 0.0,
            lot_notional,
            policy: ClosePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ClosePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn apply(&mut self, trade: &Trade) -> Result<(), ReplayError> {
        match trade.kind() {
            TradeKind::Open(_) => self.apply_open(trade),
            TradeKind::Close(_) => self.apply_close(trade),
        }
    }

    pub fn apply_open(&mut self, trade: &Trade) -> Result<(), ReplayError> {
        let TradeKind::Open(direction) = trade.kind() else {
            return Err(ReplayError::WrongTradeKind {
                operation: "apply_open",
                expected: "open",
                raw_type: trade.raw_type().to_string(),
            });
        };

        let signed_lots = direction.sign() * trade.lots();
        let id = self.next_id;
        self.next_id += 1;
        self.open_lots.insert(
            id,
            OpenLot {
                id,
                signed_lots,
                entry_price: trade.price(),
            },
        );
        self.net_position += signed_lots;
        Ok(())
    }

    pub fn apply_close(&mut self, trade: &Trade) -> Result<(), ReplayError> {
        if !trade.kind().is_close() {
            return Err(ReplayError::WrongTradeKind {
                operation: "apply_close",
                expected: "close",
                raw_type: trade.raw_type().to_string(),
            });
        }

        match self.policy {
            ClosePolicy::FifoSingleLotClose => match self.open_lots.pop_first() {
                Some((_, oldest)) => {
                    let direction = oldest.signed_lots.signum();
                    self.net_position -= direction * trade.lots();
                }
                None => {
                    debug!(
                        timestamp = %trade.timestamp(),
                        pnl = trade.realized_pnl(),
                        "close with no open lot"
                    );
                }
            },
        }

        self.closed_pnl += trade.realized_pnl();
        Ok(())
    }

    /// Signed-lot-weighted mean entry price; 0 when flat.
    pub fn average_entry_price(&self) -> f64 {
        if self.is_flat() {
            return 0.0;
        }
        let (weighted, weight) = self
            .open_lots
            .values()
            .fold((0.0_f64, 0.0_f64), |(w, n), lot| {
                (w + lot.signed_lots * lot.entry_price, n + lot.signed_lots)
            });
        if weight.abs() < POSITION_TOLERANCE {
            return 0.0;
        }
        weighted / weight
    }

    /// Unrealized P&L in account currency, marked at `bar_close`.
    pub fn floating_pnl(&self, bar_close: f64, conversion_fx: f64) -> f64 {
        if self.is_flat() {
            return 0.0;
        }
        (bar_close - self.average_entry_price()) * self.net_position * self.lot_notional
            / conversion_fx
    }

    pub fn is_flat(&self) -> bool {
        self.net_position.abs() < POSITION_TOLERANCE
    }

    pub fn net_position(&self) -> f64 {
        self.net_position
    }

    pub fn closed_pnl(&self) -> f64 {
        self.closed_pnl
    }

    pub fn open_lots(&self) -> impl Iterator<Item = &OpenLot> {
        self.open_lots.values()
    }
}
