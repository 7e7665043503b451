//! Trade events extracted from a strategy-tester report.

use chrono::NaiveDateTime;
use std::fmt;

use super::error::ReplayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// Why a position was closed.
///
/// Every closing label a report can carry maps onto one of these two.
/// Market and end-of-test closes count as `TakeProfit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    TakeProfit,
    StopLoss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    Open(Direction),
    Close(CloseReason),
}

impl TradeKind {
    /// Map a report's type label onto a trade kind.
    ///
    /// Returns `None` for labels that are not ledger events (order
    /// modifications, deletions, pending orders).
    pub fn from_label(label: &str) -> Option<TradeKind> {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "buy" => Some(TradeKind::Open(Direction::Long)),
            "sell" => Some(TradeKind::Open(Direction::Short)),
            "t/p" | "take profit" | "close" => Some(TradeKind::Close(CloseReason::TakeProfit)),
            "s/l" | "stop loss" | "close at stop" => Some(TradeKind::Close(CloseReason::StopLoss)),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, TradeKind::Open(_))
    }

    pub fn is_close(&self) -> bool {
        matches!(self, TradeKind::Close(_))
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TradeKind::Open(Direction::Long) => "open long",
            TradeKind::Open(Direction::Short) => "open short",
            TradeKind::Close(CloseReason::TakeProfit) => "close take-profit",
            TradeKind::Close(CloseReason::StopLoss) => "close stop-loss",
        };
        f.write_str(label)
    }
}

/// One ledger event. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    timestamp: NaiveDateTime,
    kind: TradeKind,
    lots: f64,
    price: f64,
    realized_pnl: f64,
    raw_type: String,
}

impl Trade {
    /// Build a trade, enforcing `lots > 0`.
    ///
    /// `realized_pnl` is ignored for opens, which always carry zero.
    pub fn new(
        timestamp: NaiveDateTime,
        kind: TradeKind,
        lots: f64,
        price: f64,
        realized_pnl: f64,
        raw_type: impl Into<String>,
    ) -> Result<Self, ReplayError> {
        let raw_type = raw_type.into();
        if !(lots.is_finite() && lots > 0.0) {
            return Err(ReplayError::InvalidTrade {
                raw_type,
                reason: format!("lots must be positive, got {lots}"),
            });
        }
        if !price.is_finite() {
            return Err(ReplayError::InvalidTrade {
                raw_type,
                reason: format!("price must be finite, got {price}"),
            });
        }
        if !realized_pnl.is_finite() {
            return Err(ReplayError::InvalidTrade {
                raw_type,
                reason: format!("profit must be finite, got {realized_pnl}"),
            });
        }
        let realized_pnl = if kind.is_open() { 0.0 } else { realized_pnl };
        Ok(Trade {
            timestamp,
            kind,
            lots,
            price,
            realized_pnl,
            raw_type,
        })
    }

    /// Build a trade from its report label, e.g. `"buy"` or `"s/l"`.
    pub fn from_label(
        timestamp: NaiveDateTime,
        label: &str,
        lots: f64,
        price: f64,
        realized_pnl: f64,
    ) -> Result<Self, ReplayError> {
        let kind = TradeKind::from_label(label).ok_or_else(|| ReplayError::InvalidTrade {
            raw_type: label.to_string(),
            reason: "unrecognized trade type".to_string(),
        })?;
        Trade::new(timestamp, kind, lots, price, realized_pnl, label)
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn kind(&self) -> TradeKind {
        self.kind
    }

    pub fn lots(&self) -> f64 {
        self.lots
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn raw_type(&self) -> &str {
        &self.raw_type
    }
}
