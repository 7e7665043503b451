//! Domain error types.

use std::fmt;

/// An input record that was dropped instead of aborting the run.
///
/// Adapters collect these while reading a ledger or a price feed so the
/// caller can log or display them.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// 1-based line (or row) number in the source.
    pub line: usize,
    pub reason: String,
}

impl SkippedRecord {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// Top-level error type for tradereplay.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid trade ({raw_type}): {reason}")]
    InvalidTrade { raw_type: String, reason: String },

    #[error("{operation} called with {raw_type}, expected {expected} trade")]
    WrongTradeKind {
        operation: &'static str,
        expected: &'static str,
        raw_type: String,
    },

    #[error("ledger contains no trades")]
    EmptyLedger,

    #[error("ledger source error: {reason}")]
    LedgerSource { reason: String },

    #[error("price source error: {reason}")]
    PriceSource { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ReplayError> for std::process::ExitCode {
    fn from(err: &ReplayError) -> Self {
        let code: u8 = match err {
            ReplayError::Io(_) => 1,
            ReplayError::ConfigParse { .. }
            | ReplayError::ConfigMissing { .. }
            | ReplayError::ConfigInvalid { .. } => 2,
            ReplayError::InvalidTrade { .. }
            | ReplayError::WrongTradeKind { .. }
            | ReplayError::EmptyLedger
            | ReplayError::LedgerSource { .. } => 3,
            ReplayError::PriceSource { .. } => 4,
            ReplayError::Report { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
