//! Core domain types and logic.

pub mod trade;
pub mod ledger;
pub mod price;
pub mod position;
pub mod replay;
pub mod metrics;
pub mod analysis;
pub mod config_validation;
pub mod error;
