//! Port traits the domain is driven through.

pub mod config_port;
pub mod ledger_port;
pub mod price_port;
pub mod report_port;
