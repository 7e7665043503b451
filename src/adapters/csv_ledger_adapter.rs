//! CSV trade ledger adapter.
//!
//! Reads the normalized ledger a report scraper writes out. Columns are
//! located by header name, so extra columns (ticket, S/L, T/P, balance) are
//! ignored. Recognized headers, case-insensitive:
//!
//! | field  | headers                   |
//! |--------|---------------------------|
//! | time   | `time`, `date`            |
//! | type   | `type`                    |
//! | lots   | `lots`, `size`, `volume`  |
//! | price  | `price`                   |
//! | profit | `profit`, `pnl`            |
//!
//! The profit column may be absent or blank for opens; a close without a
//! profit value is skipped.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::adapters::timestamp::parse_timestamp;
use crate::domain::error::{ReplayError, SkippedRecord};
use crate::domain::trade::{Trade, TradeKind};
use crate::ports::ledger_port::{LedgerLoad, LedgerPort};

pub struct CsvLedgerAdapter {
    path: PathBuf,
}

impl CsvLedgerAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl LedgerPort for CsvLedgerAdapter {
    fn load_trades(&self) -> Result<LedgerLoad, ReplayError> {
        let content = fs::read_to_string(&self.path).map_err(|e| ReplayError::LedgerSource {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let load = parse_ledger(content.as_bytes())?;
        debug!(
            path = %self.path.display(),
            trades = load.trades.len(),
            skipped = load.skipped.len(),
            "ledger loaded"
        );
        Ok(load)
    }
}

struct Columns {
    time: usize,
    kind: usize,
    lots: usize,
    price: usize,
    profit: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, ReplayError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| ReplayError::LedgerSource {
                reason: format!("missing {} column", names[0]),
            })
        };
        Ok(Columns {
            time: require(&["time", "date"])?,
            kind: require(&["type"])?,
            lots: require(&["lots", "size", "volume"])?,
            price: require(&["price"])?,
            profit: find(&["profit", "pnl"]),
        })
    }
}

/// Parse a ledger CSV, skipping rows that cannot become trades.
pub fn parse_ledger<R: Read>(reader: R) -> Result<LedgerLoad, ReplayError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| ReplayError::LedgerSource {
        reason: format!("CSV header error: {}", e),
    })?;
    let columns = Columns::locate(headers)?;

    let mut load = LedgerLoad::default();

    for (index, result) in rdr.records().enumerate() {
        // header is line 1; quoted fields may span lines, so prefer the
        // reader's own position
        let fallback = index + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map_or(fallback, |p| p.line() as usize);
                load.skipped.push(SkippedRecord::new(line, format!("CSV parse error: {}", e)));
                continue;
            }
        };
        let line = record.position().map_or(fallback, |p| p.line() as usize);

        let label = record.get(columns.kind).unwrap_or_default();
        if TradeKind::from_label(label).is_none() {
            debug!(line, label, "ignoring non-trade row");
            continue;
        }

        match parse_row(&record, &columns) {
            Ok(trade) => load.trades.push(trade),
            Err(reason) => load.skipped.push(SkippedRecord::new(line, reason)),
        }
    }

    for skipped in &load.skipped {
        warn!(%skipped, "skipping ledger row");
    }

    Ok(load)
}

fn parse_row(record: &csv::StringRecord, columns: &Columns) -> Result<Trade, String> {
    let time_str = record.get(columns.time).unwrap_or_default();
    let timestamp =
        parse_timestamp(time_str).ok_or_else(|| format!("invalid time '{}'", time_str))?;

    let label = record.get(columns.kind).unwrap_or_default();
    let is_close = TradeKind::from_label(label).is_some_and(|k| k.is_close());
    let lots = parse_number(record.get(columns.lots), "lots")?;
    let price = parse_number(record.get(columns.price), "price")?;
    let profit = match columns.profit.and_then(|i| record.get(i)).filter(|s| !s.is_empty()) {
        Some(s) => parse_number(Some(s), "profit")?,
        None if is_close => return Err("missing profit on close".to_string()),
        None => 0.0,
    };

    Trade::from_label(timestamp, label, lots, price, profit).map_err(|e| e.to_string())
}

/// Numbers in reports may carry space thousands separators ("1 250.00").
fn parse_number(value: Option<&str>, field: &str) -> Result<f64, String> {
    let raw = value.ok_or_else(|| format!("missing {} column", field))?;
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    cleaned
        .parse::<f64>()
        .map_err(|e| format!("invalid {} value '{}': {}", field, raw, e))
}
