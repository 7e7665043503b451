//! CSV report adapter implementing ReportPort.
//!
//! Writes the valuation series to the output path and the metrics summary
//! to a sibling `<stem>.metrics.csv`. In ledger-only mode only the metrics
//! file is written.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::analysis::Analysis;
use crate::domain::error::ReplayError;
use crate::domain::metrics::Metrics;
use crate::domain::replay::ValuationRecord;
use crate::ports::report_port::ReportPort;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvReportAdapter {
    write_metrics: bool,
}

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self {
            write_metrics: true,
        }
    }

    pub fn with_metrics(mut self, write_metrics: bool) -> Self {
        self.write_metrics = write_metrics;
        self
    }

    /// `valuation.csv` -> `valuation.metrics.csv`
    pub fn metrics_path(output_path: &Path) -> PathBuf {
        output_path.with_extension("metrics.csv")
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, analysis: &Analysis, output_path: &str) -> Result<(), ReplayError> {
        let path = Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        if let Some(valuation) = &analysis.valuation {
            write_valuation(path, &valuation.records)?;
            info!(path = %path.display(), records = valuation.records.len(), "valuation written");
        }

        if self.write_metrics || analysis.is_ledger_only() {
            let metrics_path = Self::metrics_path(path);
            write_metrics(&metrics_path, &analysis.metrics)?;
            info!(path = %metrics_path.display(), "metrics written");
        }

        Ok(())
    }
}

fn report_error(path: &Path, e: impl std::fmt::Display) -> ReplayError {
    ReplayError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

fn write_valuation(path: &Path, records: &[ValuationRecord]) -> Result<(), ReplayError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| report_error(path, e))?;
    wtr.write_record([
        "timestamp",
        "position",
        "closed_pnl",
        "average_entry_price",
        "bar_close",
        "conversion_fx",
        "floating_pnl",
        "total_pnl",
    ])
    .map_err(|e| report_error(path, e))?;

    for r in records {
        wtr.write_record([
            r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            r.position.to_string(),
            r.closed_pnl.to_string(),
            r.average_entry_price.to_string(),
            r.bar_close.to_string(),
            r.conversion_fx.to_string(),
            r.floating_pnl.to_string(),
            r.total_pnl.to_string(),
        ])
        .map_err(|e| report_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_metrics(path: &Path, m: &Metrics) -> Result<(), ReplayError> {
    let rows: [(&str, String); 22] = [
        ("total_trades", m.total_trades.to_string()),
        ("long_opens", m.long_opens.to_string()),
        ("short_opens", m.short_opens.to_string()),
        ("closed_trades", m.closed_trades.to_string()),
        ("take_profit_closes", m.take_profit_closes.to_string()),
        ("stop_loss_closes", m.stop_loss_closes.to_string()),
        ("trades_won", m.trades_won.to_string()),
        ("trades_lost", m.trades_lost.to_string()),
        ("trades_breakeven", m.trades_breakeven.to_string()),
        ("win_rate", m.win_rate.to_string()),
        ("total_pnl", m.total_pnl.to_string()),
        ("total_profit", m.total_profit.to_string()),
        ("total_loss", m.total_loss.to_string()),
        ("avg_win", m.avg_win.to_string()),
        ("avg_loss", m.avg_loss.to_string()),
        ("largest_win", m.largest_win.to_string()),
        ("largest_loss", m.largest_loss.to_string()),
        ("profit_factor", m.profit_factor.to_string()),
        ("max_drawdown", m.max_drawdown.to_string()),
        ("max_drawdown_amount", m.max_drawdown_amount.to_string()),
        ("starting_balance", m.starting_balance.to_string()),
        ("final_balance", m.final_balance.to_string()),
    ];

    let mut wtr = csv::Writer::from_path(path).map_err(|e| report_error(path, e))?;
    wtr.write_record(["metric", "value"])
        .map_err(|e| report_error(path, e))?;
    for (name, value) in &rows {
        wtr.write_record([*name, value.as_str()])
            .map_err(|e| report_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}
