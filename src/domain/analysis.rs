//! Full analysis of one report: ledger metrics plus, when prices are
//! available, the bar-by-bar valuation.

use tracing::info;

use super::error::ReplayError;
use super::ledger::TradeLedger;
use super::metrics::{Metrics, MetricsConfig};
use super::price::{PriceSeries, DEFAULT_CONVERSION_FX};
use super::replay::{run_replay, ReplayConfig, ReplayOutcome};
use super::trade::Trade;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub replay: ReplayConfig,
    pub metrics: MetricsConfig,
    /// Conversion factor given to bars whose feed record has none.
    pub default_conversion_fx: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            replay: ReplayConfig::default(),
            metrics: MetricsConfig::default(),
            default_conversion_fx: DEFAULT_CONVERSION_FX,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub ledger: TradeLedger,
    pub metrics: Metrics,
    /// `None` in ledger-only mode.
    pub valuation: Option<ReplayOutcome>,
}

impl Analysis {
    pub fn is_ledger_only(&self) -> bool {
        self.valuation.is_none()
    }
}

/// Run metrics and, if `prices` holds any bars, the replay.
///
/// An empty trade list is a hard failure. A missing or empty price series
/// is not: the result simply has no valuation.
pub fn analyze(
    trades: Vec<Trade>,
    prices: Option<&PriceSeries>,
    config: &AnalysisConfig,
) -> Result<Analysis, ReplayError> {
    let ledger = TradeLedger::new(trades)?;
    let metrics = Metrics::compute(ledger.trades(), &config.metrics);

    let valuation = match prices.filter(|p| !p.is_empty()) {
        Some(series) => {
            info!(
                trades = ledger.len(),
                bars = series.len(),
                "replaying ledger against price series"
            );
            Some(run_replay(&ledger, series, &config.replay)?)
        }
        None => {
            info!(trades = ledger.len(), "no price data, ledger-only analysis");
            None
        }
    };

    Ok(Analysis {
        ledger,
        metrics,
        valuation,
    })
}
