//! Newline-delimited JSON price feed adapter.
//!
//! One bar per line:
//!
//! ```text
//! {"symbol":"USDJPY","time":"2024-03-01T09:00:00Z","open":"150.1","high":"150.3",
//!  "low":"150.0","close":"150.2","volume":"812","conversionFx":"150.2"}
//! ```
//!
//! Numeric fields may be JSON strings or numbers. A line that fails to
//! parse is skipped on its own. When a symbol is requested, only records
//! tagged with that symbol are kept.

use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::adapters::timestamp::parse_timestamp;
use crate::domain::error::{ReplayError, SkippedRecord};
use crate::domain::price::{PriceBar, PriceSeries, DEFAULT_CONVERSION_FX};
use crate::ports::price_port::{PriceLoad, PricePort};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn value(&self, field: &str) -> Result<f64, String> {
        let v = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid {} value '{}'", field, s))?,
        };
        if v.is_finite() {
            Ok(v)
        } else {
            Err(format!("{} must be finite", field))
        }
    }
}

#[derive(Debug, Deserialize)]
struct BarRecord {
    time: String,
    open: Numeric,
    high: Numeric,
    low: Numeric,
    close: Numeric,
    #[serde(default)]
    volume: Option<Numeric>,
    #[serde(default, rename = "conversionFx")]
    conversion_fx: Option<Numeric>,
    #[serde(default)]
    symbol: Option<String>,
}

impl BarRecord {
    fn matches(&self, symbol: Option<&str>) -> bool {
        match (symbol, self.symbol.as_deref()) {
            (Some(wanted), Some(tag)) => wanted.eq_ignore_ascii_case(tag.trim()),
            // untagged records cannot be attributed to the requested symbol
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    fn into_bar(self, default_fx: f64) -> Result<PriceBar, String> {
        let timestamp =
            parse_timestamp(&self.time).ok_or_else(|| format!("invalid time '{}'", self.time))?;
        let conversion_fx = match &self.conversion_fx {
            Some(fx) => fx.value("conversionFx")?,
            None => default_fx,
        };
        if conversion_fx <= 0.0 {
            return Err(format!("conversionFx must be positive, got {}", conversion_fx));
        }
        Ok(PriceBar {
            timestamp,
            open: self.open.value("open")?,
            high: self.high.value("high")?,
            low: self.low.value("low")?,
            close: self.close.value("close")?,
            volume: match &self.volume {
                Some(v) => v.value("volume")?,
                None => 0.0,
            },
            conversion_fx,
        })
    }
}

pub struct NdjsonPriceAdapter {
    path: PathBuf,
    default_conversion_fx: f64,
}

impl NdjsonPriceAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            default_conversion_fx: DEFAULT_CONVERSION_FX,
        }
    }

    pub fn with_default_conversion_fx(mut self, fx: f64) -> Self {
        self.default_conversion_fx = fx;
        self
    }
}

impl PricePort for NdjsonPriceAdapter {
    fn fetch_bars(&self, symbol: Option<&str>) -> Result<PriceLoad, ReplayError> {
        let file = File::open(&self.path).map_err(|e| ReplayError::PriceSource {
            reason: format!("failed to open {}: {}", self.path.display(), e),
        })?;
        let load = parse_bars(BufReader::new(file), symbol, self.default_conversion_fx);
        debug!(
            path = %self.path.display(),
            bars = load.series.len(),
            skipped = load.skipped.len(),
            "price series loaded"
        );
        Ok(load)
    }
}

/// Parse an NDJSON stream; never fails as a whole.
pub fn parse_bars<R: BufRead>(reader: R, symbol: Option<&str>, default_fx: f64) -> PriceLoad {
    let mut bars = Vec::new();
    let mut skipped = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                skipped.push(SkippedRecord::new(line_no, format!("read error: {}", e)));
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let record: BarRecord = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                skipped.push(SkippedRecord::new(line_no, format!("invalid JSON: {}", e)));
                continue;
            }
        };
        if !record.matches(symbol) {
            continue;
        }
        match record.into_bar(default_fx) {
            Ok(bar) => bars.push(bar),
            Err(reason) => skipped.push(SkippedRecord::new(line_no, reason)),
        }
    }

    for record in &skipped {
        warn!(%record, "skipping price line");
    }

    PriceLoad {
        series: PriceSeries::new(symbol.map(str::to_string), bars),
        skipped,
    }
}
