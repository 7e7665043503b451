#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use tradereplay::domain::error::{ReplayError, SkippedRecord};
use tradereplay::domain::price::{PriceBar, PriceSeries, DEFAULT_CONVERSION_FX};
pub use tradereplay::domain::trade::Trade;
use tradereplay::ports::ledger_port::{LedgerLoad, LedgerPort};
use tradereplay::ports::price_port::{PriceLoad, PricePort};

pub struct MockLedgerPort {
    pub trades: Vec<Trade>,
    pub skipped: Vec<SkippedRecord>,
    pub error: Option<String>,
}

impl MockLedgerPort {
    pub fn new(trades: Vec<Trade>) -> Self {
        Self {
            trades,
            skipped: Vec::new(),
            error: None,
        }
    }

    pub fn with_skipped(mut self, line: usize, reason: &str) -> Self {
        self.skipped.push(SkippedRecord::new(line, reason));
        self
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            trades: Vec::new(),
            skipped: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl LedgerPort for MockLedgerPort {
    fn load_trades(&self) -> Result<LedgerLoad, ReplayError> {
        if let Some(reason) = &self.error {
            return Err(ReplayError::LedgerSource {
                reason: reason.clone(),
            });
        }
        Ok(LedgerLoad {
            trades: self.trades.clone(),
            skipped: self.skipped.clone(),
        })
    }
}

pub struct MockPricePort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub error: Option<String>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            error: None,
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl PricePort for MockPricePort {
    fn fetch_bars(&self, symbol: Option<&str>) -> Result<PriceLoad, ReplayError> {
        if let Some(reason) = &self.error {
            return Err(ReplayError::PriceSource {
                reason: reason.clone(),
            });
        }
        let bars = match symbol {
            Some(s) => self.data.get(s).cloned().unwrap_or_default(),
            None => self.data.values().flatten().cloned().collect(),
        };
        Ok(PriceLoad {
            series: PriceSeries::new(symbol.map(str::to_string), bars),
            skipped: Vec::new(),
        })
    }
}

/// 2024-03-01 at h:m.
pub fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn trade(h: u32, m: u32, label: &str, lots: f64, price: f64, pnl: f64) -> Trade {
    Trade::from_label(at(h, m), label, lots, price, pnl).unwrap()
}

pub fn make_bar(h: u32, m: u32, close: f64) -> PriceBar {
    PriceBar {
        timestamp: at(h, m),
        open: close,
        high: close + 0.0005,
        low: close - 0.0005,
        close,
        volume: 100.0,
        conversion_fx: DEFAULT_CONVERSION_FX,
    }
}

/// `count` bars every `step_minutes`, starting 09:00, with a linear drift.
pub fn generate_bars(count: usize, step_minutes: i64, start_price: f64, drift: f64) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            let close = start_price + drift * i as f64;
            PriceBar {
                timestamp: at(9, 0) + Duration::minutes(step_minutes * i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
                conversion_fx: DEFAULT_CONVERSION_FX,
            }
        })
        .collect()
}

/// Open long 1 lot @1.1000 at 09:00, take profit +50 at 09:10.
pub fn take_profit_ledger() -> Vec<Trade> {
    vec![
        trade(9, 0, "buy", 1.0, 1.1, 0.0),
        trade(9, 10, "t/p", 1.0, 1.105, 50.0),
    ]
}

pub fn take_profit_bars() -> Vec<PriceBar> {
    vec![
        make_bar(9, 0, 1.1),
        make_bar(9, 5, 1.103),
        make_bar(9, 10, 1.105),
        make_bar(9, 15, 1.105),
    ]
}

pub const LEDGER_CSV: &str = "\
time,type,lots,price,profit
2024.03.01 09:00,buy,1.00,1.10000,
2024.03.01 09:03,modify,1.00,1.10000,
2024.03.01 09:10,t/p,1.00,1.10500,50.00
2024.03.01 09:20,sell,0.50,1.10600,
2024.03.01 09:40,s/l,0.50,1.10800,-100.00
";

pub const PRICES_NDJSON: &str = r#"{"symbol":"EURUSD","time":"2024-03-01T09:00:00","open":"1.1000","high":"1.1002","low":"1.0998","close":"1.1000","volume":"10"}
{"symbol":"EURUSD","time":"2024-03-01T09:05:00","open":"1.1000","high":"1.1032","low":"1.0999","close":"1.1030","volume":"12"}
{"symbol":"EURUSD","time":"2024-03-01T09:10:00","open":"1.1030","high":"1.1052","low":"1.1025","close":"1.1050","volume":"9"}
broken line
{"symbol":"EURUSD","time":"2024-03-01T09:20:00","open":"1.1050","high":"1.1062","low":"1.1045","close":"1.1060","volume":"14"}
{"symbol":"EURUSD","time":"2024-03-01T09:30:00","open":"1.1060","high":"1.1072","low":"1.1055","close":"1.1070","volume":"11"}
{"symbol":"EURUSD","time":"2024-03-01T09:40:00","open":"1.1070","high":"1.1082","low":"1.1065","close":"1.1080","volume":"8"}
{"symbol":"GBPUSD","time":"2024-03-01T09:40:00","open":"1.26","high":"1.27","low":"1.25","close":"1.26","volume":"8"}
"#;
