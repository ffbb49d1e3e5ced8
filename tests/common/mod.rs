#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Mutex;
use trendquest::adapters::chart_svg::Visualizer;
use trendquest::adapters::default_catalog::load_catalog;
use trendquest::adapters::file_config_adapter::FileConfigAdapter;
use trendquest::domain::catalog::Catalog;
use trendquest::domain::error::TrendQuestError;
use trendquest::domain::pool::PoolSymbol;
use trendquest::domain::request::BacktestRequest;
use trendquest::domain::settings::AppSettings;
use trendquest::domain::trade::{RawEquityRow, RawTrade};
use trendquest::ports::engine_port::{BacktestEngine, EngineOutput};

/// Engine returning canned output for the symbols it knows.
pub struct MockEngine {
    pub outputs: Vec<EngineOutput>,
    pub failure: Option<String>,
    pub requests: Mutex<Vec<BacktestRequest>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            outputs: Vec::new(),
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_output(mut self, output: EngineOutput) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl BacktestEngine for MockEngine {
    fn run(
        &self,
        request: &BacktestRequest,
        symbols: &[PoolSymbol],
    ) -> Result<Vec<EngineOutput>, TrendQuestError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(reason) = &self.failure {
            return Err(TrendQuestError::Engine {
                reason: reason.clone(),
            });
        }
        Ok(self
            .outputs
            .iter()
            .filter(|o| symbols.iter().any(|s| s.code == o.symbol))
            .cloned()
            .collect())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn reference_time() -> NaiveDateTime {
    date("2025-02-16").and_hms_opt(0, 0, 0).unwrap()
}

pub fn equity_row(d: &str, close: f64, value: f64) -> RawEquityRow {
    RawEquityRow {
        date: Some(d.to_string()),
        close: Some(close.to_string()),
        value: Some(value.to_string()),
    }
}

pub fn trade_row(d: &str, side: &str, price: f64, size: u64, pnl: Option<f64>) -> RawTrade {
    RawTrade {
        date: Some(d.to_string()),
        side: Some(side.to_string()),
        price: Some(price.to_string()),
        size: Some(size.to_string()),
        pnl: pnl.map(|p| p.to_string()),
    }
}

/// Ten trading days rising from 100000 to 104500 with one round trip.
pub fn rising_output(symbol: &str) -> EngineOutput {
    let equity = (0..10)
        .map(|i| {
            equity_row(
                &format!("2024-06-{:02}", 3 + i),
                100.0 + i as f64,
                100_000.0 + 500.0 * i as f64,
            )
        })
        .collect();
    EngineOutput {
        symbol: symbol.to_string(),
        equity,
        trades: vec![
            trade_row("2024-06-03", "buy", 100.0, 100, None),
            trade_row("2024-06-12", "sell", 109.0, 100, Some(900.0)),
        ],
    }
}

/// A symbol that loses money: value peaks then falls.
pub fn falling_output(symbol: &str) -> EngineOutput {
    let values = [100_000.0, 102_000.0, 99_000.0, 97_000.0, 98_000.0];
    let equity = values
        .iter()
        .enumerate()
        .map(|(i, v)| equity_row(&format!("2024-06-{:02}", 3 + i), 50.0, *v))
        .collect();
    EngineOutput {
        symbol: symbol.to_string(),
        equity,
        trades: vec![
            trade_row("2024-06-03", "buy", 50.0, 200, None),
            trade_row("2024-06-06", "sell", 48.0, 200, Some(-400.0)),
        ],
    }
}

pub fn empty_config() -> FileConfigAdapter {
    FileConfigAdapter::from_string("").unwrap()
}

pub fn catalog() -> Catalog {
    load_catalog(&empty_config()).unwrap()
}

pub fn settings() -> AppSettings {
    AppSettings {
        reference_date: Some(date("2025-02-16")),
        ..AppSettings::default()
    }
}

pub fn visualizer() -> Visualizer {
    Visualizer::new(reference_time())
}
