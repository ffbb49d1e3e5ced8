//! One backtest run: validate the request, run the engine, validate its
//! output, compute metrics and charts, and assemble the report input.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::adapters::chart_svg::Visualizer;
use crate::domain::catalog::Catalog;
use crate::domain::error::TrendQuestError;
use crate::domain::metrics::{SymbolResult, portfolio_summary};
use crate::domain::report::ReportInput;
use crate::domain::request::BacktestRequest;
use crate::domain::settings::AppSettings;
use crate::domain::trade::{EquitySeries, validate_trades};
use crate::ports::engine_port::BacktestEngine;

pub struct Pipeline<'a> {
    pub catalog: &'a Catalog,
    pub engine: &'a dyn BacktestEngine,
    pub visualizer: &'a Visualizer,
    pub settings: &'a AppSettings,
}

/// Prefix the record name of a malformed-output error with the symbol.
fn for_symbol(symbol: &str) -> impl Fn(TrendQuestError) -> TrendQuestError + '_ {
    move |err| match err {
        TrendQuestError::MalformedOutput { record, row, reason } => TrendQuestError::MalformedOutput {
            record: format!("{symbol} {record}"),
            row,
            reason,
        },
        other => other,
    }
}

impl Pipeline<'_> {
    pub fn run(
        &self,
        request: &BacktestRequest,
        generated_at: NaiveDateTime,
    ) -> Result<ReportInput, TrendQuestError> {
        request.validate(self.catalog)?;
        let strategy = self.catalog.strategies.get(&request.strategy_code)?;
        let pool = self.catalog.pools.get(&request.pool)?;

        tracing::info!(
            pool = %pool.name,
            strategy = %strategy.code,
            start = %request.start_date,
            end = %request.end_date,
            "running backtest"
        );
        let outputs = self.engine.run(request, &pool.symbols)?;

        let mut results = BTreeMap::new();
        let mut charts = BTreeMap::new();
        let mut distributions = BTreeMap::new();
        for output in outputs {
            let symbol = output.symbol.as_str();
            let series = EquitySeries::from_raw(&output.equity)
                .map_err(for_symbol(symbol))?
                .window(request.start_date, request.end_date);
            let trades = validate_trades(&output.trades).map_err(for_symbol(symbol))?;
            let name = pool
                .symbol(symbol)
                .map(|s| s.name.as_str())
                .unwrap_or(symbol);

            charts.insert(
                symbol.to_string(),
                self.visualizer.equity_chart(symbol, &series, &trades),
            );
            distributions.insert(
                symbol.to_string(),
                self.visualizer.pnl_distribution(symbol, &trades),
            );
            let result = SymbolResult::compute(
                symbol,
                name,
                &series,
                trades,
                self.settings.risk_free_rate,
            );
            tracing::debug!(
                symbol,
                return_rate = result.return_rate,
                trades = result.total_trades,
                "symbol evaluated"
            );
            results.insert(symbol.to_string(), result);
        }

        let summary = portfolio_summary(results.values());
        let summary_chart = self.visualizer.summary_chart(results.values());

        let mut config = request.describe();
        for (label, value) in config.iter_mut() {
            if label == "选择策略" {
                *value = format!("{} ({})", strategy.display_name, strategy.code);
            }
        }

        tracing::info!(symbols = results.len(), "backtest finished");
        Ok(ReportInput {
            title: self.settings.title.clone(),
            generated_at,
            config,
            summary,
            results,
            charts,
            distributions,
            summary_chart: Some(summary_chart),
        })
    }
}
