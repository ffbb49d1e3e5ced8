//! CSV adapters: replay of an external engine's export, and the per-symbol
//! summary export.

use crate::domain::error::TrendQuestError;
use crate::domain::format::{decimal, percent};
use crate::domain::metrics::SymbolResult;
use crate::domain::pool::PoolSymbol;
use crate::domain::request::BacktestRequest;
use crate::domain::trade::{RawEquityRow, RawTrade};
use crate::ports::engine_port::{BacktestEngine, EngineOutput};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads `<base>/<strategy>/<symbol>_equity.csv` and `<symbol>_trades.csv`.
pub struct CsvEngineAdapter {
    base_path: PathBuf,
}

impl CsvEngineAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn equity_path(&self, strategy: &str, symbol: &str) -> PathBuf {
        self.base_path
            .join(strategy)
            .join(format!("{symbol}_equity.csv"))
    }

    fn trades_path(&self, strategy: &str, symbol: &str) -> PathBuf {
        self.base_path
            .join(strategy)
            .join(format!("{symbol}_trades.csv"))
    }
}

/// Rows of a headed CSV file as column-name -> cell maps. Missing columns
/// simply do not appear, so validation can name them.
fn read_rows(path: &Path) -> Result<Vec<BTreeMap<String, String>>, TrendQuestError> {
    let content = fs::read(path)?;
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);
    let headers = rdr
        .headers()
        .map_err(|e| TrendQuestError::Engine {
            reason: format!("failed to read header of {}: {}", path.display(), e),
        })?
        .clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| TrendQuestError::Engine {
            reason: format!("CSV parse error in {}: {}", path.display(), e),
        })?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_ascii_lowercase(), v.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

/// Rows with an unparsable date are kept so validation can report them.
fn in_window(row: &BTreeMap<String, String>, start: NaiveDate, end: NaiveDate) -> bool {
    match row
        .get("date")
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    {
        Some(date) => date >= start && date <= end,
        None => true,
    }
}

impl BacktestEngine for CsvEngineAdapter {
    fn run(
        &self,
        request: &BacktestRequest,
        symbols: &[PoolSymbol],
    ) -> Result<Vec<EngineOutput>, TrendQuestError> {
        let (start, end) = (request.start_date, request.end_date);
        let mut outputs = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            let equity_path = self.equity_path(&request.strategy_code, &symbol.code);
            if !equity_path.exists() {
                tracing::warn!(
                    symbol = %symbol.code,
                    path = %equity_path.display(),
                    "no engine export for symbol, skipping"
                );
                continue;
            }

            let equity = read_rows(&equity_path)?
                .into_iter()
                .filter(|row| in_window(row, start, end))
                .map(|mut row| RawEquityRow {
                    date: row.remove("date"),
                    close: row.remove("close"),
                    value: row.remove("value"),
                })
                .collect();

            let trades_path = self.trades_path(&request.strategy_code, &symbol.code);
            let trades = if trades_path.exists() {
                read_rows(&trades_path)?
                    .into_iter()
                    .filter(|row| in_window(row, start, end))
                    .map(|mut row| RawTrade {
                        date: row.remove("date"),
                        side: row.remove("type"),
                        price: row.remove("price"),
                        size: row.remove("size"),
                        pnl: row.remove("pnl"),
                    })
                    .collect()
            } else {
                Vec::new()
            };

            tracing::debug!(symbol = %symbol.code, "loaded engine export");
            outputs.push(EngineOutput {
                symbol: symbol.code.clone(),
                equity,
                trades,
            });
        }

        if outputs.is_empty() {
            return Err(TrendQuestError::Engine {
                reason: format!(
                    "no results for strategy {} under {}",
                    request.strategy_code,
                    self.base_path.display()
                ),
            });
        }
        Ok(outputs)
    }
}

pub const SUMMARY_HEADERS: [&str; 8] = [
    "股票代码",
    "股票名称",
    "总收益率",
    "年化收益率",
    "最大回撤",
    "夏普比率",
    "交易次数",
    "胜率",
];

/// Per-symbol summary table as UTF-8 CSV with a BOM.
pub fn summary_csv<'a>(
    results: impl IntoIterator<Item = &'a SymbolResult>,
) -> Result<Vec<u8>, TrendQuestError> {
    let mut wtr = csv::Writer::from_writer(UTF8_BOM.to_vec());
    let to_io = |e: csv::Error| TrendQuestError::Io(std::io::Error::other(e.to_string()));

    wtr.write_record(SUMMARY_HEADERS).map_err(to_io)?;
    for r in results {
        wtr.write_record([
            r.symbol.clone(),
            r.name.clone(),
            percent(r.return_rate),
            percent(r.annual_return),
            percent(r.max_drawdown),
            decimal(r.sharpe_ratio),
            r.total_trades.to_string(),
            percent(r.win_rate),
        ])
        .map_err(to_io)?;
    }
    wtr.into_inner()
        .map_err(|e| TrendQuestError::Io(std::io::Error::other(e.to_string())))
}

pub fn write_summary_csv<'a>(
    path: &Path,
    results: impl IntoIterator<Item = &'a SymbolResult>,
) -> Result<(), TrendQuestError> {
    let bytes = summary_csv(results)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}
