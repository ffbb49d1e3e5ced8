//! Backtest engine port.

use crate::domain::error::TrendQuestError;
use crate::domain::pool::PoolSymbol;
use crate::domain::request::BacktestRequest;
use crate::domain::trade::{RawEquityRow, RawTrade};

/// Unvalidated engine output for one symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    pub symbol: String,
    pub equity: Vec<RawEquityRow>,
    pub trades: Vec<RawTrade>,
}

/// The external engine that executes a request over a set of symbols.
pub trait BacktestEngine {
    fn run(
        &self,
        request: &BacktestRequest,
        symbols: &[PoolSymbol],
    ) -> Result<Vec<EngineOutput>, TrendQuestError>;
}
