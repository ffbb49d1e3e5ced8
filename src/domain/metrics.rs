//! Per-symbol performance metrics and the portfolio summary.

use crate::domain::format::{decimal, percent};
use crate::domain::trade::{EquitySeries, Trade};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Result object for one symbol of the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolResult {
    pub symbol: String,
    pub name: String,
    pub return_rate: f64,
    pub annual_return: f64,
    /// Peak-to-trough decline as a negative fraction (0 when flat).
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    /// Number of closed (sell) trades.
    pub total_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub trades: Vec<Trade>,
}

impl SymbolResult {
    pub fn compute(
        symbol: &str,
        name: &str,
        equity: &EquitySeries,
        trades: Vec<Trade>,
        risk_free_rate: f64,
    ) -> Self {
        let values: Vec<f64> = equity.points().iter().map(|p| p.value).collect();

        let return_rate = match (values.first(), values.last()) {
            (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
            _ => 0.0,
        };

        let years = values.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annual_return = if years > 0.0 && return_rate > -1.0 {
            (1.0 + return_rate).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let sells: Vec<&Trade> = trades.iter().filter(|t| t.is_sell()).collect();
        let wins: Vec<f64> = sells.iter().map(|t| t.pnl).filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = sells.iter().map(|t| t.pnl).filter(|p| *p <= 0.0).collect();
        let total_trades = sells.len();
        let win_rate = if total_trades > 0 {
            wins.len() as f64 / total_trades as f64
        } else {
            0.0
        };

        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            return_rate,
            annual_return,
            max_drawdown: max_drawdown(&values),
            sharpe_ratio: sharpe_ratio(&values, risk_free_rate),
            total_trades,
            win_rate,
            avg_win: mean(&wins),
            avg_loss: mean(&losses),
            trades,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &v in values {
        peak = peak.max(v);
        if peak > 0.0 {
            worst = worst.min((v - peak) / peak);
        }
    }
    worst
}

fn sharpe_ratio(values: &[f64], risk_free_rate: f64) -> f64 {
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = values
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0] - daily_rf)
        .collect();
    if excess.len() < 2 {
        return 0.0;
    }

    let avg = mean(&excess);
    let variance =
        excess.iter().map(|r| (r - avg).powi(2)).sum::<f64>() / (excess.len() - 1) as f64;
    let std_dev = variance.sqrt();
    if std_dev > 0.0 {
        TRADING_DAYS_PER_YEAR.sqrt() * avg / std_dev
    } else {
        0.0
    }
}

/// How a summary figure is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Fraction shown as `12.34%`.
    Percent,
    /// Two decimals.
    Decimal,
    /// Whole number.
    Count,
}

/// One aggregate figure shown at the top of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMetric {
    pub name: String,
    pub value: f64,
    pub kind: MetricKind,
}

impl SummaryMetric {
    pub fn new(name: &str, value: f64, kind: MetricKind) -> Self {
        Self {
            name: name.to_string(),
            value,
            kind,
        }
    }

    pub fn count(name: &str, n: usize) -> Self {
        Self::new(name, n as f64, MetricKind::Count)
    }

    pub fn is_percentage(&self) -> bool {
        self.kind == MetricKind::Percent
    }

    pub fn text(&self) -> String {
        match self.kind {
            MetricKind::Percent => percent(self.value),
            MetricKind::Decimal => decimal(self.value),
            MetricKind::Count => format!("{:.0}", self.value + 0.0),
        }
    }
}

/// Portfolio-level summary across all symbol results.
pub fn portfolio_summary<'a>(results: impl IntoIterator<Item = &'a SymbolResult>) -> Vec<SummaryMetric> {
    let results: Vec<&SymbolResult> = results.into_iter().collect();
    let avg = |f: fn(&SymbolResult) -> f64| mean(&results.iter().map(|r| f(r)).collect::<Vec<_>>());

    let worst_drawdown = results
        .iter()
        .map(|r| r.max_drawdown)
        .fold(0.0_f64, f64::min);
    let total_trades: usize = results.iter().map(|r| r.total_trades).sum();

    vec![
        SummaryMetric::new("组合总收益率", avg(|r| r.return_rate), MetricKind::Percent),
        SummaryMetric::new("组合年化收益率", avg(|r| r.annual_return), MetricKind::Percent),
        SummaryMetric::new("组合最大回撤", worst_drawdown, MetricKind::Percent),
        SummaryMetric::new("平均夏普比率", avg(|r| r.sharpe_ratio), MetricKind::Decimal),
        SummaryMetric::count("总交易次数", total_trades),
        SummaryMetric::new("平均胜率", avg(|r| r.win_rate), MetricKind::Percent),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::{EquityPoint, TradeSide};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> EquitySeries {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        EquitySeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| EquityPoint {
                    date: start + chrono::Duration::days(i as i64),
                    close: 10.0,
                    value: *v,
                })
                .collect(),
        )
        .unwrap()
    }

    fn trade(side: TradeSide, pnl: f64) -> Trade {
        Trade {
            date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            side,
            price: 10.0,
            size: 100,
            pnl,
        }
    }

    #[test]
    fn return_rate_and_drawdown() {
        let r = SymbolResult::compute(
            "600519",
            "贵州茅台",
            &series(&[100_000.0, 110_000.0, 99_000.0, 120_000.0]),
            vec![],
            0.03,
        );
        assert_relative_eq!(r.return_rate, 0.2, epsilon = 1e-12);
        assert_relative_eq!(r.max_drawdown, -0.1, epsilon = 1e-12);
    }

    #[test]
    fn flat_curve_has_zero_sharpe_and_drawdown() {
        let r = SymbolResult::compute("X", "X", &series(&[100.0, 100.0, 100.0]), vec![], 0.0);
        assert_eq!(r.sharpe_ratio, 0.0);
        assert_eq!(r.max_drawdown, 0.0);
        assert_eq!(r.return_rate, 0.0);
    }

    #[test]
    fn trade_stats_count_sells_only() {
        let trades = vec![
            trade(TradeSide::Buy, 0.0),
            trade(TradeSide::Sell, 50.0),
            trade(TradeSide::Buy, 0.0),
            trade(TradeSide::Sell, -20.0),
            trade(TradeSide::Sell, 0.0),
        ];
        let r = SymbolResult::compute("X", "X", &series(&[100.0, 101.0]), trades, 0.0);
        assert_eq!(r.total_trades, 3);
        assert_relative_eq!(r.win_rate, 1.0 / 3.0);
        assert_relative_eq!(r.avg_win, 50.0);
        assert_relative_eq!(r.avg_loss, -10.0);
        assert_eq!(r.trades.len(), 5);
    }

    #[test]
    fn empty_series_is_all_zero() {
        let r = SymbolResult::compute("X", "X", &EquitySeries::default(), vec![], 0.03);
        assert_eq!(r.return_rate, 0.0);
        assert_eq!(r.annual_return, 0.0);
        assert_eq!(r.win_rate, 0.0);
    }

    #[test]
    fn sharpe_positive_for_rising_noisy_curve() {
        let r = SymbolResult::compute(
            "X",
            "X",
            &series(&[100.0, 102.0, 101.0, 104.0, 103.5, 107.0]),
            vec![],
            0.0,
        );
        assert!(r.sharpe_ratio > 0.0);
    }

    #[test]
    fn summary_aggregates() {
        let a = SymbolResult::compute("A", "A", &series(&[100.0, 110.0]), vec![trade(TradeSide::Sell, 5.0)], 0.0);
        let b = SymbolResult::compute(
            "B",
            "B",
            &series(&[100.0, 80.0, 90.0]),
            vec![trade(TradeSide::Sell, -5.0), trade(TradeSide::Sell, 3.0)],
            0.0,
        );
        let summary = portfolio_summary([&a, &b]);
        let names: Vec<_> = summary.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["组合总收益率", "组合年化收益率", "组合最大回撤", "平均夏普比率", "总交易次数", "平均胜率"]
        );
        assert_relative_eq!(summary[0].value, (0.1 + -0.1) / 2.0, epsilon = 1e-12);
        assert_relative_eq!(summary[2].value, -0.2, epsilon = 1e-12);
        assert_eq!(summary[4].value, 3.0);
        assert_eq!(summary[4].kind, MetricKind::Count);
        assert!(!summary[4].is_percentage());
        assert_relative_eq!(summary[5].value, (1.0 + 0.5) / 2.0);
    }

    #[test]
    fn metric_text_follows_kind() {
        assert_eq!(SummaryMetric::count("总交易次数", 2).text(), "2");
        assert_eq!(SummaryMetric::count("总交易次数", 0).text(), "0");
        assert_eq!(SummaryMetric::new("平均夏普比率", 1.234, MetricKind::Decimal).text(), "1.23");
        assert_eq!(SummaryMetric::new("平均胜率", 0.5, MetricKind::Percent).text(), "50.00%");
    }
}
