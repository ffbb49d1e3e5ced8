//! HTML report rendering and the file-writing `ReportPort` implementation.
//!
//! [`render_report`] is pure: it formats every figure into a view model and
//! substitutes it into the `report.html` Askama template. Writing to disk is
//! left to [`HtmlReportAdapter`].

use std::fs;
use std::path::Path;

use askama::Template;

use crate::domain::error::TrendQuestError;
use crate::domain::format::{color_class, decimal, percent};
use crate::domain::metrics::SymbolResult;
use crate::domain::report::ReportInput;
use crate::domain::trade::{Trade, TradeSide};
use crate::ports::report_port::ReportPort;

const NO_CLASS: &str = "";

/// A formatted figure and the CSS class it is shown with.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCell {
    pub name: String,
    pub text: String,
    pub class: &'static str,
}

impl MetricCell {
    fn new(name: &str, text: String, class: &'static str) -> Self {
        Self {
            name: name.to_string(),
            text,
            class,
        }
    }

    fn signed_percent(name: &str, value: f64) -> Self {
        Self::new(name, percent(value), color_class(value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRow {
    pub date: String,
    pub label: &'static str,
    pub price: String,
    pub size: String,
    pub pnl: String,
    pub pnl_class: &'static str,
}

impl TradeRow {
    pub fn from_trade(trade: &Trade) -> Self {
        let (pnl, pnl_class) = match trade.side {
            TradeSide::Sell => (decimal(trade.pnl), color_class(trade.pnl)),
            TradeSide::Buy => ("-".to_string(), NO_CLASS),
        };
        Self {
            date: trade.date.format("%Y-%m-%d").to_string(),
            label: trade.side.label(),
            price: decimal(trade.price),
            size: trade.size.to_string(),
            pnl,
            pnl_class,
        }
    }

    /// Plain-text form of the row, cells separated by `" | "`.
    pub fn cells(&self) -> String {
        [
            self.date.as_str(),
            self.label,
            self.price.as_str(),
            self.size.as_str(),
            self.pnl.as_str(),
        ]
        .join(" | ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSection {
    pub symbol: String,
    pub name: String,
    pub metrics: Vec<MetricCell>,
    pub trades: Vec<TradeRow>,
    pub chart: Option<String>,
    pub distribution: Option<String>,
}

impl SymbolSection {
    fn metrics(result: &SymbolResult) -> Vec<MetricCell> {
        vec![
            MetricCell::signed_percent("总收益率", result.return_rate),
            MetricCell::signed_percent("年化收益率", result.annual_return),
            MetricCell::new("最大回撤", percent(result.max_drawdown), "negative"),
            MetricCell::new("夏普比率", decimal(result.sharpe_ratio), NO_CLASS),
            MetricCell::new("交易次数", result.total_trades.to_string(), NO_CLASS),
            MetricCell::signed_percent("胜率", result.win_rate),
            MetricCell::new("平均盈利", decimal(result.avg_win), color_class(result.avg_win)),
            MetricCell::new("平均亏损", decimal(result.avg_loss), NO_CLASS),
        ]
    }
}

/// Fully formatted report content.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub title: String,
    pub generated_at: String,
    pub config: Vec<(String, String)>,
    pub summary: Vec<MetricCell>,
    pub summary_chart: Option<String>,
    pub symbols: Vec<SymbolSection>,
    /// Form fields re-posted by the CSV download button. No button when
    /// empty.
    pub download: Vec<(String, String)>,
}

impl ReportView {
    pub fn from_input(input: &ReportInput) -> Self {
        let summary = input
            .summary
            .iter()
            .map(|m| {
                let class = if m.is_percentage() {
                    color_class(m.value)
                } else {
                    NO_CLASS
                };
                MetricCell::new(&m.name, m.text(), class)
            })
            .collect();

        let symbols = input
            .results
            .iter()
            .map(|(symbol, result)| SymbolSection {
                symbol: symbol.clone(),
                name: result.name.clone(),
                metrics: SymbolSection::metrics(result),
                trades: result.trades.iter().map(TradeRow::from_trade).collect(),
                chart: input.charts.get(symbol).map(|c| c.as_svg().to_string()),
                distribution: input
                    .distributions
                    .get(symbol)
                    .map(|c| c.as_svg().to_string()),
            })
            .collect();

        Self {
            title: input.title.clone(),
            generated_at: input.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            config: input.config.clone(),
            summary,
            summary_chart: input.summary_chart.as_ref().map(|c| c.as_svg().to_string()),
            symbols,
            download: Vec::new(),
        }
    }

    pub fn with_download(mut self, fields: Vec<(String, String)>) -> Self {
        self.download = fields;
        self
    }
}

/// Standalone document.
#[derive(Template)]
#[template(path = "report.html")]
pub struct ReportTemplate<'a> {
    pub report: &'a ReportView,
}

/// Report body only, for embedding in a page.
#[derive(Template)]
#[template(path = "report_body.html")]
pub struct ReportFragment<'a> {
    pub report: &'a ReportView,
}

pub fn render_report(input: &ReportInput) -> Result<String, TrendQuestError> {
    let view = ReportView::from_input(input);
    Ok(ReportTemplate { report: &view }.render()?)
}

pub struct HtmlReportAdapter;

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(&self, report: &ReportInput, output_path: &str) -> Result<(), TrendQuestError> {
        let html = render_report(report)?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, html)?;
        tracing::info!(path = %path.display(), "report written");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::ChartArtifact;
    use crate::domain::metrics::{MetricKind, SummaryMetric};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sell() -> Trade {
        Trade {
            date: date("2025-01-10"),
            side: TradeSide::Sell,
            price: 10.5,
            size: 100,
            pnl: 25.333,
        }
    }

    fn buy() -> Trade {
        Trade {
            date: date("2025-01-02"),
            side: TradeSide::Buy,
            price: 10.0,
            size: 100,
            pnl: 0.0,
        }
    }

    fn result() -> SymbolResult {
        SymbolResult {
            symbol: "600519".into(),
            name: "贵州茅台".into(),
            return_rate: 0.1234,
            annual_return: 0.0,
            max_drawdown: -0.05,
            sharpe_ratio: 1.234,
            total_trades: 1,
            win_rate: 1.0,
            avg_win: 25.333,
            avg_loss: 0.0,
            trades: vec![buy(), sell()],
        }
    }

    fn input() -> ReportInput {
        ReportInput {
            title: "策略回测报告".into(),
            generated_at: date("2025-02-16").and_hms_opt(12, 28, 46).unwrap(),
            config: vec![("标的池".into(), "沪深300".into())],
            summary: vec![
                SummaryMetric::new("组合总收益率", 0.0, MetricKind::Percent),
                SummaryMetric::new("平均夏普比率", 1.234, MetricKind::Decimal),
                SummaryMetric::count("总交易次数", 2),
            ],
            results: BTreeMap::from([("600519".to_string(), result())]),
            charts: BTreeMap::from([(
                "600519".to_string(),
                ChartArtifact::from_svg("<svg class=\"chart equity\"></svg>".into()),
            )]),
            distributions: BTreeMap::new(),
            summary_chart: None,
        }
    }

    #[test]
    fn sell_row_formats_exactly() {
        let row = TradeRow::from_trade(&sell());
        assert_eq!(row.cells(), "2025-01-10 | 卖出 | 10.50 | 100 | 25.33");
        assert_eq!(row.pnl_class, "positive");
    }

    #[test]
    fn buy_row_shows_dash() {
        let row = TradeRow::from_trade(&buy());
        assert_eq!(row.pnl, "-");
        assert_eq!(row.label, "买入");
    }

    #[test]
    fn zero_percentage_summary_is_negative() {
        let view = ReportView::from_input(&input());
        assert_eq!(view.summary[0].text, "0.00%");
        assert_eq!(view.summary[0].class, "negative");
        assert_eq!(view.summary[1].text, "1.23");
        assert_eq!(view.summary[1].class, "");
    }

    #[test]
    fn drawdown_always_negative_and_sharpe_uncolored() {
        let mut r = result();
        r.max_drawdown = 0.0;
        let metrics = SymbolSection::metrics(&r);
        assert_eq!(metrics[2].class, "negative");
        assert_eq!(metrics[3].text, "1.23");
        assert_eq!(metrics[3].class, "");
        assert_eq!(metrics[0].text, "12.34%");
        assert_eq!(metrics[0].class, "positive");
    }

    #[test]
    fn trade_count_renders_as_integer() {
        let view = ReportView::from_input(&input());
        assert_eq!(view.summary[2].text, "2");
        let html = render_report(&input()).unwrap();
        assert!(html.contains("<td class=\"\">2</td>"));
        assert!(!html.contains(">2.00<"));
    }

    #[test]
    fn symbol_metrics_include_average_win_and_loss() {
        let mut r = result();
        r.avg_loss = -12.5;
        let metrics = SymbolSection::metrics(&r);
        let names: Vec<_> = metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(&names[6..], &["平均盈利", "平均亏损"]);
        assert_eq!(metrics[6].text, "25.33");
        assert_eq!(metrics[6].class, "positive");
        assert_eq!(metrics[7].text, "-12.50");
        assert_eq!(metrics[7].class, "");

        let html = render_report(&input()).unwrap();
        assert!(html.contains("平均盈利"));
        assert!(html.contains("平均亏损"));
    }

    #[test]
    fn render_embeds_everything() {
        let html = render_report(&input()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("策略回测报告"));
        assert!(html.contains("2025-02-16 12:28:46"));
        assert!(html.contains("沪深300"));
        assert!(html.contains("贵州茅台"));
        assert!(html.contains("<svg class=\"chart equity\"></svg>"));
        assert!(html.contains("<td class=\"negative\">0.00%</td>"));
        assert!(html.contains("<td class=\"positive\">25.33</td>"));
    }

    #[test]
    fn fragment_has_no_document_shell() {
        let view = ReportView::from_input(&input());
        let html = ReportFragment { report: &view }.render().unwrap();
        assert!(!html.contains("<html"));
        assert!(html.contains("report-content"));
        assert!(!html.contains("/backtest/download"));
    }

    #[test]
    fn download_button_reposts_fields() {
        let view = ReportView::from_input(&input()).with_download(vec![
            ("strategy".into(), "DualMA".into()),
            ("submit".into(), "1".into()),
        ]);
        let html = ReportFragment { report: &view }.render().unwrap();
        assert!(html.contains("action=\"/backtest/download\""));
        assert!(html.contains("<input type=\"hidden\" name=\"strategy\" value=\"DualMA\">"));
        assert!(html.contains("<input type=\"hidden\" name=\"submit\" value=\"1\">"));
    }

    #[test]
    fn adapter_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("nested/deep/report.html");
        HtmlReportAdapter::new()
            .write(&input(), output_path.to_str().unwrap())
            .unwrap();
        let contents = fs::read_to_string(&output_path).unwrap();
        assert!(contents.contains("卖出"));
    }
}
