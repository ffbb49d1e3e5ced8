//! SVG chart rendering: equity curve with trade markers, P&L distribution
//! and the return/drawdown summary.

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::chart::ChartArtifact;
use crate::domain::format::percent;
use crate::domain::metrics::SymbolResult;
use crate::domain::trade::{EquitySeries, Trade, TradeSide};

pub const PNL_BINS: usize = 20;
pub const MARKER_SIZE: f64 = 10.0;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 320.0;
const PADDING: f64 = 50.0;

const PRICE_COLOR: &str = "blue";
const VALUE_COLOR: &str = "green";
const BUY_COLOR: &str = "red";
const SELL_COLOR: &str = "green";
const BAR_COLOR: &str = "#2563eb";
const DRAWDOWN_COLOR: &str = "#ef4444";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Linear map of `[lo, hi]` onto `[out_lo, out_hi]`; a flat domain maps to
/// the middle of the output range.
fn scale(value: f64, lo: f64, hi: f64, out_lo: f64, out_hi: f64) -> f64 {
    if hi > lo {
        out_lo + (value - lo) / (hi - lo) * (out_hi - out_lo)
    } else {
        (out_lo + out_hi) / 2.0
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// `(x, width)` of the hover band around each of the ascending `xs`. A band
/// spans the midpoints to its neighbours; the outer bands reach the plot
/// edges, so bands tile the plot without overlap.
fn hover_bands(xs: &[f64]) -> Vec<(f64, f64)> {
    xs.iter()
        .enumerate()
        .map(|(i, &x)| {
            let left = if i == 0 { PADDING } else { (xs[i - 1] + x) / 2.0 };
            let right = xs.get(i + 1).map_or(WIDTH - PADDING, |next| (x + next) / 2.0);
            (left, right - left)
        })
        .collect()
}

fn open_svg(class: &str, title: &str) -> String {
    format!(
        r#"<svg class="chart {class}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH:.0} {HEIGHT:.0}" width="100%" role="img"><title>{}</title><rect x="0" y="0" width="{WIDTH:.0}" height="{HEIGHT:.0}" fill="white"/>"#,
        escape(title)
    )
}

fn axes(svg: &mut String, right_axis: bool) {
    let bottom = HEIGHT - PADDING;
    let right = WIDTH - PADDING;
    svg.push_str(&format!(
        r##"<line x1="{PADDING:.0}" y1="{PADDING:.0}" x2="{PADDING:.0}" y2="{bottom:.0}" stroke="#9ca3af"/><line x1="{PADDING:.0}" y1="{bottom:.0}" x2="{right:.0}" y2="{bottom:.0}" stroke="#9ca3af"/>"##
    ));
    if right_axis {
        svg.push_str(&format!(
            r##"<line x1="{right:.0}" y1="{PADDING:.0}" x2="{right:.0}" y2="{bottom:.0}" stroke="#9ca3af"/>"##
        ));
    }
}

fn axis_label(svg: &mut String, x: f64, y: f64, anchor: &str, text: &str) {
    svg.push_str(&format!(
        r##"<text x="{x:.1}" y="{y:.1}" font-size="11" text-anchor="{anchor}" fill="#374151">{}</text>"##,
        escape(text)
    ));
}

fn placeholder(svg: &mut String, text: &str) {
    svg.push_str(&format!(
        r##"<text class="empty" x="{:.0}" y="{:.0}" font-size="14" text-anchor="middle" fill="#6b7280">{}</text>"##,
        WIDTH / 2.0,
        HEIGHT / 2.0,
        escape(text)
    ));
}

/// One histogram bucket over `[lower, upper)`; the last bucket also holds
/// its upper edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Fixed-width histogram. No values gives no bins; identical values give a
/// single bin holding all of them.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let Some((min, max)) = bounds(values.iter().copied()) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if max <= min {
        return vec![Bin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            lower: min + i as f64 * width,
            upper: min + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Builds chart artifacts from engine output. Holds the reference time used
/// for default form dates; every chart call is otherwise stateless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visualizer {
    reference: NaiveDateTime,
}

impl Visualizer {
    pub fn new(reference: NaiveDateTime) -> Self {
        Self { reference }
    }

    pub fn reference_time(&self) -> NaiveDateTime {
        self.reference
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference.date()
    }

    /// Price and account-value lines keyed by date, with one marker per
    /// trade: up-triangles for buys, down-triangles for sells.
    pub fn equity_chart(&self, symbol: &str, series: &EquitySeries, trades: &[Trade]) -> ChartArtifact {
        let mut svg = open_svg("equity", &format!("{symbol} 策略回测分析"));
        axes(&mut svg, true);

        let dates = series
            .points()
            .iter()
            .map(|p| p.date)
            .chain(trades.iter().map(|t| t.date));
        let (first, last) = match (dates.clone().min(), dates.max()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                placeholder(&mut svg, "暂无权益数据");
                svg.push_str("</svg>");
                return ChartArtifact::from_svg(svg);
            }
        };
        let span = (last - first).num_days() as f64;
        let x_of = |date: NaiveDate| {
            scale(
                (date - first).num_days() as f64,
                0.0,
                span,
                PADDING,
                WIDTH - PADDING,
            )
        };

        let (price_lo, price_hi) = bounds(
            series
                .points()
                .iter()
                .map(|p| p.close)
                .chain(trades.iter().map(|t| t.price)),
        )
        .unwrap_or((0.0, 1.0));
        let (value_lo, value_hi) =
            bounds(series.points().iter().map(|p| p.value)).unwrap_or((0.0, 1.0));
        let price_y = |v: f64| scale(v, price_lo, price_hi, HEIGHT - PADDING, PADDING);
        let value_y = |v: f64| scale(v, value_lo, value_hi, HEIGHT - PADDING, PADDING);

        axis_label(&mut svg, PADDING - 4.0, PADDING - 8.0, "end", &format!("{price_hi:.2}"));
        axis_label(&mut svg, PADDING - 4.0, HEIGHT - PADDING, "end", &format!("{price_lo:.2}"));
        axis_label(&mut svg, WIDTH - PADDING + 4.0, PADDING - 8.0, "start", &format!("{value_hi:.0}"));
        axis_label(&mut svg, WIDTH - PADDING + 4.0, HEIGHT - PADDING, "start", &format!("{value_lo:.0}"));
        axis_label(&mut svg, PADDING, HEIGHT - PADDING + 16.0, "start", &first.format("%Y-%m-%d").to_string());
        axis_label(&mut svg, WIDTH - PADDING, HEIGHT - PADDING + 16.0, "end", &last.format("%Y-%m-%d").to_string());

        let line = |y_of: &dyn Fn(f64) -> f64, pick: fn(&crate::domain::trade::EquityPoint) -> f64| {
            series
                .points()
                .iter()
                .map(|p| format!("{:.1},{:.1}", x_of(p.date), y_of(pick(p))))
                .collect::<Vec<_>>()
                .join(" ")
        };
        svg.push_str(&format!(
            r#"<polyline class="line price" fill="none" stroke="{PRICE_COLOR}" stroke-width="1" points="{}"><title>价格</title></polyline>"#,
            line(&price_y, |p| p.close)
        ));
        svg.push_str(&format!(
            r#"<polyline class="line value" fill="none" stroke="{VALUE_COLOR}" stroke-width="1" points="{}"><title>账户价值</title></polyline>"#,
            line(&value_y, |p| p.value)
        ));

        // Unified hover: one band per date showing every series.
        let xs: Vec<f64> = series.points().iter().map(|p| x_of(p.date)).collect();
        for (p, (x, band)) in series.points().iter().zip(hover_bands(&xs)) {
            svg.push_str(&format!(
                r#"<g class="hover"><rect x="{x:.1}" y="{PADDING:.0}" width="{band:.1}" height="{:.0}" fill="transparent"/><title>{}
价格: {:.2}
账户价值: {:.2}</title></g>"#,
                HEIGHT - 2.0 * PADDING,
                p.date.format("%Y-%m-%d"),
                p.close,
                p.value
            ));
        }

        let half = MARKER_SIZE / 2.0;
        for t in trades {
            let x = x_of(t.date);
            let y = price_y(t.price);
            let (class, color, path) = match t.side {
                TradeSide::Buy => (
                    "buy",
                    BUY_COLOR,
                    format!(
                        "M{:.1},{:.1} L{:.1},{:.1} L{:.1},{:.1} Z",
                        x,
                        y - half,
                        x + half,
                        y + half,
                        x - half,
                        y + half
                    ),
                ),
                TradeSide::Sell => (
                    "sell",
                    SELL_COLOR,
                    format!(
                        "M{:.1},{:.1} L{:.1},{:.1} L{:.1},{:.1} Z",
                        x,
                        y + half,
                        x + half,
                        y - half,
                        x - half,
                        y - half
                    ),
                ),
            };
            svg.push_str(&format!(
                r#"<path class="marker {class}" d="{path}" fill="{color}"><title>{} {} @ {:.2}</title></path>"#,
                t.side.label(),
                t.date.format("%Y-%m-%d"),
                t.price
            ));
        }

        legend(
            &mut svg,
            &[
                ("价格", PRICE_COLOR),
                ("账户价值", VALUE_COLOR),
                ("买入", BUY_COLOR),
                ("卖出", SELL_COLOR),
            ],
        );
        svg.push_str("</svg>");
        ChartArtifact::from_svg(svg)
    }

    /// Histogram of realized P&L over sell trades only.
    pub fn pnl_distribution(&self, symbol: &str, trades: &[Trade]) -> ChartArtifact {
        let pnls: Vec<f64> = trades.iter().filter(|t| t.is_sell()).map(|t| t.pnl).collect();
        let bins = histogram(&pnls, PNL_BINS);

        let mut svg = open_svg("pnl", &format!("{symbol} 收益分布"));
        axes(&mut svg, false);
        if bins.is_empty() {
            placeholder(&mut svg, "暂无卖出交易");
            svg.push_str("</svg>");
            return ChartArtifact::from_svg(svg);
        }

        let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;
        let plot_height = HEIGHT - 2.0 * PADDING;
        let bar_width = (WIDTH - 2.0 * PADDING) / bins.len() as f64;
        for (i, bin) in bins.iter().enumerate() {
            let h = bin.count as f64 / max_count * plot_height;
            svg.push_str(&format!(
                r#"<rect class="bar" data-count="{}" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{BAR_COLOR}"><title>[{:.2}, {:.2}]: {}</title></rect>"#,
                bin.count,
                PADDING + i as f64 * bar_width + 1.0,
                HEIGHT - PADDING - h,
                (bar_width - 2.0).max(1.0),
                h,
                bin.lower,
                bin.upper,
                bin.count
            ));
        }

        let (lo, hi) = (bins[0].lower, bins[bins.len() - 1].upper);
        axis_label(&mut svg, PADDING, HEIGHT - PADDING + 16.0, "start", &format!("{lo:.2}"));
        axis_label(&mut svg, WIDTH - PADDING, HEIGHT - PADDING + 16.0, "end", &format!("{hi:.2}"));
        axis_label(&mut svg, PADDING - 4.0, PADDING, "end", &format!("{max_count:.0}"));
        svg.push_str("</svg>");
        ChartArtifact::from_svg(svg)
    }

    /// Return-rate bars per symbol with the max drawdown drawn as a line on
    /// a secondary axis.
    pub fn summary_chart<'a>(&self, results: impl IntoIterator<Item = &'a SymbolResult>) -> ChartArtifact {
        let results: Vec<&SymbolResult> = results.into_iter().collect();
        let mut svg = open_svg("summary", "收益与风险分析");
        axes(&mut svg, true);
        if results.is_empty() {
            placeholder(&mut svg, "暂无回测结果");
            svg.push_str("</svg>");
            return ChartArtifact::from_svg(svg);
        }

        let (ret_lo, ret_hi) = bounds(results.iter().map(|r| r.return_rate).chain([0.0])).unwrap_or((0.0, 0.0));
        let (dd_lo, dd_hi) = bounds(results.iter().map(|r| r.max_drawdown).chain([0.0])).unwrap_or((0.0, 0.0));
        let ret_y = |v: f64| scale(v, ret_lo, ret_hi, HEIGHT - PADDING, PADDING);
        let dd_y = |v: f64| scale(v, dd_lo, dd_hi, HEIGHT - PADDING, PADDING);

        let slot = (WIDTH - 2.0 * PADDING) / results.len() as f64;
        let zero = ret_y(0.0);
        let mut line_points = Vec::with_capacity(results.len());
        for (i, r) in results.iter().enumerate() {
            let center = PADDING + (i as f64 + 0.5) * slot;
            let y = ret_y(r.return_rate);
            let (top, height) = if y < zero { (y, zero - y) } else { (zero, y - zero) };
            svg.push_str(&format!(
                r#"<rect class="bar" x="{:.1}" y="{top:.1}" width="{:.1}" height="{height:.1}" fill="{BAR_COLOR}"><title>{} 总收益率 {}</title></rect>"#,
                center - slot * 0.3,
                slot * 0.6,
                escape(&r.symbol),
                percent(r.return_rate)
            ));
            axis_label(&mut svg, center, top - 4.0, "middle", &percent(r.return_rate));
            axis_label(&mut svg, center, HEIGHT - PADDING + 16.0, "middle", &r.symbol);
            line_points.push((center, dd_y(r.max_drawdown), r));
        }

        let polyline: Vec<String> = line_points
            .iter()
            .map(|(x, y, _)| format!("{x:.1},{y:.1}"))
            .collect();
        svg.push_str(&format!(
            r#"<polyline class="line drawdown" fill="none" stroke="{DRAWDOWN_COLOR}" stroke-width="1.5" points="{}"/>"#,
            polyline.join(" ")
        ));
        for (x, y, r) in &line_points {
            svg.push_str(&format!(
                r#"<circle class="point drawdown" cx="{x:.1}" cy="{y:.1}" r="3" fill="{DRAWDOWN_COLOR}"><title>{} 最大回撤 {}</title></circle>"#,
                escape(&r.symbol),
                percent(r.max_drawdown)
            ));
        }

        axis_label(&mut svg, PADDING - 4.0, PADDING, "end", &percent(ret_hi));
        axis_label(&mut svg, PADDING - 4.0, HEIGHT - PADDING, "end", &percent(ret_lo));
        axis_label(&mut svg, WIDTH - PADDING + 4.0, PADDING, "start", &percent(dd_hi));
        axis_label(&mut svg, WIDTH - PADDING + 4.0, HEIGHT - PADDING, "start", &percent(dd_lo));
        legend(&mut svg, &[("总收益率", BAR_COLOR), ("最大回撤", DRAWDOWN_COLOR)]);
        svg.push_str("</svg>");
        ChartArtifact::from_svg(svg)
    }
}

fn legend(svg: &mut String, entries: &[(&str, &str)]) {
    svg.push_str(r#"<g class="legend">"#);
    let mut x = PADDING;
    for (label, color) in entries {
        svg.push_str(&format!(
            r#"<rect x="{x:.0}" y="12" width="10" height="10" fill="{color}"/>"#
        ));
        axis_label(svg, x + 14.0, 21.0, "start", label);
        x += 24.0 + 13.0 * label.chars().count() as f64;
    }
    svg.push_str("</g>");
}
