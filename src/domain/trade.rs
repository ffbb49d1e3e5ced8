//! Engine output records: trades and the equity curve.
//!
//! The external engine hands back loosely typed rows ([`RawTrade`],
//! [`RawEquityRow`]). They are validated here into [`Trade`] and
//! [`EquitySeries`]; a missing or invalid field is a contract violation and
//! fails with [`TrendQuestError::MalformedOutput`].

use chrono::NaiveDate;

use crate::domain::error::TrendQuestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "buy" => Some(TradeSide::Buy),
            "sell" => Some(TradeSide::Sell),
            _ => None,
        }
    }

    /// Localized label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            TradeSide::Buy => "买入",
            TradeSide::Sell => "卖出",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub side: TradeSide,
    pub price: f64,
    pub size: u64,
    /// Realized P&L; only meaningful for sells.
    pub pnl: f64,
}

impl Trade {
    pub fn is_sell(&self) -> bool {
        self.side == TradeSide::Sell
    }
}

/// A trade row as produced by the engine, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTrade {
    pub date: Option<String>,
    pub side: Option<String>,
    pub price: Option<String>,
    pub size: Option<String>,
    pub pnl: Option<String>,
}

fn require<'a>(
    record: &str,
    row: usize,
    field: &str,
    value: &'a Option<String>,
) -> Result<&'a str, TrendQuestError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TrendQuestError::malformed(record, row, format!("missing field '{field}'")))
}

/// Share count. Integral floats such as `100.0` are accepted; anything that
/// does not fit a `u64` is not.
fn parse_size(raw: &str) -> Option<u64> {
    raw.parse::<u64>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|s| s.fract() == 0.0 && *s >= 0.0 && *s < u64::MAX as f64)
                .map(|s| s as u64)
        })
        .filter(|s| *s >= 1)
}

fn parse_date(record: &str, row: usize, raw: &str) -> Result<NaiveDate, TrendQuestError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        TrendQuestError::malformed(record, row, format!("invalid date '{raw}', expected YYYY-MM-DD"))
    })
}

fn parse_number(record: &str, row: usize, field: &str, raw: &str) -> Result<f64, TrendQuestError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TrendQuestError::malformed(record, row, format!("invalid {field} '{raw}'")))
}

impl RawTrade {
    pub fn validate(&self, row: usize) -> Result<Trade, TrendQuestError> {
        const RECORD: &str = "trade";

        let date = parse_date(RECORD, row, require(RECORD, row, "date", &self.date)?)?;
        let side_raw = require(RECORD, row, "type", &self.side)?;
        let side = TradeSide::parse(side_raw).ok_or_else(|| {
            TrendQuestError::malformed(RECORD, row, format!("unknown trade type '{side_raw}'"))
        })?;

        let price = parse_number(RECORD, row, "price", require(RECORD, row, "price", &self.price)?)?;
        if price <= 0.0 {
            return Err(TrendQuestError::malformed(RECORD, row, format!("price {price} must be positive")));
        }

        let size_raw = require(RECORD, row, "size", &self.size)?;
        let size = parse_size(size_raw).ok_or_else(|| {
            TrendQuestError::malformed(RECORD, row, format!("size '{size_raw}' must be a positive integer"))
        })?;

        // Buys carry no realized P&L; sells must report it.
        let pnl = match side {
            TradeSide::Sell => parse_number(RECORD, row, "pnl", require(RECORD, row, "pnl", &self.pnl)?)?,
            TradeSide::Buy => match self.pnl.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                Some(raw) => parse_number(RECORD, row, "pnl", raw)?,
                None => 0.0,
            },
        };

        Ok(Trade {
            date,
            side,
            price,
            size,
            pnl,
        })
    }
}

/// Validate every raw trade row; rows are numbered from 1.
pub fn validate_trades(rows: &[RawTrade]) -> Result<Vec<Trade>, TrendQuestError> {
    rows.iter()
        .enumerate()
        .map(|(i, r)| r.validate(i + 1))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEquityRow {
    pub date: Option<String>,
    pub close: Option<String>,
    pub value: Option<String>,
}

/// Date-indexed series of close price and account value, strictly
/// increasing by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquitySeries {
    points: Vec<EquityPoint>,
}

impl EquitySeries {
    pub fn new(points: Vec<EquityPoint>) -> Result<Self, TrendQuestError> {
        for (i, pair) in points.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(TrendQuestError::malformed(
                    "equity",
                    i + 2,
                    format!(
                        "date {} does not follow {}",
                        pair[1].date, pair[0].date
                    ),
                ));
            }
        }
        Ok(Self { points })
    }

    pub fn from_raw(rows: &[RawEquityRow]) -> Result<Self, TrendQuestError> {
        const RECORD: &str = "equity";

        let points = rows
            .iter()
            .enumerate()
            .map(|(i, r)| -> Result<EquityPoint, TrendQuestError> {
                let row = i + 1;
                Ok(EquityPoint {
                    date: parse_date(RECORD, row, require(RECORD, row, "date", &r.date)?)?,
                    close: parse_number(RECORD, row, "close", require(RECORD, row, "close", &r.close)?)?,
                    value: parse_number(RECORD, row, "value", require(RECORD, row, "value", &r.value)?)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(points)
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&EquityPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&EquityPoint> {
        self.points.last()
    }

    /// Keep only points within `[start, end]`.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .cloned()
                .collect(),
        }
    }
}
