//! Backtest request handed to the external engine.

use chrono::NaiveDate;

use crate::domain::catalog::Catalog;
use crate::domain::error::TrendQuestError;
use crate::domain::form::ParamValues;

pub const INITIAL_CASH_MIN: i64 = 10_000;
pub const INITIAL_CASH_MAX: i64 = 10_000_000;
pub const INITIAL_CASH_DEFAULT: i64 = 100_000;
pub const INITIAL_CASH_STEP: i64 = 10_000;
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    pub pool: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
    pub strategy_code: String,
    pub params: ParamValues,
}

impl BacktestRequest {
    /// Default (start, end) window: one year back from `today`.
    pub fn default_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (today - chrono::Duration::days(DEFAULT_LOOKBACK_DAYS), today)
    }

    /// Checks applied before the request reaches the engine. The form
    /// collector does not run these.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), TrendQuestError> {
        if self.strategy_code.trim().is_empty() {
            return Err(TrendQuestError::invalid_request("no strategy selected"));
        }
        let strategy = catalog.strategies.get(&self.strategy_code)?;
        catalog.pools.get(&self.pool)?;

        if self.start_date >= self.end_date {
            return Err(TrendQuestError::invalid_request(format!(
                "end date {} must be after start date {}",
                self.end_date, self.start_date
            )));
        }
        if !(self.initial_cash > 0.0) {
            return Err(TrendQuestError::invalid_request(
                "initial cash must be positive",
            ));
        }
        if let Some(unknown) = self
            .params
            .keys()
            .find(|name| strategy.parameter(name).is_none())
        {
            return Err(TrendQuestError::invalid_request(format!(
                "parameter '{unknown}' is not declared by strategy {}",
                strategy.code
            )));
        }
        Ok(())
    }

    /// Ordered key/value view used for report headers and exports.
    pub fn describe(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("标的池".to_string(), self.pool.clone()),
            ("回测开始日期".to_string(), self.start_date.format("%Y-%m-%d").to_string()),
            ("回测结束日期".to_string(), self.end_date.format("%Y-%m-%d").to_string()),
            ("初始资金".to_string(), format!("{:.2}", self.initial_cash)),
            ("选择策略".to_string(), self.strategy_code.clone()),
        ];
        rows.extend(
            self.params
                .iter()
                .map(|(name, value)| (name.clone(), value.to_string())),
        );
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::form::ParamValue;
    use crate::domain::pool::{PoolCatalog, StockPool, parse_symbols};
    use crate::domain::strategy::{ParameterSpec, ParameterType, StrategyRegistry, StrategySpec};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn catalog() -> Catalog {
        Catalog {
            pools: PoolCatalog::new(vec![StockPool {
                name: "沪深300".into(),
                description: String::new(),
                symbols: parse_symbols("600519:贵州茅台").unwrap(),
            }]),
            strategies: StrategyRegistry::new(vec![StrategySpec {
                code: "DualMA".into(),
                display_name: "双均线策略".into(),
                description: String::new(),
                parameters: vec![ParameterSpec {
                    name: "fast_period".into(),
                    display_name: "短期均线周期".into(),
                    description: String::new(),
                    kind: ParameterType::Int,
                    minimum: Some(5.0),
                    maximum: Some(60.0),
                    default: Some("20".into()),
                    step: None,
                }],
            }])
            .unwrap(),
        }
    }

    fn request() -> BacktestRequest {
        BacktestRequest {
            pool: "沪深300".into(),
            start_date: date("2024-02-16"),
            end_date: date("2025-02-16"),
            initial_cash: 100_000.0,
            strategy_code: "DualMA".into(),
            params: [("fast_period".to_string(), ParamValue::Int(20))].into(),
        }
    }

    #[test]
    fn default_window_is_one_year() {
        let (start, end) = BacktestRequest::default_window(date("2025-02-16"));
        assert_eq!(start, date("2024-02-17"));
        assert_eq!(end, date("2025-02-16"));
        assert_eq!((end - start).num_days(), 365);
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate(&catalog()).is_ok());
    }

    #[test]
    fn start_after_end_rejected() {
        let r = BacktestRequest {
            start_date: date("2025-03-01"),
            ..request()
        };
        assert!(matches!(
            r.validate(&catalog()),
            Err(TrendQuestError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn equal_dates_rejected() {
        let r = BacktestRequest {
            start_date: date("2025-02-16"),
            ..request()
        };
        assert!(r.validate(&catalog()).is_err());
    }

    #[test]
    fn non_positive_cash_rejected() {
        let r = BacktestRequest {
            initial_cash: 0.0,
            ..request()
        };
        assert!(r.validate(&catalog()).is_err());
    }

    #[test]
    fn undeclared_parameter_rejected() {
        let mut r = request();
        r.params.insert("signal_period".into(), ParamValue::Int(9));
        let err = r.validate(&catalog()).unwrap_err();
        assert!(err.to_string().contains("signal_period"));
    }

    #[test]
    fn unknown_strategy_rejected() {
        let r = BacktestRequest {
            strategy_code: "RSI".into(),
            ..request()
        };
        assert!(matches!(
            r.validate(&catalog()),
            Err(TrendQuestError::StrategyNotFound { .. })
        ));
    }

    #[test]
    fn describe_lists_config_then_params() {
        let rows = request().describe();
        assert_eq!(rows[0], ("标的池".to_string(), "沪深300".to_string()));
        assert_eq!(rows[3].1, "100000.00");
        assert_eq!(rows.last().unwrap(), &("fast_period".to_string(), "20".to_string()));
    }
}
