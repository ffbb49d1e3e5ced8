//! Backtest configuration collector.
//!
//! Composes pool, date range, initial cash and the strategy parameter section
//! into one [`BacktestRequest`]. The payload is only marked submitted when the
//! submit action is present and every control accepted its input. Date order
//! is not checked here; see [`BacktestRequest::validate`].

use chrono::NaiveDate;

use crate::domain::catalog::Catalog;
use crate::domain::error::TrendQuestError;
use crate::domain::form::{ParamControl, ParamValue, StrategySection, build_strategy_section};
use crate::domain::request::{
    BacktestRequest, INITIAL_CASH_DEFAULT, INITIAL_CASH_MAX, INITIAL_CASH_MIN, INITIAL_CASH_STEP,
};
use crate::domain::strategy::{ParameterSpec, ParameterType};

pub const FIELD_POOL: &str = "pool";
pub const FIELD_START: &str = "start_date";
pub const FIELD_END: &str = "end_date";
pub const FIELD_CASH: &str = "initial_cash";
pub const FIELD_STRATEGY: &str = "strategy";
pub const FIELD_SUBMIT: &str = "submit";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw name/value pairs as posted by the form or given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormInput {
    fields: Vec<(String, String)>,
}

impl FormInput {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    /// Last value posted for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_submit(&self) -> bool {
        self.get(FIELD_SUBMIT).is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolOption {
    pub name: String,
    pub description: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOption {
    pub code: String,
    pub display_name: String,
}

/// Everything needed to render the form with its current selections.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestForm {
    pub pools: Vec<PoolOption>,
    pub selected_pool: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cash: ParamControl,
    pub strategies: Vec<StrategyOption>,
    pub section: StrategySection,
}

impl BacktestForm {
    pub fn initial_cash(&self) -> f64 {
        match self.cash.value {
            ParamValue::Int(v) => v as f64,
            ParamValue::Float(v) => v,
            ParamValue::Text(_) => INITIAL_CASH_DEFAULT as f64,
        }
    }

    fn to_request(&self) -> BacktestRequest {
        BacktestRequest {
            pool: self.selected_pool.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            initial_cash: self.initial_cash(),
            strategy_code: self.section.strategy_code.clone(),
            params: self.section.params.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormOutcome {
    pub form: Option<BacktestForm>,
    pub submitted: bool,
    /// Empty when the form could not be assembled.
    pub request: Option<BacktestRequest>,
    pub notices: Vec<String>,
}

impl FormOutcome {
    fn failed(notice: String) -> Self {
        Self {
            form: None,
            submitted: false,
            request: None,
            notices: vec![notice],
        }
    }
}

/// Control for the initial cash amount, built like any other int parameter.
pub fn cash_control() -> Result<ParamControl, TrendQuestError> {
    ParamControl::from_spec(
        "form",
        &ParameterSpec {
            name: FIELD_CASH.into(),
            display_name: "初始资金".into(),
            description: String::new(),
            kind: ParameterType::Int,
            minimum: Some(INITIAL_CASH_MIN as f64),
            maximum: Some(INITIAL_CASH_MAX as f64),
            default: Some(INITIAL_CASH_DEFAULT.to_string()),
            step: Some(INITIAL_CASH_STEP as f64),
        },
    )
}

/// Assemble the form from `input`. Never fails: assembly errors are logged
/// and returned as a notice with no payload.
pub fn collect_backtest_form(catalog: &Catalog, today: NaiveDate, input: &FormInput) -> FormOutcome {
    match assemble(catalog, today, input) {
        Ok((form, mut notices, rejected)) => {
            notices.extend(form.section.notices.iter().cloned());
            let rejected = rejected || form.section.rejected;
            let submitted = input.is_submit() && !rejected;
            if input.is_submit() && rejected {
                tracing::info!("submission held back until rejected inputs are corrected");
            }
            FormOutcome {
                request: Some(form.to_request()),
                form: Some(form),
                submitted,
                notices,
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to assemble backtest form");
            FormOutcome::failed(format!("表单加载失败: {e}"))
        }
    }
}

fn assemble(
    catalog: &Catalog,
    today: NaiveDate,
    input: &FormInput,
) -> Result<(BacktestForm, Vec<String>, bool), TrendQuestError> {
    if catalog.pools.is_empty() {
        return Err(TrendQuestError::PoolNotFound {
            pool: "(no pools configured)".into(),
        });
    }
    let first_strategy = catalog
        .strategies
        .list()
        .first()
        .ok_or_else(|| TrendQuestError::StrategyNotFound {
            code: String::new(),
            available: Vec::new(),
        })?;

    let mut notices = Vec::new();
    let mut rejected = false;

    let pool_names = catalog.pools.names();
    let selected_pool = match input.get(FIELD_POOL).map(str::trim).filter(|p| !p.is_empty()) {
        Some(name) => catalog.pools.get(name)?.name.clone(),
        None => pool_names[0].to_string(),
    };

    let (default_start, default_end) = BacktestRequest::default_window(today);
    let mut date_field = |field: &str, label: &str, default: NaiveDate| -> NaiveDate {
        match input.get(field).map(str::trim).filter(|v| !v.is_empty()) {
            None => default,
            Some(raw) => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
                Ok(d) => d,
                Err(_) => {
                    tracing::warn!(field, value = raw, "date input rejected");
                    notices.push(format!("{label}格式无效: '{raw}' (应为 YYYY-MM-DD)"));
                    rejected = true;
                    default
                }
            },
        }
    };
    let start_date = date_field(FIELD_START, "回测开始日期", default_start);
    let end_date = date_field(FIELD_END, "回测结束日期", default_end);

    let mut cash = cash_control()?;
    if let Some(raw) = input.get(FIELD_CASH) {
        match cash.accept(raw) {
            Ok(v) => cash.value = v,
            Err(e) => {
                tracing::warn!(error = %e, "initial cash rejected");
                notices.push(e.to_string());
                rejected = true;
            }
        }
    }

    let strategy = match input.get(FIELD_STRATEGY).map(str::trim).filter(|s| !s.is_empty()) {
        Some(code) => catalog.strategies.get(code)?,
        None => first_strategy,
    };
    let section = build_strategy_section(strategy, |field| input.get(field));

    let form = BacktestForm {
        pools: catalog
            .pools
            .pools()
            .iter()
            .map(|p| PoolOption {
                name: p.name.clone(),
                description: p.description.clone(),
                count: p.count(),
            })
            .collect(),
        selected_pool,
        start_date,
        end_date,
        cash,
        strategies: catalog
            .strategies
            .list()
            .iter()
            .map(|s| StrategyOption {
                code: s.code.clone(),
                display_name: s.display_name.clone(),
            })
            .collect(),
        section,
    };
    Ok((form, notices, rejected))
}
