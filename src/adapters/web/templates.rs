//! HTML templates using Askama, and the view models they render.

use askama::Template;

use crate::domain::collector::{BacktestForm, FIELD_CASH};
use crate::domain::form::{ControlKind, ParamControl, StrategySection};

#[derive(Debug, Clone, PartialEq)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// One `<input>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlView {
    pub field: String,
    pub label: String,
    pub help: String,
    pub input_type: &'static str,
    pub min: String,
    pub max: String,
    pub step: String,
    pub value: String,
}

impl ControlView {
    pub fn from_control(control: &ParamControl, field: String) -> Self {
        let (input_type, min, max, step) = match &control.kind {
            ControlKind::Float { min, max, step } => {
                ("number", min.to_string(), max.to_string(), step.to_string())
            }
            ControlKind::Int { min, max, step } => {
                ("number", min.to_string(), max.to_string(), step.to_string())
            }
            ControlKind::Text => ("text", String::new(), String::new(), String::new()),
        };
        Self {
            field,
            label: control.label.clone(),
            help: control.help.clone(),
            input_type,
            min,
            max,
            step,
            value: control.value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionView {
    pub strategy_code: String,
    pub description: String,
    pub controls: Vec<ControlView>,
    pub notices: Vec<String>,
}

impl SectionView {
    pub fn from_section(section: &StrategySection) -> Self {
        Self {
            strategy_code: section.strategy_code.clone(),
            description: section.description.clone(),
            controls: section
                .controls
                .iter()
                .map(|c| ControlView::from_control(c, c.field_name()))
                .collect(),
            notices: section.notices.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub pools: Vec<OptionView>,
    pub strategies: Vec<OptionView>,
    pub start_date: String,
    pub end_date: String,
    pub cash: ControlView,
    /// Notices not tied to the parameter section.
    pub notices: Vec<String>,
}

impl FormView {
    pub fn from_form(form: &BacktestForm, notices: &[String]) -> Self {
        Self {
            pools: form
                .pools
                .iter()
                .map(|p| OptionView {
                    value: p.name.clone(),
                    label: format!("{} ({}只)", p.name, p.count),
                    selected: p.name == form.selected_pool,
                })
                .collect(),
            strategies: form
                .strategies
                .iter()
                .map(|s| OptionView {
                    value: s.code.clone(),
                    label: s.display_name.clone(),
                    selected: s.code == form.section.strategy_code,
                })
                .collect(),
            start_date: form.start_date.format("%Y-%m-%d").to_string(),
            end_date: form.end_date.format("%Y-%m-%d").to_string(),
            cash: ControlView::from_control(&form.cash, FIELD_CASH.to_string()),
            notices: notices
                .iter()
                .filter(|n| !form.section.notices.contains(n))
                .cloned()
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "backtest_page.html")]
pub struct BacktestPageTemplate<'a> {
    pub title: &'a str,
    pub form: &'a FormView,
    pub section: &'a SectionView,
}

#[derive(Template)]
#[template(path = "backtest_form.html")]
pub struct BacktestFormTemplate<'a> {
    pub form: &'a FormView,
    pub section: &'a SectionView,
}

#[derive(Template)]
#[template(path = "param_section.html")]
pub struct ParamSectionTemplate<'a> {
    pub section: &'a SectionView,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}

#[derive(Template)]
#[template(path = "error_page.html")]
pub struct ErrorPageTemplate<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub status: u16,
}
