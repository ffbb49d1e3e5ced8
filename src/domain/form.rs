//! Parameter form builder.
//!
//! Turns a [`StrategySpec`] into one typed input control per parameter and
//! collects the chosen values into a flat name -> value mapping. Numeric
//! controls reject out-of-range input; nothing is clamped.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::TrendQuestError;
use crate::domain::strategy::{ParameterSpec, ParameterType, StrategySpec};

/// Fraction of the allowed range used as the float step when none is declared.
const DEFAULT_FLOAT_STEP_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

pub type ParamValues = BTreeMap<String, ParamValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    Float { min: f64, max: f64, step: f64 },
    Int { min: i64, max: i64, step: i64 },
    Text,
}

/// A rendered input control and its currently selected value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamControl {
    pub name: String,
    pub label: String,
    pub help: String,
    pub kind: ControlKind,
    pub value: ParamValue,
}

impl ParamControl {
    /// Build the control for one parameter, validating its schema entry.
    pub fn from_spec(strategy: &str, spec: &ParameterSpec) -> Result<Self, TrendQuestError> {
        let schema_err = |reason: String| TrendQuestError::ParameterSchema {
            strategy: strategy.to_string(),
            parameter: spec.name.clone(),
            reason,
        };

        let default = spec
            .default
            .as_deref()
            .ok_or_else(|| schema_err("missing default".into()))?;

        let (kind, value) = match spec.kind {
            ParameterType::Float => {
                let (min, max) = bounds(spec).map_err(schema_err)?;
                let default: f64 = default
                    .trim()
                    .parse()
                    .map_err(|_| schema_err(format!("default '{default}' is not a number")))?;
                if !(min..=max).contains(&default) {
                    return Err(schema_err(format!(
                        "default {default} outside [{min}, {max}]"
                    )));
                }
                let step = spec
                    .step
                    .filter(|s| *s > 0.0)
                    .unwrap_or((max - min) * DEFAULT_FLOAT_STEP_FRACTION);
                (ControlKind::Float { min, max, step }, ParamValue::Float(default))
            }
            ParameterType::Int => {
                let (min, max) = bounds(spec).map_err(schema_err)?;
                if min.fract() != 0.0 || max.fract() != 0.0 {
                    return Err(schema_err(format!("bounds [{min}, {max}] are not integers")));
                }
                let default: i64 = default
                    .trim()
                    .parse()
                    .map_err(|_| schema_err(format!("default '{default}' is not an integer")))?;
                let (min, max) = (min as i64, max as i64);
                if !(min..=max).contains(&default) {
                    return Err(schema_err(format!(
                        "default {default} outside [{min}, {max}]"
                    )));
                }
                let step = spec
                    .step
                    .map(|s| s.round() as i64)
                    .filter(|s| *s > 0)
                    .unwrap_or(1);
                (ControlKind::Int { min, max, step }, ParamValue::Int(default))
            }
            ParameterType::Text => (ControlKind::Text, ParamValue::Text(default.to_string())),
        };

        Ok(Self {
            name: spec.name.clone(),
            label: spec.display_name.clone(),
            help: spec.description.clone(),
            kind,
            value,
        })
    }

    /// Parse raw input for this control. Out-of-range numbers are rejected.
    pub fn accept(&self, raw: &str) -> Result<ParamValue, TrendQuestError> {
        let reject = |reason: String| TrendQuestError::RejectedInput {
            field: self.name.clone(),
            value: raw.to_string(),
            reason,
        };
        let trimmed = raw.trim();

        match &self.kind {
            ControlKind::Float { min, max, .. } => {
                let v: f64 = trimmed
                    .parse()
                    .map_err(|_| reject("not a number".into()))?;
                if !v.is_finite() || v < *min || v > *max {
                    return Err(reject(format!("must be within [{min}, {max}]")));
                }
                Ok(ParamValue::Float(v))
            }
            ControlKind::Int { min, max, .. } => {
                let v: i64 = trimmed
                    .parse()
                    .map_err(|_| reject("not an integer".into()))?;
                if v < *min || v > *max {
                    return Err(reject(format!("must be within [{min}, {max}]")));
                }
                Ok(ParamValue::Int(v))
            }
            ControlKind::Text => Ok(ParamValue::Text(raw.to_string())),
        }
    }

    /// Form field name used for this control.
    pub fn field_name(&self) -> String {
        format!("param.{}", self.name)
    }
}

fn bounds(spec: &ParameterSpec) -> Result<(f64, f64), String> {
    let min = spec.minimum.ok_or("missing minimum")?;
    let max = spec.maximum.ok_or("missing maximum")?;
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(format!("invalid bounds [{min}, {max}]"));
    }
    Ok((min, max))
}

/// Build one control per declared parameter, in schema order.
pub fn build_controls(spec: &StrategySpec) -> Result<Vec<ParamControl>, TrendQuestError> {
    spec.parameters
        .iter()
        .map(|p| ParamControl::from_spec(&spec.code, p))
        .collect()
}

/// The strategy part of the form: chosen strategy, its controls, and the
/// value mapping collected from them.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySection {
    pub strategy_code: String,
    pub description: String,
    pub controls: Vec<ParamControl>,
    pub params: ParamValues,
    pub notices: Vec<String>,
    /// True when some submitted value was refused by its control.
    pub rejected: bool,
}

/// Build the parameter section for `spec`, applying any submitted raw values.
///
/// A broken schema is logged and degrades to an empty mapping alongside the
/// strategy code; this never fails.
pub fn build_strategy_section<'a>(
    spec: &StrategySpec,
    submitted: impl Fn(&str) -> Option<&'a str>,
) -> StrategySection {
    let mut section = StrategySection {
        strategy_code: spec.code.clone(),
        description: spec.description.clone(),
        controls: Vec::new(),
        params: ParamValues::new(),
        notices: Vec::new(),
        rejected: false,
    };

    let controls = match build_controls(spec) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(strategy = %spec.code, error = %e, "failed to load strategy parameters");
            section.notices.push(format!("策略参数加载失败: {e}"));
            return section;
        }
    };

    for mut control in controls {
        if let Some(raw) = submitted(&control.field_name()) {
            match control.accept(raw) {
                Ok(value) => control.value = value,
                Err(e) => {
                    tracing::warn!(strategy = %spec.code, error = %e, "parameter input rejected");
                    section.notices.push(e.to_string());
                    section.rejected = true;
                }
            }
        }
        section
            .params
            .insert(control.name.clone(), control.value.clone());
        section.controls.push(control);
    }

    section
}
