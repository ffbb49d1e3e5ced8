//! Strategy registry and declarative parameter schemas.

use crate::domain::error::TrendQuestError;
use std::collections::BTreeMap;

/// Declared type of a strategy parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    Float,
    Int,
    Text,
}

impl ParameterType {
    /// `float` and `int` are numeric; every other declared type is free text.
    pub fn from_declared(declared: &str) -> Self {
        match declared.trim() {
            "float" => ParameterType::Float,
            "int" => ParameterType::Int,
            _ => ParameterType::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::Float => "float",
            ParameterType::Int => "int",
            ParameterType::Text => "string",
        }
    }
}

/// One entry of a strategy's parameter schema, as loaded from the registry.
///
/// Bounds and default are kept as loaded; [`crate::domain::form`] validates
/// them when it builds the input control.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub kind: ParameterType,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub default: Option<String>,
    pub step: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategySpec {
    pub code: String,
    pub display_name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

impl StrategySpec {
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }
}

/// Read-only map from strategy code to its spec, in registration order.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    strategies: Vec<StrategySpec>,
}

impl StrategyRegistry {
    pub fn new(strategies: Vec<StrategySpec>) -> Result<Self, TrendQuestError> {
        let mut registry = Self::default();
        for spec in strategies {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    fn register(&mut self, spec: StrategySpec) -> Result<(), TrendQuestError> {
        if self.strategies.iter().any(|s| s.code == spec.code) {
            return Err(TrendQuestError::ConfigInvalid {
                section: "strategies".into(),
                key: "codes".into(),
                reason: format!("duplicate strategy code '{}'", spec.code),
            });
        }
        tracing::debug!(code = %spec.code, name = %spec.display_name, "registered strategy");
        self.strategies.push(spec);
        Ok(())
    }

    /// Look up a strategy by code, falling back to its display name.
    pub fn get(&self, code_or_name: &str) -> Result<&StrategySpec, TrendQuestError> {
        self.strategies
            .iter()
            .find(|s| s.code == code_or_name)
            .or_else(|| self.strategies.iter().find(|s| s.display_name == code_or_name))
            .ok_or_else(|| TrendQuestError::StrategyNotFound {
                code: code_or_name.to_string(),
                available: self
                    .strategies
                    .iter()
                    .map(|s| format!("{} ({})", s.display_name, s.code))
                    .collect(),
            })
    }

    pub fn list(&self) -> &[StrategySpec] {
        &self.strategies
    }

    /// Display name -> strategy code.
    pub fn display_names(&self) -> BTreeMap<&str, &str> {
        self.strategies
            .iter()
            .map(|s| (s.display_name.as_str(), s.code.as_str()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_param(name: &str, min: f64, max: f64, default: &str) -> ParameterSpec {
        ParameterSpec {
            name: name.into(),
            display_name: name.into(),
            description: String::new(),
            kind: ParameterType::Int,
            minimum: Some(min),
            maximum: Some(max),
            default: Some(default.into()),
            step: None,
        }
    }

    fn registry() -> StrategyRegistry {
        StrategyRegistry::new(vec![
            StrategySpec {
                code: "DualMA".into(),
                display_name: "双均线策略".into(),
                description: "使用快慢双均线进行交易".into(),
                parameters: vec![
                    int_param("fast_period", 5.0, 60.0, "20"),
                    int_param("slow_period", 20.0, 250.0, "60"),
                ],
            },
            StrategySpec {
                code: "MACD".into(),
                display_name: "MACD策略".into(),
                description: "使用MACD指标进行交易".into(),
                parameters: vec![],
            },
        ])
        .unwrap()
    }

    #[test]
    fn declared_types_map_to_variants() {
        assert_eq!(ParameterType::from_declared("float"), ParameterType::Float);
        assert_eq!(ParameterType::from_declared("int"), ParameterType::Int);
        assert_eq!(ParameterType::from_declared("string"), ParameterType::Text);
        assert_eq!(ParameterType::from_declared("bool"), ParameterType::Text);
    }

    #[test]
    fn get_by_code_and_display_name() {
        let r = registry();
        assert_eq!(r.get("DualMA").unwrap().display_name, "双均线策略");
        assert_eq!(r.get("MACD策略").unwrap().code, "MACD");
    }

    #[test]
    fn get_unknown_lists_available() {
        let r = registry();
        match r.get("Nonexistent") {
            Err(TrendQuestError::StrategyNotFound { code, available }) => {
                assert_eq!(code, "Nonexistent");
                assert_eq!(available, vec!["双均线策略 (DualMA)", "MACD策略 (MACD)"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn duplicate_code_rejected() {
        let spec = registry().get("MACD").unwrap().clone();
        assert!(StrategyRegistry::new(vec![spec.clone(), spec]).is_err());
    }

    #[test]
    fn list_keeps_registration_order() {
        let codes: Vec<_> = registry().list().iter().map(|s| s.code.clone()).collect();
        assert_eq!(codes, vec!["DualMA", "MACD"]);
    }

    #[test]
    fn display_names_map_to_codes() {
        let r = registry();
        let names = r.display_names();
        assert_eq!(names.get("双均线策略"), Some(&"DualMA"));
        assert_eq!(names.get("MACD策略"), Some(&"MACD"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn parameter_names_in_order() {
        let r = registry();
        let names: Vec<_> = r.get("DualMA").unwrap().parameter_names().collect();
        assert_eq!(names, vec!["fast_period", "slow_period"]);
    }
}
