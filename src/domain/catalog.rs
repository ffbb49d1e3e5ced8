//! Load-once, read-only configuration object: stock pools and strategies.

use crate::domain::error::TrendQuestError;
use crate::domain::pool::{PoolCatalog, StockPool, parse_symbols};
use crate::domain::strategy::{ParameterSpec, ParameterType, StrategyRegistry, StrategySpec};
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub pools: PoolCatalog,
    pub strategies: StrategyRegistry,
}

impl Catalog {
    /// Build the catalog from `config`, taking pools and strategies from
    /// `builtin` when `config` does not declare them.
    pub fn load(config: &dyn ConfigPort, builtin: &dyn ConfigPort) -> Result<Self, TrendQuestError> {
        let pools = match load_pools(config)? {
            Some(p) => p,
            None => load_pools(builtin)?.unwrap_or_default(),
        };
        let strategies = match load_strategies(config)? {
            Some(s) => s,
            None => load_strategies(builtin)?.unwrap_or_default(),
        };
        tracing::info!(
            pools = pools.pools().len(),
            strategies = strategies.list().len(),
            "catalog loaded"
        );
        Ok(Self { pools, strategies })
    }
}

pub fn load_pools(config: &dyn ConfigPort) -> Result<Option<PoolCatalog>, TrendQuestError> {
    let Some(names) = config.get_list("pools", "names") else {
        return Ok(None);
    };

    let mut pools = Vec::new();
    for name in names {
        let section = format!("pool.{name}");
        let symbols_str =
            config
                .get_string(&section, "symbols")
                .ok_or_else(|| TrendQuestError::ConfigMissing {
                    section: section.clone(),
                    key: "symbols".into(),
                })?;
        let symbols = parse_symbols(&symbols_str).map_err(|reason| {
            TrendQuestError::ConfigInvalid {
                section: section.clone(),
                key: "symbols".into(),
                reason,
            }
        })?;
        pools.push(StockPool {
            description: config.get_string(&section, "description").unwrap_or_default(),
            name,
            symbols,
        });
    }

    Ok(Some(PoolCatalog::new(pools)))
}

pub fn load_strategies(
    config: &dyn ConfigPort,
) -> Result<Option<StrategyRegistry>, TrendQuestError> {
    let Some(codes) = config.get_list("strategies", "codes") else {
        return Ok(None);
    };

    let mut specs = Vec::new();
    for code in codes {
        let section = format!("strategy.{code}");
        let display_name = config
            .get_string(&section, "name")
            .ok_or_else(|| TrendQuestError::ConfigMissing {
                section: section.clone(),
                key: "name".into(),
            })?;
        let parameters = config
            .get_list(&section, "params")
            .unwrap_or_default()
            .into_iter()
            .map(|name| load_parameter(config, &section, name))
            .collect::<Result<Vec<_>, _>>()?;

        specs.push(StrategySpec {
            description: config.get_string(&section, "description").unwrap_or_default(),
            code,
            display_name,
            parameters,
        });
    }

    StrategyRegistry::new(specs).map(Some)
}

/// Parameter entries are loaded leniently: a missing section or bound is
/// kept as `None` and reported when the form builds the control.
fn load_parameter(
    config: &dyn ConfigPort,
    strategy_section: &str,
    name: String,
) -> Result<ParameterSpec, TrendQuestError> {
    let section = format!("{strategy_section}.{name}");
    let number = |key: &str| -> Result<Option<f64>, TrendQuestError> {
        match config.get_string(&section, key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
                TrendQuestError::ConfigInvalid {
                    section: section.clone(),
                    key: key.to_string(),
                    reason: format!("'{raw}' is not a number"),
                }
            }),
        }
    };

    Ok(ParameterSpec {
        display_name: config
            .get_string(&section, "display_name")
            .unwrap_or_else(|| name.clone()),
        description: config.get_string(&section, "description").unwrap_or_default(),
        kind: ParameterType::from_declared(
            &config.get_string(&section, "type").unwrap_or_default(),
        ),
        minimum: number("min")?,
        maximum: number("max")?,
        default: config.get_string(&section, "default"),
        step: number("step")?,
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const CUSTOM: &str = r#"
[pools]
names = 自选, 科技

[pool.自选]
description = 自选股
symbols = 600519:贵州茅台:食品饮料

[pool.科技]
symbols = 002475:立讯精密:电子, 000063

[strategies]
codes = Breakout

[strategy.Breakout]
name = 突破策略
description = 价格突破通道上轨买入
params = window, threshold, label

[strategy.Breakout.window]
display_name = 通道周期
type = int
min = 10
max = 120
default = 20

[strategy.Breakout.threshold]
type = float
min = 0.0
max = 0.1
default = 0.02
step = 0.005
"#;

    fn empty() -> FileConfigAdapter {
        FileConfigAdapter::from_string("").unwrap()
    }

    #[test]
    fn loads_pools_in_declared_order() {
        let config = FileConfigAdapter::from_string(CUSTOM).unwrap();
        let catalog = Catalog::load(&config, &empty()).unwrap();
        assert_eq!(catalog.pools.names(), vec!["自选", "科技"]);
        assert_eq!(catalog.pools.get("自选").unwrap().description, "自选股");
        assert_eq!(catalog.pools.symbols("科技").unwrap()[1].code, "000063");
    }

    #[test]
    fn loads_strategy_schema() {
        let config = FileConfigAdapter::from_string(CUSTOM).unwrap();
        let catalog = Catalog::load(&config, &empty()).unwrap();
        let spec = catalog.strategies.get("Breakout").unwrap();
        assert_eq!(spec.display_name, "突破策略");
        let names: Vec<_> = spec.parameter_names().collect();
        assert_eq!(names, vec!["window", "threshold", "label"]);

        let window = spec.parameter("window").unwrap();
        assert_eq!(window.kind, ParameterType::Int);
        assert_eq!(window.minimum, Some(10.0));
        assert_eq!(window.default.as_deref(), Some("20"));

        let threshold = spec.parameter("threshold").unwrap();
        assert_eq!(threshold.display_name, "threshold");
        assert_eq!(threshold.step, Some(0.005));
    }

    #[test]
    fn parameter_without_section_is_kept_lenient() {
        let config = FileConfigAdapter::from_string(CUSTOM).unwrap();
        let catalog = Catalog::load(&config, &empty()).unwrap();
        let label = catalog.strategies.get("Breakout").unwrap().parameter("label").unwrap();
        assert_eq!(label.kind, ParameterType::Text);
        assert!(label.default.is_none());
    }

    #[test]
    fn falls_back_to_builtin_sections() {
        let config = FileConfigAdapter::from_string("[app]\ntitle = x\n").unwrap();
        let builtin = FileConfigAdapter::from_string(CUSTOM).unwrap();
        let catalog = Catalog::load(&config, &builtin).unwrap();
        assert_eq!(catalog.pools.names().len(), 2);
        assert!(catalog.strategies.get("Breakout").is_ok());
    }

    #[test]
    fn missing_symbols_is_config_error() {
        let config = FileConfigAdapter::from_string("[pools]\nnames = A\n").unwrap();
        assert!(matches!(
            Catalog::load(&config, &empty()),
            Err(TrendQuestError::ConfigMissing { key, .. }) if key == "symbols"
        ));
    }

    #[test]
    fn non_numeric_bound_is_config_error() {
        let ini = "[strategies]\ncodes = X\n[strategy.X]\nname = X\nparams = p\n[strategy.X.p]\ntype = int\nmin = low\n";
        let config = FileConfigAdapter::from_string(ini).unwrap();
        assert!(matches!(
            Catalog::load(&config, &empty()),
            Err(TrendQuestError::ConfigInvalid { key, .. }) if key == "min"
        ));
    }
}
