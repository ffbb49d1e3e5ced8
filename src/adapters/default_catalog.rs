//! Built-in pools and strategies, used when the configuration file does not
//! declare its own `[pools]` or `[strategies]` sections.

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::catalog::Catalog;
use crate::domain::error::TrendQuestError;
use crate::ports::config_port::ConfigPort;

pub const BUILTIN_CATALOG: &str = r#"
[pools]
names = 沪深300, 中证500

[pool.沪深300]
description = 沪深300指数成分股
symbols = 600519:贵州茅台:食品饮料, 601318:中国平安:金融保险

[pool.中证500]
description = 中证500指数成分股
symbols = 000661:长春高新:医药生物, 002475:立讯精密:电子

[strategies]
codes = DualMA, MACD

[strategy.DualMA]
name = 双均线策略
description = 使用快慢双均线进行交易
params = fast_period, slow_period, position_size

[strategy.DualMA.fast_period]
display_name = 短期均线周期
type = int
min = 5
max = 60
default = 20
description = 快速移动平均线的周期

[strategy.DualMA.slow_period]
display_name = 长期均线周期
type = int
min = 20
max = 250
default = 60
description = 慢速移动平均线的周期

[strategy.DualMA.position_size]
display_name = 仓位比例
type = float
min = 0.01
max = 1.0
default = 0.1
step = 0.01
description = 每次开仓占可用资金的比例

[strategy.MACD]
name = MACD策略
description = 使用MACD指标进行交易
params = fast_period, slow_period, signal_period, position_size

[strategy.MACD.fast_period]
display_name = 快线周期
type = int
min = 5
max = 50
default = 12
description = 快速EMA的周期

[strategy.MACD.slow_period]
display_name = 慢线周期
type = int
min = 10
max = 100
default = 26
description = 慢速EMA的周期

[strategy.MACD.signal_period]
display_name = 信号线周期
type = int
min = 3
max = 30
default = 9
description = 信号线EMA的周期

[strategy.MACD.position_size]
display_name = 仓位比例
type = float
min = 0.01
max = 1.0
default = 0.1
step = 0.01
description = 每次开仓占可用资金的比例
"#;

pub fn builtin_config() -> Result<FileConfigAdapter, TrendQuestError> {
    FileConfigAdapter::from_string(BUILTIN_CATALOG)
}

/// Load the catalog from `config`, falling back to the built-in sections.
pub fn load_catalog(config: &dyn ConfigPort) -> Result<Catalog, TrendQuestError> {
    Catalog::load(config, &builtin_config()?)
}
