//! Stock pools: named, ordered collections of tradable symbols.
//!
//! Pools are loaded once at startup and never mutated afterwards.

use crate::domain::error::TrendQuestError;

#[derive(Debug, Clone, PartialEq)]
pub struct PoolSymbol {
    pub code: String,
    pub name: String,
    pub industry: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockPool {
    pub name: String,
    pub description: String,
    pub symbols: Vec<PoolSymbol>,
}

impl StockPool {
    pub fn count(&self) -> usize {
        self.symbols.len()
    }

    pub fn symbol(&self, code: &str) -> Option<&PoolSymbol> {
        self.symbols.iter().find(|s| s.code == code)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PoolCatalog {
    pools: Vec<StockPool>,
}

impl PoolCatalog {
    pub fn new(pools: Vec<StockPool>) -> Self {
        Self { pools }
    }

    pub fn names(&self) -> Vec<&str> {
        self.pools.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Result<&StockPool, TrendQuestError> {
        self.pools
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| TrendQuestError::PoolNotFound {
                pool: name.to_string(),
            })
    }

    pub fn symbols(&self, name: &str) -> Result<&[PoolSymbol], TrendQuestError> {
        self.get(name).map(|p| p.symbols.as_slice())
    }

    pub fn pools(&self) -> &[StockPool] {
        &self.pools
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Parse a `code:name:industry` list separated by commas.
///
/// Name and industry are optional; a missing name falls back to the code.
pub fn parse_symbols(input: &str) -> Result<Vec<PoolSymbol>, String> {
    let mut symbols: Vec<PoolSymbol> = Vec::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err("empty token in symbol list".into());
        }
        let mut parts = trimmed.splitn(3, ':').map(str::trim);
        let code = parts.next().unwrap_or_default().to_string();
        if code.is_empty() {
            return Err(format!("missing symbol code in '{trimmed}'"));
        }
        if symbols.iter().any(|s| s.code == code) {
            return Err(format!("duplicate symbol: {code}"));
        }
        let name = parts
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&code)
            .to_string();
        let industry = parts.next().unwrap_or_default().to_string();
        symbols.push(PoolSymbol {
            code,
            name,
            industry,
        });
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_symbols_full() {
        let result = parse_symbols("600519:贵州茅台:食品饮料, 601318:中国平安:金融保险").unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].code, "600519");
        assert_eq!(result[0].name, "贵州茅台");
        assert_eq!(result[1].industry, "金融保险");
    }

    #[test]
    fn parse_symbols_code_only() {
        let result = parse_symbols("000661").unwrap();
        assert_eq!(result[0].name, "000661");
        assert_eq!(result[0].industry, "");
    }

    #[test]
    fn parse_symbols_empty_token() {
        assert!(parse_symbols("600519,,601318").is_err());
    }

    #[test]
    fn parse_symbols_duplicate() {
        let err = parse_symbols("600519,600519").unwrap_err();
        assert!(err.contains("600519"));
    }

    #[test]
    fn catalog_lookup() {
        let catalog = PoolCatalog::new(vec![StockPool {
            name: "沪深300".into(),
            description: "沪深300指数成分股".into(),
            symbols: parse_symbols("600519:贵州茅台:食品饮料").unwrap(),
        }]);
        assert_eq!(catalog.names(), vec!["沪深300"]);
        assert_eq!(catalog.symbols("沪深300").unwrap().len(), 1);
        assert!(matches!(
            catalog.get("中证500"),
            Err(TrendQuestError::PoolNotFound { pool }) if pool == "中证500"
        ));
    }
}
