//! Symbol allow/deny filtering.

use crate::Config;

/// Decides which symbols may be traded.
///
/// The blacklist always wins. An empty whitelist allows everything that is
/// not blacklisted. Comparison ignores case and surrounding whitespace.
#[derive(Debug, Clone, Default)]
pub struct SymbolFilter {
    whitelist: Vec<String>,
    blacklist: Vec<String>,
}

impl SymbolFilter {
    pub fn new(whitelist: &[String], blacklist: &[String]) -> Self {
        Self {
            whitelist: whitelist.iter().map(|s| normalize(s)).collect(),
            blacklist: blacklist.iter().map(|s| normalize(s)).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.symbol_whitelist, &config.symbol_blacklist)
    }

    pub fn allows(&self, symbol: &str) -> bool {
        let symbol = normalize(symbol);

        if self.blacklist.contains(&symbol) {
            return false;
        }

        self.whitelist.is_empty() || self.whitelist.contains(&symbol)
    }
}

fn normalize(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}
