use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ast::Node,
    transform::{ACCESSOR, TransformOutput, Transformer},
};

/// Callback that may replace the transform result.
///
/// Returning `Some` short-circuits the remaining passes.
pub type Hook = Arc<dyn Fn(&Transformer<'_>, &Node) -> Option<TransformOutput> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid symbol name '{name}'")]
    InvalidName { name: String },

    #[error("Symbol '{name}' is configured more than once")]
    DuplicateSymbol { name: String },

    #[error("The {role} symbol '{name}' is not a configured symbol")]
    UnknownSymbol { role: &'static str, name: String },

    #[error("Invalid configuration: {0}")]
    Json(String),
}

/// One recognized symbol. In source it is spelled `$name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolConfig {
    #[serde(rename = "symbol")]
    pub name: String,
    /// Passed to compiled code as its own parameter instead of being read
    /// through the accessor.
    #[serde(default)]
    pub direct: bool,
    /// Accepts a numeric level suffix (`$scope2`).
    #[serde(default)]
    pub level: bool,
}

impl SymbolConfig {
    pub fn new(name: impl Into<String>) -> Self {
        SymbolConfig {
            name: name.into(),
            direct: false,
            level: false,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileConfig {
    pub symbols: Vec<SymbolConfig>,
    /// Container for bare names used as a call callee.
    pub call: String,
    /// Container for every other unresolved bare name.
    pub default: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dollar: Option<String>,
    #[serde(default)]
    pub allow_unknown_dollar: bool,
    #[serde(skip)]
    pub on_before_process: Option<Hook>,
    #[serde(skip)]
    pub on_after_process: Option<Hook>,
}

impl fmt::Debug for CompileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileConfig")
            .field("symbols", &self.symbols)
            .field("call", &self.call)
            .field("default", &self.default)
            .field("dollar", &self.dollar)
            .field("allow_unknown_dollar", &self.allow_unknown_dollar)
            .field("on_before_process", &self.on_before_process.is_some())
            .field("on_after_process", &self.on_after_process.is_some())
            .finish()
    }
}

impl Default for CompileConfig {
    /// `$scope` (with levels) as the default container and `$hooks` as a
    /// direct call container.
    fn default() -> Self {
        CompileConfig::new("scope", "hooks")
            .leveled("scope")
            .direct("hooks")
    }
}

impl CompileConfig {
    /// An empty config; `default` and `call` still have to be added as
    /// symbols before it validates.
    pub fn new(default: impl Into<String>, call: impl Into<String>) -> Self {
        CompileConfig {
            symbols: vec![],
            call: call.into(),
            default: default.into(),
            dollar: None,
            allow_unknown_dollar: false,
            on_before_process: None,
            on_after_process: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))
    }

    pub fn with_symbol(mut self, symbol: SymbolConfig) -> Self {
        self.symbols.push(symbol);
        self
    }

    pub fn symbol(self, name: impl Into<String>) -> Self {
        self.with_symbol(SymbolConfig::new(name))
    }

    pub fn leveled(self, name: impl Into<String>) -> Self {
        self.with_symbol(SymbolConfig {
            level: true,
            ..SymbolConfig::new(name)
        })
    }

    pub fn direct(self, name: impl Into<String>) -> Self {
        self.with_symbol(SymbolConfig {
            direct: true,
            ..SymbolConfig::new(name)
        })
    }

    pub fn dollar(mut self, name: impl Into<String>) -> Self {
        self.dollar = Some(name.into());
        self
    }

    pub fn allow_unknown_dollar(mut self, allow: bool) -> Self {
        self.allow_unknown_dollar = allow;
        self
    }

    pub fn on_before_process<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Transformer<'_>, &Node) -> Option<TransformOutput> + Send + Sync + 'static,
    {
        self.on_before_process = Some(Arc::new(hook));
        self
    }

    pub fn on_after_process<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Transformer<'_>, &Node) -> Option<TransformOutput> + Send + Sync + 'static,
    {
        self.on_after_process = Some(Arc::new(hook));
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if !is_symbol_name(&symbol.name) {
                return Err(ConfigError::InvalidName {
                    name: symbol.name.clone(),
                });
            }
            if !seen.insert(symbol.name.as_str()) {
                return Err(ConfigError::DuplicateSymbol {
                    name: symbol.name.clone(),
                });
            }
        }

        let roles = [
            ("default", Some(&self.default)),
            ("call", Some(&self.call)),
            ("dollar", self.dollar.as_ref()),
        ];
        for (role, name) in roles {
            if let Some(name) = name
                && !seen.contains(name.as_str())
            {
                return Err(ConfigError::UnknownSymbol {
                    role,
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Parameter names of compiled code: the accessor, then one per direct
    /// symbol in configured order.
    pub fn parameters(&self) -> Vec<String> {
        let mut params = vec![ACCESSOR.to_string()];
        params.extend(
            self.symbols
                .iter()
                .filter(|s| s.direct)
                .map(|s| format!("${}", s.name)),
        );
        params
    }

    pub fn direct_symbols(&self) -> impl Iterator<Item = &SymbolConfig> {
        self.symbols.iter().filter(|s| s.direct)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_symbol_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Outcome of matching a `$name` spelling against the configured symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognized {
    /// Configured symbol name.
    pub name: String,
    /// Numeric suffix, only for symbols configured with `level`.
    pub level: Option<String>,
    pub direct: bool,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    direct: bool,
    level: bool,
}

/// Precomputed lookup over [`CompileConfig::symbols`].
#[derive(Debug, Clone)]
pub struct SymbolTable {
    entries: HashMap<String, Entry>,
}

impl SymbolTable {
    pub fn new(config: &CompileConfig) -> Self {
        let entries = config
            .symbols
            .iter()
            .map(|s| {
                (
                    s.name.clone(),
                    Entry {
                        direct: s.direct,
                        level: s.level,
                    },
                )
            })
            .collect();
        SymbolTable { entries }
    }

    /// Matches `$name` or, for leveled symbols, `$name<digits>`.
    pub fn recognize(&self, raw: &str) -> Option<Recognized> {
        let rest = raw.strip_prefix('$')?;

        if let Some(entry) = self.entries.get(rest) {
            return Some(Recognized {
                name: rest.to_string(),
                level: None,
                direct: entry.direct,
            });
        }

        let digits = rest.bytes().rev().take_while(u8::is_ascii_digit).count();
        // Longest name first.
        for split in (rest.len() - digits..rest.len()).rev() {
            let (name, level) = rest.split_at(split);
            if let Some(entry) = self.entries.get(name)
                && entry.level
            {
                return Some(Recognized {
                    name: name.to_string(),
                    level: Some(level.to_string()),
                    direct: entry.direct,
                });
            }
        }
        None
    }

    pub fn is_recognized(&self, raw: &str) -> bool {
        self.recognize(raw).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognize_level_suffix() {
        let config = CompileConfig::new("scope", "hooks")
            .leveled("scope")
            .direct("hooks");
        let table = SymbolTable::new(&config);

        let scope2 = table.recognize("$scope2").unwrap();
        assert_eq!(scope2.name, "scope");
        assert_eq!(scope2.level.as_deref(), Some("2"));
        assert!(!scope2.direct);

        assert!(table.recognize("$hooks").unwrap().direct);
        assert_eq!(table.recognize("$hooks1"), None);
        assert_eq!(table.recognize("scope"), None);
        assert_eq!(table.recognize("$"), None);
    }

    #[test]
    fn test_validate() {
        assert!(CompileConfig::default().validate().is_ok());

        let missing_call = CompileConfig::new("scope", "hooks").symbol("scope");
        assert!(matches!(
            missing_call.validate(),
            Err(ConfigError::UnknownSymbol { role: "call", .. })
        ));

        let bad_name = CompileConfig::new("scope", "scope").symbol("scope").symbol("a-b");
        assert!(matches!(bad_name.validate(), Err(ConfigError::InvalidName { .. })));

        let duplicate = CompileConfig::new("scope", "scope").symbol("scope").direct("scope");
        assert!(matches!(duplicate.validate(), Err(ConfigError::DuplicateSymbol { .. })));
    }
}
