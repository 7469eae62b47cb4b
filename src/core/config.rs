//! Scan configuration
//!
//! A [`Config`] is built once per call: defaults first, then caller
//! overrides. Overrides come either from the builder methods or from a
//! deserialized [`ConfigOverrides`] (e.g. a JSON config file).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::{ConfigError, RESERVED_MODULE_NAME};
use crate::core::module::{Module, ModuleRegistry};

/// Default token delimiters
pub const DEFAULT_DELIMITERS: &[char] = &[' ', '\n', '\r', '\t', ',', '.'];

/// Default minimal token length (in chars, after case folding)
pub const DEFAULT_MINIMAL_LENGTH: usize = 2;

/// A rule that excludes matching tokens from counting and from modules
#[derive(Debug, Clone)]
pub enum IgnoreRule {
    /// Exact match against the folded token; stored lower-cased
    Literal(String),
    /// Unanchored regex match against the folded token
    Pattern(Regex),
}

impl IgnoreRule {
    pub fn literal(word: &str) -> Self {
        IgnoreRule::Literal(word.to_lowercase())
    }

    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(IgnoreRule::Pattern)
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Test a folded token against this rule
    pub fn matches(&self, token: &str) -> bool {
        match self {
            IgnoreRule::Literal(word) => word == token,
            IgnoreRule::Pattern(re) => re.is_match(token),
        }
    }
}

impl fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreRule::Literal(word) => write!(f, "{}", word),
            IgnoreRule::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Serialized form of an ignore rule: `"word"` or `{ "pattern": "^a.+$" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IgnoreRuleSpec {
    Literal(String),
    Pattern { pattern: String },
}

impl TryFrom<&IgnoreRuleSpec> for IgnoreRule {
    type Error = ConfigError;

    fn try_from(spec: &IgnoreRuleSpec) -> Result<Self, Self::Error> {
        match spec {
            IgnoreRuleSpec::Literal(word) => Ok(IgnoreRule::literal(word)),
            IgnoreRuleSpec::Pattern { pattern } => IgnoreRule::pattern(pattern),
        }
    }
}

/// Partial configuration; every field left out keeps its default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    /// Single-character strings
    pub delimiters: Option<Vec<String>>,
    pub start_position: Option<usize>,
    pub minimal_length: Option<usize>,
    pub ignore_words: Option<Vec<IgnoreRuleSpec>>,
}

impl ConfigOverrides {
    /// Layer `other` on top of `self`; fields set in `other` win
    pub fn overlay(self, other: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            delimiters: other.delimiters.or(self.delimiters),
            start_position: other.start_position.or(self.start_position),
            minimal_length: other.minimal_length.or(self.minimal_length),
            ignore_words: other.ignore_words.or(self.ignore_words),
        }
    }
}

/// Immutable scan configuration
#[derive(Debug)]
pub struct Config {
    pub delimiters: Vec<char>,
    pub start_position: usize,
    pub minimal_length: usize,
    pub ignore_words: Vec<IgnoreRule>,
    pub modules: ModuleRegistry,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delimiters: DEFAULT_DELIMITERS.to_vec(),
            start_position: 0,
            minimal_length: DEFAULT_MINIMAL_LENGTH,
            ignore_words: Vec::new(),
            modules: ModuleRegistry::new(),
        }
    }
}

impl Config {
    /// Defaults merged with `overrides`
    pub fn merged(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(delimiters) = &overrides.delimiters {
            config.delimiters = delimiters
                .iter()
                .map(|d| parse_delimiter(d))
                .collect::<Result<_, _>>()?;
        }
        if let Some(start_position) = overrides.start_position {
            config.start_position = start_position;
        }
        if let Some(minimal_length) = overrides.minimal_length {
            config.minimal_length = minimal_length;
        }
        if let Some(rules) = &overrides.ignore_words {
            config.ignore_words = rules
                .iter()
                .map(IgnoreRule::try_from)
                .collect::<Result<_, _>>()?;
        }

        Ok(config)
    }

    pub fn with_delimiters(mut self, delimiters: impl IntoIterator<Item = char>) -> Self {
        self.delimiters = delimiters.into_iter().collect();
        self
    }

    pub fn with_start_position(mut self, start_position: usize) -> Self {
        self.start_position = start_position;
        self
    }

    pub fn with_minimal_length(mut self, minimal_length: usize) -> Self {
        self.minimal_length = minimal_length;
        self
    }

    pub fn with_ignore_rule(mut self, rule: IgnoreRule) -> Self {
        self.ignore_words.push(rule);
        self
    }

    pub fn with_ignore_word(self, word: &str) -> Self {
        self.with_ignore_rule(IgnoreRule::literal(word))
    }

    pub fn with_ignore_pattern(self, pattern: &str) -> Result<Self, ConfigError> {
        Ok(self.with_ignore_rule(IgnoreRule::pattern(pattern)?))
    }

    /// Register a module; invocation order is registration order
    pub fn with_module<M>(mut self, name: impl Into<String>, module: M) -> Self
    where
        M: Module + 'static,
    {
        self.modules.register(name, module);
        self
    }

    /// Check the configuration before a scan starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modules.names().any(|name| name == RESERVED_MODULE_NAME) {
            return Err(ConfigError::ReservedModuleName(
                RESERVED_MODULE_NAME.to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_delimiter(&self, c: char) -> bool {
        self.delimiters.contains(&c)
    }

    /// Whether a folded token matches any ignore rule
    pub fn is_ignored(&self, token: &str) -> bool {
        self.ignore_words.iter().any(|rule| rule.matches(token))
    }
}

/// Accepts exactly one character; escapes like `\t` are resolved by serde/the shell
pub fn parse_delimiter(s: &str) -> Result<char, ConfigError> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidDelimiter(s.to_string())),
    }
}
