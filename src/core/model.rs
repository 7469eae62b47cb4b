//! Scan result model
//!
//! Serializes to the flat shape `{ "tokens": { ... }, "<module>": value, ... }`.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::core::error::RESERVED_MODULE_NAME;

/// Token ordering for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenOrder {
    /// Alphabetical
    #[default]
    Alpha,
    /// Descending count, ties alphabetical
    Count,
}

impl std::str::FromStr for TokenOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alpha" | "name" => Ok(TokenOrder::Alpha),
            "count" | "freq" => Ok(TokenOrder::Count),
            _ => Err(format!("Unknown sort order: {}", s)),
        }
    }
}

/// Output of one scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    /// Folded token -> occurrence count
    pub tokens: BTreeMap<String, usize>,
    /// Final module values in registration order; `null` if never invoked
    pub modules: Vec<(String, Value)>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one accepted occurrence
    pub fn record(&mut self, token: &str) {
        match self.tokens.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                self.tokens.insert(token.to_string(), 1);
            }
        }
    }

    pub fn count(&self, token: &str) -> usize {
        self.tokens.get(token).copied().unwrap_or(0)
    }

    /// Total accepted occurrences
    pub fn total(&self) -> usize {
        self.tokens.values().sum()
    }

    /// Number of distinct tokens
    pub fn distinct(&self) -> usize {
        self.tokens.len()
    }

    pub fn module(&self, name: &str) -> Option<&Value> {
        self.modules
            .iter()
            .find(|(module, _)| module == name)
            .map(|(_, value)| value)
    }

    /// Tokens in the requested order, limited to `top` entries if given
    pub fn sorted_tokens(&self, order: TokenOrder, top: Option<usize>) -> Vec<(&str, usize)> {
        let mut tokens: Vec<_> = self
            .tokens
            .iter()
            .map(|(token, count)| (token.as_str(), *count))
            .collect();

        if order == TokenOrder::Count {
            // stable sort keeps the alphabetical order among equal counts
            tokens.sort_by_key(|(_, count)| Reverse(*count));
        }
        if let Some(top) = top {
            tokens.truncate(top);
        }
        tokens
    }
}

impl Serialize for ScanResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + self.modules.len()))?;
        map.serialize_entry(RESERVED_MODULE_NAME, &self.tokens)?;
        for (name, value) in &self.modules {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ScanResult {
        let mut result = ScanResult::new();
        for token in ["ab", "abcd", "ab", "dbca", "ab", "aab", "dbca"] {
            result.record(token);
        }
        result
    }

    #[test]
    fn test_record_and_totals() {
        let result = sample();
        assert_eq!(result.count("ab"), 3);
        assert_eq!(result.count("zz"), 0);
        assert_eq!(result.total(), 7);
        assert_eq!(result.distinct(), 4);
    }

    #[test]
    fn test_sorted_by_count_breaks_ties_alphabetically() {
        let result = sample();
        let sorted = result.sorted_tokens(TokenOrder::Count, None);
        assert_eq!(
            sorted,
            vec![("ab", 3), ("dbca", 2), ("aab", 1), ("abcd", 1)]
        );
        assert_eq!(result.sorted_tokens(TokenOrder::Alpha, Some(2)), vec![("aab", 1), ("ab", 3)]);
    }

    #[test]
    fn test_serialized_shape() {
        let mut result = ScanResult::new();
        result.record("word");
        result.modules.push(("custom".to_string(), json!(1)));
        result.modules.push(("unused".to_string(), Value::Null));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({"tokens": {"word": 1}, "custom": 1, "unused": null})
        );
    }

    #[test]
    fn test_order_from_str() {
        assert_eq!("count".parse::<TokenOrder>().unwrap(), TokenOrder::Count);
        assert_eq!("ALPHA".parse::<TokenOrder>().unwrap(), TokenOrder::Alpha);
        assert!("size".parse::<TokenOrder>().is_err());
    }
}
