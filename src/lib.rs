//! tagscan - a single-pass, tag-aware text tokenizer
//!
//! tagscan provides:
//! - Token extraction that skips delimiters and HTML-like tags
//! - Filtering by minimal length and literal or regex ignore rules
//! - Case-folded token frequency counting
//! - Caller-supplied accumulators (modules) folded over accepted tokens

pub mod core;

pub use crate::core::config::{Config, ConfigOverrides, IgnoreRule, IgnoreRuleSpec};
pub use crate::core::error::{ConfigError, ScanError};
pub use crate::core::model::ScanResult;
pub use crate::core::module::{from_fn, try_from_fn, Module, ModuleRegistry};
pub use crate::core::scanner::scan;
