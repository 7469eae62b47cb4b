//! Error types for configuration and scanning

use thiserror::Error;

/// Name reserved for the token frequency map in a [`ScanResult`](crate::core::model::ScanResult)
pub const RESERVED_MODULE_NAME: &str = "tokens";

/// Errors detected while building or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("module cannot be named `{0}`")]
    ReservedModuleName(String),

    #[error("invalid ignore pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("delimiter must be a single character, got {0:?}")]
    InvalidDelimiter(String),
}

/// Errors returned by [`scan`](crate::core::scanner::scan)
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A module accumulator failed; the scan was aborted at this token
    #[error("module `{name}` failed on token '{token}' at position {position}")]
    Module {
        name: String,
        token: String,
        position: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("value of module `{name}` could not be serialized")]
    ModuleValue {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
