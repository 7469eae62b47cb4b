//! Core module - the tokenizing scanner and everything around it
//!
//! This module provides:
//! - Scan configuration with defaults-then-override merging
//! - Pluggable accumulators (modules) and the built-in set
//! - The single-pass, tag-aware scanner
//! - The scan result model and its renderers
//! - Input reading for the command line

pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod module;
pub mod render;
pub mod scanner;
