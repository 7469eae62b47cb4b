//! tagscan - count case-folded tokens in text and markup
//!
//! tagscan provides:
//! - Tag-aware tokenizing of files, stdin or inline text
//! - Length and ignore-list filtering
//! - Built-in accumulator modules
//! - Unified output format (json/jsonl/md/table)

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run(cli)
}
