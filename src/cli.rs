//! CLI module - Command-line interface definitions and handlers

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use tagscan::core::config::{Config, ConfigOverrides, IgnoreRuleSpec};
use tagscan::core::input::{
    read_input, EncodingStrategy, InputConfig, InputSource, DEFAULT_MAX_BYTES,
};
use tagscan::core::model::TokenOrder;
use tagscan::core::module::{register_builtin, BUILTIN_MODULES};
use tagscan::core::render::{OutputFormat, RenderConfig, Renderer};
use tagscan::scan;

/// tagscan - count words in text and markup, skipping tags and delimiters.
#[derive(Parser, Debug)]
#[command(name = "tagscan")]
#[command(
    author,
    version,
    about,
    long_about = r#"tagscan scans text in a single pass and counts case-folded tokens.

Tokens are maximal runs of characters between delimiters. Anything between
'<' and the next '>' is treated as markup and skipped. Tokens shorter than
--min-length or matching an ignore rule are dropped.

Configuration is layered: built-in defaults < --config FILE < flags.

Output formats:
- json: the result object {"tokens": {...}, "<module>": value} (default)
- jsonl: one JSON object per token, then one per module
- md: Markdown tables
- table: aligned plain text

Examples:
    tagscan page.html
    tagscan --text "word and another word" -m count
    cat notes.txt | tagscan --min-length 4 --ignore-file stopwords.txt --format table
    tagscan -d '_' --text "_BB_bcd_____QWErty"
"#
)]
pub struct Cli {
    /// Input file ("-" or omitted reads stdin).
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Scan this text instead of reading a file.
    #[arg(long, value_name = "TEXT", conflicts_with = "file")]
    pub text: Option<String>,

    /// Maximum input size in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_BYTES)]
    pub max_bytes: u64,

    /// Fail on invalid UTF-8 instead of replacing it.
    #[arg(long)]
    pub strict_utf8: bool,

    /// JSON config file with delimiters, start_position, minimal_length, ignore_words.
    #[arg(
        long,
        env = "TAGSCAN_CONFIG",
        value_name = "PATH",
        long_help = "JSON config file. Every field is optional:\n\n\
{\n  \"delimiters\": [\" \", \"_\"],\n  \"start_position\": 0,\n  \"minimal_length\": 2,\n  \
\"ignore_words\": [\"the\", {\"pattern\": \"^a.+$\"}]\n}\n\n\
Values given as flags take precedence over the file."
    )]
    pub config: Option<PathBuf>,

    /// Delimiter characters (escapes: \n \r \t \s for space, \\).
    #[arg(short, long, value_name = "CHARS")]
    pub delimiters: Option<String>,

    /// Char offset at which scanning starts.
    #[arg(long, value_name = "N")]
    pub start: Option<usize>,

    /// Minimal token length in chars.
    #[arg(long, value_name = "N")]
    pub min_length: Option<usize>,

    /// Ignore a word (case-insensitive, repeatable).
    #[arg(long = "ignore", value_name = "WORD")]
    pub ignore: Vec<String>,

    /// Ignore tokens matching a regex (repeatable).
    #[arg(long = "ignore-pattern", value_name = "REGEX")]
    pub ignore_patterns: Vec<String>,

    /// Ignore every word listed in a file (one per line, '#' comments).
    #[arg(long, value_name = "PATH")]
    pub ignore_file: Option<PathBuf>,

    /// Run a built-in module, optionally under another name (repeatable).
    #[arg(
        short,
        long = "module",
        value_name = "[NAME=]BUILTIN",
        long_help = "Run a built-in module for every accepted token. Modules run in the\n\
order given and their final values appear in the result under NAME.\n\n\
Built-ins: count, first, last, longest, positions, chars"
    )]
    pub modules: Vec<String>,

    /// Output format (json/jsonl/md/table).
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub format: String,

    /// Token order (alpha/count).
    #[arg(long, default_value = "alpha", value_name = "ORDER")]
    pub sort: String,

    /// Only output the first N tokens.
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long)]
    pub pretty: bool,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,

    /// Quiet mode (errors only on stderr).
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose diagnostics (-v debug, -vv trace every scan step).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.quiet);

    let format: OutputFormat = cli.format.parse().map_err(anyhow::Error::msg)?;
    let order: TokenOrder = cli.sort.parse().map_err(anyhow::Error::msg)?;
    let render_config = RenderConfig {
        format,
        pretty: cli.pretty,
        order,
        top: cli.top,
        color: !cli.no_color && io::stdout().is_terminal(),
    };

    let config = build_config(&cli)?;

    let input_config = InputConfig {
        max_bytes: cli.max_bytes,
        encoding: if cli.strict_utf8 {
            EncodingStrategy::Strict
        } else {
            EncodingStrategy::Lossy
        },
    };
    let source = InputSource::from_args(cli.text.clone(), cli.file.as_deref());
    let input = read_input(&source, &input_config)?;
    if input.lossy {
        log::warn!("Input contained invalid UTF-8; invalid sequences were replaced");
    }

    let result = scan(&input.content, &config)?;

    Renderer::with_config(render_config).render_to(&result, io::stdout().lock())?;
    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    // a logger may already be installed when embedded in tests
    let _ = env_logger::Builder::from_env(env_logger::Env::new().filter_or("TAGSCAN_LOG", level))
        .format_timestamp(None)
        .try_init();
}

/// Defaults < config file < flags, then modules
fn build_config(cli: &Cli) -> Result<Config> {
    let file_overrides = match &cli.config {
        Some(path) => load_overrides(path)?,
        None => ConfigOverrides::default(),
    };

    let overrides = file_overrides.overlay(flag_overrides(cli)?);
    log::debug!("Effective overrides: {:?}", overrides);

    let mut config = Config::merged(&overrides)?;
    for spec in &cli.modules {
        let (name, builtin) = parse_module_spec(spec);
        if !register_builtin(&mut config.modules, name, builtin) {
            bail!(
                "Unknown module: {}. Available: {}",
                builtin,
                BUILTIN_MODULES.join(", ")
            );
        }
    }

    Ok(config)
}

fn load_overrides(path: &Path) -> Result<ConfigOverrides> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file: {:?}", path))
}

fn flag_overrides(cli: &Cli) -> Result<ConfigOverrides> {
    let delimiters = cli
        .delimiters
        .as_deref()
        .map(parse_delimiter_list)
        .transpose()?;

    let mut ignore_words: Vec<IgnoreRuleSpec> = cli
        .ignore
        .iter()
        .cloned()
        .map(IgnoreRuleSpec::Literal)
        .collect();
    ignore_words.extend(
        cli.ignore_patterns
            .iter()
            .map(|pattern| IgnoreRuleSpec::Pattern {
                pattern: pattern.clone(),
            }),
    );
    if let Some(path) = &cli.ignore_file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ignore file: {:?}", path))?;
        ignore_words.extend(parse_ignore_list(&content).map(IgnoreRuleSpec::Literal));
    }

    Ok(ConfigOverrides {
        delimiters,
        start_position: cli.start,
        minimal_length: cli.min_length,
        ignore_words: (!ignore_words.is_empty()).then_some(ignore_words),
    })
}

/// Split a delimiter argument into single-character strings, resolving escapes
fn parse_delimiter_list(s: &str) -> Result<Vec<String>> {
    let mut delimiters = Vec::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        let delimiter = if c == '\\' {
            match chars.next() {
                Some('n') => '\n',
                Some('r') => '\r',
                Some('t') => '\t',
                Some('s') => ' ',
                Some('\\') => '\\',
                Some(other) => bail!("Unknown delimiter escape: \\{}", other),
                None => bail!("Dangling '\\' in delimiters"),
            }
        } else {
            c
        };
        delimiters.push(delimiter.to_string());
    }
    if delimiters.is_empty() {
        bail!("At least one delimiter is required");
    }
    Ok(delimiters)
}

/// Non-empty, non-comment lines of an ignore list
fn parse_ignore_list(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

/// `name=builtin` or just `builtin` (registered under its own name)
fn parse_module_spec(spec: &str) -> (&str, &str) {
    match spec.split_once('=') {
        Some((name, builtin)) => (name.trim(), builtin.trim()),
        None => (spec.trim(), spec.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiter_list() {
        assert_eq!(parse_delimiter_list("_").unwrap(), vec!["_"]);
        assert_eq!(
            parse_delimiter_list(r"\s\n,").unwrap(),
            vec![" ", "\n", ","]
        );
        assert_eq!(parse_delimiter_list(r"\\").unwrap(), vec!["\\"]);
        assert!(parse_delimiter_list(r"\q").is_err());
        assert!(parse_delimiter_list("\\").is_err());
        assert!(parse_delimiter_list("").is_err());
    }

    #[test]
    fn test_parse_ignore_list() {
        let words: Vec<_> = parse_ignore_list("# stop words\nthe\n\n  and \n#x\nor").collect();
        assert_eq!(words, vec!["the", "and", "or"]);
    }

    #[test]
    fn test_parse_module_spec() {
        assert_eq!(parse_module_spec("count"), ("count", "count"));
        assert_eq!(parse_module_spec("words=count"), ("words", "count"));
    }

    #[test]
    fn test_flags_override_only_what_is_given() {
        let cli = Cli::parse_from(["tagscan", "--min-length", "4", "--ignore", "The"]);
        let overrides = flag_overrides(&cli).unwrap();
        assert_eq!(overrides.minimal_length, Some(4));
        assert_eq!(overrides.start_position, None);
        assert_eq!(overrides.delimiters, None);
        assert_eq!(
            overrides.ignore_words,
            Some(vec![IgnoreRuleSpec::Literal("The".to_string())])
        );
    }

    #[test]
    fn test_unknown_module_rejected() {
        let cli = Cli::parse_from(["tagscan", "-m", "median"]);
        let err = build_config(&cli).unwrap_err();
        assert!(err.to_string().contains("Unknown module: median"));
    }
}
