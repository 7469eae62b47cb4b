//! Renderer module
//!
//! Renders a ScanResult to different output formats: json, jsonl, md, table

use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use std::io::Write;

use crate::core::model::{ScanResult, TokenOrder};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Jsonl,
    Markdown,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "table" | "text" => Ok(OutputFormat::Table),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
    pub order: TokenOrder,
    /// Only render the first N tokens (after ordering)
    pub top: Option<usize>,
    pub color: bool,
}

impl RenderConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }
}

/// Renderer for scan results
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a scan result to a string
    pub fn render(&self, result: &ScanResult) -> String {
        match self.config.format {
            OutputFormat::Json => self.render_json(result),
            OutputFormat::Jsonl => self.render_jsonl(result),
            OutputFormat::Markdown => self.render_markdown(result),
            OutputFormat::Table => self.render_table(result),
        }
    }

    /// Render to a writer
    pub fn render_to<W: Write>(&self, result: &ScanResult, mut writer: W) -> std::io::Result<()> {
        let output = self.render(result);
        writeln!(writer, "{}", output)
    }

    /// Whether `top` hides part of the tokens; the full result is otherwise untouched
    fn is_limited(&self, result: &ScanResult) -> bool {
        self.config.top.is_some_and(|top| top < result.distinct())
    }

    fn to_json_string<T: Serialize + ?Sized>(&self, value: &T) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
        }
    }

    /// Render as a single JSON object
    fn render_json(&self, result: &ScanResult) -> String {
        if !self.is_limited(result) {
            return self.to_json_string(result);
        }

        let tokens: serde_json::Map<_, _> = result
            .sorted_tokens(self.config.order, self.config.top)
            .into_iter()
            .map(|(token, count)| (token.to_string(), json!(count)))
            .collect();
        let mut object = serde_json::Map::new();
        object.insert("tokens".to_string(), serde_json::Value::Object(tokens));
        for (name, value) in &result.modules {
            object.insert(name.clone(), value.clone());
        }
        self.to_json_string(&serde_json::Value::Object(object))
    }

    /// Render as JSON Lines: one object per token, then one per module
    fn render_jsonl(&self, result: &ScanResult) -> String {
        let tokens = result
            .sorted_tokens(self.config.order, self.config.top)
            .into_iter()
            .map(|(token, count)| json!({ "token": token, "count": count }));
        let modules = result
            .modules
            .iter()
            .map(|(name, value)| json!({ "module": name, "value": value }));

        tokens
            .chain(modules)
            .map(|line| self.to_json_string(&line))
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as Markdown
    fn render_markdown(&self, result: &ScanResult) -> String {
        let mut output = String::new();

        output.push_str("## Tokens\n\n");
        if result.tokens.is_empty() {
            output.push_str("_No tokens._\n");
        } else {
            output.push_str("| Token | Count |\n");
            output.push_str("|-------|------:|\n");
            for (token, count) in result.sorted_tokens(self.config.order, self.config.top) {
                output.push_str(&format!("| `{}` | {} |\n", escape_markdown_cell(token), count));
            }
            output.push_str(&format!(
                "\n**Total:** {} ({} distinct)\n",
                result.total(),
                result.distinct()
            ));
        }

        if !result.modules.is_empty() {
            output.push_str("\n## Modules\n\n");
            for (name, value) in &result.modules {
                output.push_str(&format!("- **{}**: `{}`\n", name, value));
            }
        }

        output
    }

    /// Render as aligned plain text
    fn render_table(&self, result: &ScanResult) -> String {
        let tokens = result.sorted_tokens(self.config.order, self.config.top);
        let width = tokens
            .iter()
            .map(|(token, _)| token.chars().count())
            .max()
            .unwrap_or(0)
            .max("TOKEN".len());

        let mut lines = Vec::with_capacity(tokens.len() + result.modules.len() + 3);
        lines.push(self.header(&format!("{:<width$}  {:>6}", "TOKEN", "COUNT")));
        for (token, count) in &tokens {
            lines.push(format!("{:<width$}  {:>6}", token, count));
        }
        lines.push(format!(
            "{} tokens, {} distinct",
            result.total(),
            result.distinct()
        ));

        if !result.modules.is_empty() {
            lines.push(String::new());
            for (name, value) in &result.modules {
                lines.push(format!("{}: {}", self.header(name), value));
            }
        }

        lines.join("\n")
    }

    fn header(&self, text: &str) -> String {
        if self.config.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }
}

fn escape_markdown_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('`', "'")
}
