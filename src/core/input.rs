//! Input reading - text to scan from an inline string, a file or stdin
//!
//! The scanner needs the whole text up front, so input is read fully into
//! memory, bounded by a size limit.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Default maximum input size in bytes (64 MB)
pub const DEFAULT_MAX_BYTES: u64 = 64 * 1024 * 1024;

/// Where the text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Inline(String),
    File(PathBuf),
    Stdin,
}

impl InputSource {
    /// Build a source from CLI arguments; a missing path or `-` means stdin
    pub fn from_args(text: Option<String>, path: Option<&Path>) -> Self {
        match (text, path) {
            (Some(text), _) => InputSource::Inline(text),
            (None, Some(path)) if path != Path::new("-") => InputSource::File(path.to_path_buf()),
            _ => InputSource::Stdin,
        }
    }
}

/// Strategy for handling non-UTF-8 content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingStrategy {
    /// Fail on invalid UTF-8
    Strict,
    /// Replace invalid sequences with U+FFFD
    #[default]
    Lossy,
}

/// Configuration for reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfig {
    pub max_bytes: u64,
    pub encoding: EncodingStrategy,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            encoding: EncodingStrategy::Lossy,
        }
    }
}

/// Text read from an input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputText {
    pub content: String,
    /// Whether invalid UTF-8 was replaced
    pub lossy: bool,
}

/// Read the whole input described by `source`
pub fn read_input(source: &InputSource, config: &InputConfig) -> Result<InputText> {
    match source {
        InputSource::Inline(text) => {
            if text.len() as u64 > config.max_bytes {
                bail!(
                    "Input exceeds size limit ({} > {} bytes)",
                    text.len(),
                    config.max_bytes
                );
            }
            Ok(InputText {
                content: text.clone(),
                lossy: false,
            })
        }
        InputSource::File(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
            read_from(BufReader::new(file), config)
                .with_context(|| format!("Failed to read file: {:?}", path))
        }
        InputSource::Stdin => read_from(io::stdin().lock(), config).context("Failed to read stdin"),
    }
}

/// Read everything from `reader`, enforcing the size limit and encoding strategy
pub fn read_from<R: Read>(reader: R, config: &InputConfig) -> Result<InputText> {
    let mut bytes = Vec::new();
    // one extra byte tells "exactly at the limit" apart from "over the limit"
    reader
        .take(config.max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)?;

    if bytes.len() as u64 > config.max_bytes {
        bail!("Input exceeds size limit of {} bytes", config.max_bytes);
    }

    match String::from_utf8(bytes) {
        Ok(content) => Ok(InputText {
            content,
            lossy: false,
        }),
        Err(err) => match config.encoding {
            EncodingStrategy::Strict => {
                bail!("Input contains invalid UTF-8 sequences: {}", err.utf8_error())
            }
            EncodingStrategy::Lossy => Ok(InputText {
                content: String::from_utf8_lossy(err.as_bytes()).into_owned(),
                lossy: true,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_source_from_args() {
        assert_eq!(
            InputSource::from_args(Some("hi".into()), Some(Path::new("x.txt"))),
            InputSource::Inline("hi".into())
        );
        assert_eq!(
            InputSource::from_args(None, Some(Path::new("x.txt"))),
            InputSource::File(PathBuf::from("x.txt"))
        );
        assert_eq!(
            InputSource::from_args(None, Some(Path::new("-"))),
            InputSource::Stdin
        );
        assert_eq!(InputSource::from_args(None, None), InputSource::Stdin);
    }

    #[test]
    fn test_read_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("page.html");
        fs::write(&path, "<p>Hello world</p>").unwrap();

        let input = read_input(&InputSource::File(path), &InputConfig::default()).unwrap();
        assert_eq!(input.content, "<p>Hello world</p>");
        assert!(!input.lossy);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = read_input(
            &InputSource::File(PathBuf::from("/definitely/not/here.txt")),
            &InputConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to open file"));
    }

    #[test]
    fn test_lossy_decoding() {
        let bytes: &[u8] = b"caf\xe9 ok";
        let input = read_from(bytes, &InputConfig::default()).unwrap();
        assert!(input.lossy);
        assert_eq!(input.content, "caf\u{fffd} ok");
    }

    #[test]
    fn test_strict_decoding_fails() {
        let bytes: &[u8] = b"caf\xe9 ok";
        let config = InputConfig {
            encoding: EncodingStrategy::Strict,
            ..Default::default()
        };
        assert!(read_from(bytes, &config).is_err());
    }

    #[test]
    fn test_size_limit() {
        let config = InputConfig {
            max_bytes: 4,
            ..Default::default()
        };
        assert!(read_from("abcd".as_bytes(), &config).is_ok());
        assert!(read_from("abcde".as_bytes(), &config).is_err());
        assert!(read_input(&InputSource::Inline("abcde".into()), &config).is_err());
    }
}
