//! Tokenizing scanner - single left-to-right pass over the text
//!
//! The cursor is a char index. At every step it either:
//! - skips one delimiter,
//! - skips an HTML-like tag from `<` through the next `>` (or to the end), or
//! - reads a token up to the next delimiter, `<` or end of text.
//!
//! Tokens are lower-cased once, then filtered by minimal length and the
//! ignore rules. Accepted tokens are counted and handed to every module
//! in registration order.
//!
//! ```rust
//! use tagscan::{scan, Config};
//!
//! let result = scan("a ab abcd dbca ab Ab AAB", &Config::default()).unwrap();
//! assert_eq!(result.count("ab"), 3);
//! assert_eq!(result.count("a"), 0);
//! ```

use log::{debug, trace};
use std::time::Instant;

use crate::core::config::Config;
use crate::core::error::ScanError;
use crate::core::model::ScanResult;

const TAG_OPEN: char = '<';
const TAG_CLOSE: char = '>';

/// Scan `text` and return token counts plus the final module values
///
/// Fails before scanning if the configuration is invalid. A failing module
/// aborts the scan; the partial result is dropped.
pub fn scan(text: &str, config: &Config) -> Result<ScanResult, ScanError> {
    config.validate()?;

    let started = Instant::now();
    let chars: Vec<char> = text.chars().collect();
    debug!(
        "Started scanning {} chars from position {}",
        chars.len(),
        config.start_position
    );

    let mut result = ScanResult::new();
    let mut runs = config.modules.begin();
    let mut position = config.start_position;

    while position < chars.len() {
        let c = chars[position];

        if config.is_delimiter(c) {
            trace!("Found delimiter {:?} at position {}", c, position);
            position += 1;
        } else if c == TAG_OPEN {
            trace!("Found tag at position {}", position);
            position = find_tag_end(&chars, position) + 1;
        } else {
            let end = find_token_end(&chars, position, config);
            let token: String = chars[position..end].iter().collect::<String>().to_lowercase();
            trace!("Found token '{}' at position {}", token, position);

            if token.chars().count() < config.minimal_length {
                trace!("Token '{}' at {} is too short", token, position);
            } else if config.is_ignored(&token) {
                trace!("Token '{}' at {} is ignored", token, position);
            } else {
                trace!("Token '{}' at {} is valid", token, position);
                result.record(&token);

                for (name, run) in runs.iter_mut() {
                    run.step(&token, position)
                        .map_err(|source| ScanError::Module {
                            name: name.to_string(),
                            token: token.clone(),
                            position,
                            source,
                        })?;
                }
            }

            position = end;
        }

        trace!("Next position is {}", position);
    }

    for (name, run) in runs {
        let value = run.finish().map_err(|source| ScanError::ModuleValue {
            name: name.to_string(),
            source,
        })?;
        result.modules.push((name.to_string(), value));
    }

    debug!(
        "Finished scanning: {} tokens ({} distinct) in {:?}",
        result.total(),
        result.distinct(),
        started.elapsed()
    );

    Ok(result)
}

/// Index of the `>` closing the tag opened at `start`, or the text length
fn find_tag_end(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|&c| c == TAG_CLOSE)
        .map_or(chars.len(), |offset| start + offset)
}

/// Exclusive end of the token starting at `start`
fn find_token_end(chars: &[char], start: usize, config: &Config) -> usize {
    chars[start..]
        .iter()
        .position(|&c| c == TAG_OPEN || config.is_delimiter(c))
        .map_or(chars.len(), |offset| start + offset)
}
