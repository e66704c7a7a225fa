//! Flat `key = value` file reading.
//!
//! The format is deliberately small: one assignment per line, `;` or `#`
//! comments, blank lines ignored. There are no sections, quoting, escapes or
//! continuation lines.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::error::SyntaxReason;
use super::ConfigError;

/// Raw string values keyed by their external key name.
pub type RawMapping = BTreeMap<String, String>;

/// Reads a flat file into a [`RawMapping`].
///
/// A key that appears more than once keeps its last value.
pub fn read_flat_file(path: impl AsRef<Path>) -> Result<RawMapping, ConfigError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ConfigError::NotFound {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut mapping = RawMapping::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let line_no = idx + 1;

        let Some((key, value)) = parse_line(&line).map_err(|reason| ConfigError::Syntax {
            path: path.to_path_buf(),
            line: line_no,
            content: line.clone(),
            reason,
        })?
        else {
            continue;
        };

        if let Some(previous) = mapping.insert(key.to_string(), value.to_string()) {
            tracing::debug!(
                path = %path.display(),
                line = line_no,
                key,
                previous = %previous,
                "duplicate key, keeping last value"
            );
        }
    }

    Ok(mapping)
}

/// Loads a flat file that may be optional.
///
/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
pub fn load_flat_file(
    path: impl AsRef<Path>,
    required: bool,
) -> Result<Option<RawMapping>, ConfigError> {
    let path = path.as_ref();
    match read_flat_file(path) {
        Ok(mapping) => Ok(Some(mapping)),
        Err(ConfigError::NotFound { source, .. })
            if !required && source.kind() == std::io::ErrorKind::NotFound =>
        {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Renders a mapping as `key = value` lines, in key order.
pub fn render_flat(mapping: &RawMapping) -> String {
    let mut out = String::new();
    for (key, value) in mapping {
        out.push_str(key);
        out.push_str(" = ");
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Splits one line into a trimmed key and value.
///
/// Returns `Ok(None)` for blank and comment lines.
fn parse_line(line: &str) -> Result<Option<(&str, &str)>, SyntaxReason> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
        return Ok(None);
    }

    let (key, value) = line.split_once('=').ok_or(SyntaxReason::MissingEquals)?;
    let (key, value) = (key.trim(), value.trim());

    if key.is_empty() {
        return Err(SyntaxReason::EmptyKey);
    }
    if key.chars().any(char::is_whitespace) {
        return Err(SyntaxReason::KeyContainsWhitespace);
    }
    if value.is_empty() {
        return Err(SyntaxReason::EmptyValue);
    }

    Ok(Some((key, value)))
}
