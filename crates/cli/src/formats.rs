//! Text-format handling for CLI input and output.
//!
//! Two input shapes are accepted, auto-detected: JSON objects keyed by
//! range, and space-delimited `address value` lines. Output is always the
//! line form, in range order.

use anyhow::{bail, Result};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use sheetlink_core::WriteIntent;

/// Input format for piped write data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    CellValue,
}

/// Auto-detect the input format: JSON starts with `{` or `[`.
pub fn detect_format(text: &str) -> InputFormat {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        InputFormat::Json
    } else {
        InputFormat::CellValue
    }
}

/// Parse space-delimited `address value` lines.
///
/// Splits on the first space only; everything after it is the value, so
/// formulas and multi-word strings pass through untouched. Blank lines are
/// skipped.
pub fn parse_cell_value_pairs(text: &str) -> Result<IndexMap<String, String>> {
    let mut pairs = IndexMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ') {
            Some((cell, value)) => {
                pairs.insert(cell.to_string(), value.to_string());
            }
            None => bail!("invalid line '{line}': expected 'cell value'"),
        }
    }

    Ok(pairs)
}

/// Render cell/value pairs as `address value` lines.
pub fn format_cell_value_pairs(pairs: &IndexMap<String, JsonValue>) -> String {
    pairs
        .iter()
        .map(|(cell, value)| format!("{cell} {}", display_value(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a cell value for line output: strings bare, null empty.
pub fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse piped write input into write intents, auto-detecting the format.
///
/// JSON objects map ranges to either a 2-D array (written as-is) or a
/// scalar (written to the single named cell). The line format always
/// writes single cells.
pub fn parse_input(text: &str) -> Result<Vec<WriteIntent>> {
    match detect_format(text) {
        InputFormat::Json => {
            let parsed: JsonValue = serde_json::from_str(text)?;
            let Some(object) = parsed.as_object() else {
                bail!("expected a JSON object keyed by cell or range");
            };

            Ok(object
                .iter()
                .map(|(range, value)| intent_for(range.clone(), value.clone()))
                .collect())
        }
        InputFormat::CellValue => Ok(parse_cell_value_pairs(text)?
            .into_iter()
            .map(|(cell, value)| {
                WriteIntent::values(cell, vec![vec![JsonValue::String(value)]])
            })
            .collect()),
    }
}

/// A 2-D array value is a range write; anything else writes one cell.
fn intent_for(range: String, value: JsonValue) -> WriteIntent {
    match value {
        JsonValue::Array(rows) if rows.iter().all(JsonValue::is_array) => {
            let rows = rows
                .into_iter()
                .map(|row| row.as_array().cloned().unwrap_or_default())
                .collect();
            WriteIntent::values(range, rows)
        }
        scalar => WriteIntent::values(range, vec![vec![scalar]]),
    }
}

/// Read all piped input, or nothing when stdin is a terminal.
pub fn read_stdin() -> Result<String> {
    use std::io::{IsTerminal, Read};

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }

    let mut buffer = String::new();
    stdin.read_to_string(&mut buffer)?;
    Ok(buffer)
}
