//! A1-style addressing and grid-region translation.
//!
//! Two coordinate systems meet here: the human-readable A1 notation
//! (one-based rows, bijective base-26 column letters, optional `Sheet!`
//! prefix) and the backend's zero-based, half-open grid regions. Everything
//! in this module is pure; the client and CLI layers call into it for
//! parsing, conversion, and caller-side range expansion.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{SheetError, SheetResult};

/// A single cell position. Both coordinates are one-based: `col` 1 is
/// column `A`, `row` 1 is the first row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub col: u32,
    pub row: u32,
}

impl CellAddress {
    /// Create a new cell address.
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Render as A1 notation (e.g. `(1, 1)` is `A1`, `(28, 5)` is `AB5`).
    pub fn to_a1(&self) -> String {
        format!("{}{}", letters_for(self.col), self.row)
    }
}

/// A parsed rectangular range, normalized so `start <= end` in both
/// dimensions. The sheet prefix, when present, is kept verbatim so
/// addresses can be reconstructed exactly as the caller wrote them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub sheet: Option<String>,
    pub start: CellAddress,
    pub end: CellAddress,
}

impl Range {
    /// Convert to the backend's zero-based, half-open grid representation.
    ///
    /// End bounds become exclusive: one past the last included coordinate.
    pub fn to_grid_region(&self, sheet_id: i64) -> GridRegion {
        GridRegion {
            sheet_id,
            start_row: self.start.row - 1,
            end_row: self.end.row,
            start_col: self.start.col - 1,
            end_col: self.end.col,
        }
    }

    /// Render back to A1 notation, re-applying any sheet prefix.
    pub fn to_a1(&self) -> String {
        let prefix = self
            .sheet
            .as_deref()
            .map(|name| format!("{name}!"))
            .unwrap_or_default();
        format!("{}{}:{}", prefix, self.start.to_a1(), self.end.to_a1())
    }
}

/// Zero-based, half-open rectangular region in backend coordinates.
///
/// Serializes to the exact wire shape the structural batch-update surface
/// expects (`sheetId`, `startRowIndex`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridRegion {
    #[serde(rename = "sheetId")]
    pub sheet_id: i64,
    #[serde(rename = "startRowIndex")]
    pub start_row: u32,
    #[serde(rename = "endRowIndex")]
    pub end_row: u32,
    #[serde(rename = "startColumnIndex")]
    pub start_col: u32,
    #[serde(rename = "endColumnIndex")]
    pub end_col: u32,
}

impl GridRegion {
    /// Recover the equivalent one-based inclusive range.
    pub fn to_range(&self, sheet: Option<String>) -> Range {
        Range {
            sheet,
            start: CellAddress::new(self.start_col + 1, self.start_row + 1),
            end: CellAddress::new(self.end_col, self.end_row),
        }
    }
}

/// Convert column letters to a one-based column index.
/// `A` is 1, `Z` is 26, `AA` is 27. Case-insensitive.
pub fn column_letter_to_index(letters: &str) -> SheetResult<u32> {
    if letters.is_empty() {
        return Err(SheetError::invalid_address("empty column letters"));
    }

    let mut result: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(SheetError::invalid_address(format!(
                "invalid column character '{ch}' in '{letters}'"
            )));
        }
        let digit = u32::from(ch.to_ascii_uppercase() as u8 - b'A') + 1;
        result = result
            .checked_mul(26)
            .and_then(|r| r.checked_add(digit))
            .ok_or_else(|| {
                SheetError::invalid_address(format!("column '{letters}' is out of range"))
            })?;
    }

    Ok(result)
}

/// Convert a one-based column index to letters.
/// 1 is `A`, 26 is `Z`, 27 is `AA`.
pub fn column_index_to_letter(index: u32) -> SheetResult<String> {
    if index == 0 {
        return Err(SheetError::invalid_address(
            "column index must be at least 1",
        ));
    }
    Ok(letters_for(index))
}

/// Bijective base-26 rendering for a one-based column index.
fn letters_for(mut index: u32) -> String {
    let mut out = String::new();
    while index > 0 {
        index -= 1;
        out.push((b'A' + (index % 26) as u8) as char);
        index /= 26;
    }
    out.chars().rev().collect()
}

/// Parse A1 notation into a [`Range`].
///
/// Accepts `A1`, `A1:C10`, and `Sheet!A1:C10` forms. A bare cell address
/// normalizes to a range whose start equals its end; reversed ranges are
/// normalized so start <= end in both dimensions.
pub fn parse_range(text: &str) -> SheetResult<Range> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SheetError::invalid_address("empty range"));
    }

    let (sheet, cells) = match trimmed.split_once('!') {
        Some((name, rest)) => {
            if name.is_empty() {
                return Err(SheetError::invalid_address(format!(
                    "missing sheet name in '{trimmed}'"
                )));
            }
            (Some(name.to_string()), rest)
        }
        None => (None, trimmed),
    };

    let (start, end) = match cells.split_once(':') {
        Some((lhs, rhs)) => (parse_cell(lhs)?, parse_cell(rhs)?),
        None => {
            let cell = parse_cell(cells)?;
            (cell, cell)
        }
    };

    Ok(Range {
        sheet,
        start: CellAddress::new(start.col.min(end.col), start.row.min(end.row)),
        end: CellAddress::new(start.col.max(end.col), start.row.max(end.row)),
    })
}

/// Parse a single cell reference like `B5` into a one-based address.
fn parse_cell(text: &str) -> SheetResult<CellAddress> {
    let bytes = text.as_bytes();

    let mut split = 0;
    while split < bytes.len() && bytes[split].is_ascii_alphabetic() {
        split += 1;
    }

    if split == 0 || split == bytes.len() {
        return Err(SheetError::invalid_address(format!(
            "'{text}' is not a cell reference"
        )));
    }

    let col = column_letter_to_index(&text[..split])?;
    let row: u32 = text[split..]
        .parse()
        .map_err(|_| SheetError::invalid_address(format!("invalid row in '{text}'")))?;
    if row == 0 {
        return Err(SheetError::invalid_address(format!(
            "row must be at least 1 in '{text}'"
        )));
    }

    Ok(CellAddress::new(col, row))
}

/// Expand a range and its row-major values into per-cell entries.
///
/// The mapping preserves row-major order and reconstructs each address with
/// the range's original sheet prefix. Rows shorter than the range are fine;
/// the backend omits trailing empty cells and so do we.
pub fn expand_range_to_cells(
    range_str: &str,
    values: &[Vec<JsonValue>],
) -> SheetResult<IndexMap<String, JsonValue>> {
    let range = parse_range(range_str)?;
    let prefix = range
        .sheet
        .as_deref()
        .map(|name| format!("{name}!"))
        .unwrap_or_default();

    let mut cells = IndexMap::new();
    for (row_offset, row_values) in values.iter().enumerate() {
        let row = range.start.row + row_offset as u32;
        for (col_offset, value) in row_values.iter().enumerate() {
            let col = range.start.col + col_offset as u32;
            cells.insert(
                format!("{prefix}{}{row}", letters_for(col)),
                value.clone(),
            );
        }
    }

    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_letter_to_index() {
        assert_eq!(column_letter_to_index("A").unwrap(), 1);
        assert_eq!(column_letter_to_index("Z").unwrap(), 26);
        assert_eq!(column_letter_to_index("AA").unwrap(), 27);
        assert_eq!(column_letter_to_index("AB").unwrap(), 28);
        assert_eq!(column_letter_to_index("ZZ").unwrap(), 702);

        // Case insensitive
        assert_eq!(column_letter_to_index("a").unwrap(), 1);
        assert_eq!(column_letter_to_index("aB").unwrap(), 28);
    }

    #[test]
    fn test_column_letter_to_index_errors() {
        assert!(column_letter_to_index("").is_err());
        assert!(column_letter_to_index("A1").is_err());
        assert!(column_letter_to_index("Ä").is_err());
    }

    #[test]
    fn test_column_index_to_letter() {
        assert_eq!(column_index_to_letter(1).unwrap(), "A");
        assert_eq!(column_index_to_letter(26).unwrap(), "Z");
        assert_eq!(column_index_to_letter(27).unwrap(), "AA");
        assert_eq!(column_index_to_letter(703).unwrap(), "AAA");
        assert!(column_index_to_letter(0).is_err());
    }

    #[test]
    fn test_parse_range_with_sheet() {
        let range = parse_range("Sheet1!A1:C10").unwrap();
        assert_eq!(range.sheet.as_deref(), Some("Sheet1"));
        assert_eq!(range.start, CellAddress::new(1, 1));
        assert_eq!(range.end, CellAddress::new(3, 10));

        let region = range.to_grid_region(0);
        assert_eq!(region.start_row, 0);
        assert_eq!(region.end_row, 10);
        assert_eq!(region.start_col, 0);
        assert_eq!(region.end_col, 3);
    }

    #[test]
    fn test_parse_range_bare_cell() {
        let range = parse_range("B5").unwrap();
        assert_eq!(range.sheet, None);
        assert_eq!(range.start, range.end);

        let region = range.to_grid_region(0);
        assert_eq!(region.start_row, 4);
        assert_eq!(region.end_row, 5);
        assert_eq!(region.start_col, 1);
        assert_eq!(region.end_col, 2);
    }

    #[test]
    fn test_parse_range_normalizes_reversed() {
        let range = parse_range("C10:A1").unwrap();
        assert_eq!(range.start, CellAddress::new(1, 1));
        assert_eq!(range.end, CellAddress::new(3, 10));
    }

    #[test]
    fn test_parse_range_errors() {
        assert!(parse_range("").is_err());
        assert!(parse_range("1A").is_err());
        assert!(parse_range("A0").is_err());
        assert!(parse_range("A").is_err());
        assert!(parse_range("12").is_err());
        assert!(parse_range("!A1").is_err());
        assert!(parse_range("A1:").is_err());
        assert!(parse_range("A1:B").is_err());
    }

    #[test]
    fn test_grid_region_round_trip() {
        let range = parse_range("Sheet1!B2:D9").unwrap();
        let region = range.to_grid_region(7);
        let back = region.to_range(range.sheet.clone());
        assert_eq!(back, range);
        assert_eq!(region.sheet_id, 7);
    }

    #[test]
    fn test_grid_region_half_open_non_empty() {
        for text in ["A1", "B5", "A1:C10", "Sheet1!AA100:AB101"] {
            let region = parse_range(text).unwrap().to_grid_region(0);
            assert!(region.end_row > region.start_row, "{text}");
            assert!(region.end_col > region.start_col, "{text}");
        }
    }

    #[test]
    fn test_grid_region_serializes_to_wire_shape() {
        let region = parse_range("A1:C10").unwrap().to_grid_region(3);
        let wire = serde_json::to_value(region).unwrap();
        assert_eq!(
            wire,
            json!({
                "sheetId": 3,
                "startRowIndex": 0,
                "endRowIndex": 10,
                "startColumnIndex": 0,
                "endColumnIndex": 3,
            })
        );
    }

    #[test]
    fn test_expand_range_to_cells() {
        let values = vec![
            vec![json!("a1"), json!("b1")],
            vec![json!("a2"), json!("b2")],
        ];
        let cells = expand_range_to_cells("A1:B2", &values).unwrap();

        assert_eq!(cells.get("A1"), Some(&json!("a1")));
        assert_eq!(cells.get("B1"), Some(&json!("b1")));
        assert_eq!(cells.get("A2"), Some(&json!("a2")));
        assert_eq!(cells.get("B2"), Some(&json!("b2")));

        let order: Vec<&str> = cells.keys().map(String::as_str).collect();
        assert_eq!(order, ["A1", "B1", "A2", "B2"]);
    }

    #[test]
    fn test_expand_range_keeps_sheet_prefix() {
        let values = vec![vec![json!(42)]];
        let cells = expand_range_to_cells("Sheet2!C3", &values).unwrap();
        assert_eq!(cells.get("Sheet2!C3"), Some(&json!(42)));
    }

    #[test]
    fn test_expand_range_ragged_rows() {
        // Backend trims trailing empty cells per row.
        let values = vec![vec![json!("a1"), json!("b1")], vec![json!("a2")]];
        let cells = expand_range_to_cells("A1:B2", &values).unwrap();
        assert_eq!(cells.len(), 3);
        assert!(!cells.contains_key("B2"));
    }

    #[test]
    fn test_cell_address_to_a1() {
        assert_eq!(CellAddress::new(1, 1).to_a1(), "A1");
        assert_eq!(CellAddress::new(28, 5).to_a1(), "AB5");
        assert_eq!(parse_range("Sheet1!A1:C10").unwrap().to_a1(), "Sheet1!A1:C10");
    }
}
