//! Read routing and write batching.
//!
//! Reads pick one of the two backend surfaces from the requested facets;
//! writes partition heterogeneous intents into at most two batched calls
//! (one values batch, one structural batch), independent of intent count.

use std::collections::HashMap;

use serde_json::{json, Value as JsonValue};

use crate::address::parse_range;
use crate::error::{SheetError, SheetResult};
use crate::facet::CellData;

/// Rendering mode for values-surface reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRender {
    /// Computed, locale-formatted cell values.
    FormattedValue,
    /// Raw formula text where a cell holds a formula.
    Formula,
}

impl ValueRender {
    /// Wire value for the `valueRenderOption` query parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            Self::FormattedValue => "FORMATTED_VALUE",
            Self::Formula => "FORMULA",
        }
    }
}

/// The backend call shape chosen for a read.
///
/// Ranges travel as A1 strings verbatim: the backend accepts addressing
/// forms wider than rectangular ranges (full columns `A:A`, full rows
/// `1:1`, bare sheet titles), and the router must not reject or rewrite
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadPlan {
    /// Heavyweight surface: whole-document get with grid data.
    Grid { ranges: Vec<String> },
    /// Lightweight surface, single range.
    Values { range: String, render: ValueRender },
    /// Lightweight surface, one batched call for all ranges.
    BatchValues {
        ranges: Vec<String>,
        render: ValueRender,
    },
}

/// Decide which backend surface a read should use.
///
/// `FORMAT` or `NOTE` facets force the grid-data surface with full-range
/// payloads. Otherwise the values surface is used, rendering formulas as
/// text when `FORMULA` is requested. Reading K ranges always costs exactly
/// one backend round trip.
pub fn plan_read(ranges: &[String], facets: CellData) -> SheetResult<ReadPlan> {
    if ranges.is_empty() {
        return Err(SheetError::invalid_request("at least one range is required"));
    }

    if facets.intersects(CellData::FORMAT | CellData::NOTE) {
        return Ok(ReadPlan::Grid {
            ranges: ranges.to_vec(),
        });
    }

    let render = if facets.contains(CellData::FORMULA) {
        ValueRender::Formula
    } else {
        ValueRender::FormattedValue
    };

    if ranges.len() == 1 {
        Ok(ReadPlan::Values {
            range: ranges[0].clone(),
            render,
        })
    } else {
        Ok(ReadPlan::BatchValues {
            ranges: ranges.to_vec(),
            render,
        })
    }
}

/// One write operation: a target range plus exactly one payload kind.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteIntent {
    /// A1 notation target, optionally sheet-qualified.
    pub range: String,
    pub payload: WritePayload,
}

impl WriteIntent {
    /// Create a values/formulas write.
    pub fn values(range: impl Into<String>, rows: Vec<Vec<JsonValue>>) -> Self {
        Self {
            range: range.into(),
            payload: WritePayload::Values(rows),
        }
    }

    /// Create a formatting write. An empty descriptor clears formatting.
    pub fn format(range: impl Into<String>, descriptor: JsonValue) -> Self {
        Self {
            range: range.into(),
            payload: WritePayload::Format(descriptor),
        }
    }

    /// Create a note write.
    pub fn note(range: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            payload: WritePayload::Note(text.into()),
        }
    }

    /// Whether this intent targets the structural batch-update surface.
    pub fn is_structural(&self) -> bool {
        matches!(
            self.payload,
            WritePayload::Format(_) | WritePayload::Note(_)
        )
    }
}

/// Payload of a [`WriteIntent`]. Exactly one kind per intent; mixed-kind
/// writes are unrepresentable rather than rejected at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum WritePayload {
    /// Row-major cell values. Scalars beginning with `=` are formulas; the
    /// backend's input parsing handles the distinction.
    Values(Vec<Vec<JsonValue>>),
    /// Formatting descriptor applied to every cell in the range.
    Format(JsonValue),
    /// Note text applied to every cell in the range.
    Note(String),
}

/// Sheet-title to numeric-id lookup used when A1 ranges must become grid
/// regions for the structural surface.
#[derive(Debug, Clone, Default)]
pub struct SheetIds {
    ids: HashMap<String, i64>,
    default_id: i64,
}

impl SheetIds {
    /// Create a lookup whose unqualified ranges resolve to `default_id`.
    pub fn new(default_id: i64) -> Self {
        Self {
            ids: HashMap::new(),
            default_id,
        }
    }

    /// Register a sheet title.
    pub fn insert(&mut self, title: impl Into<String>, id: i64) {
        self.ids.insert(title.into(), id);
    }

    /// Resolve an optional sheet prefix to a numeric id.
    ///
    /// Quoted titles (`'Sales Data'`) are unquoted before lookup.
    pub fn resolve(&self, sheet: Option<&str>) -> SheetResult<i64> {
        match sheet {
            None => Ok(self.default_id),
            Some(name) => {
                let name = unquote_sheet_name(name);
                self.ids.get(name.as_ref()).copied().ok_or_else(|| {
                    SheetError::invalid_request(format!("unknown sheet: {name}"))
                })
            }
        }
    }
}

/// Strip surrounding single quotes and collapse doubled quotes.
fn unquote_sheet_name(name: &str) -> std::borrow::Cow<'_, str> {
    match name
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        Some(inner) => std::borrow::Cow::Owned(inner.replace("''", "'")),
        None => std::borrow::Cow::Borrowed(name),
    }
}

/// Batched backend calls assembled from a list of write intents.
///
/// At most one values batch and one structural batch, regardless of how
/// many intents went in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WritePlan {
    /// Body for the values batch-update call, when any intent wrote values.
    pub values: Option<JsonValue>,
    /// Request list for the structural batch-update call, when any intent
    /// wrote formatting or notes.
    pub structural: Option<Vec<JsonValue>>,
}

/// Partition write intents into at most two batched backend calls.
///
/// Value payloads go to the values surface with "interpret as entered"
/// semantics, so typed input (numbers, booleans, dates, formulas) is
/// coerced by the backend itself. Format and note payloads become one
/// `repeatCell` request each on the structural surface.
pub fn plan_writes(intents: &[WriteIntent], sheets: &SheetIds) -> SheetResult<WritePlan> {
    if intents.is_empty() {
        return Err(SheetError::invalid_request(
            "at least one write intent is required",
        ));
    }

    let mut data = Vec::new();
    let mut requests = Vec::new();

    for intent in intents {
        match &intent.payload {
            WritePayload::Values(rows) => {
                data.push(json!({ "range": intent.range, "values": rows }));
            }
            WritePayload::Format(descriptor) => {
                let region = grid_region_for(&intent.range, sheets)?;
                requests.push(json!({
                    "repeatCell": {
                        "range": region,
                        "cell": { "userEnteredFormat": descriptor },
                        "fields": "userEnteredFormat",
                    }
                }));
            }
            WritePayload::Note(text) => {
                let region = grid_region_for(&intent.range, sheets)?;
                requests.push(json!({
                    "repeatCell": {
                        "range": region,
                        "cell": { "note": text },
                        "fields": "note",
                    }
                }));
            }
        }
    }

    Ok(WritePlan {
        values: (!data.is_empty()).then(|| {
            json!({
                "valueInputOption": "USER_ENTERED",
                "data": data,
            })
        }),
        structural: (!requests.is_empty()).then_some(requests),
    })
}

fn grid_region_for(range: &str, sheets: &SheetIds) -> SheetResult<JsonValue> {
    let parsed = parse_range(range)?;
    let sheet_id = sheets.resolve(parsed.sheet.as_deref())?;
    Ok(serde_json::to_value(parsed.to_grid_region(sheet_id))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_read_empty_ranges() {
        let err = plan_read(&[], CellData::VALUE).unwrap_err();
        assert!(matches!(err, SheetError::InvalidRequest(_)));
    }

    #[test]
    fn test_plan_read_single_range_values() {
        let ranges = vec!["Sheet1!A1:C10".to_string()];
        let plan = plan_read(&ranges, CellData::VALUE).unwrap();
        assert_eq!(
            plan,
            ReadPlan::Values {
                range: "Sheet1!A1:C10".to_string(),
                render: ValueRender::FormattedValue,
            }
        );
    }

    #[test]
    fn test_plan_read_formula_render() {
        let ranges = vec!["A1".to_string()];
        let plan = plan_read(&ranges, CellData::VALUE | CellData::FORMULA).unwrap();
        assert!(matches!(
            plan,
            ReadPlan::Values {
                render: ValueRender::Formula,
                ..
            }
        ));
    }

    #[test]
    fn test_plan_read_multiple_ranges_is_one_batch() {
        let ranges: Vec<String> = ["A1", "B2:C3", "Sheet2!D4"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let plan = plan_read(&ranges, CellData::VALUE).unwrap();
        match plan {
            ReadPlan::BatchValues { ranges, render } => {
                assert_eq!(ranges.len(), 3);
                assert_eq!(render, ValueRender::FormattedValue);
            }
            other => panic!("expected one batched call, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_read_format_forces_grid() {
        for count in 1..4 {
            let ranges: Vec<String> = (0..count).map(|i| format!("A{}", i + 1)).collect();
            let plan = plan_read(&ranges, CellData::FORMAT).unwrap();
            assert!(matches!(plan, ReadPlan::Grid { .. }), "count {count}");
        }
    }

    #[test]
    fn test_plan_read_note_forces_grid_over_values() {
        let ranges = vec!["A1".to_string()];
        let plan = plan_read(&ranges, CellData::VALUE | CellData::NOTE).unwrap();
        assert!(matches!(plan, ReadPlan::Grid { .. }));
    }

    #[test]
    fn test_plan_read_accepts_open_ended_forms() {
        // Full columns, full rows, and bare sheet titles pass through
        // verbatim; only emptiness is a routing error.
        let ranges: Vec<String> = ["Sheet1!A:A", "Sheet1!1:1", "Sheet1"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let plan = plan_read(&ranges, CellData::VALUE).unwrap();
        assert!(matches!(plan, ReadPlan::BatchValues { .. }));
    }

    #[test]
    fn test_plan_writes_empty() {
        let err = plan_writes(&[], &SheetIds::default()).unwrap_err();
        assert!(matches!(err, SheetError::InvalidRequest(_)));
    }

    #[test]
    fn test_plan_writes_values_only() {
        let intents = vec![
            WriteIntent::values("Sheet1!A1", vec![vec![json!(1), json!(2)]]),
            WriteIntent::values("Sheet2!B5", vec![vec![json!("=SUM(A:A)")]]),
        ];
        let plan = plan_writes(&intents, &SheetIds::default()).unwrap();

        assert!(plan.structural.is_none());
        let body = plan.values.unwrap();
        assert_eq!(body["valueInputOption"], "USER_ENTERED");
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"][1]["values"][0][0], "=SUM(A:A)");
    }

    #[test]
    fn test_plan_writes_mixed_is_two_batches() {
        let intents = vec![
            WriteIntent::values("A1", vec![vec![json!("Total")]]),
            WriteIntent::format("A1", json!({ "textFormat": { "bold": true } })),
            WriteIntent::note("B2", "reviewed"),
            WriteIntent::values("C3", vec![vec![json!(9)]]),
        ];
        let plan = plan_writes(&intents, &SheetIds::default()).unwrap();

        let values = plan.values.unwrap();
        assert_eq!(values["data"].as_array().unwrap().len(), 2);

        let requests = plan.structural.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0]["repeatCell"]["cell"]["userEnteredFormat"]["textFormat"]["bold"],
            true
        );
        assert_eq!(requests[0]["repeatCell"]["fields"], "userEnteredFormat");
        assert_eq!(requests[1]["repeatCell"]["cell"]["note"], "reviewed");
        assert_eq!(requests[1]["repeatCell"]["fields"], "note");
    }

    #[test]
    fn test_plan_writes_resolves_sheet_ids() {
        let mut sheets = SheetIds::new(0);
        sheets.insert("Sales", 77);

        let intents = vec![WriteIntent::format("Sales!A1:B2", json!({}))];
        let plan = plan_writes(&intents, &sheets).unwrap();
        let requests = plan.structural.unwrap();
        assert_eq!(requests[0]["repeatCell"]["range"]["sheetId"], 77);
        assert_eq!(requests[0]["repeatCell"]["range"]["endRowIndex"], 2);
    }

    #[test]
    fn test_plan_writes_unknown_sheet() {
        let intents = vec![WriteIntent::note("Nowhere!A1", "x")];
        let err = plan_writes(&intents, &SheetIds::default()).unwrap_err();
        assert!(matches!(err, SheetError::InvalidRequest(_)));
    }

    #[test]
    fn test_plan_writes_unquotes_sheet_names() {
        let mut sheets = SheetIds::new(0);
        sheets.insert("Sales Data", 5);

        let intents = vec![WriteIntent::note("'Sales Data'!A1", "x")];
        let plan = plan_writes(&intents, &sheets).unwrap();
        assert_eq!(plan.structural.unwrap()[0]["repeatCell"]["range"]["sheetId"], 5);
    }

    #[test]
    fn test_write_intent_kinds() {
        assert!(!WriteIntent::values("A1", vec![]).is_structural());
        assert!(WriteIntent::format("A1", json!({})).is_structural());
        assert!(WriteIntent::note("A1", "n").is_structural());
    }
}
