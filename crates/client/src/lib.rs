//! # sheetlink-client
//!
//! Async client for the spreadsheet backend's two API surfaces: the
//! lightweight values surface and the heavyweight grid-data surface.
//!
//! Reads and writes are shaped by the planning layer in `sheetlink-core`;
//! every resulting network call goes through the bounded exponential-backoff
//! retry executor. Responses come back as raw JSON payloads.

pub mod auth;

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use sheetlink_core::{
    plan_read, plan_writes, CellData, FailureClass, ReadPlan, RetryPolicy, SheetError, SheetIds,
    SheetResult, WriteIntent,
};

pub use auth::{load_token, AccessToken};

/// Default backend endpoint.
const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// Client for the spreadsheet backend.
///
/// Holds the authenticated session token and is safe to share across tasks;
/// operations issue their backend calls sequentially and keep no state
/// between calls.
pub struct SheetsClient {
    http: Client,
    base_url: String,
    token: AccessToken,
    retry: RetryPolicy,
}

/// Raw backend replies from a write, one per issued batch call.
#[derive(Debug, Clone, Default)]
pub struct WriteResponse {
    /// Reply of the values batch update, when value intents were present.
    pub values: Option<JsonValue>,
    /// Reply of the structural batch update, when format/note intents were
    /// present.
    pub structural: Option<JsonValue>,
}

impl WriteResponse {
    /// Total updated cell count reported by the values surface.
    pub fn total_updated_cells(&self) -> Option<u64> {
        self.values.as_ref()?.get("totalUpdatedCells")?.as_u64()
    }
}

impl SheetsClient {
    /// Create a client against the default backend endpoint.
    ///
    /// Uses a 30-second request timeout and the default retry policy
    /// (3 attempts, 1-second backoff base).
    pub fn new(token: AccessToken) -> SheetResult<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (tests, self-hosted
    /// deployments).
    pub fn with_base_url(token: AccessToken, base_url: impl Into<String>) -> SheetResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .no_proxy()
            .build()
            .map_err(|e| SheetError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Read cells from the given A1 ranges.
    ///
    /// The facet set decides the surface: `FORMAT` or `NOTE` route to the
    /// grid-data surface, everything else to the values surface, with
    /// formulas rendered as text when `FORMULA` is requested. K ranges cost
    /// exactly one backend round trip. Returns the raw backend payload.
    pub async fn read(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
        facets: CellData,
    ) -> SheetResult<JsonValue> {
        let id = require_spreadsheet_id(spreadsheet_id)?;

        match plan_read(ranges, facets)? {
            ReadPlan::Grid { ranges } => {
                debug!(count = ranges.len(), "reading via grid-data surface");
                let mut request = self
                    .get(&format!("/v4/spreadsheets/{id}"))
                    .query(&[("includeGridData", "true")]);
                for range in &ranges {
                    request = request.query(&[("ranges", range.as_str())]);
                }
                self.execute_with_retry(request).await
            }
            ReadPlan::Values { range, render } => {
                debug!(%range, "reading via values surface");
                let request = self
                    .get(&format!(
                        "/v4/spreadsheets/{id}/values/{}",
                        urlencoding::encode(&range)
                    ))
                    .query(&[("valueRenderOption", render.as_param())]);
                self.execute_with_retry(request).await
            }
            ReadPlan::BatchValues { ranges, render } => {
                debug!(count = ranges.len(), "reading via batched values surface");
                let mut request = self
                    .get(&format!("/v4/spreadsheets/{id}/values:batchGet"))
                    .query(&[("valueRenderOption", render.as_param())]);
                for range in &ranges {
                    request = request.query(&[("ranges", range.as_str())]);
                }
                self.execute_with_retry(request).await
            }
        }
    }

    /// Write cells.
    ///
    /// Intents are partitioned into at most two batched calls: one values
    /// batch ("interpret as entered", so `=`-prefixed scalars become
    /// formulas) and one structural batch for formatting and notes. When a
    /// structural intent names a sheet, titles are resolved to numeric ids
    /// with a single structure read first.
    pub async fn write(
        &self,
        spreadsheet_id: &str,
        intents: &[WriteIntent],
    ) -> SheetResult<WriteResponse> {
        let id = require_spreadsheet_id(spreadsheet_id)?;

        let needs_resolution = intents
            .iter()
            .any(|intent| intent.is_structural() && intent.range.contains('!'));
        let sheets = if needs_resolution {
            sheet_ids_from_metadata(&self.meta_read(spreadsheet_id).await?)
        } else {
            SheetIds::default()
        };

        let plan = plan_writes(intents, &sheets)?;
        let mut response = WriteResponse::default();

        if let Some(body) = &plan.values {
            debug!("issuing values batch update");
            let request = self
                .post(&format!("/v4/spreadsheets/{id}/values:batchUpdate"))
                .json(body);
            response.values = Some(self.execute_with_retry(request).await?);
        }

        if let Some(requests) = &plan.structural {
            debug!(count = requests.len(), "issuing structural batch update");
            let request = self
                .post(&format!("/v4/spreadsheets/{id}:batchUpdate"))
                .json(&json!({ "requests": requests }));
            response.structural = Some(self.execute_with_retry(request).await?);
        }

        Ok(response)
    }

    /// Read spreadsheet structure and properties, without cell data.
    pub async fn meta_read(&self, spreadsheet_id: &str) -> SheetResult<JsonValue> {
        let id = require_spreadsheet_id(spreadsheet_id)?;
        let request = self
            .get(&format!("/v4/spreadsheets/{id}"))
            .query(&[("includeGridData", "false")]);
        self.execute_with_retry(request).await
    }

    /// Apply raw structural operations through the batch-update surface.
    pub async fn meta_write(
        &self,
        spreadsheet_id: &str,
        requests: &[JsonValue],
    ) -> SheetResult<JsonValue> {
        let id = require_spreadsheet_id(spreadsheet_id)?;
        if requests.is_empty() {
            return Err(SheetError::invalid_request(
                "at least one structural request is required",
            ));
        }
        let request = self
            .post(&format!("/v4/spreadsheets/{id}:batchUpdate"))
            .json(&json!({ "requests": requests }));
        self.execute_with_retry(request).await
    }

    /// Create a new spreadsheet with an optional list of sheet property
    /// descriptors.
    pub async fn create(
        &self,
        title: &str,
        sheets: Option<&[JsonValue]>,
    ) -> SheetResult<JsonValue> {
        if title.trim().is_empty() {
            return Err(SheetError::invalid_request("title is required"));
        }

        let mut body = json!({ "properties": { "title": title } });
        if let Some(sheets) = sheets {
            body["sheets"] = json!(sheets);
        }

        let request = self.post("/v4/spreadsheets").json(&body);
        self.execute_with_retry(request).await
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(self.token.secret())
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(self.token.secret())
    }

    /// Send a request, retrying transient backend failures with bounded
    /// exponential backoff.
    ///
    /// 429 and 500/503 retry up to the policy's attempt budget, sleeping
    /// `base_delay * 2^attempt` between tries; any other error status fails
    /// immediately. Transport errors are not retried.
    async fn execute_with_retry(&self, request: RequestBuilder) -> SheetResult<JsonValue> {
        let mut exhausted: Option<(u16, String)> = None;

        for attempt in 0..self.retry.max_attempts {
            let attempt_request = request
                .try_clone()
                .ok_or_else(|| SheetError::Http("request body cannot be replayed".to_string()))?;

            let response = attempt_request
                .send()
                .await
                .map_err(|e| SheetError::Http(e.to_string()))?;
            let status = response.status().as_u16();

            if response.status().is_success() {
                return response
                    .json()
                    .await
                    .map_err(|e| SheetError::Http(format!("failed to decode response: {e}")));
            }

            let body = response.text().await.unwrap_or_default();
            match FailureClass::classify(status) {
                FailureClass::Permanent => {
                    return Err(SheetError::BackendRequest { status, body });
                }
                FailureClass::Transient => {
                    exhausted = Some((status, body));
                    if attempt + 1 < self.retry.max_attempts {
                        let delay = self.retry.delay_for_attempt(attempt);
                        warn!(status, attempt, ?delay, "transient backend failure, backing off");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(match exhausted {
            Some((429, body)) => SheetError::RateLimitExceeded {
                attempts: self.retry.max_attempts,
                last_error: Some(body),
            },
            Some((status, body)) => SheetError::BackendUnavailable {
                status,
                attempts: self.retry.max_attempts,
                last_error: Some(body),
            },
            None => SheetError::Http("retry budget allows no attempts".to_string()),
        })
    }
}

fn require_spreadsheet_id(id: &str) -> SheetResult<&str> {
    if id.trim().is_empty() {
        return Err(SheetError::invalid_request("spreadsheet id is required"));
    }
    Ok(id)
}

/// Build a sheet-title lookup from a structure read. Unqualified ranges
/// resolve to the first sheet.
fn sheet_ids_from_metadata(meta: &JsonValue) -> SheetIds {
    let entries: &[JsonValue] = meta
        .get("sheets")
        .and_then(JsonValue::as_array)
        .map_or(&[], Vec::as_slice);

    let default_id = entries
        .first()
        .and_then(|entry| entry["properties"]["sheetId"].as_i64())
        .unwrap_or(0);

    let mut sheets = SheetIds::new(default_id);
    for entry in entries {
        let props = &entry["properties"];
        if let (Some(title), Some(id)) = (props["title"].as_str(), props["sheetId"].as_i64()) {
            sheets.insert(title, id);
        }
    }
    sheets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_spreadsheet_id() {
        assert!(require_spreadsheet_id("abc123").is_ok());
        assert!(matches!(
            require_spreadsheet_id(""),
            Err(SheetError::InvalidRequest(_))
        ));
        assert!(matches!(
            require_spreadsheet_id("   "),
            Err(SheetError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_sheet_ids_from_metadata() {
        let meta = json!({
            "spreadsheetId": "abc",
            "sheets": [
                { "properties": { "sheetId": 10, "title": "First", "index": 0 } },
                { "properties": { "sheetId": 77, "title": "Sales", "index": 1 } },
            ]
        });
        let sheets = sheet_ids_from_metadata(&meta);
        assert_eq!(sheets.resolve(None).unwrap(), 10);
        assert_eq!(sheets.resolve(Some("Sales")).unwrap(), 77);
        assert!(sheets.resolve(Some("Missing")).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            SheetsClient::with_base_url(AccessToken::new("t"), "http://localhost:9000/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9000");
    }
}
