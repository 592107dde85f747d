//! REST client for the Google Sheets v4 endpoints used by the service:
//! reading a values range, writing a single cell, and reading spreadsheet
//! metadata.

use async_trait::async_trait;
use podscript_core::error::{CoreError, UpstreamKind};
use podscript_core::providers::{SheetInfo, SpreadsheetProvider};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::a1;
use crate::auth::SheetsAuth;

/// Base URL of the Sheets v4 spreadsheets collection.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Service label used in upstream errors.
const SERVICE: &str = "spreadsheet";

/// Errors from the Sheets REST layer.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Sheets API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// Credentials could not be loaded or exchanged.
    #[error("Sheets authentication failed: {0}")]
    Auth(String),

    /// The client was built with an unusable base URL or spreadsheet id.
    #[error("Invalid Sheets request: {0}")]
    InvalidRequest(String),
}

/// Map an HTTP status from the API to the kind of upstream failure.
pub fn kind_for_status(status: u16) -> UpstreamKind {
    match status {
        429 => UpstreamKind::RateLimited,
        401 | 403 => UpstreamKind::Unauthorized,
        _ => UpstreamKind::ServerError,
    }
}

impl From<SheetsError> for CoreError {
    fn from(err: SheetsError) -> Self {
        let kind = match &err {
            SheetsError::Request(e) if e.is_decode() => UpstreamKind::InvalidResponse,
            SheetsError::Request(_) => UpstreamKind::Unreachable,
            SheetsError::ApiError { status, .. } => kind_for_status(*status),
            SheetsError::Auth(_) => UpstreamKind::Unauthorized,
            SheetsError::InvalidRequest(_) => {
                return CoreError::Internal(err.to_string());
            }
        };
        CoreError::upstream(SERVICE, kind, err.to_string())
    }
}

/// Body of `GET .../values/{range}`.
#[derive(Debug, Deserialize)]
struct ValueRange {
    /// Absent entirely when the range holds no data.
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Body of `GET /{spreadsheetId}?fields=...`.
#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    properties: TitleProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: TitleProperties,
}

#[derive(Debug, Deserialize)]
struct TitleProperties {
    title: String,
}

/// Render one cell of a values response as text. Formatted values already
/// arrive as strings; numbers and booleans appear when unformatted values
/// are requested.
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// HTTP client for one spreadsheet.
pub struct SheetsApi {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    /// Tab that cell updates are written to, taken from the configured range.
    tab: String,
    /// Top-left cell of the configured range; `None` when it is not valid A1.
    origin: Option<(usize, usize)>,
    auth: SheetsAuth,
}

impl SheetsApi {
    /// Create a client for `spreadsheet_id`. Cell updates go to the tab named
    /// by `sheet_range` (e.g. `Sheet1!A:Z` writes to `Sheet1`).
    pub fn new(spreadsheet_id: String, sheet_range: &str, auth: SheetsAuth) -> Self {
        Self::with_client(
            reqwest::Client::new(),
            DEFAULT_BASE_URL.to_string(),
            spreadsheet_id,
            sheet_range,
            auth,
        )
    }

    /// Create a client reusing an existing [`reqwest::Client`] and pointing at
    /// an alternative base URL.
    pub fn with_client(
        client: reqwest::Client,
        base_url: String,
        spreadsheet_id: String,
        sheet_range: &str,
        auth: SheetsAuth,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            spreadsheet_id,
            tab: a1::tab_of(sheet_range).to_string(),
            origin: a1::range_origin(sheet_range),
            auth,
        }
    }

    /// Read a range as rows of text.
    pub async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.url(&["values", range])?;
        let token = self.auth.bearer(&self.client).await?;

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let body: ValueRange = Self::parse_response(response).await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    /// Write `value` to a single cell as if typed by a user.
    ///
    /// `row` (1-based) and `column` (zero-based) count from the top-left cell
    /// of the configured range, matching the rows returned by
    /// [`read_range`](Self::read_range) for that range.
    pub async fn write_cell(&self, row: usize, column: usize, value: &str) -> Result<(), SheetsError> {
        let (first_column, first_row) = self.origin.ok_or_else(|| {
            SheetsError::InvalidRequest(format!("range on tab {} has no valid start cell", self.tab))
        })?;
        let range = a1::cell_range(&self.tab, row + first_row - 1, column + first_column);
        let mut url = self.url(&["values", &range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "USER_ENTERED");
        let token = self.auth.bearer(&self.client).await?;

        let body = serde_json::json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [[value]],
        });
        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Spreadsheet title and tab names.
    pub async fn metadata(&self) -> Result<SheetInfo, SheetsError> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "properties.title,sheets.properties.title");
        let token = self.auth.bearer(&self.client).await?;

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let meta: SpreadsheetMeta = Self::parse_response(response).await?;

        Ok(SheetInfo {
            title: meta.properties.title,
            tabs: meta.sheets.into_iter().map(|s| s.properties.title).collect(),
        })
    }

    // ---- private helpers ----

    /// `{base}/{spreadsheetId}/{segments...}` with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetsError::InvalidRequest(format!("bad base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| SheetsError::InvalidRequest(format!("base URL {} cannot hold a path", self.base_url)))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    /// Ensure the response has a success status code, or turn it into a
    /// [`SheetsError::ApiError`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SheetsError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SheetsError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), SheetsError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetProvider for SheetsApi {
    async fn get_rows(&self, range: &str) -> Result<Vec<Vec<String>>, CoreError> {
        let rows = self.read_range(range).await.map_err(|e| {
            tracing::error!(range, error = %e, "Failed to read spreadsheet range");
            CoreError::from(e)
        })?;
        tracing::debug!(range, rows = rows.len(), "Read spreadsheet range");
        Ok(rows)
    }

    async fn update_cell(&self, row: usize, column: usize, value: &str) -> Result<(), CoreError> {
        self.write_cell(row, column, value).await.map_err(|e| {
            tracing::error!(row, column, error = %e, "Failed to update spreadsheet cell");
            CoreError::from(e)
        })?;
        tracing::info!(row, column, value, "Updated spreadsheet cell");
        Ok(())
    }

    async fn describe(&self) -> Result<SheetInfo, CoreError> {
        Ok(self.metadata().await?)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn status_kinds() {
        assert_eq!(kind_for_status(429), UpstreamKind::RateLimited);
        assert_eq!(kind_for_status(401), UpstreamKind::Unauthorized);
        assert_eq!(kind_for_status(403), UpstreamKind::Unauthorized);
        assert_eq!(kind_for_status(500), UpstreamKind::ServerError);
        assert_eq!(kind_for_status(404), UpstreamKind::ServerError);
    }

    #[test]
    fn api_errors_become_upstream_core_errors() {
        let err: CoreError = SheetsError::ApiError {
            status: 429,
            body: "quota".into(),
        }
        .into();

        assert_matches!(
            err,
            CoreError::Upstream {
                service: "spreadsheet",
                kind: UpstreamKind::RateLimited,
                ..
            }
        );
    }

    #[test]
    fn value_range_without_values_is_empty() {
        let body: ValueRange = serde_json::from_value(json!({
            "range": "Sheet1!A1:Z1000",
            "majorDimension": "ROWS"
        }))
        .unwrap();
        assert!(body.values.is_empty());
    }

    #[test]
    fn non_string_cells_are_rendered_as_text() {
        assert_eq!(cell_text(json!("High")), "High");
        assert_eq!(cell_text(json!(45658)), "45658");
        assert_eq!(cell_text(json!(true)), "true");
        assert_eq!(cell_text(Value::Null), "");
    }

    #[test]
    fn urls_encode_tab_names() {
        let api = SheetsApi::new("abc123".into(), "Sheet1!A:Z", SheetsAuth::Static("t".into()));

        let url = api.url(&["values", "'Q3 Plan'!A:Z"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'Q3%20Plan'!A:Z"
        );
    }
}
