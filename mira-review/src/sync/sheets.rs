//! Google Sheets v4 backend
//!
//! Talks to the `values` endpoints of one spreadsheet with a bearer token read
//! from the credential file. Minting tokens from service-account keys is left
//! to whatever provisions that file.

use super::{SheetBackend, SyncError};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
const USER_AGENT: &str = concat!("mira-review/", env!("CARGO_PKG_VERSION"));
const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Contents of the credential file
#[derive(Debug, Deserialize)]
struct Credentials {
    access_token: Option<String>,
    #[serde(default)]
    sheet_name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Extract the spreadsheet id from a `.../spreadsheets/d/<id>/...` URL
///
/// # Examples
/// ```
/// use mira_review::sync::sheets::spreadsheet_id_from_url;
///
/// let url = "https://docs.google.com/spreadsheets/d/1AbC-xyz_9/edit#gid=0";
/// assert_eq!(spreadsheet_id_from_url(url).as_deref(), Some("1AbC-xyz_9"));
/// assert_eq!(spreadsheet_id_from_url("https://example.com/"), None);
/// ```
pub fn spreadsheet_id_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/spreadsheets/d/")?;
    let id: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    (!id.is_empty()).then_some(id)
}

#[derive(Debug)]
pub struct GoogleSheetsBackend {
    client: reqwest::Client,
    spreadsheet_id: String,
    sheet_name: String,
    access_token: String,
    base_url: String,
}

impl GoogleSheetsBackend {
    pub fn new(spreadsheet_id: String, sheet_name: String, access_token: String) -> Result<Self, SyncError> {
        if access_token.trim().is_empty() {
            return Err(SyncError::Unauthorized("Access token must not be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            spreadsheet_id,
            sheet_name,
            access_token: access_token.trim().to_string(),
            base_url: SHEETS_BASE_URL.to_string(),
        })
    }

    /// Build a backend from the configured sheet URL and credential file
    pub fn from_config(sheet_url: &str, credentials_file: &Path) -> Result<Self, SyncError> {
        let spreadsheet_id = spreadsheet_id_from_url(sheet_url)
            .ok_or_else(|| SyncError::Malformed(format!("No spreadsheet id in URL: {}", sheet_url)))?;

        let text = std::fs::read_to_string(credentials_file).map_err(|e| {
            SyncError::Unauthorized(format!("Cannot read {}: {}", credentials_file.display(), e))
        })?;
        let credentials: Credentials = serde_json::from_str(&text)
            .map_err(|e| SyncError::Malformed(format!("Credential file is not valid JSON: {}", e)))?;

        let access_token = match (credentials.access_token, credentials.kind.as_deref()) {
            (Some(token), _) => token,
            (None, Some("service_account")) => {
                return Err(SyncError::Unauthorized(
                    "Service-account keys must be exchanged for an access_token first".to_string(),
                ))
            }
            (None, _) => {
                return Err(SyncError::Unauthorized("Credential file has no access_token".to_string()))
            }
        };

        let sheet_name = credentials
            .sheet_name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());

        Self::new(spreadsheet_id, sheet_name, access_token)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// URL of a `values` range, with an optional `:append`-style suffix on the last segment
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, SyncError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SyncError::Malformed(format!("Invalid sheets base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SyncError::Malformed("Sheets base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    fn row_range(&self, row_number: usize) -> String {
        format!("{}!A{}", self.sheet_name, row_number)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SyncError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| SyncError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Unauthorized(format!("HTTP {}: {}", status.as_u16(), body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn write_range(&self, range: String, row: &[String]) -> Result<(), SyncError> {
        let url = self.values_url(&range, "")?;
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": [row] });
        self.send(
            self.client
                .put(url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
        )
        .await?;
        Ok(())
    }
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetBackend for GoogleSheetsBackend {
    async fn fetch_values(&self) -> Result<Vec<Vec<String>>, SyncError> {
        let url = self.values_url(&self.sheet_name, "")?;
        debug!(spreadsheet = %self.spreadsheet_id, "Fetching sheet values");

        let response = self
            .send(self.client.get(url).query(&[("majorDimension", "ROWS")]))
            .await?;
        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| SyncError::Malformed(format!("Unexpected values payload: {e}")))?;

        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn update_header(&self, header: &[String]) -> Result<(), SyncError> {
        self.write_range(self.row_range(1), header).await
    }

    async fn update_row(&self, row_number: usize, values: &[String]) -> Result<(), SyncError> {
        self.write_range(self.row_range(row_number), values).await
    }

    async fn append_row(&self, values: &[String]) -> Result<(), SyncError> {
        let range = format!("{}!A1", self.sheet_name);
        let url = self.values_url(&range, ":append")?;
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": [values] });
        self.send(
            self.client
                .post(url)
                .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
                .json(&body),
        )
        .await?;
        Ok(())
    }
}
