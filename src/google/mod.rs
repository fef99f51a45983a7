//! Backend client facade for the Sheets and Drive APIs.
//!
//! The tools talk to these traits, never to HTTP directly; the traits
//! are the seam the integration tests mock.

pub mod drive;
pub mod sheets;
pub mod types;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use types::{DriveFile, SheetProperties, Spreadsheet, ValueRange, ValueRenderOption};

pub const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

const HTTP_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Spreadsheet metadata (title, sheet properties). `fields` narrows
    /// the response server-side.
    async fn get_spreadsheet(
        &self,
        spreadsheet_id: &str,
        fields: Option<&str>,
    ) -> Result<Spreadsheet>;

    /// Full grid (values plus formatting) for the given ranges,
    /// returned verbatim.
    async fn get_spreadsheet_grid(&self, spreadsheet_id: &str, ranges: &[String])
    -> Result<Value>;

    async fn values_get(
        &self,
        spreadsheet_id: &str,
        range: &str,
        render: ValueRenderOption,
    ) -> Result<ValueRange>;

    /// Overwrite one range, values parsed as user-entered.
    async fn values_update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<Value>;

    /// Atomically update several ranges, values parsed as user-entered.
    async fn values_batch_update(&self, spreadsheet_id: &str, data: Vec<ValueRange>)
    -> Result<Value>;

    /// Forward structural requests verbatim to the batchUpdate endpoint.
    async fn batch_update(&self, spreadsheet_id: &str, requests: Vec<Value>) -> Result<Value>;

    /// Copy a sheet into another spreadsheet; returns the new sheet's
    /// properties (including its backend-assigned title).
    async fn copy_sheet_to(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        destination_spreadsheet_id: &str,
    ) -> Result<SheetProperties>;
}

#[async_trait]
pub trait DriveApi: Send + Sync {
    async fn create_file(
        &self,
        name: &str,
        mime_type: &str,
        parent: Option<&str>,
    ) -> Result<DriveFile>;

    async fn list_files(&self, query: &str, order_by: &str) -> Result<Vec<DriveFile>>;

    /// Grant a user-type permission; returns the permission id.
    async fn create_permission(
        &self,
        file_id: &str,
        email: &str,
        role: &str,
        send_notification: bool,
    ) -> Result<String>;
}

/// Authenticated client bundle handed to every tool invocation.
#[derive(Clone)]
pub struct GoogleServices {
    pub sheets: Arc<dyn SheetsApi>,
    pub drive: Arc<dyn DriveApi>,
    /// Default destination folder for created/listed spreadsheets.
    pub folder_id: Option<String>,
}

impl GoogleServices {
    /// Production bundle over HTTP clients sharing one connection pool.
    pub fn connect(token: String, folder_id: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            sheets: Arc::new(sheets::HttpSheetsClient::new(http.clone(), token.clone())),
            drive: Arc::new(drive::HttpDriveClient::new(http, token)),
            folder_id,
        })
    }
}

/// Turn a non-success response into a [`crate::error::BackendError`],
/// extracting Google's error message from the body when present.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);
    Err(crate::error::BackendError { status, message }.into())
}
