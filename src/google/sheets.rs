//! HTTP client for the Sheets v4 API.

use super::types::{SheetProperties, Spreadsheet, ValueRange, ValueRenderOption};
use super::{SheetsApi, check_response};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct HttpSheetsClient {
    http: reqwest::Client,
    token: String,
    base: String,
}

impl HttpSheetsClient {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self {
            http,
            token,
            base: SHEETS_BASE.to_string(),
        }
    }

    // Segments are pushed one at a time so ranges like "Sheet 1!A1:B2"
    // get percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base).context("invalid Sheets base URL")?;
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| anyhow!("Sheets base URL cannot be a base"))?;
            for segment in segments {
                parts.push(segment);
            }
        }
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Sheets request failed")?;
        check_response(response)
            .await?
            .json()
            .await
            .context("parse Sheets response")
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        body: &Value,
    ) -> Result<T> {
        let response = request
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .context("Sheets request failed")?;
        check_response(response)
            .await?
            .json()
            .await
            .context("parse Sheets response")
    }
}

#[async_trait]
impl SheetsApi for HttpSheetsClient {
    async fn get_spreadsheet(
        &self,
        spreadsheet_id: &str,
        fields: Option<&str>,
    ) -> Result<Spreadsheet> {
        let mut url = self.url(&[spreadsheet_id])?;
        if let Some(fields) = fields {
            url.query_pairs_mut().append_pair("fields", fields);
        }
        self.get_json(url).await
    }

    async fn get_spreadsheet_grid(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Result<Value> {
        let mut url = self.url(&[spreadsheet_id])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("includeGridData", "true");
            for range in ranges {
                pairs.append_pair("ranges", range);
            }
        }
        self.get_json(url).await
    }

    async fn values_get(
        &self,
        spreadsheet_id: &str,
        range: &str,
        render: ValueRenderOption,
    ) -> Result<ValueRange> {
        let mut url = self.url(&[spreadsheet_id, "values", range])?;
        if render != ValueRenderOption::FormattedValue {
            url.query_pairs_mut()
                .append_pair("valueRenderOption", render.as_str());
        }
        self.get_json(url).await
    }

    async fn values_update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<Value> {
        let mut url = self.url(&[spreadsheet_id, "values", range])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        let body = serde_json::json!({ "values": values });
        self.send_json(self.http.put(url), &body).await
    }

    async fn values_batch_update(
        &self,
        spreadsheet_id: &str,
        data: Vec<ValueRange>,
    ) -> Result<Value> {
        let url = self.url(&[spreadsheet_id, "values:batchUpdate"])?;
        let body = serde_json::json!({
            "valueInputOption": "USER_ENTERED",
            "data": data,
        });
        self.send_json(self.http.post(url), &body).await
    }

    async fn batch_update(&self, spreadsheet_id: &str, requests: Vec<Value>) -> Result<Value> {
        let url = self.url(&[&format!("{spreadsheet_id}:batchUpdate")])?;
        let body = serde_json::json!({ "requests": requests });
        self.send_json(self.http.post(url), &body).await
    }

    async fn copy_sheet_to(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        destination_spreadsheet_id: &str,
    ) -> Result<SheetProperties> {
        let url = self.url(&[
            spreadsheet_id,
            "sheets",
            &format!("{sheet_id}:copyTo"),
        ])?;
        let body = serde_json::json!({
            "destinationSpreadsheetId": destination_spreadsheet_id,
        });
        self.send_json(self.http.post(url), &body).await
    }
}
