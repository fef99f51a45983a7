//! HTTP client for the Drive v3 files/permissions API.

use super::types::{DriveFile, FileList};
use super::{DriveApi, check_response};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

const DRIVE_FILES_BASE: &str = "https://www.googleapis.com/drive/v3/files";

pub struct HttpDriveClient {
    http: reqwest::Client,
    token: String,
    base: String,
}

impl HttpDriveClient {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self {
            http,
            token,
            base: DRIVE_FILES_BASE.to_string(),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base).context("invalid Drive base URL")?;
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| anyhow!("Drive base URL cannot be a base"))?;
            for segment in segments {
                parts.push(segment);
            }
        }
        Ok(url)
    }
}

#[derive(Deserialize)]
struct PermissionId {
    #[serde(default)]
    id: String,
}

#[async_trait]
impl DriveApi for HttpDriveClient {
    async fn create_file(
        &self,
        name: &str,
        mime_type: &str,
        parent: Option<&str>,
    ) -> Result<DriveFile> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("supportsAllDrives", "true")
            .append_pair("fields", "id,name,parents");

        let mut metadata = serde_json::json!({
            "name": name,
            "mimeType": mime_type,
        });
        if let Some(parent) = parent {
            metadata["parents"] = serde_json::json!([parent]);
        }

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&metadata)
            .send()
            .await
            .context("Drive create request failed")?;
        check_response(response)
            .await?
            .json()
            .await
            .context("parse Drive create response")
    }

    async fn list_files(&self, query: &str, order_by: &str) -> Result<Vec<DriveFile>> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("spaces", "drive")
            .append_pair("includeItemsFromAllDrives", "true")
            .append_pair("supportsAllDrives", "true")
            .append_pair("fields", "files(id,name,parents)")
            .append_pair("orderBy", order_by);

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Drive list request failed")?;
        let list: FileList = check_response(response)
            .await?
            .json()
            .await
            .context("parse Drive list response")?;
        Ok(list.files)
    }

    async fn create_permission(
        &self,
        file_id: &str,
        email: &str,
        role: &str,
        send_notification: bool,
    ) -> Result<String> {
        let mut url = self.url(&[file_id, "permissions"])?;
        url.query_pairs_mut()
            .append_pair(
                "sendNotificationEmail",
                if send_notification { "true" } else { "false" },
            )
            .append_pair("supportsAllDrives", "true")
            .append_pair("fields", "id");

        let body = serde_json::json!({
            "type": "user",
            "role": role,
            "emailAddress": email,
        });

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("Drive permission request failed")?;
        let permission: PermissionId = check_response(response)
            .await?
            .json()
            .await
            .context("parse Drive permission response")?;
        Ok(permission.id)
    }
}
