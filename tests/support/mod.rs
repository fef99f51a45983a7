//! Scripted Sheets/Drive backends for integration tests.
//!
//! Mocks record every call so tests can assert on ordering and on
//! which backend operations were (or were not) reached.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use gsheets_mcp::config::{CredentialSources, ServerConfig, TransportKind};
use gsheets_mcp::google::types::{
    DriveFile, Sheet, SheetProperties, Spreadsheet, SpreadsheetProperties, ValueRange,
    ValueRenderOption,
};
use gsheets_mcp::google::{DriveApi, GoogleServices, SheetsApi};
use gsheets_mcp::state::{AppState, ServiceConnector};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub fn test_config() -> ServerConfig {
    ServerConfig {
        credentials: CredentialSources::default(),
        default_folder_id: None,
        enabled_tools: None,
        transport: TransportKind::Stdio,
        http_bind_address: "127.0.0.1:0".parse().expect("test bind address"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetsCall {
    GetSpreadsheet {
        spreadsheet_id: String,
        fields: Option<String>,
    },
    GetGrid {
        spreadsheet_id: String,
        ranges: Vec<String>,
    },
    ValuesGet {
        spreadsheet_id: String,
        range: String,
        render: &'static str,
    },
    ValuesUpdate {
        spreadsheet_id: String,
        range: String,
        values: Vec<Vec<Value>>,
    },
    ValuesBatchUpdate {
        spreadsheet_id: String,
        ranges: Vec<String>,
    },
    BatchUpdate {
        spreadsheet_id: String,
        requests: Vec<Value>,
    },
    CopyTo {
        spreadsheet_id: String,
        sheet_id: i64,
        destination: String,
    },
}

#[derive(Default)]
pub struct MockSheetsApi {
    spreadsheets: HashMap<String, Spreadsheet>,
    failing_spreadsheets: HashMap<String, String>,
    values: HashMap<(String, String), Vec<Vec<Value>>>,
    failing_ranges: HashMap<(String, String), String>,
    batch_update_response: Value,
    copy_result: Option<SheetProperties>,
    calls: Mutex<Vec<SheetsCall>>,
}

impl MockSheetsApi {
    /// Script spreadsheet metadata with `(title, sheet_id)` tabs.
    pub fn with_spreadsheet(mut self, id: &str, title: &str, tabs: &[(&str, i64)]) -> Self {
        let sheets = tabs
            .iter()
            .map(|(tab_title, sheet_id)| Sheet {
                properties: SheetProperties {
                    sheet_id: Some(*sheet_id),
                    title: Some(tab_title.to_string()),
                    ..SheetProperties::default()
                },
            })
            .collect();
        self.spreadsheets.insert(
            id.to_string(),
            Spreadsheet {
                spreadsheet_id: id.to_string(),
                properties: SpreadsheetProperties {
                    title: Some(title.to_string()),
                },
                sheets,
            },
        );
        self
    }

    pub fn with_failing_spreadsheet(mut self, id: &str, message: &str) -> Self {
        self.failing_spreadsheets
            .insert(id.to_string(), message.to_string());
        self
    }

    /// Script the values returned for one full `sheet!range` reference.
    pub fn with_values(mut self, id: &str, range: &str, values: Vec<Vec<Value>>) -> Self {
        self.values
            .insert((id.to_string(), range.to_string()), values);
        self
    }

    pub fn with_failing_range(mut self, id: &str, range: &str, message: &str) -> Self {
        self.failing_ranges
            .insert((id.to_string(), range.to_string()), message.to_string());
        self
    }

    pub fn with_batch_update_response(mut self, response: Value) -> Self {
        self.batch_update_response = response;
        self
    }

    /// Script the sheet properties copy_sheet_to hands back (the
    /// backend assigns the title).
    pub fn with_copy_result(mut self, sheet_id: i64, title: &str) -> Self {
        self.copy_result = Some(SheetProperties {
            sheet_id: Some(sheet_id),
            title: Some(title.to_string()),
            ..SheetProperties::default()
        });
        self
    }

    pub fn calls(&self) -> Vec<SheetsCall> {
        self.calls.lock().clone()
    }

    pub fn batch_update_calls(&self) -> Vec<SheetsCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, SheetsCall::BatchUpdate { .. }))
            .collect()
    }
}

#[async_trait]
impl SheetsApi for MockSheetsApi {
    async fn get_spreadsheet(
        &self,
        spreadsheet_id: &str,
        fields: Option<&str>,
    ) -> Result<Spreadsheet> {
        self.calls.lock().push(SheetsCall::GetSpreadsheet {
            spreadsheet_id: spreadsheet_id.to_string(),
            fields: fields.map(str::to_string),
        });
        if let Some(message) = self.failing_spreadsheets.get(spreadsheet_id) {
            return Err(anyhow!("{message}"));
        }
        self.spreadsheets
            .get(spreadsheet_id)
            .cloned()
            .ok_or_else(|| anyhow!("spreadsheet '{spreadsheet_id}' not scripted"))
    }

    async fn get_spreadsheet_grid(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Result<Value> {
        self.calls.lock().push(SheetsCall::GetGrid {
            spreadsheet_id: spreadsheet_id.to_string(),
            ranges: ranges.to_vec(),
        });
        Ok(serde_json::json!({
            "spreadsheetId": spreadsheet_id,
            "sheets": [],
        }))
    }

    async fn values_get(
        &self,
        spreadsheet_id: &str,
        range: &str,
        render: ValueRenderOption,
    ) -> Result<ValueRange> {
        self.calls.lock().push(SheetsCall::ValuesGet {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            render: render.as_str(),
        });
        let key = (spreadsheet_id.to_string(), range.to_string());
        if let Some(message) = self.failing_ranges.get(&key) {
            return Err(anyhow!("{message}"));
        }
        Ok(ValueRange {
            range: Some(range.to_string()),
            major_dimension: None,
            values: self.values.get(&key).cloned().unwrap_or_default(),
        })
    }

    async fn values_update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<Value> {
        self.calls.lock().push(SheetsCall::ValuesUpdate {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            values,
        });
        Ok(serde_json::json!({ "updatedRange": range }))
    }

    async fn values_batch_update(
        &self,
        spreadsheet_id: &str,
        data: Vec<ValueRange>,
    ) -> Result<Value> {
        let ranges = data
            .iter()
            .map(|entry| entry.range.clone().unwrap_or_default())
            .collect::<Vec<_>>();
        self.calls.lock().push(SheetsCall::ValuesBatchUpdate {
            spreadsheet_id: spreadsheet_id.to_string(),
            ranges: ranges.clone(),
        });
        Ok(serde_json::json!({ "totalUpdatedRanges": ranges.len() }))
    }

    async fn batch_update(&self, spreadsheet_id: &str, requests: Vec<Value>) -> Result<Value> {
        self.calls.lock().push(SheetsCall::BatchUpdate {
            spreadsheet_id: spreadsheet_id.to_string(),
            requests,
        });
        Ok(self.batch_update_response.clone())
    }

    async fn copy_sheet_to(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        destination_spreadsheet_id: &str,
    ) -> Result<SheetProperties> {
        self.calls.lock().push(SheetsCall::CopyTo {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_id,
            destination: destination_spreadsheet_id.to_string(),
        });
        self.copy_result
            .clone()
            .ok_or_else(|| anyhow!("copy result not scripted"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriveCall {
    CreateFile {
        name: String,
        mime_type: String,
        parent: Option<String>,
    },
    ListFiles {
        query: String,
        order_by: String,
    },
    CreatePermission {
        file_id: String,
        email: String,
        role: String,
        send_notification: bool,
    },
}

#[derive(Default)]
pub struct MockDriveApi {
    create_result: Option<DriveFile>,
    list_result: Vec<DriveFile>,
    failing_emails: HashMap<String, String>,
    calls: Mutex<Vec<DriveCall>>,
}

impl MockDriveApi {
    pub fn with_create_result(mut self, id: &str, name: &str, parents: &[&str]) -> Self {
        self.create_result = Some(DriveFile {
            id: id.to_string(),
            name: name.to_string(),
            parents: parents.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    pub fn with_file(mut self, id: &str, name: &str, parents: &[&str]) -> Self {
        self.list_result.push(DriveFile {
            id: id.to_string(),
            name: name.to_string(),
            parents: parents.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    pub fn with_failing_email(mut self, email: &str, message: &str) -> Self {
        self.failing_emails
            .insert(email.to_string(), message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<DriveCall> {
        self.calls.lock().clone()
    }

    pub fn permission_calls(&self) -> Vec<DriveCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, DriveCall::CreatePermission { .. }))
            .collect()
    }
}

#[async_trait]
impl DriveApi for MockDriveApi {
    async fn create_file(
        &self,
        name: &str,
        mime_type: &str,
        parent: Option<&str>,
    ) -> Result<DriveFile> {
        self.calls.lock().push(DriveCall::CreateFile {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            parent: parent.map(str::to_string),
        });
        self.create_result
            .clone()
            .ok_or_else(|| anyhow!("create result not scripted"))
    }

    async fn list_files(&self, query: &str, order_by: &str) -> Result<Vec<DriveFile>> {
        self.calls.lock().push(DriveCall::ListFiles {
            query: query.to_string(),
            order_by: order_by.to_string(),
        });
        Ok(self.list_result.clone())
    }

    async fn create_permission(
        &self,
        file_id: &str,
        email: &str,
        role: &str,
        send_notification: bool,
    ) -> Result<String> {
        let permission_number = self.permission_calls().len() + 1;
        self.calls.lock().push(DriveCall::CreatePermission {
            file_id: file_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            send_notification,
        });
        if let Some(message) = self.failing_emails.get(email) {
            return Err(anyhow!("{message}"));
        }
        Ok(format!("perm-{permission_number}"))
    }
}

struct StaticConnector {
    services: GoogleServices,
}

#[async_trait]
impl ServiceConnector for StaticConnector {
    async fn connect(&self) -> Result<GoogleServices> {
        Ok(self.services.clone())
    }
}

/// Application state wired to scripted backends.
pub fn app_state(
    sheets: Arc<MockSheetsApi>,
    drive: Arc<MockDriveApi>,
    folder_id: Option<String>,
) -> Arc<AppState> {
    let services = GoogleServices {
        sheets,
        drive,
        folder_id,
    };
    Arc::new(AppState::with_connector(
        Arc::new(test_config()),
        Arc::new(StaticConnector { services }),
    ))
}
