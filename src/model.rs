//! Shared domain types: range references, share roles, and the shaped
//! response payloads the tools return.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Resolve a `(sheet, optional A1 range)` reference to the single
/// string the backend expects. Absent range denotes the entire sheet.
pub fn build_range(sheet: &str, range: Option<&str>) -> String {
    match range {
        Some(range) => format!("{sheet}!{range}"),
        None => sheet.to_string(),
    }
}

/// The fixed set of roles a spreadsheet can be shared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ShareRole {
    Reader,
    Commenter,
    Writer,
}

impl ShareRole {
    pub const VALID_ROLES: &'static str = "'reader', 'commenter', or 'writer'";
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetDataResponse {
    pub spreadsheet_id: String,
    pub value_ranges: Vec<ValueRangeData>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ValueRangeData {
    pub range: String,
    pub values: Vec<Vec<Value>>,
}

/// One entry of a get_multiple_sheet_data result: the original query
/// fields plus either `data` or `error`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SheetQueryResult {
    pub spreadsheet_id: String,
    pub sheet: String,
    pub range: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Vec<Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-spreadsheet summary. `error` is populated when the whole
/// spreadsheet fetch failed; per-sheet failures land on the sheet.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SpreadsheetSummary {
    pub spreadsheet_id: String,
    pub title: Option<String>,
    pub sheets: Vec<SheetSummary>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SheetSummary {
    pub title: Option<String>,
    pub sheet_id: Option<i64>,
    pub headers: Vec<Value>,
    pub first_rows: Vec<Vec<Value>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpreadsheetResponse {
    pub spreadsheet_id: String,
    pub title: String,
    pub folder: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSheetResponse {
    pub sheet_id: Option<i64>,
    pub title: Option<String>,
    pub index: Option<i64>,
    pub spreadsheet_id: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SpreadsheetFile {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct FolderEntry {
    pub id: String,
    pub name: String,
    pub parent: String,
}

/// Every recipient of a share_spreadsheet call lands in exactly one of
/// these lists.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct ShareReport {
    pub successes: Vec<ShareSuccess>,
    pub failures: Vec<ShareFailure>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ShareSuccess {
    pub email_address: String,
    pub role: String,
    #[serde(rename = "permissionId")]
    pub permission_id: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ShareFailure {
    pub email_address: Option<String>,
    pub error: String,
}

/// Payload of the `spreadsheet://{id}/info` resource.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SpreadsheetInfo {
    pub title: String,
    pub sheets: Vec<SheetInfo>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetInfo {
    pub title: Option<String>,
    pub sheet_id: Option<i64>,
    pub grid_properties: Value,
}
