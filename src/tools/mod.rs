//! Tool handlers: request shaping, backend call sequence, response
//! shaping, and the per-tool error policy.
//!
//! Backend failures normally propagate as protocol errors. The
//! exceptions are documented per handler: sheet-name lookups that miss
//! return `{"error": ...}` as data, and list-oriented tools isolate
//! per-item failures so one bad entry never aborts its siblings.

use crate::google::types::{ValueRange, ValueRenderOption};
use crate::google::{FOLDER_MIME, GoogleServices, SPREADSHEET_MIME};
use crate::model::{
    CreateSheetResponse, CreateSpreadsheetResponse, FolderEntry, ShareFailure, ShareReport,
    ShareRole, ShareSuccess, SheetDataResponse, SheetInfo, SheetQueryResult, SheetSummary,
    SpreadsheetFile, SpreadsheetInfo, SpreadsheetSummary, ValueRangeData, build_range,
};
use crate::state::AppState;
use anyhow::Result;
use futures::future::join_all;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_SUMMARY_ROWS: u32 = 5;

const SHEET_ID_FIELDS: &str = "sheets(properties(sheetId,title))";
const SUMMARY_FIELDS: &str = "properties.title,sheets(properties(title,sheetId))";

fn default_true() -> bool {
    true
}

fn default_summary_rows() -> u32 {
    DEFAULT_SUMMARY_ROWS
}

/// Resolve a sheet's numeric id by title. `Ok(None)` means the name
/// did not match; callers decide whether that is data or an error.
async fn resolve_sheet_id(
    services: &GoogleServices,
    spreadsheet_id: &str,
    sheet_name: &str,
) -> Result<Option<i64>> {
    let spreadsheet = services
        .sheets
        .get_spreadsheet(spreadsheet_id, Some(SHEET_ID_FIELDS))
        .await?;
    Ok(spreadsheet
        .sheets
        .into_iter()
        .find(|sheet| sheet.properties.title.as_deref() == Some(sheet_name))
        .and_then(|sheet| sheet.properties.sheet_id))
}

fn sheet_not_found(sheet: &str) -> Value {
    serde_json::json!({ "error": format!("Sheet '{sheet}' not found") })
}

// ---------------------------------------------------------------------------
// get_sheet_data
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetSheetDataParams {
    /// The ID of the spreadsheet (found in the URL)
    pub spreadsheet_id: String,
    /// The name of the sheet
    pub sheet: String,
    /// Optional cell range in A1 notation (e.g. 'A1:C10'); the entire
    /// sheet when omitted
    pub range: Option<String>,
    /// Include cell formatting and other metadata (values only when
    /// false, which is cheaper)
    #[serde(default)]
    pub include_grid_data: bool,
}

pub async fn get_sheet_data(state: Arc<AppState>, params: GetSheetDataParams) -> Result<Value> {
    let services = state.services().await?;
    let full_range = build_range(&params.sheet, params.range.as_deref());

    if params.include_grid_data {
        services
            .sheets
            .get_spreadsheet_grid(&params.spreadsheet_id, std::slice::from_ref(&full_range))
            .await
    } else {
        let value_range = services
            .sheets
            .values_get(
                &params.spreadsheet_id,
                &full_range,
                ValueRenderOption::FormattedValue,
            )
            .await?;
        let response = SheetDataResponse {
            spreadsheet_id: params.spreadsheet_id,
            value_ranges: vec![ValueRangeData {
                range: full_range,
                values: value_range.values,
            }],
        };
        Ok(serde_json::to_value(response)?)
    }
}

// ---------------------------------------------------------------------------
// get_sheet_formulas
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetSheetFormulasParams {
    pub spreadsheet_id: String,
    pub sheet: String,
    /// Optional cell range in A1 notation; whole sheet when omitted
    pub range: Option<String>,
}

pub async fn get_sheet_formulas(
    state: Arc<AppState>,
    params: GetSheetFormulasParams,
) -> Result<Vec<Vec<Value>>> {
    let services = state.services().await?;
    let full_range = build_range(&params.sheet, params.range.as_deref());
    let value_range = services
        .sheets
        .values_get(
            &params.spreadsheet_id,
            &full_range,
            ValueRenderOption::Formula,
        )
        .await?;
    Ok(value_range.values)
}

// ---------------------------------------------------------------------------
// update_cells
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateCellsParams {
    pub spreadsheet_id: String,
    pub sheet: String,
    /// Cell range in A1 notation (e.g. 'A1:C10')
    pub range: String,
    /// 2D array of values to write; formulas are evaluated, types
    /// inferred (user-entered parsing)
    pub data: Vec<Vec<Value>>,
}

pub async fn update_cells(state: Arc<AppState>, params: UpdateCellsParams) -> Result<Value> {
    let services = state.services().await?;
    let full_range = build_range(&params.sheet, Some(&params.range));
    services
        .sheets
        .values_update(&params.spreadsheet_id, &full_range, params.data)
        .await
}

// ---------------------------------------------------------------------------
// batch_update_cells
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BatchUpdateCellsParams {
    pub spreadsheet_id: String,
    pub sheet: String,
    /// Map of A1 range strings to 2D value arrays; applied atomically
    /// in caller order
    pub ranges: IndexMap<String, Vec<Vec<Value>>>,
}

pub async fn batch_update_cells(
    state: Arc<AppState>,
    params: BatchUpdateCellsParams,
) -> Result<Value> {
    let services = state.services().await?;
    let data = params
        .ranges
        .into_iter()
        .map(|(range, values)| ValueRange {
            range: Some(build_range(&params.sheet, Some(&range))),
            major_dimension: None,
            values,
        })
        .collect();
    services
        .sheets
        .values_batch_update(&params.spreadsheet_id, data)
        .await
}

// ---------------------------------------------------------------------------
// add_rows / add_columns
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddRowsParams {
    pub spreadsheet_id: String,
    pub sheet: String,
    /// Number of rows to add
    pub count: u32,
    /// 0-based row index to start at; beginning of the sheet when
    /// omitted
    pub start_row: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddColumnsParams {
    pub spreadsheet_id: String,
    pub sheet: String,
    /// Number of columns to add
    pub count: u32,
    /// 0-based column index to start at; beginning of the sheet when
    /// omitted
    pub start_column: Option<u32>,
}

pub async fn add_rows(state: Arc<AppState>, params: AddRowsParams) -> Result<Value> {
    insert_dimension(
        state,
        params.spreadsheet_id,
        params.sheet,
        "ROWS",
        params.start_row.unwrap_or(0),
        params.count,
    )
    .await
}

pub async fn add_columns(state: Arc<AppState>, params: AddColumnsParams) -> Result<Value> {
    insert_dimension(
        state,
        params.spreadsheet_id,
        params.sheet,
        "COLUMNS",
        params.start_column.unwrap_or(0),
        params.count,
    )
    .await
}

async fn insert_dimension(
    state: Arc<AppState>,
    spreadsheet_id: String,
    sheet: String,
    dimension: &str,
    start: u32,
    count: u32,
) -> Result<Value> {
    let services = state.services().await?;
    let Some(sheet_id) = resolve_sheet_id(&services, &spreadsheet_id, &sheet).await? else {
        return Ok(sheet_not_found(&sheet));
    };

    // Inserting at index 0 has no preceding row/column to inherit
    // formatting from.
    let request = serde_json::json!({
        "insertDimension": {
            "range": {
                "sheetId": sheet_id,
                "dimension": dimension,
                "startIndex": start,
                "endIndex": start + count,
            },
            "inheritFromBefore": start > 0,
        }
    });
    services
        .sheets
        .batch_update(&spreadsheet_id, vec![request])
        .await
}

// ---------------------------------------------------------------------------
// list_sheets
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListSheetsParams {
    pub spreadsheet_id: String,
}

pub async fn list_sheets(state: Arc<AppState>, params: ListSheetsParams) -> Result<Vec<String>> {
    let services = state.services().await?;
    let spreadsheet = services
        .sheets
        .get_spreadsheet(&params.spreadsheet_id, Some("sheets(properties(title))"))
        .await?;
    Ok(spreadsheet
        .sheets
        .into_iter()
        .map(|sheet| sheet.properties.title.unwrap_or_default())
        .collect())
}

// ---------------------------------------------------------------------------
// copy_sheet
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CopySheetParams {
    /// Source spreadsheet ID
    pub src_spreadsheet: String,
    /// Source sheet name
    pub src_sheet: String,
    /// Destination spreadsheet ID
    pub dst_spreadsheet: String,
    /// Desired sheet name in the destination
    pub dst_sheet: String,
}

pub async fn copy_sheet(state: Arc<AppState>, params: CopySheetParams) -> Result<Value> {
    let services = state.services().await?;
    let Some(src_sheet_id) =
        resolve_sheet_id(&services, &params.src_spreadsheet, &params.src_sheet).await?
    else {
        return Ok(serde_json::json!({
            "error": format!("Source sheet '{}' not found", params.src_sheet)
        }));
    };

    let copy = services
        .sheets
        .copy_sheet_to(&params.src_spreadsheet, src_sheet_id, &params.dst_spreadsheet)
        .await?;

    // The backend assigns a "Copy of ..." title; rename only when it
    // differs from what the caller asked for.
    if copy.title.as_deref() != Some(params.dst_sheet.as_str()) {
        let rename_request = serde_json::json!({
            "updateSheetProperties": {
                "properties": {
                    "sheetId": copy.sheet_id,
                    "title": params.dst_sheet,
                },
                "fields": "title",
            }
        });
        let rename = services
            .sheets
            .batch_update(&params.dst_spreadsheet, vec![rename_request])
            .await?;
        Ok(serde_json::json!({ "copy": copy, "rename": rename }))
    } else {
        Ok(serde_json::json!({ "copy": copy }))
    }
}

// ---------------------------------------------------------------------------
// rename_sheet
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenameSheetParams {
    /// Spreadsheet ID
    pub spreadsheet: String,
    /// Current sheet name
    pub sheet: String,
    /// New sheet name
    pub new_name: String,
}

pub async fn rename_sheet(state: Arc<AppState>, params: RenameSheetParams) -> Result<Value> {
    let services = state.services().await?;
    let Some(sheet_id) = resolve_sheet_id(&services, &params.spreadsheet, &params.sheet).await?
    else {
        return Ok(sheet_not_found(&params.sheet));
    };

    let request = serde_json::json!({
        "updateSheetProperties": {
            "properties": {
                "sheetId": sheet_id,
                "title": params.new_name,
            },
            "fields": "title",
        }
    });
    services
        .sheets
        .batch_update(&params.spreadsheet, vec![request])
        .await
}

// ---------------------------------------------------------------------------
// get_multiple_sheet_data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SheetQuery {
    pub spreadsheet_id: String,
    pub sheet: String,
    pub range: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetMultipleSheetDataParams {
    /// Queries to run; each succeeds or fails independently
    pub queries: Vec<SheetQuery>,
}

pub async fn get_multiple_sheet_data(
    state: Arc<AppState>,
    params: GetMultipleSheetDataParams,
) -> Result<Vec<SheetQueryResult>> {
    let services = state.services().await?;

    // join_all keeps output order aligned with input order.
    let fetches = params.queries.into_iter().map(|query| {
        let services = services.clone();
        async move {
            let full_range = build_range(&query.sheet, Some(&query.range));
            match services
                .sheets
                .values_get(
                    &query.spreadsheet_id,
                    &full_range,
                    ValueRenderOption::FormattedValue,
                )
                .await
            {
                Ok(value_range) => SheetQueryResult {
                    spreadsheet_id: query.spreadsheet_id,
                    sheet: query.sheet,
                    range: query.range,
                    data: Some(value_range.values),
                    error: None,
                },
                Err(error) => SheetQueryResult {
                    spreadsheet_id: query.spreadsheet_id,
                    sheet: query.sheet,
                    range: query.range,
                    data: None,
                    error: Some(error.to_string()),
                },
            }
        }
    });

    Ok(join_all(fetches).await)
}

// ---------------------------------------------------------------------------
// get_multiple_spreadsheet_summary
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetMultipleSpreadsheetSummaryParams {
    pub spreadsheet_ids: Vec<String>,
    /// Number of rows to sample per sheet
    #[serde(default = "default_summary_rows")]
    pub rows_to_fetch: u32,
}

pub async fn get_multiple_spreadsheet_summary(
    state: Arc<AppState>,
    params: GetMultipleSpreadsheetSummaryParams,
) -> Result<Vec<SpreadsheetSummary>> {
    let services = state.services().await?;
    let rows_to_fetch = params.rows_to_fetch.max(1);
    let mut summaries = Vec::with_capacity(params.spreadsheet_ids.len());

    for spreadsheet_id in params.spreadsheet_ids {
        let mut summary = SpreadsheetSummary {
            spreadsheet_id: spreadsheet_id.clone(),
            title: None,
            sheets: Vec::new(),
            error: None,
        };

        match services
            .sheets
            .get_spreadsheet(&spreadsheet_id, Some(SUMMARY_FIELDS))
            .await
        {
            Ok(spreadsheet) => {
                summary.title = Some(
                    spreadsheet
                        .properties
                        .title
                        .unwrap_or_else(|| "Unknown Title".to_string()),
                );

                for sheet in spreadsheet.sheets {
                    let mut sheet_summary = SheetSummary {
                        title: sheet.properties.title.clone(),
                        sheet_id: sheet.properties.sheet_id,
                        headers: Vec::new(),
                        first_rows: Vec::new(),
                        error: None,
                    };

                    let Some(sheet_title) = sheet.properties.title else {
                        sheet_summary.error = Some("Sheet title not found".to_string());
                        summary.sheets.push(sheet_summary);
                        continue;
                    };

                    let sample_range = format!("{sheet_title}!A1:{rows_to_fetch}");
                    match services
                        .sheets
                        .values_get(
                            &spreadsheet_id,
                            &sample_range,
                            ValueRenderOption::FormattedValue,
                        )
                        .await
                    {
                        Ok(value_range) => {
                            let mut values = value_range.values;
                            if !values.is_empty() {
                                sheet_summary.headers = values.remove(0);
                                values.truncate(rows_to_fetch.saturating_sub(1) as usize);
                                sheet_summary.first_rows = values;
                            }
                        }
                        Err(error) => {
                            sheet_summary.error = Some(format!("Error fetching data: {error}"));
                        }
                    }

                    summary.sheets.push(sheet_summary);
                }
            }
            Err(error) => {
                summary.error = Some(format!("Error fetching spreadsheet: {error}"));
            }
        }

        summaries.push(summary);
    }

    Ok(summaries)
}

// ---------------------------------------------------------------------------
// create_spreadsheet
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateSpreadsheetParams {
    /// Title of the new spreadsheet
    pub title: String,
    /// Drive folder to create it in; the configured default folder (or
    /// the Drive root) when omitted
    pub folder_id: Option<String>,
}

pub async fn create_spreadsheet(
    state: Arc<AppState>,
    params: CreateSpreadsheetParams,
) -> Result<CreateSpreadsheetResponse> {
    let services = state.services().await?;
    let target_folder = params.folder_id.or_else(|| services.folder_id.clone());

    let file = services
        .drive
        .create_file(&params.title, SPREADSHEET_MIME, target_folder.as_deref())
        .await?;

    Ok(CreateSpreadsheetResponse {
        spreadsheet_id: file.id,
        title: if file.name.is_empty() {
            params.title
        } else {
            file.name
        },
        folder: file
            .parents
            .into_iter()
            .next()
            .unwrap_or_else(|| "root".to_string()),
    })
}

// ---------------------------------------------------------------------------
// create_sheet
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateSheetParams {
    pub spreadsheet_id: String,
    /// Title for the new sheet tab
    pub title: String,
}

pub async fn create_sheet(
    state: Arc<AppState>,
    params: CreateSheetParams,
) -> Result<CreateSheetResponse> {
    let services = state.services().await?;
    let request = serde_json::json!({
        "addSheet": {
            "properties": { "title": params.title }
        }
    });
    let response = services
        .sheets
        .batch_update(&params.spreadsheet_id, vec![request])
        .await?;

    let properties = response
        .pointer("/replies/0/addSheet/properties")
        .cloned()
        .unwrap_or(Value::Null);

    Ok(CreateSheetResponse {
        sheet_id: properties.get("sheetId").and_then(Value::as_i64),
        title: properties
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string),
        index: properties.get("index").and_then(Value::as_i64),
        spreadsheet_id: params.spreadsheet_id,
    })
}

// ---------------------------------------------------------------------------
// list_spreadsheets
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListSpreadsheetsParams {
    /// Drive folder to search; the configured default folder (or all of
    /// Drive) when omitted
    pub folder_id: Option<String>,
}

pub async fn list_spreadsheets(
    state: Arc<AppState>,
    params: ListSpreadsheetsParams,
) -> Result<Vec<SpreadsheetFile>> {
    let services = state.services().await?;
    let target_folder = params.folder_id.or_else(|| services.folder_id.clone());

    let mut query = format!("mimeType='{SPREADSHEET_MIME}'");
    if let Some(folder) = target_folder {
        query.push_str(&format!(" and '{folder}' in parents"));
    }

    let files = services.drive.list_files(&query, "modifiedTime desc").await?;
    Ok(files
        .into_iter()
        .map(|file| SpreadsheetFile {
            id: file.id,
            title: file.name,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// share_spreadsheet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ShareRecipient {
    pub email_address: String,
    /// One of 'reader', 'commenter', or 'writer'
    pub role: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ShareSpreadsheetParams {
    /// The ID of the spreadsheet to share
    pub spreadsheet_id: String,
    /// Recipients; each is processed independently
    pub recipients: Vec<ShareRecipient>,
    /// Send a notification email to each recipient
    #[serde(default = "default_true")]
    pub send_notification: bool,
}

pub async fn share_spreadsheet(
    state: Arc<AppState>,
    params: ShareSpreadsheetParams,
) -> Result<ShareReport> {
    let services = state.services().await?;
    let mut report = ShareReport::default();

    for recipient in params.recipients {
        if recipient.email_address.is_empty() {
            report.failures.push(ShareFailure {
                email_address: None,
                error: "Missing email_address in recipient entry.".to_string(),
            });
            continue;
        }

        // Role validity is checked here, not by the schema, so a bad
        // role becomes a per-recipient failure with no backend call.
        let Ok(role) = ShareRole::from_str(&recipient.role) else {
            report.failures.push(ShareFailure {
                email_address: Some(recipient.email_address),
                error: format!(
                    "Invalid role '{}'. Must be {}.",
                    recipient.role,
                    ShareRole::VALID_ROLES
                ),
            });
            continue;
        };

        match services
            .drive
            .create_permission(
                &params.spreadsheet_id,
                &recipient.email_address,
                &role.to_string(),
                params.send_notification,
            )
            .await
        {
            Ok(permission_id) => report.successes.push(ShareSuccess {
                email_address: recipient.email_address,
                role: role.to_string(),
                permission_id,
            }),
            Err(error) => report.failures.push(ShareFailure {
                email_address: Some(recipient.email_address),
                error: format!("Failed to share: {error}"),
            }),
        }
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// list_folders
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListFoldersParams {
    /// Parent folder to search within; the Drive root when omitted
    pub parent_folder_id: Option<String>,
}

pub async fn list_folders(
    state: Arc<AppState>,
    params: ListFoldersParams,
) -> Result<Vec<FolderEntry>> {
    let services = state.services().await?;

    let mut query = format!("mimeType='{FOLDER_MIME}'");
    match params.parent_folder_id {
        Some(parent) => query.push_str(&format!(" and '{parent}' in parents")),
        None => query.push_str(" and 'root' in parents"),
    }

    let files = services.drive.list_files(&query, "name").await?;
    Ok(files
        .into_iter()
        .map(|file| FolderEntry {
            id: file.id,
            name: file.name,
            parent: file
                .parents
                .into_iter()
                .next()
                .unwrap_or_else(|| "root".to_string()),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// batch_update
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BatchUpdateParams {
    pub spreadsheet_id: String,
    /// batchUpdate request objects, forwarded verbatim
    pub requests: Vec<Value>,
}

pub async fn batch_update(state: Arc<AppState>, params: BatchUpdateParams) -> Result<Value> {
    if params.requests.is_empty() {
        return Ok(serde_json::json!({ "error": "requests list cannot be empty" }));
    }

    let services = state.services().await?;
    services
        .sheets
        .batch_update(&params.spreadsheet_id, params.requests)
        .await
}

// ---------------------------------------------------------------------------
// spreadsheet_info resource
// ---------------------------------------------------------------------------

pub const SPREADSHEET_INFO_TEMPLATE: &str = "spreadsheet://{spreadsheet_id}/info";

/// Extract the spreadsheet id from a `spreadsheet://{id}/info` URI.
pub fn parse_spreadsheet_info_uri(uri: &str) -> Result<String> {
    uri.strip_prefix("spreadsheet://")
        .and_then(|rest| rest.strip_suffix("/info"))
        .filter(|id| !id.is_empty() && !id.contains('/'))
        .map(str::to_string)
        .ok_or_else(|| {
            crate::error::InvalidResourceUri {
                uri: uri.to_string(),
            }
            .into()
        })
}

pub async fn spreadsheet_info(
    state: Arc<AppState>,
    spreadsheet_id: &str,
) -> Result<SpreadsheetInfo> {
    let services = state.services().await?;
    let spreadsheet = services.sheets.get_spreadsheet(spreadsheet_id, None).await?;

    Ok(SpreadsheetInfo {
        title: spreadsheet
            .properties
            .title
            .unwrap_or_else(|| "Unknown".to_string()),
        sheets: spreadsheet
            .sheets
            .into_iter()
            .map(|sheet| SheetInfo {
                title: sheet.properties.title,
                sheet_id: sheet.properties.sheet_id,
                grid_properties: sheet
                    .properties
                    .grid_properties
                    .unwrap_or_else(|| Value::Object(Default::default())),
            })
            .collect(),
    })
}
