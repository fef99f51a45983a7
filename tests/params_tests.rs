//! Wire-level parameter decoding: required fields, defaults, and
//! tolerance for unknown fields.

use gsheets_mcp::tools::{
    AddRowsParams, BatchUpdateCellsParams, GetMultipleSpreadsheetSummaryParams,
    GetSheetDataParams, ShareSpreadsheetParams,
};
use serde_json::json;

#[test]
fn sheet_data_params_require_spreadsheet_and_sheet() {
    let missing_sheet = serde_json::from_value::<GetSheetDataParams>(json!({
        "spreadsheet_id": "ss1"
    }));
    assert!(missing_sheet.is_err());

    let missing_id = serde_json::from_value::<GetSheetDataParams>(json!({
        "sheet": "Sheet1"
    }));
    assert!(missing_id.is_err());
}

#[test]
fn sheet_data_params_default_to_cheap_values_read() {
    let params: GetSheetDataParams = serde_json::from_value(json!({
        "spreadsheet_id": "ss1",
        "sheet": "Sheet1"
    }))
    .expect("minimal params decode");

    assert!(params.range.is_none());
    assert!(!params.include_grid_data);
}

#[test]
fn unknown_fields_are_ignored() {
    let params: GetSheetDataParams = serde_json::from_value(json!({
        "spreadsheet_id": "ss1",
        "sheet": "Sheet1",
        "somethingElse": true
    }))
    .expect("extra fields tolerated");

    assert_eq!(params.spreadsheet_id, "ss1");
}

#[test]
fn add_rows_start_is_optional() {
    let params: AddRowsParams = serde_json::from_value(json!({
        "spreadsheet_id": "ss1",
        "sheet": "Sheet1",
        "count": 2
    }))
    .expect("params decode");

    assert_eq!(params.count, 2);
    assert!(params.start_row.is_none());
}

#[test]
fn summary_row_count_defaults_to_five() {
    let params: GetMultipleSpreadsheetSummaryParams = serde_json::from_value(json!({
        "spreadsheet_ids": ["ss1"]
    }))
    .expect("params decode");

    assert_eq!(params.rows_to_fetch, 5);
}

#[test]
fn share_notification_defaults_on() {
    let params: ShareSpreadsheetParams = serde_json::from_value(json!({
        "spreadsheet_id": "ss1",
        "recipients": [
            { "email_address": "a@example.com", "role": "reader" }
        ]
    }))
    .expect("params decode");

    assert!(params.send_notification);
    assert_eq!(params.recipients[0].role, "reader");
}

#[test]
fn batch_update_cells_ranges_keep_document_order() {
    let params: BatchUpdateCellsParams = serde_json::from_value(json!({
        "spreadsheet_id": "ss1",
        "sheet": "Sheet1",
        "ranges": {
            "Z9": [["last"]],
            "A1": [["first"]],
            "M5": [["middle"]]
        }
    }))
    .expect("params decode");

    let keys: Vec<_> = params.ranges.keys().cloned().collect();
    assert_eq!(keys, vec!["Z9", "A1", "M5"]);
}
