use crate::config::ServerConfig;
use crate::model::{
    CreateSheetResponse, CreateSpreadsheetResponse, FolderEntry, ShareReport, SheetQueryResult,
    SpreadsheetFile, SpreadsheetSummary,
};
use crate::state::AppState;
use crate::tools;
use anyhow::Result;
use rmcp::{
    ErrorData as McpError, Json, RoleServer, ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        AnnotateAble, Implementation, ListResourceTemplatesResult, ListResourcesResult,
        PaginatedRequestParam,
        RawResourceTemplate, ReadResourceRequestParam, ReadResourceResult, ResourceContents,
        ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router,
    transport::stdio,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

const INSTRUCTIONS: &str = "\
Google Sheets MCP: read, write, and manage Google Sheets spreadsheets.

WORKFLOW:
1) list_spreadsheets (or create_spreadsheet) to find the target file
2) list_sheets to see its tabs
3) get_sheet_data / get_sheet_formulas to read; update_cells or \
batch_update_cells to write

TOOL SELECTION:
- get_sheet_data: Read values. Leave include_grid_data off unless you \
need formatting metadata; it is much heavier.
- batch_update_cells: Several ranges in one atomic call; prefer it over \
repeated update_cells.
- get_multiple_sheet_data / get_multiple_spreadsheet_summary: Fan-out \
reads; each query succeeds or fails on its own.
- batch_update: Raw Sheets batchUpdate requests for anything the \
dedicated tools do not cover.
- share_spreadsheet: Roles are 'reader', 'commenter', or 'writer'; each \
recipient is reported under successes or failures.

RANGES: A1 notation (e.g. A1:C10). Omit the range to address a whole \
sheet.

The spreadsheet://{spreadsheet_id}/info resource returns a JSON \
overview (title plus sheet inventory).";

const RESOURCE_MIME: &str = "application/json";

#[derive(Clone)]
pub struct GoogleSheetsServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<GoogleSheetsServer>,
}

impl GoogleSheetsServer {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self::from_state(Arc::new(AppState::new(config)))
    }

    pub fn from_state(state: Arc<AppState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    pub async fn run_stdio(self) -> Result<()> {
        let service = self
            .serve(stdio())
            .await
            .inspect_err(|error| tracing::error!("serving error: {:?}", error))?;
        service.waiting().await?;
        Ok(())
    }

    fn ensure_tool_enabled(&self, tool: &str) -> Result<()> {
        tracing::info!(tool = tool, "tool invocation requested");
        if self.state.config().is_tool_enabled(tool) {
            Ok(())
        } else {
            Err(ToolDisabledError::new(tool).into())
        }
    }
}

#[tool_router]
impl GoogleSheetsServer {
    #[tool(
        name = "get_sheet_data",
        description = "Get data from a specific sheet. Optionally include cell formatting metadata."
    )]
    pub async fn get_sheet_data(
        &self,
        Parameters(params): Parameters<tools::GetSheetDataParams>,
    ) -> Result<Json<Value>, McpError> {
        self.ensure_tool_enabled("get_sheet_data")
            .map_err(to_mcp_error)?;
        tools::get_sheet_data(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "get_sheet_formulas",
        description = "Get formulas from a specific sheet"
    )]
    pub async fn get_sheet_formulas(
        &self,
        Parameters(params): Parameters<tools::GetSheetFormulasParams>,
    ) -> Result<Json<Vec<Vec<Value>>>, McpError> {
        self.ensure_tool_enabled("get_sheet_formulas")
            .map_err(to_mcp_error)?;
        tools::get_sheet_formulas(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "update_cells",
        description = "Update cells in a spreadsheet range"
    )]
    pub async fn update_cells(
        &self,
        Parameters(params): Parameters<tools::UpdateCellsParams>,
    ) -> Result<Json<Value>, McpError> {
        self.ensure_tool_enabled("update_cells")
            .map_err(to_mcp_error)?;
        tools::update_cells(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "batch_update_cells",
        description = "Batch update multiple ranges in a sheet atomically"
    )]
    pub async fn batch_update_cells(
        &self,
        Parameters(params): Parameters<tools::BatchUpdateCellsParams>,
    ) -> Result<Json<Value>, McpError> {
        self.ensure_tool_enabled("batch_update_cells")
            .map_err(to_mcp_error)?;
        tools::batch_update_cells(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(name = "add_rows", description = "Insert rows into a sheet")]
    pub async fn add_rows(
        &self,
        Parameters(params): Parameters<tools::AddRowsParams>,
    ) -> Result<Json<Value>, McpError> {
        self.ensure_tool_enabled("add_rows").map_err(to_mcp_error)?;
        tools::add_rows(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(name = "add_columns", description = "Insert columns into a sheet")]
    pub async fn add_columns(
        &self,
        Parameters(params): Parameters<tools::AddColumnsParams>,
    ) -> Result<Json<Value>, McpError> {
        self.ensure_tool_enabled("add_columns")
            .map_err(to_mcp_error)?;
        tools::add_columns(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "list_sheets",
        description = "List all sheet names in a spreadsheet"
    )]
    pub async fn list_sheets(
        &self,
        Parameters(params): Parameters<tools::ListSheetsParams>,
    ) -> Result<Json<Vec<String>>, McpError> {
        self.ensure_tool_enabled("list_sheets")
            .map_err(to_mcp_error)?;
        tools::list_sheets(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "copy_sheet",
        description = "Copy a sheet from one spreadsheet to another"
    )]
    pub async fn copy_sheet(
        &self,
        Parameters(params): Parameters<tools::CopySheetParams>,
    ) -> Result<Json<Value>, McpError> {
        self.ensure_tool_enabled("copy_sheet")
            .map_err(to_mcp_error)?;
        tools::copy_sheet(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(name = "rename_sheet", description = "Rename a sheet in a spreadsheet")]
    pub async fn rename_sheet(
        &self,
        Parameters(params): Parameters<tools::RenameSheetParams>,
    ) -> Result<Json<Value>, McpError> {
        self.ensure_tool_enabled("rename_sheet")
            .map_err(to_mcp_error)?;
        tools::rename_sheet(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "get_multiple_sheet_data",
        description = "Get data from multiple ranges, possibly across spreadsheets, in one call"
    )]
    pub async fn get_multiple_sheet_data(
        &self,
        Parameters(params): Parameters<tools::GetMultipleSheetDataParams>,
    ) -> Result<Json<Vec<SheetQueryResult>>, McpError> {
        self.ensure_tool_enabled("get_multiple_sheet_data")
            .map_err(to_mcp_error)?;
        tools::get_multiple_sheet_data(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "get_multiple_spreadsheet_summary",
        description = "Summarize multiple spreadsheets: titles, sheets, headers, and sample rows"
    )]
    pub async fn get_multiple_spreadsheet_summary(
        &self,
        Parameters(params): Parameters<tools::GetMultipleSpreadsheetSummaryParams>,
    ) -> Result<Json<Vec<SpreadsheetSummary>>, McpError> {
        self.ensure_tool_enabled("get_multiple_spreadsheet_summary")
            .map_err(to_mcp_error)?;
        tools::get_multiple_spreadsheet_summary(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "create_spreadsheet",
        description = "Create a new spreadsheet, optionally in a specific Drive folder"
    )]
    pub async fn create_spreadsheet(
        &self,
        Parameters(params): Parameters<tools::CreateSpreadsheetParams>,
    ) -> Result<Json<CreateSpreadsheetResponse>, McpError> {
        self.ensure_tool_enabled("create_spreadsheet")
            .map_err(to_mcp_error)?;
        tools::create_spreadsheet(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "create_sheet",
        description = "Create a new sheet tab in an existing spreadsheet"
    )]
    pub async fn create_sheet(
        &self,
        Parameters(params): Parameters<tools::CreateSheetParams>,
    ) -> Result<Json<CreateSheetResponse>, McpError> {
        self.ensure_tool_enabled("create_sheet")
            .map_err(to_mcp_error)?;
        tools::create_sheet(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "list_spreadsheets",
        description = "List spreadsheets in a Drive folder, most recently modified first"
    )]
    pub async fn list_spreadsheets(
        &self,
        Parameters(params): Parameters<tools::ListSpreadsheetsParams>,
    ) -> Result<Json<Vec<SpreadsheetFile>>, McpError> {
        self.ensure_tool_enabled("list_spreadsheets")
            .map_err(to_mcp_error)?;
        tools::list_spreadsheets(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "share_spreadsheet",
        description = "Share a spreadsheet with multiple users, reporting per-recipient outcomes"
    )]
    pub async fn share_spreadsheet(
        &self,
        Parameters(params): Parameters<tools::ShareSpreadsheetParams>,
    ) -> Result<Json<ShareReport>, McpError> {
        self.ensure_tool_enabled("share_spreadsheet")
            .map_err(to_mcp_error)?;
        tools::share_spreadsheet(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "list_folders",
        description = "List Drive folders, optionally under a parent folder"
    )]
    pub async fn list_folders(
        &self,
        Parameters(params): Parameters<tools::ListFoldersParams>,
    ) -> Result<Json<Vec<FolderEntry>>, McpError> {
        self.ensure_tool_enabled("list_folders")
            .map_err(to_mcp_error)?;
        tools::list_folders(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }

    #[tool(
        name = "batch_update",
        description = "Apply raw batchUpdate requests to a spreadsheet"
    )]
    pub async fn batch_update(
        &self,
        Parameters(params): Parameters<tools::BatchUpdateParams>,
    ) -> Result<Json<Value>, McpError> {
        self.ensure_tool_enabled("batch_update")
            .map_err(to_mcp_error)?;
        tools::batch_update(self.state.clone(), params)
            .await
            .map(Json)
            .map_err(to_mcp_error)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for GoogleSheetsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(INSTRUCTIONS.to_string()),
            ..ServerInfo::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        // Only templated resources are exposed; there is nothing to
        // enumerate without a spreadsheet id.
        Ok(ListResourcesResult {
            meta: None,
            resources: Vec::new(),
            next_cursor: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult {
            meta: None,
            resource_templates: vec![
                RawResourceTemplate {
                    uri_template: tools::SPREADSHEET_INFO_TEMPLATE.to_string(),
                    name: "spreadsheet_info".to_string(),
                    title: Some("Spreadsheet information".to_string()),
                    description: Some(
                        "Title and sheet inventory for a spreadsheet".to_string(),
                    ),
                    mime_type: Some(RESOURCE_MIME.to_string()),
                }
                .no_annotation(),
            ],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let spreadsheet_id = tools::parse_spreadsheet_info_uri(&uri).map_err(to_mcp_error)?;
        let info = tools::spreadsheet_info(self.state.clone(), &spreadsheet_id)
            .await
            .map_err(to_mcp_error)?;
        let text = serde_json::to_string(&info)
            .map_err(|e| to_mcp_error(anyhow::anyhow!("failed to serialize resource: {e}")))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri,
                mime_type: Some(RESOURCE_MIME.to_string()),
                text,
                meta: None,
            }],
        })
    }
}

fn to_mcp_error(error: anyhow::Error) -> McpError {
    if error.downcast_ref::<ToolDisabledError>().is_some() {
        return McpError::invalid_request(error.to_string(), None);
    }
    crate::error::to_rmcp_error(error)
}

#[derive(Debug, Error)]
#[error("tool '{tool_name}' is disabled by server configuration")]
struct ToolDisabledError {
    tool_name: String,
}

impl ToolDisabledError {
    fn new(tool_name: &str) -> Self {
        Self {
            tool_name: tool_name.to_ascii_lowercase(),
        }
    }
}
