// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use tokio::sync::RwLock;

use crate::client::{ClientError, Connector};
use crate::exec;
use crate::model::{validate_target_path, PathError, Session};
use crate::ops;

use super::types::*;

/// Status string for a cell that executed without producing output.
pub const NO_OUTPUT: &str = "[No output]";
/// Status string for a cell with no execution count yet.
pub const NOT_EXECUTED: &str = "[Not executed]";

/// Startup failure: the process cannot obtain its initial connection pair.
/// Surfaced to the operator, never retried silently.
#[derive(Debug)]
pub enum BootError {
    Path(PathError),
    Client(ClientError),
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(err) => err.fmt(f),
            Self::Client(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for BootError {}

impl From<PathError> for BootError {
    fn from(err: PathError) -> Self {
        Self::Path(err)
    }
}

impl From<ClientError> for BootError {
    fn from(err: ClientError) -> Self {
        Self::Client(err)
    }
}

/// MCP server over one designated notebook.
///
/// Tool calls run concurrently; each call clones the current session handle
/// once up front and works against that snapshot for its whole duration, so
/// a target switch is atomic from the caller's perspective and calls that
/// started against the old session finish (or fail) against the old session.
#[derive(Clone)]
pub struct GalateaMcp {
    session: Arc<RwLock<Arc<Session>>>,
    connector: Arc<dyn Connector>,
    default_wait: Duration,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GalateaMcp {
    /// Open the initial session against `target_path`.
    pub async fn connect(
        connector: Arc<dyn Connector>,
        target_path: &str,
        default_wait: Duration,
    ) -> Result<Self, BootError> {
        validate_target_path(target_path)?;
        let session = open_session(connector.as_ref(), target_path).await?;
        Ok(Self {
            session: Arc::new(RwLock::new(Arc::new(session))),
            connector,
            default_wait,
            tool_router: Self::tool_router(),
        })
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    async fn current_session(&self) -> Arc<Session> {
        self.session.read().await.clone()
    }

    fn wait_from(&self, seconds: Option<u64>) -> Duration {
        seconds.map(Duration::from_secs).unwrap_or(self.default_wait)
    }

    /// Point the server at another notebook (relative path only). Replaces
    /// the document and kernel connections as a unit; executions still in
    /// flight on the old session are abandoned and their outputs discarded.
    #[tool(name = "set_target_notebook")]
    async fn set_target_notebook(
        &self,
        params: Parameters<SetTargetNotebookParams>,
    ) -> Result<Json<SetTargetNotebookResponse>, ErrorData> {
        let SetTargetNotebookParams { path } = params.0;
        validate_target_path(&path).map_err(map_path_error)?;

        // Open both connections before touching the live session; a failure
        // here leaves the old session fully intact.
        let session = open_session(self.connector.as_ref(), &path).await.map_err(|err| {
            ErrorData::internal_error(
                format!("cannot open notebook '{path}': {err}"),
                Some(serde_json::json!({ "path": path })),
            )
        })?;

        let mut current = self.session.write().await;
        *current = Arc::new(session);
        drop(current);
        tracing::info!(target = %path, "switched target notebook");

        Ok(Json(SetTargetNotebookResponse { target_path: path }))
    }

    /// Current target notebook path; set with `set_target_notebook`.
    #[tool(name = "get_target_notebook")]
    async fn get_target_notebook(&self) -> Result<Json<GetTargetNotebookResponse>, ErrorData> {
        let session = self.current_session().await;
        Ok(Json(GetTargetNotebookResponse {
            target_path: session.target_path().to_owned(),
        }))
    }

    /// Insert a cell so it occupies `index`; omit `index` (or pass one out
    /// of range) to append at the end. Returns the index the cell landed on.
    #[tool(name = "add_cell")]
    async fn add_cell(
        &self,
        params: Parameters<AddCellParams>,
    ) -> Result<Json<AddCellResponse>, ErrorData> {
        let AddCellParams { content, cell_type, index } = params.0;
        let session = self.current_session().await;
        let index = ops::add_cell(
            &session,
            &content,
            cell_type_from_mcp(cell_type),
            index.map(|index| index as usize),
        )
        .await
        .map_err(map_op_error)?;
        Ok(Json(AddCellResponse { index: index as u64 }))
    }

    /// Delete the cell at `cell_index`.
    #[tool(name = "delete_cell")]
    async fn delete_cell(
        &self,
        params: Parameters<DeleteCellParams>,
    ) -> Result<Json<DeleteCellResponse>, ErrorData> {
        let DeleteCellParams { cell_index } = params.0;
        let session = self.current_session().await;
        ops::delete_cell(&session, cell_index as usize).await.map_err(map_op_error)?;
        Ok(Json(DeleteCellResponse { deleted_index: cell_index }))
    }

    /// Move a cell to a new position; both indices refer to the current
    /// sequence, and the moved cell ends up at `to_index`.
    #[tool(name = "move_cell")]
    async fn move_cell(
        &self,
        params: Parameters<MoveCellParams>,
    ) -> Result<Json<MoveCellResponse>, ErrorData> {
        let MoveCellParams { from_index, to_index } = params.0;
        let session = self.current_session().await;
        ops::move_cell(&session, from_index as usize, to_index as usize)
            .await
            .map_err(map_op_error)?;
        Ok(Json(MoveCellResponse { from_index, to_index }))
    }

    /// Split a cell in two at a 1-based line boundary; lines up to and
    /// including `line_number` stay in the first cell.
    #[tool(name = "split_cell")]
    async fn split_cell(
        &self,
        params: Parameters<SplitCellParams>,
    ) -> Result<Json<SplitCellResponse>, ErrorData> {
        let SplitCellParams { cell_index, line_number } = params.0;
        let session = self.current_session().await;
        let (first, second) =
            ops::split_cell(&session, cell_index as usize, line_number as usize)
                .await
                .map_err(map_op_error)?;
        Ok(Json(SplitCellResponse {
            first_index: first as u64,
            second_index: second as u64,
        }))
    }

    /// Replace the source of the cell at `cell_index`.
    #[tool(name = "edit_cell_source")]
    async fn edit_cell_source(
        &self,
        params: Parameters<EditCellSourceParams>,
    ) -> Result<Json<EditCellSourceResponse>, ErrorData> {
        let EditCellSourceParams { cell_index, content } = params.0;
        let session = self.current_session().await;
        ops::edit_cell_source(&session, cell_index as usize, &content)
            .await
            .map_err(map_op_error)?;
        Ok(Json(EditCellSourceResponse { index: cell_index }))
    }

    /// Search every cell's source for `query`; matches come back in document
    /// order with their current indices.
    #[tool(name = "search_notebook_cells")]
    async fn search_notebook_cells(
        &self,
        params: Parameters<SearchNotebookCellsParams>,
    ) -> Result<Json<SearchNotebookCellsResponse>, ErrorData> {
        let SearchNotebookCellsParams { query, case_sensitive } = params.0;
        let session = self.current_session().await;
        let hits = ops::search_cells(&session, &query, case_sensitive)
            .await
            .map_err(map_op_error)?;
        Ok(Json(SearchNotebookCellsResponse {
            matches: hits
                .into_iter()
                .map(|hit| McpSearchMatch {
                    index: hit.index as u64,
                    cell_type: hit.cell_type.label().to_owned(),
                    source: hit.source,
                })
                .collect(),
        }))
    }

    /// Full snapshot of the notebook: every cell with source, readable
    /// outputs, and execution count.
    #[tool(name = "get_all_cells")]
    async fn get_all_cells(&self) -> Result<Json<GetAllCellsResponse>, ErrorData> {
        let session = self.current_session().await;
        let cells = session.document().snapshot().await.map_err(map_client_error)?;
        Ok(Json(GetAllCellsResponse {
            cells: cells
                .iter()
                .enumerate()
                .map(|(index, cell)| McpCell {
                    index: index as u64,
                    cell_type: cell.cell_type.label().to_owned(),
                    source: cell.source.clone(),
                    outputs: cell.outputs.iter().map(|output| output.text()).collect(),
                    execution_count: cell.execution_count,
                })
                .collect(),
        }))
    }

    /// Readable output of every code cell (`[Not executed]` / `[No output]`
    /// where applicable), in document order.
    #[tool(name = "get_all_outputs")]
    async fn get_all_outputs(&self) -> Result<Json<GetAllOutputsResponse>, ErrorData> {
        let session = self.current_session().await;
        let cells = session.document().snapshot().await.map_err(map_client_error)?;
        Ok(Json(GetAllOutputsResponse {
            outputs: cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| cell.is_code())
                .map(|(index, cell)| McpCellOutput {
                    index: index as u64,
                    output: output_string(cell),
                })
                .collect(),
        }))
    }

    /// Dispatch execution of the cell at `cell_index` and return immediately
    /// once the kernel acknowledges it; fetch results later with
    /// `get_cell_output`.
    #[tool(name = "execute_cell")]
    async fn execute_cell(
        &self,
        params: Parameters<ExecuteCellParams>,
    ) -> Result<Json<ExecuteCellResponse>, ErrorData> {
        let ExecuteCellParams { cell_index } = params.0;
        let session = self.current_session().await;
        let handle = exec::execute_cell(&session, cell_index as usize)
            .await
            .map_err(map_exec_error)?;
        Ok(Json(ExecuteCellResponse {
            index: cell_index,
            status: handle.status.label().to_owned(),
        }))
    }

    /// Dispatch every code cell sequentially in document order; returns
    /// after the last submission, not after the last completion.
    #[tool(name = "execute_all_cells")]
    async fn execute_all_cells(&self) -> Result<Json<ExecuteAllCellsResponse>, ErrorData> {
        let session = self.current_session().await;
        let handles = exec::execute_all_cells(&session).await.map_err(map_exec_error)?;
        Ok(Json(ExecuteAllCellsResponse { dispatched: handles.len() as u64 }))
    }

    /// Poll the cell's output for up to `wait_seconds` (server default when
    /// omitted, zero for a single read). Returns the captured text,
    /// `[No output]`, or `[Not executed]`; re-poll when certainty matters.
    #[tool(name = "get_cell_output")]
    async fn get_cell_output(
        &self,
        params: Parameters<GetCellOutputParams>,
    ) -> Result<Json<GetCellOutputResponse>, ErrorData> {
        let GetCellOutputParams { cell_index, wait_seconds } = params.0;
        let session = self.current_session().await;
        let poll = exec::wait_for_output(
            &session,
            cell_index as usize,
            self.wait_from(wait_seconds),
        )
        .await
        .map_err(map_exec_error)?;
        Ok(Json(GetCellOutputResponse {
            index: cell_index,
            output: poll_string(poll),
        }))
    }

    /// List the kernel's interactive variables (runs `%whos` in a scratch
    /// cell that is removed afterwards).
    #[tool(name = "get_kernel_variables")]
    async fn get_kernel_variables(
        &self,
        params: Parameters<GetKernelVariablesParams>,
    ) -> Result<Json<CapturedTextResponse>, ErrorData> {
        let GetKernelVariablesParams { timeout_seconds } = params.0;
        let session = self.current_session().await;
        let report = exec::kernel_variables(&session, self.wait_from(timeout_seconds))
            .await
            .map_err(map_exec_error)?;
        Ok(Json(captured_response(report)))
    }

    /// Install a package into the running kernel's environment (runs
    /// `%pip install` in a scratch cell that is removed afterwards).
    #[tool(name = "install_package")]
    async fn install_package(
        &self,
        params: Parameters<InstallPackageParams>,
    ) -> Result<Json<CapturedTextResponse>, ErrorData> {
        let InstallPackageParams { package, timeout_seconds } = params.0;
        let session = self.current_session().await;
        let report =
            exec::install_package(&session, &package, self.wait_from(timeout_seconds))
                .await
                .map_err(map_exec_error)?;
        Ok(Json(captured_response(report)))
    }

    /// List packages installed in the kernel's environment (runs `%pip list`
    /// in a scratch cell that is removed afterwards).
    #[tool(name = "list_installed_packages")]
    async fn list_installed_packages(
        &self,
        params: Parameters<ListInstalledPackagesParams>,
    ) -> Result<Json<CapturedTextResponse>, ErrorData> {
        let ListInstalledPackagesParams { timeout_seconds } = params.0;
        let session = self.current_session().await;
        let report = exec::list_packages(&session, self.wait_from(timeout_seconds))
            .await
            .map_err(map_exec_error)?;
        Ok(Json(captured_response(report)))
    }
}

#[tool_handler]
impl ServerHandler for GalateaMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Galatea notebook orchestration server (tools: set_target_notebook, get_target_notebook, add_cell, delete_cell, move_cell, split_cell, edit_cell_source, search_notebook_cells, get_all_cells, get_all_outputs, execute_cell, execute_all_cells, get_cell_output, get_kernel_variables, install_package, list_installed_packages)"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Extracted mapping helpers for MCP tool handlers.
include!("server/helpers.rs");
