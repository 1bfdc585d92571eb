// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// MCP server helper functions:
/// session opening, error-to-protocol mapping, and output status strings.
async fn open_session(
    connector: &dyn Connector,
    path: &str,
) -> Result<Session, ClientError> {
    let (document, kernel) = connector.connect(path).await?;
    match document.presence().await {
        Ok(peers) => tracing::debug!(target = %path, ?peers, "joined document session"),
        Err(err) => tracing::debug!(target = %path, %err, "presence unavailable"),
    }
    Ok(Session::new(path, document, kernel))
}

fn cell_type_from_mcp(cell_type: McpCellType) -> crate::model::CellType {
    match cell_type {
        McpCellType::Code => crate::model::CellType::Code,
        McpCellType::Markdown => crate::model::CellType::Markdown,
    }
}

fn map_path_error(err: PathError) -> ErrorData {
    ErrorData::invalid_params(err.to_string(), None)
}

fn map_client_error(err: ClientError) -> ErrorData {
    ErrorData::internal_error(err.to_string(), None)
}

fn map_op_error(err: ops::OpError) -> ErrorData {
    match err {
        ops::OpError::Index { index, count } => ErrorData::invalid_params(
            err.to_string(),
            Some(serde_json::json!({ "index": index as u64, "cell_count": count as u64 })),
        ),
        ops::OpError::Line { line, lines } => ErrorData::invalid_params(
            err.to_string(),
            Some(serde_json::json!({ "line_number": line as u64, "line_count": lines as u64 })),
        ),
        ops::OpError::Client(err) => map_client_error(err),
    }
}

fn map_exec_error(err: exec::ExecError) -> ErrorData {
    match err {
        exec::ExecError::NotCode { index } => ErrorData::invalid_params(
            err.to_string(),
            Some(serde_json::json!({ "index": index as u64 })),
        ),
        exec::ExecError::InvalidPackage { ref spec } => ErrorData::invalid_params(
            err.to_string(),
            Some(serde_json::json!({ "package": spec })),
        ),
        exec::ExecError::Op(err) => map_op_error(err),
    }
}

/// Status string for a code cell's outputs in bulk reads.
fn output_string(cell: &crate::model::CellSnapshot) -> String {
    if cell.execution_count.is_none() {
        return NOT_EXECUTED.to_owned();
    }
    let text = cell.output_text();
    if text.is_empty() {
        NO_OUTPUT.to_owned()
    } else {
        text
    }
}

fn poll_string(poll: exec::OutputPoll) -> String {
    match poll {
        exec::OutputPoll::Text(text) if !text.is_empty() => text,
        exec::OutputPoll::Text(_) | exec::OutputPoll::NoOutput => NO_OUTPUT.to_owned(),
        exec::OutputPoll::NotExecuted => NOT_EXECUTED.to_owned(),
    }
}

fn captured_response(report: exec::ScratchReport) -> CapturedTextResponse {
    CapturedTextResponse {
        status: report.status.label().to_owned(),
        output: report.output,
        failure: report.failure,
        cleanup_error: report.cleanup_error,
    }
}
