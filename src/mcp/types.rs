// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum McpCellType {
    Code,
    Markdown,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetTargetNotebookParams {
    /// Relative path of the notebook to target, e.g. `analysis/run-7.ipynb`.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetTargetNotebookResponse {
    pub target_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetTargetNotebookResponse {
    pub target_path: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddCellParams {
    pub content: String,
    pub cell_type: McpCellType,
    /// Position the new cell should occupy; omitted or out-of-range appends.
    pub index: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddCellResponse {
    pub index: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteCellParams {
    pub cell_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteCellResponse {
    pub deleted_index: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MoveCellParams {
    pub from_index: u64,
    pub to_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MoveCellResponse {
    pub from_index: u64,
    pub to_index: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SplitCellParams {
    pub cell_index: u64,
    /// 1-based line number; lines up to and including it stay in the first
    /// cell.
    pub line_number: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SplitCellResponse {
    pub first_index: u64,
    pub second_index: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EditCellSourceParams {
    pub cell_index: u64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EditCellSourceResponse {
    pub index: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchNotebookCellsParams {
    pub query: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpSearchMatch {
    pub index: u64,
    pub cell_type: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchNotebookCellsResponse {
    pub matches: Vec<McpSearchMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpCell {
    pub index: u64,
    pub cell_type: String,
    pub source: String,
    /// Readable text per output record; empty for markdown cells.
    pub outputs: Vec<String>,
    pub execution_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetAllCellsResponse {
    pub cells: Vec<McpCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpCellOutput {
    pub index: u64,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetAllOutputsResponse {
    /// One entry per code cell, in document order.
    pub outputs: Vec<McpCellOutput>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteCellParams {
    pub cell_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteCellResponse {
    pub index: u64,
    /// Always `dispatched`: execution completes asynchronously; observe it
    /// with `get_cell_output`.
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteAllCellsResponse {
    pub dispatched: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetCellOutputParams {
    pub cell_index: u64,
    /// Upper bound on the output poll; defaults to the server's configured
    /// wait. Zero performs a single read.
    pub wait_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetCellOutputResponse {
    pub index: u64,
    /// Captured text, `[No output]`, or `[Not executed]`.
    pub output: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetKernelVariablesParams {
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InstallPackageParams {
    /// Plain requirement syntax, e.g. `numpy` or `pandas==2.2`.
    pub package: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListInstalledPackagesParams {
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CapturedTextResponse {
    /// `completed`, `timed_out`, or `failed`.
    pub status: String,
    /// Captured text, including partial output collected before a timeout.
    pub output: Option<String>,
    pub failure: Option<String>,
    /// Set when the scratch cell could not be removed afterwards and is
    /// still visible in the notebook.
    pub cleanup_error: Option<String>,
}
