// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Execution orchestration.
//!
//! Dispatch is fire-and-forget: `execute_cell` returns once the kernel
//! acknowledges the submission, and completion is observed later by polling
//! the document's output field within a bounded wait window. The scratch-cell
//! protocol runs throwaway introspection code in an appended cell that is
//! removed again on every path out — success, failure, timeout, and (best
//! effort) caller cancellation.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::Instant;

use crate::client::{ClientError, DocumentClient, ExecutionId};
use crate::model::{CellId, CellType, Session};
use crate::ops::{self, OpError};

/// How often a bounded wait re-reads the document's output field.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on any caller-supplied wait. Callers pick arbitrary second
/// counts over the wire; waits past this clamp would overflow the deadline
/// arithmetic anyway.
const MAX_WAIT: Duration = Duration::from_secs(60 * 60 * 24);

fn deadline_after(wait: Duration) -> Instant {
    Instant::now() + wait.min(MAX_WAIT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    Dispatched,
    Completed,
    Failed,
    TimedOut,
}

impl ExecStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dispatched => "dispatched",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for ExecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One dispatched execution. Lives only for the duration of a tool call;
/// never persisted, and abandoned outright when the session is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionHandle {
    /// Document index of the dispatched cell at submission time.
    pub index: usize,
    pub execution_id: ExecutionId,
    pub submitted_at: SystemTime,
    pub status: ExecStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    NotCode { index: usize },
    InvalidPackage { spec: String },
    Op(OpError),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCode { index } => {
                write!(f, "cell {index} is not a code cell")
            }
            Self::InvalidPackage { spec } => {
                write!(f, "invalid package specification '{spec}'")
            }
            Self::Op(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Op(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OpError> for ExecError {
    fn from(err: OpError) -> Self {
        Self::Op(err)
    }
}

impl From<ClientError> for ExecError {
    fn from(err: ClientError) -> Self {
        Self::Op(OpError::from(err))
    }
}

/// Dispatch the cell at `index` and return once the submission is
/// acknowledged. Never waits for completion; kernel latency is unbounded and
/// the caller observes results later via `wait_for_output`.
pub async fn execute_cell(session: &Session, index: usize) -> Result<ExecutionHandle, ExecError> {
    let at = ops::resolve(session.document().as_ref(), index).await?;
    let cell = session.document().cell(at).await?;
    if !cell.is_code() {
        return Err(ExecError::NotCode { index: at });
    }

    let execution_id = session.kernel().submit(cell.cell_id, &cell.source).await?;
    tracing::debug!(index = at, %execution_id, "dispatched cell execution");
    Ok(ExecutionHandle {
        index: at,
        execution_id,
        submitted_at: SystemTime::now(),
        status: ExecStatus::Dispatched,
    })
}

/// Dispatch every code cell sequentially in document order.
///
/// Kernels run a strict FIFO queue, so out-of-order submission would not
/// parallelize anything; each dispatch is still fire-and-forget, and this
/// returns after the last submission, not after the last completion.
pub async fn execute_all_cells(session: &Session) -> Result<Vec<ExecutionHandle>, ExecError> {
    let cells = session.document().snapshot().await?;
    let mut handles = Vec::new();
    for (index, cell) in cells.iter().enumerate() {
        if !cell.is_code() {
            continue;
        }
        let execution_id = session.kernel().submit(cell.cell_id, &cell.source).await?;
        handles.push(ExecutionHandle {
            index,
            execution_id,
            submitted_at: SystemTime::now(),
            status: ExecStatus::Dispatched,
        });
    }
    tracing::debug!(dispatched = handles.len(), "dispatched all code cells");
    Ok(handles)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPoll {
    /// Concatenated text outputs.
    Text(String),
    /// Executed, but nothing appeared within the wait window.
    NoOutput,
    /// No execution count yet (markdown cells always report this).
    NotExecuted,
}

/// Bounded poll of the cell's output field, re-reading every `POLL_INTERVAL`
/// up to `wait`. Outputs are written by the document asynchronously relative
/// to kernel completion, so a caller needing certainty re-polls; `wait` of
/// zero performs exactly one read.
pub async fn wait_for_output(
    session: &Session,
    index: usize,
    wait: Duration,
) -> Result<OutputPoll, ExecError> {
    let at = ops::resolve(session.document().as_ref(), index).await?;
    let deadline = deadline_after(wait);
    loop {
        let cell = session.document().cell(at).await?;
        if !cell.is_code() {
            return Ok(OutputPoll::NotExecuted);
        }
        if !cell.outputs.is_empty() {
            return Ok(OutputPoll::Text(cell.output_text()));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(if cell.execution_count.is_none() {
                OutputPoll::NotExecuted
            } else {
                OutputPoll::NoOutput
            });
        }
        tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
    }
}

/// Outcome of one scratch execution. A timeout is a normal outcome; a
/// cleanup error means the scratch cell is still visible in the notebook and
/// must be surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchReport {
    pub status: ExecStatus,
    /// Captured text, including partial output collected before a timeout.
    pub output: Option<String>,
    /// Submission/read failure detail when `status` is `Failed`.
    pub failure: Option<String>,
    /// Set when deleting the scratch cell failed after execution.
    pub cleanup_error: Option<String>,
}

/// Run throwaway code in a scratch cell appended to the notebook.
///
/// Holds the mutation guard for the whole lifecycle so no concurrent
/// structural edit (or `get_all_cells` long enough to matter) observes the
/// scratch cell beyond the window needed to run it. The delete step runs on
/// the success, failure, and timeout paths alike.
pub async fn run_scratch(
    session: &Session,
    code: &str,
    wait: Duration,
) -> Result<ScratchReport, ExecError> {
    let _guard = session.edit_lock().lock().await;
    let document = session.document();

    let index = document.cell_count().await?;
    let cell_id = document.insert_cell(index, CellType::Code, code).await?;

    let cleanup = ScratchCleanup::arm(document.clone(), index);
    let (status, output, failure) = capture_scratch(session, index, cell_id, code, wait).await;
    let cleanup_error = cleanup.run().await;

    if let Some(reason) = &cleanup_error {
        tracing::error!(index, reason, "scratch cell cleanup failed; notebook has leftover cell");
    }
    Ok(ScratchReport { status, output, failure, cleanup_error })
}

/// The capture phase never returns `Err`: any mid-flight failure is folded
/// into a `Failed` status so the cleanup step behind it always runs.
async fn capture_scratch(
    session: &Session,
    index: usize,
    cell_id: CellId,
    code: &str,
    wait: Duration,
) -> (ExecStatus, Option<String>, Option<String>) {
    let execution_id = match session.kernel().submit(cell_id, code).await {
        Ok(id) => id,
        Err(err) => return (ExecStatus::Failed, None, Some(err.to_string())),
    };
    tracing::debug!(%execution_id, "dispatched scratch execution");

    let deadline = deadline_after(wait);
    let mut partial: Option<String> = None;
    loop {
        let cell = match session.document().cell(index).await {
            Ok(cell) => cell,
            Err(err) => return (ExecStatus::Failed, partial, Some(err.to_string())),
        };
        if !cell.outputs.is_empty() {
            partial = Some(cell.output_text());
        }
        if cell.execution_count.is_some() {
            return (ExecStatus::Completed, partial, None);
        }
        let now = Instant::now();
        if now >= deadline {
            return (ExecStatus::TimedOut, partial, None);
        }
        tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
    }
}

/// Deletes the scratch cell exactly once. The normal path is the explicit
/// `run`; if the owning future is dropped mid-wait, `Drop` spawns a
/// best-effort delete so cancellation cannot leak the cell either.
struct ScratchCleanup {
    document: Option<Arc<dyn DocumentClient>>,
    index: usize,
}

impl ScratchCleanup {
    fn arm(document: Arc<dyn DocumentClient>, index: usize) -> Self {
        Self { document: Some(document), index }
    }

    async fn run(mut self) -> Option<String> {
        let document = self.document.take()?;
        match document.remove_cell(self.index).await {
            Ok(_) => None,
            Err(err) => Some(err.to_string()),
        }
    }
}

impl Drop for ScratchCleanup {
    fn drop(&mut self) {
        let Some(document) = self.document.take() else {
            return;
        };
        let index = self.index;
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(err) = document.remove_cell(index).await {
                    tracing::error!(index, %err, "scratch cleanup after cancellation failed");
                }
            });
        }
    }
}

/// List the kernel's interactive variables via a scratch `%whos`.
pub async fn kernel_variables(session: &Session, wait: Duration) -> Result<ScratchReport, ExecError> {
    run_scratch(session, "%whos", wait).await
}

/// Install a package into the running kernel's environment.
pub async fn install_package(
    session: &Session,
    spec: &str,
    wait: Duration,
) -> Result<ScratchReport, ExecError> {
    validate_package_spec(spec)?;
    run_scratch(session, &format!("%pip install {spec}"), wait).await
}

/// List packages installed in the kernel's environment.
pub async fn list_packages(session: &Session, wait: Duration) -> Result<ScratchReport, ExecError> {
    run_scratch(session, "%pip list", wait).await
}

/// The spec is interpolated into a cell magic, so only plain requirement
/// syntax gets through (name, extras, version pins).
fn validate_package_spec(spec: &str) -> Result<(), ExecError> {
    let valid = !spec.trim().is_empty()
        && spec.chars().all(|ch| {
            ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '[' | ']' | '=' | '<' | '>' | '~' | ',')
        });
    if valid {
        Ok(())
    } else {
        Err(ExecError::InvalidPackage { spec: spec.to_owned() })
    }
}

#[cfg(test)]
mod tests;
