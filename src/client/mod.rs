// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Seams to the two external collaborators.
//!
//! The document service holds the notebook's cell sequence as a structure
//! mutable by multiple simultaneous editors; the kernel service runs code and
//! delivers output back into the document asynchronously. Galatea only ever
//! talks to them through these traits — wire formats and transports live in
//! the implementations, not here. `local` ships an in-process backend used by
//! demo mode and the test suite.

pub mod local;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{CellId, CellSnapshot, CellType};

pub use local::{LocalConnector, LocalDocument, LocalKernel};

/// Handle for one dispatched execution, assigned by the kernel service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExecutionId(u64);

impl ExecutionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exec:{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Connection to the document or kernel service is gone.
    Unavailable { reason: String },
    /// A positional access raced a concurrent structural edit.
    OutOfSync { index: usize, count: usize },
}

impl ClientError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "upstream unavailable: {reason}"),
            Self::OutOfSync { index, count } => {
                write!(f, "cell index {index} is stale (document has {count} cells)")
            }
        }
    }
}

impl std::error::Error for ClientError {}

/// Typed interface over the collaborative document service.
///
/// All positional arguments address the live sequence at call time; callers
/// re-resolve indices immediately before every call and never cache them
/// across suspension points.
#[async_trait]
pub trait DocumentClient: fmt::Debug + Send + Sync {
    async fn cell_count(&self) -> Result<usize, ClientError>;

    /// Ordered snapshot of every cell.
    async fn snapshot(&self) -> Result<Vec<CellSnapshot>, ClientError>;

    async fn cell(&self, index: usize) -> Result<CellSnapshot, ClientError>;

    /// Structured insert at `index` (0 ≤ index ≤ count). Concurrent
    /// collaborators observe a well-formed insert, never a buffer replace.
    async fn insert_cell(
        &self,
        index: usize,
        cell_type: CellType,
        source: &str,
    ) -> Result<CellId, ClientError>;

    /// Reinsert a previously removed cell, outputs and execution count
    /// included. Used by move, which is modelled as delete-then-reinsert.
    async fn reinsert_cell(&self, index: usize, cell: CellSnapshot)
        -> Result<CellId, ClientError>;

    /// Remove the cell at `index`, returning its final state.
    async fn remove_cell(&self, index: usize) -> Result<CellSnapshot, ClientError>;

    async fn set_cell_source(&self, index: usize, source: &str) -> Result<(), ClientError>;

    /// Names of editors currently present on the document.
    async fn presence(&self) -> Result<Vec<String>, ClientError>;
}

/// Typed interface over the kernel execution service.
#[async_trait]
pub trait KernelClient: fmt::Debug + Send + Sync {
    /// Submit `code` for execution; outputs are delivered asynchronously to
    /// the document cell identified by `cell`. Returns once the submission is
    /// acknowledged — completion is observed later through the document.
    async fn submit(&self, cell: CellId, code: &str) -> Result<ExecutionId, ClientError>;
}

/// Opens a fresh (document, kernel) pair for a target notebook path.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        path: &str,
    ) -> Result<(Arc<dyn DocumentClient>, Arc<dyn KernelClient>), ClientError>;
}
