// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! In-process backend: a shared cell store joined by a document client and a
//! FIFO kernel worker.
//!
//! The kernel delivers outputs back into the store asynchronously, keyed by
//! cell id, so the timing model matches a real deployment: submission is
//! acknowledged immediately, outputs appear later, and outputs for a cell
//! that was deleted in the meantime are discarded.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::model::{CellId, CellSnapshot, CellType, OutputRecord};

use super::{ClientError, Connector, DocumentClient, ExecutionId, KernelClient};

/// Maps submitted code to the outputs the simulated kernel produces.
pub type Responder = Arc<dyn Fn(&str) -> Vec<OutputRecord> + Send + Sync>;

/// The ordered cell sequence shared by one notebook's document and kernel.
#[derive(Debug)]
pub struct NotebookStore {
    cells: Mutex<Vec<CellSnapshot>>,
    next_cell_id: AtomicU64,
    execution_counter: AtomicU64,
}

impl NotebookStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cells: Mutex::new(Vec::new()),
            next_cell_id: AtomicU64::new(1),
            execution_counter: AtomicU64::new(0),
        })
    }

    fn allocate_cell_id(&self) -> CellId {
        CellId::new(self.next_cell_id.fetch_add(1, Ordering::Relaxed))
    }

    pub async fn seed(&self, cells: &[(CellType, &str)]) {
        let mut guard = self.cells.lock().await;
        for (cell_type, source) in cells {
            guard.push(CellSnapshot {
                cell_id: self.allocate_cell_id(),
                cell_type: *cell_type,
                source: (*source).to_owned(),
                outputs: Vec::new(),
                execution_count: None,
            });
        }
    }

    async fn insert(
        &self,
        index: usize,
        cell_type: CellType,
        source: &str,
    ) -> Result<CellId, ClientError> {
        let mut guard = self.cells.lock().await;
        if index > guard.len() {
            return Err(ClientError::OutOfSync { index, count: guard.len() });
        }
        let cell_id = self.allocate_cell_id();
        guard.insert(
            index,
            CellSnapshot {
                cell_id,
                cell_type,
                source: source.to_owned(),
                outputs: Vec::new(),
                execution_count: None,
            },
        );
        Ok(cell_id)
    }

    async fn reinsert(&self, index: usize, mut cell: CellSnapshot) -> Result<CellId, ClientError> {
        let mut guard = self.cells.lock().await;
        if index > guard.len() {
            return Err(ClientError::OutOfSync { index, count: guard.len() });
        }
        // The document service assigns a fresh id; any in-flight execution
        // addressed to the removed cell stays undeliverable.
        cell.cell_id = self.allocate_cell_id();
        let cell_id = cell.cell_id;
        guard.insert(index, cell);
        Ok(cell_id)
    }

    async fn remove(&self, index: usize) -> Result<CellSnapshot, ClientError> {
        let mut guard = self.cells.lock().await;
        if index >= guard.len() {
            return Err(ClientError::OutOfSync { index, count: guard.len() });
        }
        Ok(guard.remove(index))
    }

    async fn set_source(&self, index: usize, source: &str) -> Result<(), ClientError> {
        let mut guard = self.cells.lock().await;
        let count = guard.len();
        let cell = guard
            .get_mut(index)
            .ok_or(ClientError::OutOfSync { index, count })?;
        cell.source = source.to_owned();
        Ok(())
    }

    /// Deliver execution results for `cell_id`; silently dropped when the
    /// cell no longer exists (deleted or replaced while the kernel ran).
    async fn complete_execution(&self, cell_id: CellId, outputs: Vec<OutputRecord>) {
        let mut guard = self.cells.lock().await;
        let Some(cell) = guard.iter_mut().find(|cell| cell.cell_id == cell_id) else {
            tracing::debug!(%cell_id, "discarding outputs for vanished cell");
            return;
        };
        cell.outputs = outputs;
        cell.execution_count = Some(self.execution_counter.fetch_add(1, Ordering::Relaxed) + 1);
    }
}

#[derive(Debug)]
pub struct LocalDocument {
    store: Arc<NotebookStore>,
    client_name: String,
}

impl LocalDocument {
    pub fn new(store: Arc<NotebookStore>, client_name: impl Into<String>) -> Self {
        Self { store, client_name: client_name.into() }
    }
}

#[async_trait]
impl DocumentClient for LocalDocument {
    async fn cell_count(&self) -> Result<usize, ClientError> {
        Ok(self.store.cells.lock().await.len())
    }

    async fn snapshot(&self) -> Result<Vec<CellSnapshot>, ClientError> {
        Ok(self.store.cells.lock().await.clone())
    }

    async fn cell(&self, index: usize) -> Result<CellSnapshot, ClientError> {
        let guard = self.store.cells.lock().await;
        guard
            .get(index)
            .cloned()
            .ok_or(ClientError::OutOfSync { index, count: guard.len() })
    }

    async fn insert_cell(
        &self,
        index: usize,
        cell_type: CellType,
        source: &str,
    ) -> Result<CellId, ClientError> {
        self.store.insert(index, cell_type, source).await
    }

    async fn reinsert_cell(
        &self,
        index: usize,
        cell: CellSnapshot,
    ) -> Result<CellId, ClientError> {
        self.store.reinsert(index, cell).await
    }

    async fn remove_cell(&self, index: usize) -> Result<CellSnapshot, ClientError> {
        self.store.remove(index).await
    }

    async fn set_cell_source(&self, index: usize, source: &str) -> Result<(), ClientError> {
        self.store.set_source(index, source).await
    }

    async fn presence(&self) -> Result<Vec<String>, ClientError> {
        Ok(vec![self.client_name.clone()])
    }
}

struct Submission {
    cell_id: CellId,
    code: String,
}

/// Simulated kernel: a strict FIFO queue with configurable latency.
pub struct LocalKernel {
    queue: mpsc::UnboundedSender<Submission>,
    next_execution_id: AtomicU64,
    disconnected: AtomicBool,
}

impl std::fmt::Debug for LocalKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKernel")
            .field("disconnected", &self.disconnected.load(Ordering::Relaxed))
            .finish()
    }
}

impl LocalKernel {
    /// Start the kernel worker. Must run inside a tokio runtime.
    pub fn spawn(store: Arc<NotebookStore>, latency: Duration, responder: Responder) -> Arc<Self> {
        let (queue, mut submissions) = mpsc::unbounded_channel::<Submission>();
        tokio::spawn(async move {
            while let Some(submission) = submissions.recv().await {
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
                let outputs = responder(&submission.code);
                store.complete_execution(submission.cell_id, outputs).await;
            }
        });
        Arc::new(Self {
            queue,
            next_execution_id: AtomicU64::new(1),
            disconnected: AtomicBool::new(false),
        })
    }

    /// Model kernel connection loss: all later submissions fail.
    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::Relaxed);
    }
}

#[async_trait]
impl KernelClient for LocalKernel {
    async fn submit(&self, cell: CellId, code: &str) -> Result<ExecutionId, ClientError> {
        if self.disconnected.load(Ordering::Relaxed) {
            return Err(ClientError::unavailable("kernel connection lost"));
        }
        self.queue
            .send(Submission { cell_id: cell, code: code.to_owned() })
            .map_err(|_| ClientError::unavailable("kernel worker stopped"))?;
        Ok(ExecutionId::new(self.next_execution_id.fetch_add(1, Ordering::Relaxed)))
    }
}

/// Echo-style default kernel behavior, plus canned replies for the
/// introspection magics the scratch tools submit.
pub fn default_responder() -> Responder {
    Arc::new(|code: &str| {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if trimmed.starts_with("%whos") {
            return vec![OutputRecord::stream(
                "Variable   Type    Data/Info\n----------------------------\n",
            )];
        }
        if trimmed.starts_with("%pip install") {
            let package = trimmed.trim_start_matches("%pip install").trim();
            return vec![OutputRecord::stream(format!("Successfully installed {package}\n"))];
        }
        if trimmed.starts_with("%pip list") {
            return vec![OutputRecord::stream(
                "Package    Version\n---------- -------\npip        24.0\n",
            )];
        }
        let last_line = trimmed
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default();
        vec![OutputRecord::execute_result_plain(last_line.trim())]
    })
}

/// Connector over in-process notebooks, one shared store per path so
/// re-targeting back to a path rejoins the same cell sequence.
pub struct LocalConnector {
    notebooks: Mutex<BTreeMap<String, Arc<NotebookStore>>>,
    latency: Duration,
    responder: Responder,
    client_name: String,
}

impl LocalConnector {
    pub fn new() -> Self {
        Self {
            notebooks: Mutex::new(BTreeMap::new()),
            latency: Duration::ZERO,
            responder: default_responder(),
            client_name: "galatea".to_owned(),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_responder(mut self, responder: Responder) -> Self {
        self.responder = responder;
        self
    }

    /// Pre-populate the notebook at `path`.
    pub async fn seed(&self, path: &str, cells: &[(CellType, &str)]) {
        let store = self.store_for(path).await;
        store.seed(cells).await;
    }

    async fn store_for(&self, path: &str) -> Arc<NotebookStore> {
        let mut notebooks = self.notebooks.lock().await;
        notebooks.entry(path.to_owned()).or_insert_with(NotebookStore::new).clone()
    }
}

impl Default for LocalConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(
        &self,
        path: &str,
    ) -> Result<(Arc<dyn DocumentClient>, Arc<dyn KernelClient>), ClientError> {
        let store = self.store_for(path).await;
        let document = Arc::new(LocalDocument::new(store.clone(), self.client_name.clone()));
        let kernel = LocalKernel::spawn(store, self.latency, self.responder.clone());
        Ok((document as Arc<dyn DocumentClient>, kernel as Arc<dyn KernelClient>))
    }
}
