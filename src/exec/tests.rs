// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::client::local::{default_responder, NotebookStore, Responder};
use crate::client::{
    ClientError, Connector, DocumentClient, LocalConnector, LocalDocument, LocalKernel,
};
use crate::model::{CellId, CellSnapshot, CellType, OutputRecord, Session};
use crate::ops::OpError;

use super::{
    execute_all_cells, execute_cell, install_package, kernel_variables, list_packages,
    wait_for_output, ExecError, ExecStatus, OutputPoll,
};

async fn session_with_latency(
    cells: &[(CellType, &str)],
    latency: Duration,
) -> Arc<Session> {
    let connector = LocalConnector::new().with_latency(latency);
    connector.seed("exec-test.ipynb", cells).await;
    let (document, kernel) = connector.connect("exec-test.ipynb").await.expect("connect");
    Arc::new(Session::new("exec-test.ipynb", document, kernel))
}

#[tokio::test]
async fn execute_cell_returns_dispatched_before_any_output_exists() {
    let session =
        session_with_latency(&[(CellType::Code, "1 + 1")], Duration::from_millis(100)).await;

    let handle = execute_cell(&session, 0).await.expect("dispatch");
    assert_eq!(handle.status, ExecStatus::Dispatched);
    assert_eq!(handle.index, 0);

    let cell = session.document().cell(0).await.expect("cell");
    assert!(cell.outputs.is_empty());
    assert_eq!(cell.execution_count, None);
}

#[tokio::test]
async fn execute_cell_rejects_markdown_and_stale_indices() {
    let session = session_with_latency(&[(CellType::Markdown, "# notes")], Duration::ZERO).await;

    assert_eq!(execute_cell(&session, 0).await.unwrap_err(), ExecError::NotCode { index: 0 });
    assert_eq!(
        execute_cell(&session, 4).await.unwrap_err(),
        ExecError::Op(OpError::Index { index: 4, count: 1 })
    );
}

#[tokio::test]
async fn wait_for_output_with_zero_wait_reports_not_executed() {
    let session = session_with_latency(&[(CellType::Code, "x = 1")], Duration::ZERO).await;
    let poll = wait_for_output(&session, 0, Duration::ZERO).await.expect("poll");
    assert_eq!(poll, OutputPoll::NotExecuted);
}

#[tokio::test]
async fn wait_for_output_returns_captured_text_once_it_lands() {
    let session =
        session_with_latency(&[(CellType::Code, "6 * 7")], Duration::from_millis(10)).await;

    execute_cell(&session, 0).await.expect("dispatch");
    let poll = wait_for_output(&session, 0, Duration::from_secs(2)).await.expect("poll");
    assert_eq!(poll, OutputPoll::Text("6 * 7".to_owned()));
}

#[tokio::test]
async fn wait_for_output_distinguishes_silent_execution_from_no_execution() {
    let silent: Responder = Arc::new(|_code: &str| Vec::new());
    let connector = LocalConnector::new()
        .with_latency(Duration::from_millis(10))
        .with_responder(silent);
    connector.seed("silent.ipynb", &[(CellType::Code, "x = 1")]).await;
    let (document, kernel) = connector.connect("silent.ipynb").await.expect("connect");
    let session = Session::new("silent.ipynb", document, kernel);

    execute_cell(&session, 0).await.expect("dispatch");
    let poll = wait_for_output(&session, 0, Duration::from_millis(300)).await.expect("poll");
    assert_eq!(poll, OutputPoll::NoOutput);
}

#[tokio::test]
async fn extreme_wait_bounds_are_clamped_instead_of_overflowing() {
    let session =
        session_with_latency(&[(CellType::Code, "6 * 7")], Duration::from_millis(5)).await;

    execute_cell(&session, 0).await.expect("dispatch");
    let poll = wait_for_output(&session, 0, Duration::from_secs(u64::MAX))
        .await
        .expect("poll");
    assert_eq!(poll, OutputPoll::Text("6 * 7".to_owned()));

    let report = kernel_variables(&session, Duration::from_secs(u64::MAX))
        .await
        .expect("scratch");
    assert_eq!(report.status, ExecStatus::Completed);
    assert_eq!(session.document().cell_count().await.expect("count"), 1);
}

#[tokio::test]
async fn execute_all_cells_dispatches_code_cells_sequentially_in_order() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder: Responder = {
        let seen = seen.clone();
        Arc::new(move |code: &str| {
            seen.try_lock().expect("recorder lock").push(code.to_owned());
            vec![OutputRecord::stream("ok")]
        })
    };

    let connector = LocalConnector::new().with_responder(recorder);
    connector
        .seed(
            "all.ipynb",
            &[
                (CellType::Code, "first"),
                (CellType::Markdown, "# skipped"),
                (CellType::Code, "second"),
                (CellType::Code, "third"),
            ],
        )
        .await;
    let (document, kernel) = connector.connect("all.ipynb").await.expect("connect");
    let session = Session::new("all.ipynb", document, kernel);

    let handles = execute_all_cells(&session).await.expect("dispatch all");
    assert_eq!(handles.len(), 3);
    assert_eq!(handles.iter().map(|handle| handle.index).collect::<Vec<_>>(), [0, 2, 3]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*seen.lock().await, ["first", "second", "third"]);
}

#[tokio::test]
async fn scratch_success_captures_output_and_leaves_no_cell_behind() {
    let session =
        session_with_latency(&[(CellType::Code, "x = 1")], Duration::from_millis(5)).await;

    let report = kernel_variables(&session, Duration::from_secs(2)).await.expect("scratch");
    assert_eq!(report.status, ExecStatus::Completed);
    assert!(report.output.expect("output").starts_with("Variable"));
    assert_eq!(report.cleanup_error, None);
    assert_eq!(session.document().cell_count().await.expect("count"), 1);
}

#[tokio::test]
async fn scratch_timeout_still_removes_the_cell() {
    let session =
        session_with_latency(&[(CellType::Code, "x = 1")], Duration::from_millis(500)).await;

    let report = list_packages(&session, Duration::from_millis(40)).await.expect("scratch");
    assert_eq!(report.status, ExecStatus::TimedOut);
    assert_eq!(report.output, None);
    assert_eq!(report.cleanup_error, None);
    assert_eq!(session.document().cell_count().await.expect("count"), 1);

    // The abandoned execution completes later against a deleted cell.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(session.document().cell_count().await.expect("count"), 1);
}

#[tokio::test]
async fn scratch_submit_failure_reports_failed_and_cleans_up() {
    let store = NotebookStore::new();
    store.seed(&[(CellType::Code, "x = 1")]).await;
    let document: Arc<dyn DocumentClient> =
        Arc::new(LocalDocument::new(store.clone(), "test-client"));
    let kernel = LocalKernel::spawn(store, Duration::ZERO, default_responder());
    kernel.disconnect();
    let session = Session::new("fail.ipynb", document, kernel.clone());

    let report = kernel_variables(&session, Duration::from_secs(1)).await.expect("scratch");
    assert_eq!(report.status, ExecStatus::Failed);
    assert!(report.failure.expect("failure").contains("kernel connection lost"));
    assert_eq!(report.cleanup_error, None);
    assert_eq!(session.document().cell_count().await.expect("count"), 1);
}

/// Document wrapper whose `remove_cell` always fails, to exercise the
/// leftover-scratch-cell reporting path.
#[derive(Debug)]
struct RemoveFailsDocument {
    inner: LocalDocument,
}

#[async_trait]
impl DocumentClient for RemoveFailsDocument {
    async fn cell_count(&self) -> Result<usize, ClientError> {
        self.inner.cell_count().await
    }

    async fn snapshot(&self) -> Result<Vec<CellSnapshot>, ClientError> {
        self.inner.snapshot().await
    }

    async fn cell(&self, index: usize) -> Result<CellSnapshot, ClientError> {
        self.inner.cell(index).await
    }

    async fn insert_cell(
        &self,
        index: usize,
        cell_type: CellType,
        source: &str,
    ) -> Result<CellId, ClientError> {
        self.inner.insert_cell(index, cell_type, source).await
    }

    async fn reinsert_cell(
        &self,
        index: usize,
        cell: CellSnapshot,
    ) -> Result<CellId, ClientError> {
        self.inner.reinsert_cell(index, cell).await
    }

    async fn remove_cell(&self, _index: usize) -> Result<CellSnapshot, ClientError> {
        Err(ClientError::unavailable("document write channel closed"))
    }

    async fn set_cell_source(&self, index: usize, source: &str) -> Result<(), ClientError> {
        self.inner.set_cell_source(index, source).await
    }

    async fn presence(&self) -> Result<Vec<String>, ClientError> {
        self.inner.presence().await
    }
}

#[tokio::test]
async fn scratch_cleanup_failure_is_surfaced_with_the_captured_output() {
    let store = NotebookStore::new();
    let document: Arc<dyn DocumentClient> = Arc::new(RemoveFailsDocument {
        inner: LocalDocument::new(store.clone(), "test-client"),
    });
    let kernel = LocalKernel::spawn(store, Duration::from_millis(5), default_responder());
    let session = Session::new("leak.ipynb", document, kernel);

    let report = kernel_variables(&session, Duration::from_secs(2)).await.expect("scratch");
    assert_eq!(report.status, ExecStatus::Completed);
    assert!(report.output.expect("output").starts_with("Variable"));
    assert!(report.cleanup_error.expect("cleanup error").contains("document write channel"));
    // The scratch cell is genuinely left behind in this case.
    assert_eq!(session.document().cell_count().await.expect("count"), 1);
}

#[tokio::test]
async fn install_package_validates_the_spec_before_interpolation() {
    let session = session_with_latency(&[], Duration::ZERO).await;

    let err = install_package(&session, "requests; rm -rf /", Duration::ZERO)
        .await
        .unwrap_err();
    assert_eq!(err, ExecError::InvalidPackage { spec: "requests; rm -rf /".to_owned() });

    let report = install_package(&session, "numpy==1.26", Duration::from_secs(1))
        .await
        .expect("scratch");
    assert_eq!(report.status, ExecStatus::Completed);
    assert!(report.output.expect("output").contains("numpy==1.26"));
}
