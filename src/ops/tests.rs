// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use rstest::rstest;

use crate::client::{Connector, LocalConnector};
use crate::model::{CellType, Session};

use super::{
    add_cell, delete_cell, edit_cell_source, move_cell, search_cells, split_cell, OpError,
};

async fn session_with(cells: &[(CellType, &str)]) -> Arc<Session> {
    let connector = LocalConnector::new();
    connector.seed("ops-test.ipynb", cells).await;
    let (document, kernel) = connector.connect("ops-test.ipynb").await.expect("connect");
    Arc::new(Session::new("ops-test.ipynb", document, kernel))
}

async fn sources(session: &Session) -> Vec<String> {
    session
        .document()
        .snapshot()
        .await
        .expect("snapshot")
        .into_iter()
        .map(|cell| cell.source)
        .collect()
}

#[tokio::test]
async fn add_cell_at_index_shifts_later_cells() {
    let session = session_with(&[
        (CellType::Code, "a"),
        (CellType::Code, "b"),
        (CellType::Code, "c"),
    ])
    .await;

    let index = add_cell(&session, "x = 1", CellType::Code, Some(1)).await.expect("add");
    assert_eq!(index, 1);
    assert_eq!(sources(&session).await, ["a", "x = 1", "b", "c"]);
}

#[tokio::test]
async fn add_cell_appends_when_index_is_omitted_or_out_of_range() {
    let session = session_with(&[(CellType::Code, "a")]).await;

    let index = add_cell(&session, "b", CellType::Code, None).await.expect("append");
    assert_eq!(index, 1);

    let index = add_cell(&session, "c", CellType::Markdown, Some(99)).await.expect("append");
    assert_eq!(index, 2);

    assert_eq!(sources(&session).await, ["a", "b", "c"]);
}

#[tokio::test]
async fn delete_cell_fails_on_stale_index() {
    let session = session_with(&[(CellType::Code, "a")]).await;
    let err = delete_cell(&session, 1).await.unwrap_err();
    assert_eq!(err, OpError::Index { index: 1, count: 1 });

    delete_cell(&session, 0).await.expect("delete");
    assert!(sources(&session).await.is_empty());
}

#[tokio::test]
async fn edit_cell_source_replaces_content_in_place() {
    let session = session_with(&[(CellType::Code, "old")]).await;
    edit_cell_source(&session, 0, "new").await.expect("edit");
    assert_eq!(sources(&session).await, ["new"]);

    let err = edit_cell_source(&session, 5, "x").await.unwrap_err();
    assert_eq!(err, OpError::Index { index: 5, count: 1 });
}

#[rstest]
#[case(0, 2, ["b", "c", "a", "d"])]
#[case(3, 0, ["d", "a", "b", "c"])]
#[case(1, 1, ["a", "b", "c", "d"])]
#[tokio::test]
async fn move_cell_lands_on_target_index(
    #[case] from: usize,
    #[case] to: usize,
    #[case] expected: [&str; 4],
) {
    let session = session_with(&[
        (CellType::Code, "a"),
        (CellType::Code, "b"),
        (CellType::Code, "c"),
        (CellType::Code, "d"),
    ])
    .await;

    move_cell(&session, from, to).await.expect("move");
    assert_eq!(sources(&session).await, expected);
}

#[tokio::test]
async fn move_cell_then_inverse_restores_ordering() {
    let session = session_with(&[
        (CellType::Code, "a"),
        (CellType::Code, "b"),
        (CellType::Code, "c"),
    ])
    .await;

    move_cell(&session, 0, 2).await.expect("move");
    move_cell(&session, 2, 0).await.expect("inverse move");
    assert_eq!(sources(&session).await, ["a", "b", "c"]);
}

#[tokio::test]
async fn move_cell_validates_both_indices() {
    let session = session_with(&[(CellType::Code, "a"), (CellType::Code, "b")]).await;
    assert_eq!(
        move_cell(&session, 2, 0).await.unwrap_err(),
        OpError::Index { index: 2, count: 2 }
    );
    assert_eq!(
        move_cell(&session, 0, 2).await.unwrap_err(),
        OpError::Index { index: 2, count: 2 }
    );
}

#[tokio::test]
async fn split_cell_divides_source_at_one_based_boundary() {
    let session = session_with(&[(CellType::Code, "one\ntwo\nthree")]).await;

    let (first, second) = split_cell(&session, 0, 1).await.expect("split");
    assert_eq!((first, second), (0, 1));
    assert_eq!(sources(&session).await, ["one", "two\nthree"]);
}

#[rstest]
#[case(0)]
#[case(3)]
#[tokio::test]
async fn split_cell_rejects_line_numbers_outside_the_cell(#[case] line: usize) {
    let session = session_with(&[(CellType::Code, "one\ntwo")]).await;
    let err = split_cell(&session, 0, line).await.unwrap_err();
    assert_eq!(err, OpError::Line { line, lines: 2 });
}

#[tokio::test]
async fn split_cell_keeps_cell_type() {
    let session = session_with(&[(CellType::Markdown, "# title\nbody")]).await;
    split_cell(&session, 0, 1).await.expect("split");

    let cells = session.document().snapshot().await.expect("snapshot");
    assert_eq!(cells[1].cell_type, CellType::Markdown);
    assert_eq!(cells[1].source, "body");
}

#[tokio::test]
async fn search_cells_orders_matches_and_honors_case() {
    let session = session_with(&[
        (CellType::Code, "import numpy"),
        (CellType::Markdown, "# NumPy notes"),
        (CellType::Code, "print('done')"),
    ])
    .await;

    let hits = search_cells(&session, "numpy", false).await.expect("search");
    assert_eq!(hits.iter().map(|hit| hit.index).collect::<Vec<_>>(), [0, 1]);

    let hits = search_cells(&session, "numpy", true).await.expect("search");
    assert_eq!(hits.iter().map(|hit| hit.index).collect::<Vec<_>>(), [0]);
    assert_eq!(hits[0].cell_type, CellType::Code);
}

/// Interleaved structural edits against one session: the guard linearizes
/// them, so every add/delete pair nets out and nothing errors.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_structural_edits_are_linearized() {
    let session = session_with(&[
        (CellType::Code, "seed-0"),
        (CellType::Code, "seed-1"),
        (CellType::Code, "seed-2"),
    ])
    .await;

    let mut tasks = Vec::new();
    for worker in 0..4usize {
        let session = session.clone();
        tasks.push(tokio::spawn(async move {
            for round in 0..25usize {
                let source = format!("w{worker}-r{round}");
                add_cell(&session, &source, CellType::Code, Some(worker % 3))
                    .await
                    .expect("add under guard");
                delete_cell(&session, 0).await.expect("delete under guard");
                if round % 5 == 0 {
                    move_cell(&session, 0, 2).await.expect("move under guard");
                }
            }
        }));
    }
    for task in tasks {
        task.await.expect("worker");
    }

    let count = session.document().cell_count().await.expect("count");
    assert_eq!(count, 3);
}
