// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural and content edits over the live cell sequence.
//!
//! Positional addressing is only meaningful while the document's shape is
//! stable, so every structural edit resolves its index fresh and applies it
//! under the session's mutation guard. Read-only scans never take the guard.

use std::fmt;

use crate::client::{ClientError, DocumentClient};
use crate::model::{CellType, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    /// Index out of the document's current bounds.
    Index { index: usize, count: usize },
    /// Split line number outside the cell's line count.
    Line { line: usize, lines: usize },
    Client(ClientError),
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index { index, count } => {
                write!(f, "cell index {index} is out of bounds (notebook has {count} cells)")
            }
            Self::Line { line, lines } => {
                write!(f, "line number {line} is out of bounds (cell has {lines} lines)")
            }
            Self::Client(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for OpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Client(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ClientError> for OpError {
    fn from(err: ClientError) -> Self {
        // A stale positional access surfaces like any other bounds failure.
        match err {
            ClientError::OutOfSync { index, count } => Self::Index { index, count },
            other => Self::Client(other),
        }
    }
}

/// Check `index` against the document's cell count right now.
///
/// Always performed fresh against the live document, never against a cached
/// snapshot; a concurrent structural edit may have changed the shape since
/// the caller picked the index.
pub async fn resolve(document: &dyn DocumentClient, index: usize) -> Result<usize, OpError> {
    let count = document.cell_count().await?;
    if index >= count {
        return Err(OpError::Index { index, count });
    }
    Ok(index)
}

/// Insert a cell so it occupies `index`; omitted or out-of-range indices
/// append at the end. Returns the index the new cell landed on.
pub async fn add_cell(
    session: &Session,
    source: &str,
    cell_type: CellType,
    index: Option<usize>,
) -> Result<usize, OpError> {
    let _guard = session.edit_lock().lock().await;
    let document = session.document();
    let count = document.cell_count().await?;
    let at = match index {
        Some(index) if index < count => index,
        _ => count,
    };
    document.insert_cell(at, cell_type, source).await?;
    Ok(at)
}

pub async fn delete_cell(session: &Session, index: usize) -> Result<(), OpError> {
    let _guard = session.edit_lock().lock().await;
    let document = session.document();
    let at = resolve(document.as_ref(), index).await?;
    document.remove_cell(at).await?;
    Ok(())
}

pub async fn edit_cell_source(
    session: &Session,
    index: usize,
    source: &str,
) -> Result<(), OpError> {
    let document = session.document();
    let at = resolve(document.as_ref(), index).await?;
    document.set_cell_source(at, source).await?;
    Ok(())
}

/// Move a cell from `from_index` to `to_index`.
///
/// Modelled as delete-then-reinsert — the document's native move produces
/// flicker for live viewers — with both steps under one guard acquisition so
/// no other structural edit can interleave between them.
pub async fn move_cell(session: &Session, from_index: usize, to_index: usize) -> Result<(), OpError> {
    let _guard = session.edit_lock().lock().await;
    let document = session.document();
    let count = document.cell_count().await?;
    if from_index >= count {
        return Err(OpError::Index { index: from_index, count });
    }
    if to_index >= count {
        return Err(OpError::Index { index: to_index, count });
    }
    if from_index == to_index {
        return Ok(());
    }

    let removed = document.remove_cell(from_index).await?;
    // Inserting at `to_index` in the post-removal sequence lands the cell on
    // `to_index` in the final sequence, for moves in either direction.
    document.reinsert_cell(to_index, removed).await?;
    Ok(())
}

/// Split the cell at `index` in place. `line_number` is 1-based: lines up to
/// and including it stay in the first cell, the rest move to a new cell of
/// the same type inserted right after. Outputs stay with the first cell.
pub async fn split_cell(
    session: &Session,
    index: usize,
    line_number: usize,
) -> Result<(usize, usize), OpError> {
    let _guard = session.edit_lock().lock().await;
    let document = session.document();
    let at = resolve(document.as_ref(), index).await?;
    let cell = document.cell(at).await?;

    let lines: Vec<&str> = cell.source.lines().collect();
    if line_number == 0 || line_number > lines.len() {
        return Err(OpError::Line { line: line_number, lines: lines.len() });
    }

    let head = lines[..line_number].join("\n");
    let tail = lines[line_number..].join("\n");

    document.set_cell_source(at, &head).await?;
    document.insert_cell(at + 1, cell.cell_type, &tail).await?;
    Ok((at, at + 1))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub index: usize,
    pub cell_type: CellType,
    pub source: String,
}

/// Read-only scan of every cell's source; ordered by index, no guard.
pub async fn search_cells(
    session: &Session,
    query: &str,
    case_sensitive: bool,
) -> Result<Vec<SearchHit>, OpError> {
    let cells = session.document().snapshot().await?;
    let needle = if case_sensitive { query.to_owned() } else { query.to_lowercase() };

    let mut hits = Vec::new();
    for (index, cell) in cells.iter().enumerate() {
        let matched = if case_sensitive {
            cell.source.contains(&needle)
        } else {
            cell.source.to_lowercase().contains(&needle)
        };
        if matched {
            hits.push(SearchHit {
                index,
                cell_type: cell.cell_type,
                source: cell.source.clone(),
            });
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests;
