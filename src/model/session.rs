// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::path::{Component, Path};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::{DocumentClient, KernelClient};

/// One live (document, kernel) connection pair bound to a target notebook.
///
/// A session is immutable once created; changing the target notebook builds a
/// new `Session` and swaps it in wholesale, so concurrent tool calls always
/// observe either the old pair or the new pair, never a mix. Handles from a
/// replaced session stay usable until the last holder drops its `Arc`; their
/// eventual outputs are simply never delivered to anyone.
#[derive(Debug)]
pub struct Session {
    target_path: String,
    document: Arc<dyn DocumentClient>,
    kernel: Arc<dyn KernelClient>,
    edit_lock: Mutex<()>,
}

impl Session {
    pub fn new(
        target_path: impl Into<String>,
        document: Arc<dyn DocumentClient>,
        kernel: Arc<dyn KernelClient>,
    ) -> Self {
        Self {
            target_path: target_path.into(),
            document,
            kernel,
            edit_lock: Mutex::new(()),
        }
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    pub fn document(&self) -> &Arc<dyn DocumentClient> {
        &self.document
    }

    pub fn kernel(&self) -> &Arc<dyn KernelClient> {
        &self.kernel
    }

    /// Mutation guard: serializes structural edits and scratch-cell
    /// lifecycles within this session. Read-only operations never take it.
    pub fn edit_lock(&self) -> &Mutex<()> {
        &self.edit_lock
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    Empty,
    Absolute { path: String },
    Escapes { path: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "notebook path is empty"),
            Self::Absolute { path } => {
                write!(f, "notebook path must be relative (got '{path}')")
            }
            Self::Escapes { path } => {
                write!(f, "notebook path escapes the notebook root ('{path}')")
            }
        }
    }
}

impl std::error::Error for PathError {}

/// Validate a caller-supplied target path: relative, confined to the root.
pub fn validate_target_path(path: &str) -> Result<(), PathError> {
    if path.trim().is_empty() {
        return Err(PathError::Empty);
    }

    let parsed = Path::new(path);
    if parsed.is_absolute() {
        return Err(PathError::Absolute { path: path.to_owned() });
    }

    let mut depth: i64 = 0;
    for component in parsed.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(PathError::Absolute { path: path.to_owned() });
            }
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return Err(PathError::Escapes { path: path.to_owned() });
                }
            }
            Component::CurDir => {}
            Component::Normal(_) => depth += 1,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_target_path, PathError};

    #[test]
    fn accepts_plain_relative_paths() {
        validate_target_path("notebook.ipynb").expect("plain file");
        validate_target_path("experiments/run-7.ipynb").expect("nested file");
        validate_target_path("./a/../b.ipynb").expect("resolvable dots");
    }

    #[test]
    fn rejects_empty_path() {
        assert_eq!(validate_target_path("  "), Err(PathError::Empty));
    }

    #[test]
    fn rejects_absolute_path() {
        assert_eq!(
            validate_target_path("/etc/notebook.ipynb"),
            Err(PathError::Absolute { path: "/etc/notebook.ipynb".to_owned() })
        );
    }

    #[test]
    fn rejects_escape_via_parent_components() {
        assert_eq!(
            validate_target_path("../other.ipynb"),
            Err(PathError::Escapes { path: "../other.ipynb".to_owned() })
        );
        assert_eq!(
            validate_target_path("a/../../other.ipynb"),
            Err(PathError::Escapes { path: "a/../../other.ipynb".to_owned() })
        );
    }
}
