// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A session binds one target notebook to one (document, kernel) connection
//! pair; cells are positional snapshots over the document's ordered sequence.

pub mod cell;
pub mod session;

pub use cell::{CellId, CellSnapshot, CellType, OutputRecord};
pub use session::{validate_target_path, PathError, Session};
