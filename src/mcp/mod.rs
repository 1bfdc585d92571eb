// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Model Context Protocol (MCP) server surface.
//!
//! The tool catalog is the system boundary: everything an external agent can
//! do to the target notebook goes through these tools.

mod server;
mod types;

pub use server::{BootError, GalateaMcp, NOT_EXECUTED, NO_OUTPUT};
