// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Galatea — MCP session & execution orchestrator for live Jupyter notebooks.
//!
//! The crate sits between a tool-invocation protocol and two external
//! services (collaborative document, kernel execution) it deliberately does
//! not implement; see the `client` module for the seams.

pub mod client;
pub mod config;
pub mod exec;
pub mod mcp;
pub mod model;
pub mod ops;
