// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Injected environment configuration.
//!
//! Connection coordinates mirror the classic Jupyter MCP deployment
//! (`SERVER_URL`, `TOKEN`, `NOTEBOOK_PATH`); they are consumed here and
//! handed to whichever connector backs the process.

use std::time::Duration;

const DEFAULT_SERVER_URL: &str = "http://localhost:8888";
const DEFAULT_NOTEBOOK_PATH: &str = "notebook.ipynb";
const DEFAULT_WAIT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address of the Jupyter deployment backing the connectors.
    pub server_url: String,
    /// Authentication token for that deployment, when required.
    pub token: Option<String>,
    /// Initial target notebook path (relative).
    pub notebook_path: String,
    /// Default bound for output polls when a tool call omits its own.
    pub default_wait: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let server_url =
            lookup("SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_owned());
        let token = lookup("TOKEN").filter(|token| !token.is_empty());
        let notebook_path =
            lookup("NOTEBOOK_PATH").unwrap_or_else(|| DEFAULT_NOTEBOOK_PATH.to_owned());
        let default_wait = lookup("GALATEA_WAIT_SECONDS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_WAIT);

        Self { server_url, token, notebook_path, default_wait }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Config;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.server_url, "http://localhost:8888");
        assert_eq!(config.token, None);
        assert_eq!(config.notebook_path, "notebook.ipynb");
        assert_eq!(config.default_wait, Duration::from_secs(10));
    }

    #[test]
    fn lookup_values_override_defaults() {
        let config = Config::from_lookup(|key| match key {
            "SERVER_URL" => Some("http://jupyter:8888".to_owned()),
            "TOKEN" => Some("secret".to_owned()),
            "NOTEBOOK_PATH" => Some("work/run.ipynb".to_owned()),
            "GALATEA_WAIT_SECONDS" => Some("3".to_owned()),
            _ => None,
        });
        assert_eq!(config.server_url, "http://jupyter:8888");
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.notebook_path, "work/run.ipynb");
        assert_eq!(config.default_wait, Duration::from_secs(3));
    }

    #[test]
    fn empty_token_and_bad_wait_fall_back() {
        let config = Config::from_lookup(|key| match key {
            "TOKEN" => Some(String::new()),
            "GALATEA_WAIT_SECONDS" => Some("soon".to_owned()),
            _ => None,
        });
        assert_eq!(config.token, None);
        assert_eq!(config.default_wait, Duration::from_secs(10));
    }
}
