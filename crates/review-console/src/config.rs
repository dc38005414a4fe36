//! Console configuration — backend endpoint, paging, and the user
//! directory for the credential check.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Roster page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 15;

/// Top-level console configuration.
///
/// Defaults come from the environment; a TOML file can override any
/// field. The page size is fixed for the whole session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base URL of the prediction backend.
    pub api_base: String,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Roster page size.
    pub page_size: usize,
    /// Shared bearer token installed on successful login.
    pub api_token: String,
    /// username → password directory consulted at login.
    pub users: HashMap<String, String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base: std::env::var("REVIEW_API_BASE")
                .unwrap_or_else(|_| "http://127.0.0.1:8000".into()),
            request_timeout_secs: 30,
            page_size: DEFAULT_PAGE_SIZE,
            api_token: std::env::var("REVIEW_API_TOKEN").unwrap_or_default(),
            users: HashMap::new(),
        }
    }
}

impl ConsoleConfig {
    /// Load from a TOML file, with defaults for anything unspecified.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Credential check against the configured user directory.
    pub fn check_credentials(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|expected| expected == password)
    }
}
