//! Console configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{ConsoleError, DEFAULT_BASE_URL, DEFAULT_NAVIGATION};

/// Environment variable overriding the API endpoint
pub const ENV_BASE_URL: &str = "CONSOLE_BASE_URL";

/// Environment variable overriding the state directory
pub const ENV_STATE_DIR: &str = "CONSOLE_STATE_DIR";

/// Main console configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// API endpoint, without the `/api/v1` prefix
    pub base_url: String,

    /// Directory holding the local and session storage documents
    pub state_dir: PathBuf,

    /// Menu entry selected when nothing (valid) is persisted
    pub default_navigation: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            state_dir: PathBuf::from(".console"),
            default_navigation: DEFAULT_NAVIGATION.to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the state directory
    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = state_dir.into();
        self
    }

    /// Set the default menu entry
    pub fn with_default_navigation(mut self, id: impl Into<String>) -> Self {
        self.default_navigation = id.into();
        self
    }

    /// Path of the document kept across restarts (selected project, menu
    /// selection); sign-out removes the project but keeps the menu selection
    pub fn local_storage_path(&self) -> PathBuf {
        self.state_dir.join("local.json")
    }

    /// Path of the document cleared on sign-out (token, email)
    pub fn session_storage_path(&self) -> PathBuf {
        self.state_dir.join("session.json")
    }

    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `CONSOLE_*` overrides, reading a `.env` file first if present
    pub fn with_env(mut self) -> Self {
        dotenvy::dotenv().ok();

        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Ok(state_dir) = std::env::var(ENV_STATE_DIR) {
            self.state_dir = PathBuf::from(state_dir);
        }
        self
    }

    /// Check the endpoint is an absolute http(s) URL
    pub fn validate(&self) -> crate::Result<()> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            ConsoleError::InvalidConfig(format!("base_url {}: {}", self.base_url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConsoleError::InvalidConfig(format!(
                "base_url must be http or https, got {}",
                url.scheme()
            )));
        }

        if self.default_navigation.trim().is_empty() {
            return Err(ConsoleError::InvalidConfig(
                "default_navigation must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
