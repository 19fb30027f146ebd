//! Persisted proxy settings shared with the account-manager tooling.
//!
//! ## Storage Location
//!
//! - Windows: `%APPDATA%\ai.verdent.account-manager\proxy_settings.json`
//! - macOS: `~/Library/Application Support/ai.verdent.account-manager/proxy_settings.json`
//! - Linux: `~/.config/ai.verdent.account-manager/proxy_settings.json`
//!
//! The client never reads this file on its own; callers resolve the proxy
//! and pass it in through [`ClientOptions`](crate::client::ClientOptions).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{TrialError, TrialResult};

const APP_DIR: &str = "ai.verdent.account-manager";
const SETTINGS_FILE: &str = "proxy_settings.json";

/// Default proxy offered when nothing has been saved yet.
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:7890";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub enabled: bool,
    pub url: String,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: DEFAULT_PROXY_URL.to_string(),
        }
    }
}

impl ProxySettings {
    /// Default settings file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> TrialResult<Self> {
        Self::load_from(&require_default_path()?)
    }

    /// Save to the default location.
    pub fn save(&self) -> TrialResult<()> {
        self.save_to(&require_default_path()?)
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> TrialResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(TrialError::Storage(e)),
        };

        serde_json::from_str(&content).map_err(|e| {
            TrialError::Config(format!(
                "failed to parse proxy settings {}: {e}",
                path.display()
            ))
        })
    }

    /// Save to `path` as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> TrialResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| TrialError::Config(format!("failed to serialize proxy settings: {e}")))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// The proxy URL to use, if enabled and non-blank.
    pub fn active_proxy(&self) -> Option<&str> {
        let url = self.url.trim();
        (self.enabled && !url.is_empty()).then_some(url)
    }
}

fn require_default_path() -> TrialResult<PathBuf> {
    ProxySettings::default_path()
        .ok_or_else(|| TrialError::Config("no config directory on this platform".to_string()))
}
