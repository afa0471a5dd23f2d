//! Global reload policy from the host settings document
//!
//! ```json
//! {
//!   "settings": {
//!     "AutomaticPluginReloading": true,
//!     "AutomaticPluginReloadSeconds": 5,
//!     "SaveWorldBeforePluginReload": true
//!   }
//! }
//! ```

use std::io;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::error::PluginManagerError;

/// Default seconds between staged-replacement scans
pub const DEFAULT_RELOAD_SECONDS: u64 = 5;

/// Longest accepted interval between scans (one day)
pub const MAX_RELOAD_SECONDS: u64 = 24 * 60 * 60;

/// Settings document as stored on disk (all fields optional)
#[derive(Debug, Default, Deserialize)]
struct RawSettingsDocument {
    #[serde(default)]
    settings: RawReloadSettings,
}

#[derive(Debug, Default, Deserialize)]
struct RawReloadSettings {
    #[serde(rename = "AutomaticPluginReloading")]
    enabled: Option<bool>,
    #[serde(rename = "AutomaticPluginReloadSeconds")]
    interval_seconds: Option<u64>,
    #[serde(rename = "SaveWorldBeforePluginReload")]
    checkpoint_before_reload: Option<bool>,
}

/// Hot-reload policy with defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadSettings {
    /// Whether the watcher scans at all
    pub enabled: bool,
    /// Minimum time between scans
    pub interval: Duration,
    /// Request a host state checkpoint before the first reload of a pass
    pub checkpoint_before_reload: bool,
}

impl Default for ReloadSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(DEFAULT_RELOAD_SECONDS),
            checkpoint_before_reload: true,
        }
    }
}

impl ReloadSettings {
    /// Parse a settings document.
    ///
    /// Interval and checkpoint flag are only read when reloading is enabled.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let raw: RawSettingsDocument = serde_json::from_str(content)?;
        Ok(Self::finalize(raw.settings))
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, PluginManagerError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        Self::from_json(&content).map_err(|source| PluginManagerError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn finalize(raw: RawReloadSettings) -> Self {
        let defaults = Self::default();
        if !raw.enabled.unwrap_or(defaults.enabled) {
            return defaults;
        }

        Self {
            enabled: true,
            interval: raw
                .interval_seconds
                .map(|secs| {
                    if secs > MAX_RELOAD_SECONDS {
                        tracing::warn!(
                            seconds = secs,
                            max = MAX_RELOAD_SECONDS,
                            "AutomaticPluginReloadSeconds too large, clamping"
                        );
                    }
                    Duration::from_secs(secs.min(MAX_RELOAD_SECONDS))
                })
                .unwrap_or(defaults.interval),
            checkpoint_before_reload: raw
                .checkpoint_before_reload
                .unwrap_or(defaults.checkpoint_before_reload),
        }
    }
}
