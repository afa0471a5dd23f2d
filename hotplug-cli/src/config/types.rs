use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use hotplug_core::PluginManagerConfig;
use hotplug_plugin_api::HOST_API_VERSION;

/// Default cadence at which the host drives the reload watcher
pub const DEFAULT_TICK_MILLIS: u64 = 1000;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHotplugConfig {
    #[serde(default)]
    pub host: RawHostConfig,
}

/// Host config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHostConfig {
    /// Plugin root directory
    pub plugin_dir: Option<PathBuf>,

    /// Reload settings document (`config.json`)
    pub settings_path: Option<PathBuf>,

    /// Host API version advertised to plugins
    pub api_version: Option<f32>,

    /// Watcher drive cadence in milliseconds
    pub tick_millis: Option<u64>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HotplugConfig {
    #[serde(default)]
    pub host: HostConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub plugin_dir: PathBuf,
    pub settings_path: PathBuf,
    pub api_version: f32,
    pub tick_millis: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            plugin_dir: hotplug_paths::plugin_dir(),
            settings_path: hotplug_paths::settings_path(),
            api_version: HOST_API_VERSION,
            tick_millis: DEFAULT_TICK_MILLIS,
        }
    }
}

impl HostConfig {
    pub fn manager_config(&self) -> PluginManagerConfig {
        PluginManagerConfig {
            plugin_dir: self.plugin_dir.clone(),
            settings_path: self.settings_path.clone(),
            api_version: self.api_version,
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}
