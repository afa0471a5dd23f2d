use super::types::{DEFAULT_TICK_MILLIS, HostConfig, HotplugConfig, RawHostConfig, RawHotplugConfig};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use hotplug_plugin_api::HOST_API_VERSION;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<HotplugConfig> {
        let mut raw = RawHotplugConfig::default();

        // Layer 1: User config
        let user_path = Self::user_config_path();
        if user_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        hotplug_paths::config_dir().join("hotplug.toml")
    }

    /// Get project config path
    /// Can be overridden with HOTPLUG_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("HOTPLUG_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("hotplug.toml")
        } else {
            PathBuf::from(".hotplug/hotplug.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<RawHotplugConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawHotplugConfig, overlay: RawHotplugConfig) -> RawHotplugConfig {
        RawHotplugConfig {
            host: RawHostConfig {
                plugin_dir: overlay.host.plugin_dir.or(base.host.plugin_dir),
                settings_path: overlay.host.settings_path.or(base.host.settings_path),
                api_version: overlay.host.api_version.or(base.host.api_version),
                tick_millis: overlay.host.tick_millis.or(base.host.tick_millis),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawHotplugConfig) -> HotplugConfig {
        HotplugConfig {
            host: HostConfig {
                plugin_dir: raw
                    .host
                    .plugin_dir
                    .unwrap_or_else(hotplug_paths::plugin_dir),
                settings_path: raw
                    .host
                    .settings_path
                    .unwrap_or_else(hotplug_paths::settings_path),
                api_version: raw.host.api_version.unwrap_or(HOST_API_VERSION),
                tick_millis: raw.host.tick_millis.unwrap_or(DEFAULT_TICK_MILLIS),
            },
        }
    }

    /// Load config from a specific path (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<HotplugConfig> {
        if path.exists() {
            Ok(Self::finalize(Self::read_raw(path)?))
        } else {
            Ok(HotplugConfig::default())
        }
    }
}
