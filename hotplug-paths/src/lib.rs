//! Base directory paths for hotplug.
//!
//! The host keeps its plugins and settings under a single root so a
//! deployment step can stage replacement modules without knowing anything
//! else about the running process.

use std::path::PathBuf;

/// Get the hotplug host root directory.
///
/// Resolution order:
/// 1. `$HOTPLUG_HOME` if set
/// 2. `$XDG_DATA_HOME/hotplug`
/// 3. `~/.local/share/hotplug`
///
/// # Examples
///
/// ```
/// use hotplug_paths::host_root;
///
/// let root = host_root();
/// let plugins = root.join("plugins");
/// ```
pub fn host_root() -> PathBuf {
    if let Ok(home) = std::env::var("HOTPLUG_HOME") {
        PathBuf::from(home)
    } else if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("hotplug")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share/hotplug")
    } else {
        PathBuf::from(".local/share/hotplug")
    }
}

/// Get the hotplug config directory.
///
/// Returns `$XDG_CONFIG_HOME/hotplug` if set, otherwise `~/.config/hotplug`.
/// The CLI's own `hotplug.toml` lives here.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("hotplug")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/hotplug")
    } else {
        PathBuf::from(".config/hotplug")
    }
}

/// Default plugin root: one subdirectory per plugin.
pub fn plugin_dir() -> PathBuf {
    host_root().join("plugins")
}

/// Default global settings document (reload policy).
pub fn settings_path() -> PathBuf {
    host_root().join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-mutating assertions live in one test so they can't race each other.
    #[test]
    fn test_env_overrides() {
        unsafe {
            std::env::set_var("HOTPLUG_HOME", "/tmp/test-hotplug");
        }
        assert_eq!(host_root(), PathBuf::from("/tmp/test-hotplug"));
        assert_eq!(plugin_dir(), PathBuf::from("/tmp/test-hotplug/plugins"));
        assert_eq!(
            settings_path(),
            PathBuf::from("/tmp/test-hotplug/config.json")
        );
        unsafe {
            std::env::remove_var("HOTPLUG_HOME");
        }

        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-config");
        }
        assert_eq!(config_dir(), PathBuf::from("/tmp/test-config/hotplug"));
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    fn test_plugin_dir_is_under_root() {
        assert!(plugin_dir().ends_with("plugins"));
    }
}
