pub mod config;
pub mod plugin;
pub mod run;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::config::{ConfigLoader, HostConfig};

/// Overrides layered on top of `hotplug.toml`
#[derive(Args, Debug, Default, Clone)]
pub struct HostArgs {
    /// Plugin root directory
    #[arg(long, value_name = "DIR")]
    pub plugin_dir: Option<PathBuf>,

    /// Reload settings document (config.json)
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Host API version advertised to plugins
    #[arg(long, value_name = "VERSION")]
    pub api_version: Option<f32>,
}

impl HostArgs {
    /// Load the merged config file and apply command-line overrides
    pub fn resolve(&self) -> Result<HostConfig> {
        let config = ConfigLoader::load()?;
        Ok(self.apply(config.host))
    }

    fn apply(&self, mut host: HostConfig) -> HostConfig {
        if let Some(dir) = &self.plugin_dir {
            host.plugin_dir = dir.clone();
        }
        if let Some(settings) = &self.settings {
            host.settings_path = settings.clone();
        }
        if let Some(version) = self.api_version {
            host.api_version = version;
        }
        host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let args = HostArgs {
            plugin_dir: Some(PathBuf::from("/override/plugins")),
            api_version: Some(7.0),
            ..Default::default()
        };
        let base = HostConfig::default();
        let settings = base.settings_path.clone();

        let host = args.apply(base);
        assert_eq!(host.plugin_dir, PathBuf::from("/override/plugins"));
        assert_eq!(host.api_version, 7.0);
        assert_eq!(host.settings_path, settings);
    }

    #[test]
    fn test_no_overrides_is_identity() {
        let base = HostConfig::default();
        let host = HostArgs::default().apply(base.clone());
        assert_eq!(host.plugin_dir, base.plugin_dir);
        assert_eq!(host.tick_millis, base.tick_millis);
    }
}
