//! Plugin descriptors read from `PluginInfo.json`

use std::io;

use hotplug_plugin_api::PluginManifest;

use super::error::PluginManagerError;
use super::layout::PluginLayout;

/// Parsed manifest data for one plugin, fixed for the lifetime of a load
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDescriptor {
    /// Directory-derived identifier
    pub name: String,
    /// Display name, empty when the manifest gives none
    pub full_name: String,
    pub description: String,
    pub version: f32,
    /// Minimum host API version, `0.0` for none
    pub min_api_version: f32,
    /// Plugins this one expects to be loaded
    pub dependencies: Vec<String>,
}

impl PluginDescriptor {
    /// Descriptor with every field at its default
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::from_manifest(name, PluginManifest::default())
    }

    /// Combine a directory name with its manifest
    pub fn from_manifest(name: impl Into<String>, manifest: PluginManifest) -> Self {
        Self {
            name: name.into(),
            full_name: manifest.full_name,
            description: manifest.description,
            version: manifest.version,
            min_api_version: manifest.min_api_version,
            dependencies: manifest.dependencies,
        }
    }

    /// `full_name` if set, else `name`
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.name
        } else {
            &self.full_name
        }
    }

    /// Whether this plugin refuses to run on `host_version`
    pub fn requires_newer_api(&self, host_version: f32) -> bool {
        self.min_api_version != 0.0 && host_version < self.min_api_version
    }
}

/// Reads descriptors from the plugin layout
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    layout: PluginLayout,
}

impl DescriptorStore {
    pub fn new(layout: PluginLayout) -> Self {
        Self { layout }
    }

    /// Read a plugin's descriptor.
    ///
    /// A missing manifest is not an error and yields the defaults; a manifest
    /// that exists but does not parse is.
    pub fn read_descriptor(&self, name: &str) -> Result<PluginDescriptor, PluginManagerError> {
        let path = self.layout.manifest_path(name);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(PluginDescriptor::with_defaults(name));
            }
            Err(e) => return Err(e.into()),
        };

        let manifest = PluginManifest::from_json(&content)
            .map_err(|source| PluginManagerError::ManifestParse { path, source })?;
        Ok(PluginDescriptor::from_manifest(name, manifest))
    }
}
