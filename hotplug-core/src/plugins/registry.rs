//! Plugin registry - the authoritative set of loaded plugins

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::descriptor::PluginDescriptor;
use super::loader::ModuleHandle;

/// A loaded plugin: its descriptor plus the module that backs it.
///
/// Owned exclusively by [`PluginRegistry`]. Dropping it releases the module.
#[derive(Debug)]
pub struct LoadedPlugin {
    descriptor: PluginDescriptor,
    module: ModuleHandle,
}

impl LoadedPlugin {
    pub fn new(descriptor: PluginDescriptor, module: ModuleHandle) -> Self {
        Self { descriptor, module }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Path the module was loaded from
    pub fn module_path(&self) -> &Path {
        self.module.path()
    }

    pub fn module(&self) -> &ModuleHandle {
        &self.module
    }

    pub(crate) fn module_mut(&mut self) -> &mut ModuleHandle {
        &mut self.module
    }

    /// Owned snapshot of this plugin
    pub fn info(&self) -> PluginInfo {
        PluginInfo {
            descriptor: self.descriptor.clone(),
            module_path: self.module.path().to_path_buf(),
        }
    }
}

/// Snapshot of a loaded plugin, detached from its module handle
#[derive(Debug, Clone, PartialEq)]
pub struct PluginInfo {
    pub descriptor: PluginDescriptor,
    pub module_path: PathBuf,
}

impl PluginInfo {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Loaded plugins keyed by exact, case-sensitive name.
///
/// Holds at most one entry per name.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, LoadedPlugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn find(&self, name: &str) -> Option<&LoadedPlugin> {
        self.plugins.get(name)
    }

    pub(crate) fn find_mut(&mut self, name: &str) -> Option<&mut LoadedPlugin> {
        self.plugins.get_mut(name)
    }

    /// Snapshot of every loaded plugin, ordered by name
    pub fn all(&self) -> Vec<PluginInfo> {
        self.plugins.values().map(LoadedPlugin::info).collect()
    }

    /// Iterate loaded plugins in name order
    pub fn iter(&self) -> impl Iterator<Item = &LoadedPlugin> {
        self.plugins.values()
    }

    /// Names of loaded plugins, ordered
    pub fn names(&self) -> Vec<String> {
        self.plugins.keys().cloned().collect()
    }

    /// Insert a plugin.
    ///
    /// Returns the plugin back if the name is already taken; the existing
    /// entry is left untouched.
    pub fn insert(&mut self, plugin: LoadedPlugin) -> Result<(), LoadedPlugin> {
        if self.is_loaded(plugin.name()) {
            return Err(plugin);
        }
        self.plugins.insert(plugin.name().to_string(), plugin);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<LoadedPlugin> {
        self.plugins.remove(name)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
