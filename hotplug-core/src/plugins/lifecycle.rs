//! PluginManager - load/unload lifecycle over the registry
//!
//! One mutex guards the registry *and* each load/unload sequence, so two
//! callers (the reload watcher and operator commands) can never load or
//! release the same module twice.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hotplug_plugin_api::{HOST_API_VERSION, INIT_SYMBOL, SHUTDOWN_SYMBOL};

use super::audit::{MissingDependency, audit_dependencies};
use super::descriptor::DescriptorStore;
use super::error::PluginManagerError;
use super::layout::PluginLayout;
use super::loader::{LibLoader, ModuleLoader};
use super::registry::{LoadedPlugin, PluginInfo, PluginRegistry};
use super::settings::ReloadSettings;

/// Configuration for PluginManager
#[derive(Debug, Clone)]
pub struct PluginManagerConfig {
    /// Root holding one subdirectory per plugin
    pub plugin_dir: PathBuf,
    /// Global settings document (reload policy)
    pub settings_path: PathBuf,
    /// Host API version compared against each manifest's `MinApiVersion`
    pub api_version: f32,
}

impl Default for PluginManagerConfig {
    fn default() -> Self {
        Self {
            plugin_dir: hotplug_paths::plugin_dir(),
            settings_path: hotplug_paths::settings_path(),
            api_version: HOST_API_VERSION,
        }
    }
}

/// Result of [`PluginManager::load_all`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BulkLoadReport {
    /// Plugins that loaded, in discovery order
    pub loaded: Vec<String>,
    /// Plugins that failed, with the error message
    pub failed: Vec<(String, String)>,
    /// Dependency audit findings
    pub missing_dependencies: Vec<MissingDependency>,
}

/// Loads, unloads and tracks native plugins
pub struct PluginManager {
    layout: PluginLayout,
    descriptors: DescriptorStore,
    settings_path: PathBuf,
    api_version: f32,
    loader: Arc<dyn ModuleLoader>,
    registry: Mutex<PluginRegistry>,
    reload_settings: Mutex<ReloadSettings>,
}

impl PluginManager {
    /// Create a manager backed by the platform loader
    pub fn new(config: PluginManagerConfig) -> Self {
        Self::with_loader(config, Arc::new(LibLoader))
    }

    /// Create a manager with a custom module loader
    pub fn with_loader(config: PluginManagerConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        let layout = PluginLayout::new(config.plugin_dir);
        Self {
            descriptors: DescriptorStore::new(layout.clone()),
            layout,
            settings_path: config.settings_path,
            api_version: config.api_version,
            loader,
            registry: Mutex::new(PluginRegistry::new()),
            reload_settings: Mutex::new(ReloadSettings::default()),
        }
    }

    pub fn layout(&self) -> &PluginLayout {
        &self.layout
    }

    pub fn api_version(&self) -> f32 {
        self.api_version
    }

    /// Load one plugin by name.
    ///
    /// The module's init entry point, if exported, runs before this returns.
    pub fn load(&self, name: &str) -> Result<PluginInfo, PluginManagerError> {
        let mut registry = self.lock_registry();
        self.load_locked(&mut registry, name)
    }

    /// Unload one plugin by name.
    ///
    /// If the platform refuses to release the module the plugin stays
    /// registered and the error is returned.
    pub fn unload(&self, name: &str) -> Result<(), PluginManagerError> {
        let mut registry = self.lock_registry();
        self.unload_locked(&mut registry, name)
    }

    /// Unload, promote a staged build if one exists, and load again.
    ///
    /// Runs as one unit under the registry lock. A failure after the unload
    /// leaves the plugin unloaded.
    pub fn reload(&self, name: &str) -> Result<PluginInfo, PluginManagerError> {
        let mut registry = self.lock_registry();
        self.unload_locked(&mut registry, name)?;

        if self.layout.has_staged(name) {
            self.layout.promote_staged(name)?;
            self.layout.remove_staged(name)?;
        }

        self.load_locked(&mut registry, name)
    }

    /// Discover and load every plugin under the root.
    ///
    /// A staged build found for a plugin that is not loaded yet is promoted
    /// first. Failures are logged per plugin and never stop the pass. Ends by
    /// auditing dependencies and reading the reload policy.
    pub fn load_all(&self) -> Result<BulkLoadReport, PluginManagerError> {
        let mut report = BulkLoadReport::default();

        for name in self.layout.discover()? {
            match self.load_discovered(&name) {
                Ok(_) => report.loaded.push(name),
                Err(e) => {
                    tracing::warn!(plugin = %name, error = %e, "{}", e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        report.missing_dependencies = audit_dependencies(&self.lock_registry());

        let settings = match ReloadSettings::load(&self.settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Using default reload settings");
                ReloadSettings::default()
            }
        };
        tracing::debug!(
            enabled = settings.enabled,
            interval_secs = settings.interval.as_secs(),
            checkpoint = settings.checkpoint_before_reload,
            "Plugin reload settings"
        );
        self.set_reload_settings(settings);

        tracing::info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Loaded all plugins"
        );
        Ok(report)
    }

    fn load_discovered(&self, name: &str) -> Result<PluginInfo, PluginManagerError> {
        let mut registry = self.lock_registry();

        if !registry.is_loaded(name) && self.layout.has_staged(name) {
            tracing::info!(plugin = %name, "Promoting staged plugin build");
            self.layout.promote_staged(name)?;
            self.layout.remove_staged(name)?;
        }

        self.load_locked(&mut registry, name)
    }

    /// Unload every plugin, last name first. Failures are logged.
    pub fn unload_all(&self) {
        let mut registry = self.lock_registry();
        for name in registry.names().into_iter().rev() {
            if let Err(e) = self.unload_locked(&mut registry, &name) {
                tracing::warn!(plugin = %name, error = %e, "{}", e);
            }
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.lock_registry().is_loaded(name)
    }

    /// Snapshot of one loaded plugin
    pub fn info(&self, name: &str) -> Option<PluginInfo> {
        self.lock_registry().find(name).map(LoadedPlugin::info)
    }

    /// Snapshot of all loaded plugins, ordered by name
    pub fn list(&self) -> Vec<PluginInfo> {
        self.lock_registry().all()
    }

    /// Run the dependency audit against the current registry
    pub fn audit_dependencies(&self) -> Vec<MissingDependency> {
        audit_dependencies(&self.lock_registry())
    }

    /// Reload policy read by the last [`load_all`](Self::load_all)
    pub fn reload_settings(&self) -> ReloadSettings {
        self.reload_settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Override the reload policy
    pub fn set_reload_settings(&self, settings: ReloadSettings) {
        *self
            .reload_settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = settings;
    }

    fn load_locked(
        &self,
        registry: &mut PluginRegistry,
        name: &str,
    ) -> Result<PluginInfo, PluginManagerError> {
        check_name(name)?;
        let module_path = self.layout.module_path(name);
        if !module_path.is_file() {
            return Err(PluginManagerError::NotFound {
                name: name.to_string(),
            });
        }

        if registry.is_loaded(name) {
            return Err(PluginManagerError::AlreadyLoaded {
                name: name.to_string(),
            });
        }

        let descriptor = self.descriptors.read_descriptor(name)?;
        if descriptor.requires_newer_api(self.api_version) {
            return Err(PluginManagerError::IncompatibleVersion {
                name: name.to_string(),
                required: descriptor.min_api_version,
                current: self.api_version,
            });
        }

        let module =
            self.loader
                .load(&module_path)
                .map_err(|source| PluginManagerError::LoadFailed {
                    name: name.to_string(),
                    source,
                })?;

        if let Some(init) = module.find_symbol(INIT_SYMBOL) {
            tracing::debug!(plugin = %name, "Calling {}", INIT_SYMBOL);
            // SAFETY: exported by the plugin under the entry point contract.
            unsafe { init() };
        }

        let plugin = LoadedPlugin::new(descriptor, module);
        let info = plugin.info();
        if registry.insert(plugin).is_err() {
            return Err(PluginManagerError::AlreadyLoaded {
                name: name.to_string(),
            });
        }

        tracing::info!(
            plugin = %name,
            version = info.descriptor.version,
            "Loaded plugin {} V{:.1} ({})",
            info.descriptor.display_name(),
            info.descriptor.version,
            info.descriptor.description
        );
        Ok(info)
    }

    fn unload_locked(
        &self,
        registry: &mut PluginRegistry,
        name: &str,
    ) -> Result<(), PluginManagerError> {
        check_name(name)?;
        let plugin = registry
            .find_mut(name)
            .ok_or_else(|| PluginManagerError::NotLoaded {
                name: name.to_string(),
            })?;

        if !self.layout.module_path(name).is_file() {
            return Err(PluginManagerError::NotFound {
                name: name.to_string(),
            });
        }

        if let Some(shutdown) = plugin.module().find_symbol(SHUTDOWN_SYMBOL) {
            tracing::debug!(plugin = %name, "Calling {}", SHUTDOWN_SYMBOL);
            // SAFETY: exported by the plugin under the entry point contract.
            unsafe { shutdown() };
        }

        plugin
            .module_mut()
            .unload()
            .map_err(|source| PluginManagerError::UnloadFailed {
                name: name.to_string(),
                source,
            })?;

        registry.remove(name);
        tracing::info!(plugin = %name, "Unloaded plugin");
        Ok(())
    }

    fn lock_registry(&self) -> MutexGuard<'_, PluginRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Names from operators are untrusted; only a single directory under the
/// root is a plugin
fn check_name(name: &str) -> Result<(), PluginManagerError> {
    if PluginLayout::is_plugin_name(name) {
        Ok(())
    } else {
        Err(PluginManagerError::NotFound {
            name: name.to_string(),
        })
    }
}

impl Drop for PluginManager {
    fn drop(&mut self) {
        self.unload_all();
    }
}
