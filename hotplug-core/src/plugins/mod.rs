//! Plugin manager for hotplug
//!
//! - [`PluginManager`]: load/unload lifecycle, bulk load, reload
//! - [`PluginRegistry`]: the set of loaded plugins, one per name
//! - [`DescriptorStore`]: per-plugin `PluginInfo.json` with defaults
//! - [`ModuleLoader`]: native module load/unload/symbol lookup
//! - [`HotReloadWatcher`]: periodic scan for staged builds
//! - [`audit_dependencies`]: warns about missing declared dependencies
//!
//! # Plugin Structure
//!
//! Each plugin directory under the root contains:
//! - `<name>.<ext>` (`.so`/`.dylib`/`.dll`) - the module, named like the directory
//! - `PluginInfo.json` (optional) - manifest
//! - `<name>.<ext>.staged` (optional) - a replacement build waiting to be swapped in
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hotplug_core::plugins::{HotReloadWatcher, PluginManager, PluginManagerConfig, SystemClock};
//!
//! let manager = Arc::new(PluginManager::new(PluginManagerConfig::default()));
//! manager.load_all()?;
//!
//! let watcher = Arc::new(HotReloadWatcher::new(manager.clone(), Arc::new(SystemClock)));
//! watcher.spawn(Duration::from_secs(1), shutdown.clone());
//!
//! manager.unload("analytics")?;
//! ```

mod audit;
mod clock;
pub mod commands;
mod descriptor;
mod error;
mod layout;
mod lifecycle;
mod loader;
pub mod mock;
mod registry;
mod settings;
mod watcher;

pub use audit::{MissingDependency, audit_dependencies};
pub use clock::{Clock, MockClock, SystemClock};
pub use commands::{NoticeLevel, OperatorCommand, OperatorNotifier};
pub use descriptor::{DescriptorStore, PluginDescriptor};
pub use error::{LoaderError, PluginManagerError};
pub use layout::PluginLayout;
pub use lifecycle::{BulkLoadReport, PluginManager, PluginManagerConfig};
pub use loader::{LibLoader, ModuleHandle, ModuleLoader, NativeModule};
pub use mock::{LoaderCall, MockModuleLoader};
pub use registry::{LoadedPlugin, PluginInfo, PluginRegistry};
pub use settings::{DEFAULT_RELOAD_SECONDS, MAX_RELOAD_SECONDS, ReloadSettings};
pub use watcher::{HotReloadWatcher, ReloadReport, StateCheckpoint, WatcherState};
