//! hotplug-core: Plugin manager for the hotplug host
//!
//! Discovers, loads, version-gates and hot-swaps native plugin modules
//! without restarting the host process.
//!
//! - **Lifecycle** - [`PluginManager`] loads and unloads plugins by name
//! - **Registry** - [`PluginRegistry`] owns every loaded module handle
//! - **Hot reload** - [`HotReloadWatcher`] swaps in staged builds on a timer
//! - **Operator commands** - [`plugins::commands`] handles `plugins.load` / `plugins.unload`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌─────────────────────┐
//! │ HotReloadWatcher │   │  operator commands  │
//! └────────┬─────────┘   └──────────┬──────────┘
//!          └──────────┬─────────────┘
//!          ┌──────────▼──────────┐
//!          │    PluginManager    │── DescriptorStore (PluginInfo.json)
//!          │  ┌───────────────┐  │
//!          │  │PluginRegistry │  │── audit_dependencies
//!          │  └───────────────┘  │
//!          └──────────┬──────────┘
//!          ┌──────────▼──────────┐
//!          │    ModuleLoader     │  (libloading)
//!          └─────────────────────┘
//! ```

pub mod plugins;

pub use plugins::{
    BulkLoadReport, HotReloadWatcher, LoaderError, PluginDescriptor, PluginInfo, PluginManager,
    PluginManagerConfig, PluginManagerError, PluginRegistry, ReloadReport, ReloadSettings,
    StateCheckpoint, SystemClock,
};
