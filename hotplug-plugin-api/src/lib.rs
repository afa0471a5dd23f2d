//! hotplug-plugin-api - Plugin API for the hotplug host
//!
//! This crate defines the contract between the host's plugin manager and a
//! native plugin module:
//!
//! - the on-disk layout names (`PluginInfo.json`, the staged suffix)
//! - the manifest format ([`PluginManifest`])
//! - the optional exported entry points (`Plugin_Init`, `Plugin_Unload`)
//!
//! # Example
//!
//! ```ignore
//! fn init() {
//!     // install hooks
//! }
//!
//! fn shutdown() {
//!     // remove hooks
//! }
//!
//! hotplug_plugin_api::export_plugin!(init, shutdown);
//! ```

pub mod types;

pub use types::PluginManifest;

/// Version of the host API exposed to plugins.
///
/// A plugin whose manifest declares a `MinApiVersion` greater than this
/// value is refused at load time. `0.0` in a manifest means "no minimum".
pub const HOST_API_VERSION: f32 = 1.0;

/// Exported symbol invoked once, synchronously, right after the module loads.
pub const INIT_SYMBOL: &str = "Plugin_Init";

/// Exported symbol invoked once, synchronously, right before the module unloads.
pub const SHUTDOWN_SYMBOL: &str = "Plugin_Unload";

/// Manifest file name inside each plugin directory.
pub const MANIFEST_FILE: &str = "PluginInfo.json";

/// Suffix appended to the module file name to stage a replacement build.
pub const STAGED_SUFFIX: &str = "staged";

/// Signature shared by both entry points.
///
/// Entry points run while the platform loader lock may be held. They must not
/// wait on other threads (joins, barriers, channels fed by workers).
pub type EntryPoint = unsafe extern "C" fn();

/// Export init/shutdown functions as the host's entry points.
///
/// Either argument may be omitted by passing `_`, in which case no symbol is
/// generated for it and the host skips that call.
///
/// # Generated Functions
///
/// - `Plugin_Init()`: calls the first function
/// - `Plugin_Unload()`: calls the second function
#[macro_export]
macro_rules! export_plugin {
    (_, $shutdown:path) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn Plugin_Unload() {
            $shutdown();
        }
    };
    ($init:path, _) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn Plugin_Init() {
            $init();
        }
    };
    ($init:path, $shutdown:path) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn Plugin_Init() {
            $init();
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn Plugin_Unload() {
            $shutdown();
        }
    };
}

/// File name of a plugin's module on this platform (`<name>.so`, `<name>.dll`, ...).
pub fn module_file_name(plugin_name: &str) -> String {
    format!("{}.{}", plugin_name, std::env::consts::DLL_EXTENSION)
}

/// File name of a staged replacement for a plugin's module.
pub fn staged_file_name(plugin_name: &str) -> String {
    format!("{}.{}", module_file_name(plugin_name), STAGED_SUFFIX)
}
