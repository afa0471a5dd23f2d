//! Hello plugin - a minimal hotplug plugin.
//!
//! Build it, then install it under the host's plugin root:
//!
//! ```text
//! cargo build --release
//! mkdir -p <plugin-dir>/HelloPlugin
//! cp target/release/libhello_plugin.so <plugin-dir>/HelloPlugin/HelloPlugin.so
//! cp PluginInfo.json <plugin-dir>/HelloPlugin/
//! ```
//!
//! To hot-swap a rebuilt module while the host runs, copy it to
//! `HelloPlugin.so.staged` instead.

use std::sync::atomic::{AtomicU32, Ordering};

static LOADS: AtomicU32 = AtomicU32::new(0);

fn init() {
    let n = LOADS.fetch_add(1, Ordering::SeqCst) + 1;
    eprintln!("[hello-plugin] Hello from plugin (init #{n})");
}

fn shutdown() {
    eprintln!("[hello-plugin] Goodbye");
}

hotplug_plugin_api::export_plugin!(init, shutdown);
