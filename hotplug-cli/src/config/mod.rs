mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{DEFAULT_TICK_MILLIS, HostConfig, HotplugConfig};
