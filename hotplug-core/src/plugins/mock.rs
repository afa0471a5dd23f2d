//! Mock module loader for testing
//!
//! `MockModuleLoader` never calls into the platform loader. It checks that the
//! module file exists (so layout bugs still surface), records every
//! load/unload, hands out scripted entry points and can be told to fail.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use hotplug_plugin_api::EntryPoint;

use super::error::LoaderError;
use super::loader::{ModuleHandle, ModuleLoader, NativeModule};

/// A call observed by the mock loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderCall {
    /// Module loaded from path
    Load(PathBuf),
    /// Module explicitly released
    Unload(PathBuf),
    /// Module dropped without an explicit release
    Drop(PathBuf),
}

#[derive(Default)]
struct MockState {
    calls: Vec<LoaderCall>,
    symbols: HashMap<String, HashMap<String, EntryPoint>>,
    failing_loads: HashSet<String>,
    failing_unloads: HashSet<String>,
}

/// Scriptable [`ModuleLoader`]. Clones share state.
#[derive(Clone, Default)]
pub struct MockModuleLoader {
    state: Arc<Mutex<MockState>>,
}

impl MockModuleLoader {
    /// Create a loader with no scripted symbols or failures
    pub fn new() -> Self {
        Self::default()
    }

    /// Export `entry_point` as `symbol` from every load of `plugin`
    pub fn with_entry_point(self, plugin: &str, symbol: &str, entry_point: EntryPoint) -> Self {
        self.lock()
            .symbols
            .entry(plugin.to_string())
            .or_default()
            .insert(symbol.to_string(), entry_point);
        self
    }

    /// Make loads of `plugin` fail
    pub fn fail_load(&self, plugin: &str) {
        self.lock().failing_loads.insert(plugin.to_string());
    }

    /// Make releases of `plugin` fail
    pub fn fail_unload(&self, plugin: &str) {
        self.lock().failing_unloads.insert(plugin.to_string());
    }

    /// Clear all scripted failures
    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failing_loads.clear();
        state.failing_unloads.clear();
    }

    /// All calls observed so far, in order
    pub fn calls(&self) -> Vec<LoaderCall> {
        self.lock().calls.clone()
    }

    /// Number of successful loads of `plugin`
    pub fn load_count(&self, plugin: &str) -> usize {
        self.count(plugin, |call| matches!(call, LoaderCall::Load(_)))
    }

    /// Number of successful explicit releases of `plugin`
    pub fn unload_count(&self, plugin: &str) -> usize {
        self.count(plugin, |call| matches!(call, LoaderCall::Unload(_)))
    }

    fn count(&self, plugin: &str, kind: impl Fn(&LoaderCall) -> bool) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| kind(call))
            .filter(|call| {
                let path = match call {
                    LoaderCall::Load(p) | LoaderCall::Unload(p) | LoaderCall::Drop(p) => p,
                };
                plugin_name(path) == plugin
            })
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ModuleLoader for MockModuleLoader {
    fn load(&self, path: &Path) -> Result<ModuleHandle, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::Missing(path.to_path_buf()));
        }

        let plugin = plugin_name(path);
        let mut state = self.lock();
        if state.failing_loads.contains(&plugin) {
            return Err(LoaderError::Os {
                code: 193,
                message: format!("{} is not a valid module", path.display()),
            });
        }

        state.calls.push(LoaderCall::Load(path.to_path_buf()));
        let symbols = state.symbols.get(&plugin).cloned().unwrap_or_default();

        Ok(ModuleHandle::new(
            path,
            Box::new(MockModule {
                path: path.to_path_buf(),
                plugin,
                symbols,
                state: Arc::clone(&self.state),
                released: false,
            }),
        ))
    }
}

struct MockModule {
    path: PathBuf,
    plugin: String,
    symbols: HashMap<String, EntryPoint>,
    state: Arc<Mutex<MockState>>,
    released: bool,
}

impl MockModule {
    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NativeModule for MockModule {
    fn find_symbol(&self, name: &str) -> Option<EntryPoint> {
        if self.released {
            return None;
        }
        self.symbols.get(name).copied()
    }

    fn release(&mut self) -> Result<(), LoaderError> {
        if self.released {
            return Ok(());
        }

        let mut state = self.lock();
        if state.failing_unloads.contains(&self.plugin) {
            return Err(LoaderError::Os {
                code: 16,
                message: format!("{} is still referenced", self.path.display()),
            });
        }
        state.calls.push(LoaderCall::Unload(self.path.clone()));
        drop(state);

        self.released = true;
        Ok(())
    }
}

impl Drop for MockModule {
    fn drop(&mut self) {
        if !self.released {
            let path = self.path.clone();
            self.lock().calls.push(LoaderCall::Drop(path));
        }
    }
}

fn plugin_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    extern "C" fn noop() {}

    fn module_file(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(format!("{}.so", name));
        std::fs::write(&path, b"module").unwrap();
        path
    }

    #[test]
    fn test_mock_records_load_and_unload() {
        let dir = TempDir::new().unwrap();
        let path = module_file(&dir, "Foo");
        let loader = MockModuleLoader::new();

        let mut handle = loader.load(&path).unwrap();
        handle.unload().unwrap();
        handle.unload().unwrap();
        drop(handle);

        assert_eq!(
            loader.calls(),
            vec![LoaderCall::Load(path.clone()), LoaderCall::Unload(path)]
        );
        assert_eq!(loader.load_count("Foo"), 1);
        assert_eq!(loader.unload_count("Foo"), 1);
    }

    #[test]
    fn test_mock_drop_releases_once() {
        let dir = TempDir::new().unwrap();
        let path = module_file(&dir, "Foo");
        let loader = MockModuleLoader::new();

        drop(loader.load(&path).unwrap());

        assert_eq!(
            loader.calls(),
            vec![LoaderCall::Load(path.clone()), LoaderCall::Drop(path)]
        );
    }

    #[test]
    fn test_mock_missing_file() {
        let dir = TempDir::new().unwrap();
        let loader = MockModuleLoader::new();

        let err = loader.load(&dir.path().join("Nope.so")).unwrap_err();
        assert!(matches!(err, LoaderError::Missing(_)));
        assert!(loader.calls().is_empty());
    }

    #[test]
    fn test_mock_scripted_failures() {
        let dir = TempDir::new().unwrap();
        let path = module_file(&dir, "Foo");
        let loader = MockModuleLoader::new();

        loader.fail_load("Foo");
        assert_eq!(loader.load(&path).unwrap_err().os_code(), Some(193));

        loader.clear_failures();
        loader.fail_unload("Foo");
        let mut handle = loader.load(&path).unwrap();
        assert_eq!(handle.unload().unwrap_err().os_code(), Some(16));

        loader.clear_failures();
        handle.unload().unwrap();
        assert_eq!(loader.unload_count("Foo"), 1);
    }

    #[test]
    fn test_mock_symbols_are_per_plugin() {
        let dir = TempDir::new().unwrap();
        let foo = module_file(&dir, "Foo");
        let bar = module_file(&dir, "Bar");
        let loader = MockModuleLoader::new().with_entry_point("Foo", "Plugin_Init", noop);

        assert!(loader.load(&foo).unwrap().find_symbol("Plugin_Init").is_some());
        assert!(loader.load(&bar).unwrap().find_symbol("Plugin_Init").is_none());
    }
}
