//! Module loader - the only code that touches native module handles
//!
//! [`LibLoader`] wraps `libloading`; tests substitute
//! [`MockModuleLoader`](super::mock::MockModuleLoader).

use std::path::{Path, PathBuf};

use hotplug_plugin_api::EntryPoint;
use libloading::Library;

use super::error::LoaderError;

/// A native module opened by a [`ModuleLoader`]
pub trait NativeModule: Send + Sync {
    /// Look up an exported `extern "C" fn()` by name
    fn find_symbol(&self, name: &str) -> Option<EntryPoint>;

    /// Release the module, surfacing the platform error on failure.
    ///
    /// After a successful release further calls are no-ops. Dropping an
    /// unreleased module releases it without reporting errors.
    fn release(&mut self) -> Result<(), LoaderError>;
}

/// Loads native modules from disk
pub trait ModuleLoader: Send + Sync {
    /// Load the module at `path`.
    ///
    /// Fails with [`LoaderError::Missing`] before touching the platform
    /// loader when the file does not exist. Nothing is retained on failure.
    fn load(&self, path: &Path) -> Result<ModuleHandle, LoaderError>;
}

/// Owned handle to a loaded module.
///
/// The module is released exactly once: either through [`ModuleHandle::unload`]
/// or when the handle is dropped.
pub struct ModuleHandle {
    path: PathBuf,
    module: Box<dyn NativeModule>,
}

impl ModuleHandle {
    /// Wrap a native module loaded from `path`
    pub fn new(path: impl Into<PathBuf>, module: Box<dyn NativeModule>) -> Self {
        Self {
            path: path.into(),
            module,
        }
    }

    /// Path the module was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up an exported entry point
    pub fn find_symbol(&self, name: &str) -> Option<EntryPoint> {
        self.module.find_symbol(name)
    }

    /// Release the module now, reporting the platform error if it refuses
    pub fn unload(&mut self) -> Result<(), LoaderError> {
        self.module.release()
    }
}

impl std::fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// [`ModuleLoader`] backed by the platform dynamic loader
#[derive(Debug, Default, Clone, Copy)]
pub struct LibLoader;

impl ModuleLoader for LibLoader {
    fn load(&self, path: &Path) -> Result<ModuleHandle, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::Missing(path.to_path_buf()));
        }

        // SAFETY: plugins run with full host privileges; loading one executes
        // its static initializers, which is the point of installing it.
        let library = unsafe { Library::new(path)? };

        Ok(ModuleHandle::new(
            path,
            Box::new(LibModule {
                library: Some(library),
            }),
        ))
    }
}

/// A `libloading` library that can be closed explicitly
struct LibModule {
    library: Option<Library>,
}

impl NativeModule for LibModule {
    fn find_symbol(&self, name: &str) -> Option<EntryPoint> {
        let library = self.library.as_ref()?;
        // SAFETY: entry points are declared `extern "C" fn()` by the plugin
        // contract. The returned pointer is only called while this handle
        // keeps the library open.
        unsafe {
            library
                .get::<EntryPoint>(name.as_bytes())
                .ok()
                .map(|symbol| *symbol)
        }
    }

    fn release(&mut self) -> Result<(), LoaderError> {
        match self.library.take() {
            Some(library) => library.close().map_err(LoaderError::from),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lib_loader_missing_file_fails_fast() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Missing.so");

        let err = LibLoader.load(&path).unwrap_err();
        assert!(matches!(err, LoaderError::Missing(p) if p == path));
    }

    #[test]
    fn test_lib_loader_rejects_non_module_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Garbage.so");
        std::fs::write(&path, b"not a shared object").unwrap();

        let err = LibLoader.load(&path).unwrap_err();
        assert!(!matches!(err, LoaderError::Missing(_)));
    }

    #[test]
    fn test_released_lib_module_has_no_symbols() {
        let mut module = LibModule { library: None };
        assert!(module.find_symbol("Plugin_Init").is_none());
        assert!(module.release().is_ok());
    }
}
