//! Plugin manager error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the native module loader
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Module file is not on disk
    #[error("Module file does not exist: {}", .0.display())]
    Missing(PathBuf),

    /// The platform loader failed with an OS error code
    #[error("{message} (error code {code})")]
    Os { code: i32, message: String },

    /// The platform loader failed without an error code (e.g. `dlerror`)
    #[error("{0}")]
    Native(String),
}

impl LoaderError {
    /// OS error code reported by the platform loader, if any
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::Os { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<libloading::Error> for LoaderError {
    fn from(err: libloading::Error) -> Self {
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            if let Some(code) = cause
                .downcast_ref::<std::io::Error>()
                .and_then(std::io::Error::raw_os_error)
            {
                return Self::Os {
                    code,
                    message: err.to_string(),
                };
            }
            source = cause.source();
        }
        Self::Native(err.to_string())
    }
}

/// Errors returned by plugin manager operations
#[derive(Error, Debug)]
pub enum PluginManagerError {
    /// Plugin module file is missing
    #[error("Plugin {name} does not exist")]
    NotFound { name: String },

    /// Plugin is already in the registry
    #[error("Plugin {name} was already loaded")]
    AlreadyLoaded { name: String },

    /// Plugin is not in the registry
    #[error("Plugin {name} is not loaded")]
    NotLoaded { name: String },

    /// Plugin needs a newer host API
    #[error("Plugin {name} requires newer API version ({required:.1} > {current:.1})")]
    IncompatibleVersion {
        name: String,
        required: f32,
        current: f32,
    },

    /// Native load failed
    #[error("Failed to load plugin - {name}: {source}")]
    LoadFailed { name: String, source: LoaderError },

    /// Native unload failed; the plugin stays registered
    #[error("Failed to unload plugin - {name}: {source}")]
    UnloadFailed { name: String, source: LoaderError },

    /// Manifest exists but is not valid
    #[error("Malformed manifest {}: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Settings document exists but is not valid
    #[error("Malformed settings {}: {source}", .path.display())]
    SettingsParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
