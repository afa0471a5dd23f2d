//! Manifest format

use serde::{Deserialize, Serialize};

/// Contents of a plugin's `PluginInfo.json`.
///
/// Every field is optional on disk; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginManifest {
    /// Display name. Empty means "use the directory name".
    #[serde(rename = "FullName")]
    pub full_name: String,
    /// Human-readable description
    #[serde(rename = "Description")]
    pub description: String,
    /// Plugin version
    #[serde(rename = "Version")]
    pub version: f32,
    /// Minimum host API version required, `0.0` for none
    #[serde(rename = "MinApiVersion")]
    pub min_api_version: f32,
    /// Plugins this one needs loaded to work correctly
    #[serde(rename = "Dependencies")]
    pub dependencies: Vec<String>,
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            description: "No description".to_string(),
            version: 1.0,
            min_api_version: 0.0,
            dependencies: Vec::new(),
        }
    }
}

impl PluginManifest {
    /// Parse a manifest from JSON text
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}
