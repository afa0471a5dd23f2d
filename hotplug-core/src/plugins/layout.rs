//! On-disk plugin layout
//!
//! ```text
//! <root>/
//!   Foo/
//!     Foo.so             active module
//!     Foo.so.staged      staged replacement (optional)
//!     PluginInfo.json    manifest (optional)
//! ```

use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};

use hotplug_plugin_api::{MANIFEST_FILE, module_file_name, staged_file_name};

/// Resolves plugin file paths under a plugin root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginLayout {
    root: PathBuf,
}

impl PluginLayout {
    /// Create a layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Plugin root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `name` names a single directory directly under the root.
    ///
    /// Empty names, `.`, `..` and anything containing a path separator are
    /// rejected, so a plugin name can never resolve outside the root.
    pub fn is_plugin_name(name: &str) -> bool {
        let mut components = Path::new(name).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(part)), None) if part == OsStr::new(name)
        ) && !name.contains(['/', '\\'])
    }

    /// Directory holding one plugin's files
    pub fn plugin_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Active module file
    pub fn module_path(&self, name: &str) -> PathBuf {
        self.plugin_dir(name).join(module_file_name(name))
    }

    /// Staged replacement marker
    pub fn staged_path(&self, name: &str) -> PathBuf {
        self.plugin_dir(name).join(staged_file_name(name))
    }

    /// Manifest file
    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.plugin_dir(name).join(MANIFEST_FILE)
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.module_path(name).is_file()
    }

    pub fn has_staged(&self, name: &str) -> bool {
        self.staged_path(name).is_file()
    }

    /// Names of all plugin subdirectories, sorted.
    ///
    /// A missing root yields an empty list; plain files and non-UTF-8
    /// names are skipped.
    pub fn discover(&self) -> io::Result<Vec<String>> {
        if !self.root.exists() {
            tracing::debug!(dir = %self.root.display(), "Plugin directory does not exist");
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => {
                    tracing::debug!(name = ?raw, "Skipping plugin directory with non UTF-8 name");
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Copy the staged build over the active module.
    ///
    /// The old module file is unlinked first so an image still mapped by the
    /// platform loader keeps its own inode.
    pub fn promote_staged(&self, name: &str) -> io::Result<()> {
        let module = self.module_path(name);
        match std::fs::remove_file(&module) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        std::fs::copy(self.staged_path(name), &module)?;
        Ok(())
    }

    /// Delete the staged marker
    pub fn remove_staged(&self, name: &str) -> io::Result<()> {
        std::fs::remove_file(self.staged_path(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let layout = PluginLayout::new("/srv/plugins");
        let module = layout.module_path("Foo");

        assert_eq!(layout.plugin_dir("Foo"), PathBuf::from("/srv/plugins/Foo"));
        assert_eq!(module.parent(), Some(Path::new("/srv/plugins/Foo")));
        assert_eq!(module.file_stem().unwrap(), "Foo");
        assert_eq!(
            layout.staged_path("Foo"),
            PathBuf::from(format!("{}.staged", module.display()))
        );
        assert_eq!(
            layout.manifest_path("Foo"),
            PathBuf::from("/srv/plugins/Foo/PluginInfo.json")
        );
    }

    #[test]
    fn test_plugin_name_must_stay_under_root() {
        assert!(PluginLayout::is_plugin_name("Foo"));
        assert!(PluginLayout::is_plugin_name("my-plugin.v2"));

        assert!(!PluginLayout::is_plugin_name(""));
        assert!(!PluginLayout::is_plugin_name("."));
        assert!(!PluginLayout::is_plugin_name(".."));
        assert!(!PluginLayout::is_plugin_name("../../tmp/x"));
        assert!(!PluginLayout::is_plugin_name("a/b"));
        assert!(!PluginLayout::is_plugin_name("a\\b"));
        assert!(!PluginLayout::is_plugin_name("/etc"));
        assert!(!PluginLayout::is_plugin_name("Foo/"));
    }

    #[test]
    fn test_discover_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let layout = PluginLayout::new(dir.path().join("nope"));
        assert!(layout.discover().unwrap().is_empty());
    }

    #[test]
    fn test_discover_lists_directories_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Zed")).unwrap();
        std::fs::create_dir(dir.path().join("Alpha")).unwrap();
        std::fs::write(dir.path().join("README.txt"), "not a plugin").unwrap();

        let layout = PluginLayout::new(dir.path());
        assert_eq!(layout.discover().unwrap(), vec!["Alpha", "Zed"]);
    }

    #[test]
    fn test_promote_and_remove_staged() {
        let dir = TempDir::new().unwrap();
        let layout = PluginLayout::new(dir.path());
        std::fs::create_dir(layout.plugin_dir("Foo")).unwrap();
        std::fs::write(layout.module_path("Foo"), "v1").unwrap();
        std::fs::write(layout.staged_path("Foo"), "v2").unwrap();
        assert!(layout.has_staged("Foo"));

        layout.promote_staged("Foo").unwrap();
        assert_eq!(std::fs::read_to_string(layout.module_path("Foo")).unwrap(), "v2");
        assert!(layout.has_staged("Foo"));

        layout.remove_staged("Foo").unwrap();
        assert!(!layout.has_staged("Foo"));
        assert!(layout.has_module("Foo"));
    }

    #[test]
    fn test_promote_without_active_module() {
        let dir = TempDir::new().unwrap();
        let layout = PluginLayout::new(dir.path());
        std::fs::create_dir(layout.plugin_dir("Foo")).unwrap();
        std::fs::write(layout.staged_path("Foo"), "fresh").unwrap();

        layout.promote_staged("Foo").unwrap();
        assert!(layout.has_module("Foo"));
    }
}
