//! Dependency audit - diagnostic only, never blocks or unloads

use super::registry::PluginRegistry;

/// A declared dependency that is not loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDependency {
    /// Plugin that declared the dependency
    pub plugin: String,
    /// Dependency that is not in the registry
    pub dependency: String,
}

/// Warn about every declared dependency that is not loaded.
///
/// Load order is not checked: a plugin may have loaded before its
/// dependencies did.
pub fn audit_dependencies(registry: &PluginRegistry) -> Vec<MissingDependency> {
    let mut missing = Vec::new();

    for plugin in registry.iter() {
        for dependency in &plugin.descriptor().dependencies {
            if registry.is_loaded(dependency) {
                continue;
            }

            tracing::warn!(
                plugin = %plugin.name(),
                dependency = %dependency,
                "Plugin {} is missing! {} might not work correctly",
                dependency,
                plugin.name()
            );
            missing.push(MissingDependency {
                plugin: plugin.name().to_string(),
                dependency: dependency.clone(),
            });
        }
    }

    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::descriptor::PluginDescriptor;
    use crate::plugins::loader::ModuleLoader;
    use crate::plugins::mock::MockModuleLoader;
    use crate::plugins::registry::LoadedPlugin;
    use tempfile::TempDir;

    fn register(registry: &mut PluginRegistry, dir: &TempDir, name: &str, deps: &[&str]) {
        let path = dir.path().join(format!("{}.so", name));
        std::fs::write(&path, b"module").unwrap();
        let module = MockModuleLoader::new().load(&path).unwrap();
        let descriptor = PluginDescriptor {
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            ..PluginDescriptor::with_defaults(name)
        };
        registry
            .insert(LoadedPlugin::new(descriptor, module))
            .unwrap();
    }

    #[test]
    fn test_no_dependencies_no_warnings() {
        let dir = TempDir::new().unwrap();
        let mut registry = PluginRegistry::new();
        register(&mut registry, &dir, "Foo", &[]);

        assert!(audit_dependencies(&registry).is_empty());
    }

    #[test]
    fn test_satisfied_dependency() {
        let dir = TempDir::new().unwrap();
        let mut registry = PluginRegistry::new();
        register(&mut registry, &dir, "Bar", &["Baz"]);
        register(&mut registry, &dir, "Baz", &[]);

        assert!(audit_dependencies(&registry).is_empty());
    }

    #[test]
    fn test_missing_dependency_reported_once() {
        let dir = TempDir::new().unwrap();
        let mut registry = PluginRegistry::new();
        register(&mut registry, &dir, "Bar", &["Baz"]);

        let missing = audit_dependencies(&registry);
        assert_eq!(
            missing,
            vec![MissingDependency {
                plugin: "Bar".to_string(),
                dependency: "Baz".to_string(),
            }]
        );
        assert!(registry.is_loaded("Bar"));
    }

    #[test]
    fn test_each_missing_dependency_reported() {
        let dir = TempDir::new().unwrap();
        let mut registry = PluginRegistry::new();
        register(&mut registry, &dir, "Bar", &["Baz", "Qux", "Foo"]);
        register(&mut registry, &dir, "Foo", &[]);

        let missing: Vec<String> = audit_dependencies(&registry)
            .into_iter()
            .map(|m| m.dependency)
            .collect();
        assert_eq!(missing, vec!["Baz", "Qux"]);
    }
}
