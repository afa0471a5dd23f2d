//! End-to-end plugin manager scenarios against a temp plugin root

use std::sync::Arc;
use std::time::Duration;

use hotplug_core::plugins::{
    HotReloadWatcher, MockClock, MockModuleLoader, PluginManager, PluginManagerConfig,
    PluginManagerError, WatcherState,
};
use tempfile::TempDir;

struct Host {
    dir: TempDir,
    loader: MockModuleLoader,
    manager: Arc<PluginManager>,
}

fn host(api_version: f32) -> Host {
    let dir = TempDir::new().unwrap();
    let loader = MockModuleLoader::new();
    let config = PluginManagerConfig {
        plugin_dir: dir.path().join("plugins"),
        settings_path: dir.path().join("config.json"),
        api_version,
    };
    let manager = Arc::new(PluginManager::with_loader(
        config,
        Arc::new(loader.clone()),
    ));
    Host {
        dir,
        loader,
        manager,
    }
}

fn install(host: &Host, name: &str, manifest: Option<&str>) {
    let layout = host.manager.layout();
    std::fs::create_dir_all(layout.plugin_dir(name)).unwrap();
    std::fs::write(layout.module_path(name), b"build 1").unwrap();
    if let Some(manifest) = manifest {
        std::fs::write(layout.manifest_path(name), manifest).unwrap();
    }
}

#[test]
fn foo_loads_with_manifest_version() {
    let host = host(1.0);
    install(&host, "Foo", Some(r#"{"Version": 2.0, "MinApiVersion": 0.0}"#));

    host.manager.load("Foo").unwrap();

    assert!(host.manager.is_loaded("Foo"));
    assert_eq!(host.manager.info("Foo").unwrap().descriptor.version, 2.0);
}

#[test]
fn missing_dependency_is_warned_not_enforced() {
    let host = host(1.0);
    install(&host, "Bar", Some(r#"{"Dependencies": ["Baz"]}"#));

    let report = host.manager.load_all().unwrap();

    assert_eq!(report.missing_dependencies.len(), 1);
    assert_eq!(report.missing_dependencies[0].plugin, "Bar");
    assert_eq!(report.missing_dependencies[0].dependency, "Baz");
    assert!(host.manager.is_loaded("Bar"));
}

#[test]
fn dependency_loaded_after_dependent_is_satisfied() {
    let host = host(1.0);
    // "Alpha" sorts before "Zeta", so it loads first
    install(&host, "Alpha", Some(r#"{"Dependencies": ["Zeta"]}"#));
    install(&host, "Zeta", None);

    let report = host.manager.load_all().unwrap();

    assert_eq!(report.loaded, vec!["Alpha", "Zeta"]);
    assert!(report.missing_dependencies.is_empty());
}

#[test]
fn absent_settings_never_check() {
    let host = host(1.0);
    install(&host, "Foo", None);
    host.manager.load_all().unwrap();
    std::fs::write(host.manager.layout().staged_path("Foo"), b"build 2").unwrap();

    let clock = Arc::new(MockClock::new());
    let watcher = HotReloadWatcher::new(host.manager.clone(), clock.clone());
    for _ in 0..5 {
        assert!(watcher.check().is_none());
        assert_eq!(watcher.state(), WatcherState::Idle);
        clock.advance(Duration::from_secs(10));
    }

    assert_eq!(host.loader.unload_count("Foo"), 0);
}

#[test]
fn startup_then_hot_reload_cycle() {
    let host = host(1.0);
    std::fs::write(
        host.dir.path().join("config.json"),
        r#"{"settings": {"AutomaticPluginReloading": true, "AutomaticPluginReloadSeconds": 3}}"#,
    )
    .unwrap();
    install(&host, "Foo", Some(r#"{"FullName": "Foo Rules", "Version": 1.0}"#));
    install(&host, "Bar", None);
    host.manager.load_all().unwrap();

    let clock = Arc::new(MockClock::new());
    let watcher = HotReloadWatcher::new(host.manager.clone(), clock.clone());
    assert!(watcher.check().unwrap().reloaded.is_empty());

    // Deploy a new Foo build along with a bumped manifest
    let layout = host.manager.layout();
    std::fs::write(layout.staged_path("Foo"), b"build 2").unwrap();
    std::fs::write(
        layout.manifest_path("Foo"),
        r#"{"FullName": "Foo Rules", "Version": 1.1}"#,
    )
    .unwrap();

    clock.advance(Duration::from_secs(3));
    let report = watcher.check().unwrap();

    assert_eq!(report.reloaded, vec!["Foo"]);
    let info = host.manager.info("Foo").unwrap();
    assert_eq!(info.descriptor.version, 1.1);
    assert_eq!(std::fs::read(layout.module_path("Foo")).unwrap(), b"build 2");
    assert_eq!(host.loader.load_count("Bar"), 1);
    assert_eq!(host.loader.unload_count("Bar"), 0);
}

#[test]
fn concurrent_loads_of_same_plugin_load_once() {
    let host = host(1.0);
    install(&host, "Foo", None);

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| host.manager.load("Foo")))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let already = results
        .iter()
        .filter(|r| matches!(r, Err(PluginManagerError::AlreadyLoaded { .. })))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(already, 7);
    assert_eq!(host.loader.load_count("Foo"), 1);
}

#[test]
fn concurrent_unloads_release_once() {
    let host = host(1.0);
    install(&host, "Foo", None);
    host.manager.load("Foo").unwrap();

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| host.manager.unload("Foo")))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(host.loader.unload_count("Foo"), 1);
    assert!(!host.manager.is_loaded("Foo"));
}
