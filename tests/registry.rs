use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use testwatch::container::{
    ContainerRegistry, DiscoveryEvent, FsProjectOracle, SourceFilenames, SourceInfo,
};
use testwatch::fs::mock::MockFileSystem;
use testwatch_test_utils::builders::{ConfigurationBuilder, StaticConfigLoader};
use testwatch_test_utils::init_tracing;

fn filenames() -> SourceFilenames {
    SourceFilenames::new("testsettings.toml", "karma.conf.js")
}

fn make_registry(
    fs: &MockFileSystem,
    loader: StaticConfigLoader,
) -> (ContainerRegistry, UnboundedReceiver<DiscoveryEvent>) {
    let fs = Arc::new(fs.clone());
    ContainerRegistry::new(
        fs.clone(),
        Arc::new(loader),
        Arc::new(FsProjectOracle::new(fs)),
        filenames(),
    )
}

fn drain(rx: &mut UnboundedReceiver<DiscoveryEvent>) -> Vec<DiscoveryEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn refresh_count(events: &[DiscoveryEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, DiscoveryEvent::RefreshAll { .. }))
        .count()
}

/// One plain config container rooted at `<dir>/karma.conf.js`.
fn add_config_project(fs: &MockFileSystem, loader: &StaticConfigLoader, dir: &str) -> PathBuf {
    let conf = PathBuf::from(dir).join("karma.conf.js");
    fs.add_file(&conf, b"module.exports = {};");
    loader.insert(ConfigurationBuilder::new(&conf).build());
    conf
}

#[test]
fn create_container_resolves_the_config_file() {
    init_tracing();

    let fs = MockFileSystem::new();
    let loader = StaticConfigLoader::new();
    let conf = add_config_project(&fs, &loader, "/proj");
    let (registry, mut rx) = make_registry(&fs, loader);

    registry.create_container(&SourceInfo::new(&fs, "p1", Path::new("/proj")));

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.containers()[0].source(), conf);
    assert_eq!(refresh_count(&drain(&mut rx)), 1, "one refresh per create");
}

#[test]
fn settings_file_takes_precedence_over_config_file() {
    init_tracing();

    let fs = MockFileSystem::new();
    let loader = StaticConfigLoader::new();
    fs.add_file("/proj/karma.conf.js", b"module.exports = {};");
    fs.add_file("/proj/testsettings.toml", b"");
    loader.insert(ConfigurationBuilder::new("/proj/testsettings.toml").build());
    let (registry, _rx) = make_registry(&fs, loader);

    registry.create_container(&SourceInfo::new(&fs, "p1", Path::new("/proj")));

    assert_eq!(registry.len(), 1);
    let container = &registry.containers()[0];
    assert_eq!(container.source(), Path::new("/proj/testsettings.toml"));
    assert!(container.settings().has_settings_file());
}

#[test]
fn directory_without_source_creates_nothing() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("/proj/readme.md", b"no test config here");
    let (registry, mut rx) = make_registry(&fs, StaticConfigLoader::new());

    registry.create_container(&SourceInfo::new(&fs, "p1", Path::new("/proj")));

    assert!(registry.is_empty());
    assert_eq!(refresh_count(&drain(&mut rx)), 1);
}

#[test]
fn construction_failure_skips_that_source_only() {
    init_tracing();

    let fs = MockFileSystem::new();
    let loader = StaticConfigLoader::new();
    // /bad has a config file on disk but no loadable configuration.
    fs.add_file("/bad/karma.conf.js", b"module.exports = {};");
    let good = add_config_project(&fs, &loader, "/good");
    let (registry, _rx) = make_registry(&fs, loader);

    registry.create_containers(&[
        SourceInfo::new(&fs, "p1", Path::new("/bad")),
        SourceInfo::new(&fs, "p1", Path::new("/good")),
    ]);

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.containers()[0].source(), good);
}

#[test]
fn recreating_a_directory_replaces_its_container() {
    init_tracing();

    let fs = MockFileSystem::new();
    let loader = StaticConfigLoader::new();
    add_config_project(&fs, &loader, "/proj");
    let (registry, _rx) = make_registry(&fs, loader);

    let source = SourceInfo::new(&fs, "p1", Path::new("/proj"));
    registry.create_container(&source);
    let first = registry.containers()[0].clone();

    registry.create_container(&source);
    assert_eq!(registry.len(), 1, "a directory hosts at most one container");
    assert!(first.is_disposed(), "the superseded container was disposed");
}

#[test]
fn dedup_keeps_the_settings_bearing_container() {
    init_tracing();

    let fs = MockFileSystem::new();
    let loader = StaticConfigLoader::new();

    // Plain container rooted directly at the shared config file.
    let shared = add_config_project(&fs, &loader, "/shared");

    // Settings-bearing container in another directory pointing at the same
    // config file.
    fs.add_file("/proj/testsettings.toml", b"");
    loader.insert(
        ConfigurationBuilder::new("/proj/testsettings.toml")
            .with_config_file(&shared)
            .build(),
    );

    let (registry, _rx) = make_registry(&fs, loader);
    registry.create_container(&SourceInfo::new(&fs, "p1", Path::new("/shared")));
    assert_eq!(registry.len(), 1);

    registry.create_container(&SourceInfo::new(&fs, "p1", Path::new("/proj")));

    assert_eq!(registry.len(), 1, "the settings-less duplicate was removed");
    let survivor = &registry.containers()[0];
    assert_eq!(survivor.source(), Path::new("/proj/testsettings.toml"));
    assert!(survivor.settings().has_settings_file());
}

#[test]
fn batch_removal_signals_refresh_once() {
    init_tracing();

    let fs = MockFileSystem::new();
    let loader = StaticConfigLoader::new();
    let a = add_config_project(&fs, &loader, "/a");
    let b = add_config_project(&fs, &loader, "/b");
    let (registry, mut rx) = make_registry(&fs, loader);

    registry.create_containers(&[
        SourceInfo::new(&fs, "p1", Path::new("/a")),
        SourceInfo::new(&fs, "p2", Path::new("/b")),
    ]);
    let containers = registry.containers();
    drain(&mut rx);

    registry.remove_sources(&[a, b]);

    assert!(registry.is_empty());
    assert!(containers.iter().all(|c| c.is_disposed()));
    assert_eq!(refresh_count(&drain(&mut rx)), 1, "one signal per batch");
}

#[test]
fn remove_project_only_touches_that_project() {
    init_tracing();

    let fs = MockFileSystem::new();
    let loader = StaticConfigLoader::new();
    add_config_project(&fs, &loader, "/a");
    let b = add_config_project(&fs, &loader, "/b");
    let (registry, mut rx) = make_registry(&fs, loader);

    registry.create_containers(&[
        SourceInfo::new(&fs, "p1", Path::new("/a")),
        SourceInfo::new(&fs, "p2", Path::new("/b")),
    ]);
    drain(&mut rx);

    registry.remove_project("p1");

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.containers()[0].source(), b);
    assert_eq!(refresh_count(&drain(&mut rx)), 1);
}

#[test]
fn removing_nothing_signals_nothing() {
    init_tracing();

    let fs = MockFileSystem::new();
    let loader = StaticConfigLoader::new();
    add_config_project(&fs, &loader, "/a");
    let (registry, mut rx) = make_registry(&fs, loader);

    registry.create_container(&SourceInfo::new(&fs, "p1", Path::new("/a")));
    drain(&mut rx);

    registry.remove_source(Path::new("/nonexistent/karma.conf.js"));
    registry.remove_project("unknown-project");
    registry.remove_from_directory(Path::new("/elsewhere"));

    assert_eq!(registry.len(), 1);
    assert_eq!(refresh_count(&drain(&mut rx)), 0);
}

#[test]
fn remove_from_directory_covers_nested_sources() {
    init_tracing();

    let fs = MockFileSystem::new();
    let loader = StaticConfigLoader::new();
    add_config_project(&fs, &loader, "/ws/a");
    add_config_project(&fs, &loader, "/ws/b");
    add_config_project(&fs, &loader, "/other");
    let (registry, mut rx) = make_registry(&fs, loader);

    registry.create_containers(&[
        SourceInfo::new(&fs, "p1", Path::new("/ws/a")),
        SourceInfo::new(&fs, "p1", Path::new("/ws/b")),
        SourceInfo::new(&fs, "p2", Path::new("/other")),
    ]);
    drain(&mut rx);

    registry.remove_from_directory(Path::new("/ws"));

    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.containers()[0].source(),
        Path::new("/other/karma.conf.js")
    );
    assert_eq!(refresh_count(&drain(&mut rx)), 1);
}

#[test]
fn clear_disposes_everything_and_signals_once() {
    init_tracing();

    let fs = MockFileSystem::new();
    let loader = StaticConfigLoader::new();
    add_config_project(&fs, &loader, "/a");
    add_config_project(&fs, &loader, "/b");
    let (registry, mut rx) = make_registry(&fs, loader);

    registry.create_containers(&[
        SourceInfo::new(&fs, "p1", Path::new("/a")),
        SourceInfo::new(&fs, "p2", Path::new("/b")),
    ]);
    let containers = registry.containers();
    drain(&mut rx);

    registry.clear();

    assert!(registry.is_empty());
    assert!(containers.iter().all(|c| c.is_disposed()));
    assert_eq!(refresh_count(&drain(&mut rx)), 1);
}
