use std::path::{Path, PathBuf};

use testwatch::paths;

#[test]
fn normalize_resolves_dot_segments() {
    assert_eq!(
        paths::normalize(Path::new("/proj/src/../src/./a.js")),
        PathBuf::from("/proj/src/a.js")
    );
}

#[test]
fn equality_is_case_insensitive() {
    assert!(paths::paths_equal(
        Path::new("/Proj/Karma.Conf.JS"),
        Path::new("/proj/karma.conf.js")
    ));
    assert!(!paths::paths_equal(
        Path::new("/proj/a.js"),
        Path::new("/proj/b.js")
    ));
}

#[test]
fn ancestry_respects_component_boundaries() {
    assert!(paths::is_proper_ancestor(
        Path::new("/proj/src"),
        Path::new("/proj/src/sub/a.js")
    ));
    assert!(
        !paths::is_proper_ancestor(Path::new("/proj/src"), Path::new("/proj/src-extra/a.js")),
        "string prefixes are not path ancestors"
    );
    assert!(
        !paths::is_proper_ancestor(Path::new("/proj/src"), Path::new("/proj/src")),
        "a directory is not its own proper ancestor"
    );
}

#[test]
fn in_directory_covers_direct_and_nested_children() {
    assert!(paths::is_in_directory(
        Path::new("/ws/a/karma.conf.js"),
        Path::new("/ws/a")
    ));
    assert!(paths::is_in_directory(
        Path::new("/ws/a/deep/karma.conf.js"),
        Path::new("/ws")
    ));
    assert!(!paths::is_in_directory(
        Path::new("/other/karma.conf.js"),
        Path::new("/ws")
    ));
}
