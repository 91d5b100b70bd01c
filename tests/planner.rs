use std::path::{Path, PathBuf};

use proptest::prelude::*;
use testwatch::config::FileGroup;
use testwatch::paths;
use testwatch::watch::{WatchSpec, plan_watches};
use testwatch_test_utils::init_tracing;

fn recursive_watches(watches: &[WatchSpec]) -> Vec<&WatchSpec> {
    watches.iter().filter(|w| w.recursive).collect()
}

#[test]
fn nested_directories_with_same_filter_collapse_into_ancestor() {
    init_tracing();

    let groups = vec![
        FileGroup::new("/proj/src", "*.js"),
        FileGroup::new("/proj/src/sub", "*.js"),
    ];
    let watches = plan_watches(&groups, None, None);

    let recursive = recursive_watches(&watches);
    assert_eq!(recursive.len(), 1);
    assert_eq!(recursive[0].directory, PathBuf::from("/proj/src"));
    assert!(recursive[0].recursive);
}

#[test]
fn unrelated_directories_with_same_filter_stay_separate() {
    init_tracing();

    let groups = vec![
        FileGroup::new("/proj/a", "*.js"),
        FileGroup::new("/proj/b", "*.js"),
    ];
    let watches = plan_watches(&groups, None, None);

    let recursive = recursive_watches(&watches);
    assert_eq!(recursive.len(), 2);
}

#[test]
fn filter_grouping_is_case_insensitive() {
    init_tracing();

    let groups = vec![
        FileGroup::new("/proj/src", "*.JS"),
        FileGroup::new("/proj/src/sub", "*.js"),
    ];
    let watches = plan_watches(&groups, None, None);

    assert_eq!(recursive_watches(&watches).len(), 1);
}

#[test]
fn sibling_prefix_names_are_not_ancestors() {
    init_tracing();

    // "/proj/src" is a string prefix of "/proj/src-extra" but not a path
    // ancestor; both must survive.
    let groups = vec![
        FileGroup::new("/proj/src", "*.js"),
        FileGroup::new("/proj/src-extra", "*.js"),
    ];
    let watches = plan_watches(&groups, None, None);

    assert_eq!(recursive_watches(&watches).len(), 2);
}

#[test]
fn different_filters_never_collapse() {
    init_tracing();

    let groups = vec![
        FileGroup::new("/proj/src", "*.js"),
        FileGroup::new("/proj/src/sub", "*.ts"),
    ];
    let watches = plan_watches(&groups, None, None);

    assert_eq!(recursive_watches(&watches).len(), 2);
}

#[test]
fn duplicate_directories_collapse() {
    init_tracing();

    let groups = vec![
        FileGroup::new("/proj/src", "*.js"),
        FileGroup::new("/proj/src", "*.js"),
    ];
    let watches = plan_watches(&groups, None, None);

    assert_eq!(recursive_watches(&watches).len(), 1);
}

#[test]
fn singleton_files_get_non_recursive_single_file_watches() {
    init_tracing();

    let watches = plan_watches(
        &[],
        Some(Path::new("/proj/testsettings.toml")),
        Some(Path::new("/proj/karma.conf.js")),
    );

    assert_eq!(watches.len(), 2);
    for watch in &watches {
        assert!(!watch.recursive);
        assert_eq!(watch.directory, PathBuf::from("/proj"));
    }
    assert_eq!(watches[0].filter, "testsettings.toml");
    assert_eq!(watches[1].filter, "karma.conf.js");
}

#[test]
fn absent_singletons_plan_nothing() {
    init_tracing();

    let watches = plan_watches(&[], None, None);
    assert!(watches.is_empty());
}

proptest! {
    /// No planned watch may be rooted under another planned watch with the
    /// same filter, and every input directory must be covered by a surviving
    /// watch (itself or an ancestor).
    #[test]
    fn planned_watches_are_minimal_and_cover_all_groups(
        dirs in prop::collection::vec(
            prop::collection::vec("[a-c]{1,2}", 1..4),
            1..8,
        )
    ) {
        let groups: Vec<FileGroup> = dirs
            .iter()
            .map(|segments| {
                let mut dir = PathBuf::from("/root");
                for seg in segments {
                    dir.push(seg);
                }
                FileGroup::new(dir, "*.js")
            })
            .collect();

        let watches = plan_watches(&groups, None, None);

        for (i, a) in watches.iter().enumerate() {
            for (j, b) in watches.iter().enumerate() {
                if i != j {
                    prop_assert!(
                        !paths::is_proper_ancestor(&a.directory, &b.directory),
                        "{:?} is covered by {:?}",
                        b.directory,
                        a.directory,
                    );
                }
            }
        }

        for group in &groups {
            let covered = watches.iter().any(|w| {
                paths::paths_equal(&w.directory, &group.directory)
                    || paths::is_proper_ancestor(&w.directory, &group.directory)
            });
            prop_assert!(covered, "no watch covers {:?}", group.directory);
        }
    }
}
