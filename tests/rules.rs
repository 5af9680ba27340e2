// tests/rules.rs

use std::path::{Path, PathBuf};

use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};
use retest::watch::{FsEvent, FsEventKind, SkipRules};

fn rules() -> SkipRules {
    SkipRules::defaults().unwrap()
}

#[test]
fn test_skip_names() {
    let rules = rules();
    assert!(rules.should_skip_name(".git"));
    assert!(rules.should_skip_name(".hidden.go"));
    assert!(rules.should_skip_name("main.go~"));
    assert!(rules.should_skip_name("vendor"));
    assert!(!rules.should_skip_name("pkg"));
    assert!(!rules.should_skip_name("vendored"));
}

#[test]
fn test_skip_paths_check_every_component_below_root() {
    let rules = rules();
    let root = Path::new("/proj");

    assert!(rules.should_skip_path(root, Path::new("/proj/vendor/x/y.go")));
    assert!(rules.should_skip_path(root, Path::new("/proj/pkg/.cache/a.go")));
    assert!(!rules.should_skip_path(root, Path::new("/proj/pkg/a.go")));
    assert!(!rules.should_skip_path(root, root));
}

#[test]
fn test_hidden_root_is_not_skipped() {
    let rules = rules();
    let root = Path::new("/home/me/.work/proj");

    assert!(!rules.should_skip_path(root, root));
    assert!(!rules.should_skip_path(root, &root.join("a.go")));
}

#[test]
fn test_custom_skip_globs() {
    let rules = SkipRules::new(
        &["vendor".to_string(), "node_*".to_string()],
        &["*.go".to_string(), "go.mod".to_string()],
    )
    .unwrap();

    assert!(rules.should_skip_name("node_modules"));
    assert!(rules.is_source_file(Path::new("/proj/go.mod")));
    assert!(rules.is_source_file(Path::new("/proj/pkg/a_test.go")));
    assert!(!rules.is_source_file(Path::new("/proj/go.sum")));
}

#[test]
fn test_invalid_glob_is_rejected() {
    assert!(SkipRules::new(&["[".to_string()], &["*.go".to_string()]).is_err());
}

#[test]
fn test_notify_event_mapping() {
    let cases = [
        (EventKind::Create(CreateKind::File), FsEventKind::Create),
        (EventKind::Remove(RemoveKind::Any), FsEventKind::Remove),
        (EventKind::Modify(ModifyKind::Data(DataChange::Content)), FsEventKind::Write),
        (EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)), FsEventKind::Chmod),
        (EventKind::Modify(ModifyKind::Name(RenameMode::To)), FsEventKind::Create),
        (EventKind::Modify(ModifyKind::Name(RenameMode::From)), FsEventKind::Rename),
        (EventKind::Any, FsEventKind::Other),
    ];

    for (kind, expected) in cases {
        let label = format!("{kind:?}");
        let event = Event::new(kind).add_path(PathBuf::from("/proj/a.go"));
        let mapped = FsEvent::from_notify(event);
        assert_eq!(mapped, vec![FsEvent::new("/proj/a.go", expected)], "{label}");
    }
}

#[test]
fn test_notify_rename_both_splits_paths() {
    let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
        .add_path(PathBuf::from("/proj/old.go"))
        .add_path(PathBuf::from("/proj/new.go"));

    assert_eq!(
        FsEvent::from_notify(event),
        vec![
            FsEvent::new("/proj/old.go", FsEventKind::Rename),
            FsEvent::new("/proj/new.go", FsEventKind::Create),
        ]
    );
}
