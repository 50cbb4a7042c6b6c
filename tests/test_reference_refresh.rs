//! Lazy reference index refresh

use std::collections::BTreeSet;

use nodekeep::{FileId, Project};

fn project() -> (Project, FileId, FileId, FileId) {
    let mut project = Project::new();
    let app = project
        .add_file("app.brace", "import util;\nimport \"lib/shared\";\napp;")
        .unwrap();
    let util = project.add_file("util.brace", "export \"lib/shared\";").unwrap();
    let shared = project.add_file("lib/shared.brace", "shared;").unwrap();
    (project, app, util, shared)
}

/// Given: a project whose files were just added
/// When: referenced files are queried twice
/// Then: the first query refreshes exactly one entry and the second none
#[test]
fn test_referenced_files_refreshes_lazily() {
    let (mut project, app, util, shared) = project();
    assert_eq!(project.reference_refresh_count(), 0);

    let referenced = project.referenced_files(&app).unwrap();
    assert_eq!(referenced, BTreeSet::from([util.clone(), shared.clone()]));
    assert_eq!(project.reference_refresh_count(), 1);

    let again = project.referenced_files(&app).unwrap();
    assert_eq!(again, referenced);
    assert_eq!(project.reference_refresh_count(), 1);

    // the other entries stay dirty until asked for
    assert!(project.is_reference_dirty(&util));
    assert!(project.is_reference_dirty(&shared));
}

#[test]
fn test_edit_marks_file_and_referencing_files_dirty() {
    let (mut project, app, util, shared) = project();
    assert_eq!(project.refresh_dirty_source_files(), 3);
    assert_eq!(project.refresh_dirty_source_files(), 0);

    let root = project.root(&shared).unwrap();
    let statement = project.child(root, 0).unwrap().unwrap();
    let name = project.child(statement, 0).unwrap().unwrap();
    project
        .rename(name, "common", nodekeep::RenameOptions::file())
        .unwrap();

    assert!(project.is_reference_dirty(&shared));
    assert!(project.is_reference_dirty(&app));
    assert!(!project.is_reference_dirty(&util));

    // util only re-exports shared, which is not a reference of its own
    let referencing = project.referencing_files(&shared).unwrap();
    assert_eq!(referencing, BTreeSet::from([app.clone()]));
    assert_eq!(project.reference_refresh_count(), 5);
}

#[test]
fn test_new_import_is_picked_up_after_edit() {
    let (mut project, app, _, _) = project();
    let before = project.referenced_files(&app).unwrap();
    assert_eq!(before.len(), 2);

    let root = project.root(&app).unwrap();
    let last = project.last_child(root).unwrap().unwrap();
    project.replace_text(last, "import missing;").unwrap();

    assert!(project.is_reference_dirty(&app));
    let referenced = project.referenced_files(&app).unwrap();
    assert_eq!(referenced.len(), 2);

    // a file added later resolves the waiting import
    let missing = project.add_file("missing.brace", "m;").unwrap();
    assert!(project.is_reference_dirty(&app));
    assert!(project.referenced_files(&app).unwrap().contains(&missing));
}

#[test]
fn test_removed_file_dirties_its_importers() {
    let (mut project, app, util, _) = project();
    project.refresh_dirty_source_files();

    project.remove_file(&util).unwrap();
    assert!(project.is_reference_dirty(&app));
    let referenced = project.referenced_files(&app).unwrap();
    assert!(!referenced.contains(&util));
    assert!(project.referenced_files(&util).is_err());
}
