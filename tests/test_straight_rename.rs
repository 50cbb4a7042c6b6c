//! Identity preservation for edits that keep the tree shape

use nodekeep::{FileId, Project, RenameOptions, Strategy, WrapperId};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Returns (project, file, let statement, name identifier)
fn let_project(text: &str) -> (Project, FileId, WrapperId, WrapperId) {
    let mut project = Project::new();
    let file = project.add_file("a.brace", text).unwrap();
    let root = project.root(&file).unwrap();
    let statement = project.child(root, 0).unwrap().unwrap();
    let name = project.child(statement, 1).unwrap().unwrap();
    (project, file, statement, name)
}

/// Given: wrappers over `let x = 1;` and a later use of `x`
/// When: `x` is renamed
/// Then: every wrapper keeps its handle and reads the new text
#[test]
fn test_rename_preserves_every_wrapper() {
    init_logging();
    let (mut project, file, statement, name) = let_project("let x = 1;\nx;");
    let root = project.root(&file).unwrap();
    let usage = project.descendant_at(&file, 11).unwrap();

    let result = project
        .rename(name, "value", RenameOptions::file())
        .unwrap();

    assert!(result.success);
    assert_eq!(result.strategy, Strategy::Straight);
    assert!(result.invalidated_wrappers.is_empty());
    assert_eq!(result.files, vec![file.clone()]);
    assert_eq!(project.file_text(&file), Some("let value = 1;\nvalue;"));

    for wrapper in [root, statement, name, usage] {
        assert!(!project.was_forgotten(wrapper), "{wrapper} was forgotten");
    }
    assert_eq!(project.text(name).unwrap(), "value");
    assert_eq!(project.text(usage).unwrap(), "value");
    assert_eq!(project.text(statement).unwrap(), "let value = 1;");

    // navigation finds the rebound wrappers, not new ones
    assert_eq!(project.child(statement, 1).unwrap(), Some(name));
    assert_eq!(project.root(&file).unwrap(), root);
}

#[test]
fn test_project_scope_rename_edits_every_file() {
    init_logging();
    let mut project = Project::new();
    let a = project.add_file("a.brace", "let x = 1;").unwrap();
    let b = project.add_file("b.brace", "x; y;").unwrap();
    let b_root = project.root(&b).unwrap();
    let b_usage = project.first_child(b_root).unwrap().unwrap();
    let name = project.descendant_at(&a, 4).unwrap();

    let result = project
        .rename(name, "count", RenameOptions::project())
        .unwrap();

    assert_eq!(result.files, vec![a.clone(), b.clone()]);
    assert_eq!(project.file_text(&a), Some("let count = 1;"));
    assert_eq!(project.file_text(&b), Some("count; y;"));
    assert_eq!(project.text(b_usage).unwrap(), "count;");
}

#[test]
fn test_rename_rejects_non_token() {
    let (mut project, file, statement, _) = let_project("let x = 1;");
    let err = project
        .rename(statement, "y", RenameOptions::default())
        .unwrap_err();
    assert!(matches!(err, nodekeep::Error::NotRenameable { .. }));
    assert_eq!(project.file_text(&file), Some("let x = 1;"));
}

/// Given: a literal-value edit whose text adds a statement
/// When: the straight strategy fails its node-count check
/// Then: reconciliation falls back to forgetting and keeps the chain alive
#[test]
fn test_straight_verification_failure_falls_back_to_forgetting() {
    init_logging();
    let (mut project, file, statement, _) = let_project("let x = 1;");
    let number = project.child(statement, 3).unwrap().unwrap();

    let result = project.replace_text(number, "1; y").unwrap();

    assert_eq!(project.file_text(&file), Some("let x = 1; y;"));
    assert_eq!(result.strategy, Strategy::Forgetting);
    assert!(result.success);
    assert!(!project.was_forgotten(statement));
    assert!(!project.was_forgotten(number));
    assert_eq!(project.text(number).unwrap(), "1");
    let root = project.root(&file).unwrap();
    assert_eq!(project.child_count(root).unwrap(), 2);
}

#[test]
fn test_rename_locations_applies_right_to_left() {
    let mut project = Project::new();
    let file = project.add_file("a.brace", "a; a; a;").unwrap();
    let locations = [0, 3, 6]
        .into_iter()
        .map(|start| {
            nodekeep::RenameLocation::new(
                file.clone(),
                nodekeep::TextRange::new(start, start + 1),
            )
        })
        .collect();

    let result = project.rename_locations(locations, "bb").unwrap();
    assert_eq!(result.strategy, Strategy::Straight);
    assert_eq!(project.file_text(&file), Some("bb; bb; bb;"));
}

/// Given: a file whose last statement already lacks its semicolon
/// When: the identifier next to the missing token is renamed
/// Then: the old syntax error is not reported against the rename
#[test]
fn test_rename_next_to_existing_syntax_error_succeeds() {
    init_logging();
    let mut project = Project::new();
    let file = project.add_file("a.brace", "let x = 1;\nfoo").unwrap();
    let name = project.descendant_at(&file, 11).unwrap();
    assert_eq!(project.kind(name).unwrap().name(), "identifier");

    let result = project.rename(name, "bar", RenameOptions::file()).unwrap();

    assert!(result.success, "{:?}", result.diagnostics);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.strategy, Strategy::Straight);
    assert_eq!(project.file_text(&file), Some("let x = 1;\nbar"));
    assert_eq!(project.text(name).unwrap(), "bar");
}

#[test]
fn test_new_error_is_reported_beside_an_old_one() {
    let (mut project, file, statement, _) = let_project("let x = 1;\nfoo");

    let result = project.insert_text(statement, 9, " +").unwrap();

    assert!(!result.success);
    assert_eq!(project.file_text(&file), Some("let x = 1 +;\nfoo"));
    let errors: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.kind == nodekeep::DiagnosticKind::ManipulationError)
        .collect();
    assert!(!errors.is_empty());
    // the missing semicolon on line 1 predates the edit
    assert!(errors.iter().all(|diagnostic| diagnostic.position.line == 0));
}
