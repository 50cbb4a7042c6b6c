//! Indexed child edits on class member lists

use nodekeep::ast::{AstNode, ClassDecl, HasMembers};
use nodekeep::{FileId, Project, Strategy, StructuredContent, WrapperId};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Returns (project, file, member list wrapper, member wrappers)
fn class_project(text: &str) -> (Project, FileId, WrapperId, Vec<WrapperId>) {
    let mut project = Project::new();
    let file = project.add_file("a.brace", text).unwrap();

    let tree = project.source(&file).unwrap().tree();
    let class = ClassDecl::cast(tree, tree.node_at_path(&[0]).unwrap()).unwrap();
    let list_offset = tree[class.member_list(tree).unwrap()].range().start;
    assert_eq!(list_offset, 9);

    let root = project.root(&file).unwrap();
    let class = project.child(root, 0).unwrap().unwrap();
    let list = project.child(class, 3).unwrap().unwrap();
    let members = project.children(list).unwrap();
    (project, file, list, members)
}

/// Given: `class C { a; b; }` with wrappers on both members
/// When: `c;` is inserted at index 1
/// Then: `a;` keeps its wrapper, `b;` is forgotten and found again at index 2
#[test]
fn test_insert_between_members() {
    init_logging();
    let (mut project, file, list, members) = class_project("class C { a; b; }");
    let (a, b) = (members[0], members[1]);

    let result = project
        .insert_child(list, 1, &StructuredContent::text("c;"))
        .unwrap();

    assert!(result.success);
    assert_eq!(result.strategy, Strategy::IndexedChild);
    assert_eq!(project.file_text(&file), Some("class C { a; c; b; }"));

    assert!(!project.was_forgotten(a));
    assert!(!project.was_forgotten(list));
    assert!(project.was_forgotten(b));
    assert!(result.invalidated_wrappers.contains(&b));

    assert_eq!(project.child(list, 0).unwrap(), Some(a));
    let inserted = project.child(list, 1).unwrap().unwrap();
    assert_eq!(project.text(inserted).unwrap(), "c;");
    let b_again = project.child(list, 2).unwrap().unwrap();
    assert_eq!(project.text(b_again).unwrap(), "b;");
    assert_ne!(b_again, b);
}

#[test]
fn test_insert_block_into_multiline_class() {
    let (mut project, file, list, _) = class_project("class C {\n    a;\n}");
    let content = StructuredContent::block(
        "class D",
        vec![StructuredContent::text("x;"), StructuredContent::text("y;")],
    );

    let result = project.insert_child(list, 1, &content).unwrap();

    assert_eq!(result.strategy, Strategy::IndexedChild);
    insta::assert_snapshot!(project.file_text(&file).unwrap(), @r"
    class C {
        a;
        class D {
            x;
            y;
        }
    }
    ");
}

#[test]
fn test_remove_member_forgets_following_siblings() {
    init_logging();
    let (mut project, file, list, members) = class_project("class C { a; b; c; }");

    let result = project.remove_child(list, 1).unwrap();

    assert_eq!(result.strategy, Strategy::IndexedChild);
    assert_eq!(project.file_text(&file), Some("class C { a; c; }"));
    assert!(!project.was_forgotten(members[0]));
    assert!(project.was_forgotten(members[1]));
    assert!(project.was_forgotten(members[2]));
    assert_eq!(project.child_count(list).unwrap(), 2);
}

#[test]
fn test_insert_into_empty_class() {
    let (mut project, file, list, members) = class_project("class C {}");
    assert!(members.is_empty());

    let result = project
        .insert_child(list, 0, &StructuredContent::text("a;"))
        .unwrap();

    assert_eq!(project.file_text(&file), Some("class C { a; }"));
    assert_eq!(result.strategy, Strategy::IndexedChild);
    assert_eq!(project.child_count(list).unwrap(), 1);
}

/// Given: inserted text that does not parse as one member
/// When: the declared child delta disagrees with the new tree
/// Then: the edit falls back to forgetting and reports the syntax error
#[test]
fn test_delta_mismatch_falls_back_to_forgetting() {
    init_logging();
    let (mut project, file, list, members) = class_project("class C { a; b; }");

    let result = project
        .insert_child(list, 1, &StructuredContent::text("c; d;"))
        .unwrap();

    assert_eq!(project.file_text(&file), Some("class C { a; c; d; b; }"));
    assert_eq!(result.strategy, Strategy::Forgetting);
    assert!(!project.was_forgotten(list));
    assert!(project.was_forgotten(members[0]));
    assert_eq!(project.child_count(list).unwrap(), 4);
}

#[test]
fn test_child_index_out_of_bounds() {
    let (mut project, file, list, _) = class_project("class C { a; }");
    let err = project
        .insert_child(list, 5, &StructuredContent::text("b;"))
        .unwrap_err();
    assert!(matches!(
        err,
        nodekeep::Error::InvalidChildIndex { index: 5, count: 1 }
    ));
    assert_eq!(project.file_text(&file), Some("class C { a; }"));
}

/// Given: wrappers over a let statement and its identifier
/// When: child edits target nodes that are not lists
/// Then: each request fails with NotAList and the text is untouched
#[test]
fn test_child_edits_reject_non_list_targets() {
    let mut project = Project::new();
    let file = project.add_file("a.brace", "let x = 1;").unwrap();
    let root = project.root(&file).unwrap();
    let statement = project.child(root, 0).unwrap().unwrap();
    let name = project.child(statement, 1).unwrap().unwrap();

    let err = project
        .insert_child(name, 0, &StructuredContent::text("y;"))
        .unwrap_err();
    assert!(matches!(err, nodekeep::Error::NotAList { ref kind } if kind == "identifier"));

    let err = project.remove_child(statement, 0).unwrap_err();
    assert!(matches!(err, nodekeep::Error::NotAList { .. }));
    let err = project
        .replace_children(statement, &[StructuredContent::text("y;")])
        .unwrap_err();
    assert!(matches!(err, nodekeep::Error::NotAList { .. }));

    assert_eq!(project.file_text(&file), Some("let x = 1;"));
    assert!(!project.was_forgotten(name));

    // the root is always a list
    let result = project
        .insert_child(root, 1, &StructuredContent::text("y;"))
        .unwrap();
    assert_eq!(project.file_text(&file), Some("let x = 1; y;"));
    assert_eq!(result.strategy, Strategy::IndexedChild);
}
