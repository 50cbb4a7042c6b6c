//! Typed views over trees of the bundled brace language.
//!
//! A view is a node index whose kind has been checked; it borrows nothing,
//! so every accessor takes the tree it was cast from.

use crate::syntax::{BraceKind, NodeIndex, SyntaxTree};

pub trait AstNode: Sized {
    fn cast(tree: &SyntaxTree, index: NodeIndex) -> Option<Self>;

    fn syntax(&self) -> NodeIndex;
}

/// Nodes introduced by a keyword and named by an identifier
pub trait NamedNode: AstNode {
    fn name(&self, tree: &SyntaxTree) -> Option<NodeIndex> {
        child_of_kind(tree, self.syntax(), BraceKind::Identifier)
    }

    fn name_text<'t>(&self, tree: &SyntaxTree, text: &'t str) -> Option<&'t str> {
        let range = tree[self.name(tree)?].range();
        text.get(range.start..range.end)
    }
}

/// Nodes whose body is a list of items
pub trait HasMembers: AstNode {
    /// Node holding the items, the target of child insertion and removal
    fn member_list(&self, tree: &SyntaxTree) -> Option<NodeIndex>;

    fn members(&self, tree: &SyntaxTree) -> Vec<Item> {
        self.member_list(tree)
            .map(|list| {
                tree[list]
                    .children()
                    .iter()
                    .filter_map(|child| Item::cast(tree, *child))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn child_of_kind(tree: &SyntaxTree, index: NodeIndex, kind: BraceKind) -> Option<NodeIndex> {
    tree[index]
        .children()
        .iter()
        .copied()
        .find(|child| BraceKind::from_kind(tree[*child].kind()) == Some(kind))
}

fn is_kind(tree: &SyntaxTree, index: NodeIndex, kind: BraceKind) -> bool {
    tree.get(index)
        .is_some_and(|node| BraceKind::from_kind(node.kind()) == Some(kind))
}

macro_rules! ast_node {
    ($name:ident, $kind:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(NodeIndex);

        impl AstNode for $name {
            fn cast(tree: &SyntaxTree, index: NodeIndex) -> Option<Self> {
                is_kind(tree, index, $kind).then_some(Self(index))
            }

            fn syntax(&self) -> NodeIndex {
                self.0
            }
        }
    };
}

ast_node!(Root, BraceKind::SourceFile);
ast_node!(ImportDecl, BraceKind::ImportDeclaration);
ast_node!(ExportDecl, BraceKind::ExportDeclaration);
ast_node!(ClassDecl, BraceKind::ClassDeclaration);
ast_node!(LetStmt, BraceKind::LetStatement);
ast_node!(ExprStmt, BraceKind::ExpressionStatement);

impl Root {
    pub fn from_tree(tree: &SyntaxTree) -> Option<Self> {
        Self::cast(tree, tree.root())
    }
}

impl HasMembers for Root {
    fn member_list(&self, _tree: &SyntaxTree) -> Option<NodeIndex> {
        Some(self.0)
    }
}

impl ClassDecl {
    pub fn is_closed(&self, tree: &SyntaxTree) -> bool {
        child_of_kind(tree, self.0, BraceKind::RBrace).is_some()
    }
}

impl NamedNode for ClassDecl {}

impl HasMembers for ClassDecl {
    fn member_list(&self, tree: &SyntaxTree) -> Option<NodeIndex> {
        child_of_kind(tree, self.0, BraceKind::MemberList)
    }
}

impl NamedNode for LetStmt {}

impl LetStmt {
    /// The literal or identifier after `=`
    pub fn value(&self, tree: &SyntaxTree) -> Option<NodeIndex> {
        let children = tree[self.0].children();
        let equals = children
            .iter()
            .position(|child| is_kind(tree, *child, BraceKind::Equals))?;
        children
            .get(equals + 1)
            .copied()
            .filter(|value| !tree[*value].is_error())
    }
}

/// Import or export specifier token, identifier or string
fn specifier(tree: &SyntaxTree, index: NodeIndex) -> Option<NodeIndex> {
    child_of_kind(tree, index, BraceKind::Identifier)
        .or_else(|| child_of_kind(tree, index, BraceKind::StringLiteral))
}

impl ImportDecl {
    pub fn specifier(&self, tree: &SyntaxTree) -> Option<NodeIndex> {
        specifier(tree, self.0)
    }
}

impl ExportDecl {
    pub fn specifier(&self, tree: &SyntaxTree) -> Option<NodeIndex> {
        specifier(tree, self.0)
    }
}

impl ExprStmt {
    pub fn expr(&self, tree: &SyntaxTree) -> Option<NodeIndex> {
        tree[self.0]
            .children()
            .first()
            .copied()
            .filter(|expr| !tree[*expr].is_error())
    }
}

/// One entry of a file or a class body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    Import(ImportDecl),
    Export(ExportDecl),
    Class(ClassDecl),
    Let(LetStmt),
    Expr(ExprStmt),
}

impl AstNode for Item {
    fn cast(tree: &SyntaxTree, index: NodeIndex) -> Option<Self> {
        let kind = BraceKind::from_kind(tree.get(index)?.kind())?;
        Some(match kind {
            BraceKind::ImportDeclaration => Item::Import(ImportDecl(index)),
            BraceKind::ExportDeclaration => Item::Export(ExportDecl(index)),
            BraceKind::ClassDeclaration => Item::Class(ClassDecl(index)),
            BraceKind::LetStatement => Item::Let(LetStmt(index)),
            BraceKind::ExpressionStatement => Item::Expr(ExprStmt(index)),
            BraceKind::SourceFile
            | BraceKind::MemberList
            | BraceKind::Identifier
            | BraceKind::NumberLiteral
            | BraceKind::StringLiteral
            | BraceKind::ClassKeyword
            | BraceKind::ImportKeyword
            | BraceKind::ExportKeyword
            | BraceKind::LetKeyword
            | BraceKind::LBrace
            | BraceKind::RBrace
            | BraceKind::Semicolon
            | BraceKind::Equals
            | BraceKind::Error => return None,
        })
    }

    fn syntax(&self) -> NodeIndex {
        match self {
            Item::Import(node) => node.0,
            Item::Export(node) => node.0,
            Item::Class(node) => node.0,
            Item::Let(node) => node.0,
            Item::Expr(node) => node.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::FileId;
    use crate::syntax::{BraceParser, SourceParser};

    fn parse(text: &str) -> SyntaxTree {
        BraceParser.parse(text, &FileId::new("a.brace"))
    }

    #[test]
    fn test_items_of_root() {
        let text = "import a;\nclass C { let x = 1; y; }\n@";
        let tree = parse(text);
        let root = Root::from_tree(&tree).unwrap();
        let items = root.members(&tree);
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Item::Import(_)));

        let Item::Class(class) = items[1] else {
            panic!("expected class, got {:?}", items[1]);
        };
        assert_eq!(class.name_text(&tree, text), Some("C"));
        assert!(class.is_closed(&tree));

        let members = class.members(&tree);
        let Item::Let(binding) = members[0] else {
            panic!("expected let, got {:?}", members[0]);
        };
        assert_eq!(binding.name_text(&tree, text), Some("x"));
        let value = binding.value(&tree).unwrap();
        assert_eq!(&text[tree[value].range().start..tree[value].range().end], "1");
        assert!(matches!(members[1], Item::Expr(_)));
    }

    #[test]
    fn test_cast_checks_kind() {
        let tree = parse("class C {}");
        let class = tree.node_at_path(&[0]).unwrap();
        assert!(ClassDecl::cast(&tree, class).is_some());
        assert!(LetStmt::cast(&tree, class).is_none());
        assert!(Item::cast(&tree, tree.root()).is_none());
        assert_eq!(
            ClassDecl::cast(&tree, class).unwrap().member_list(&tree),
            tree.node_at_path(&[0, 3])
        );
    }

    #[test]
    fn test_unclosed_class_and_missing_value() {
        let tree = parse("class C { let x = ;");
        let class = ClassDecl::cast(&tree, tree.node_at_path(&[0]).unwrap()).unwrap();
        assert!(!class.is_closed(&tree));
        let Item::Let(binding) = class.members(&tree)[0] else {
            panic!("expected let");
        };
        assert!(binding.value(&tree).is_none());
    }
}
