use std::sync::Mutex;

use tree_sitter::{Language, Parser};

use crate::error::{LockResultExt, Result};
use crate::project::FileId;
use crate::text::TextRange;

use super::parser::SourceParser;
use super::tree::{SyntaxKind, SyntaxTree, TreeBuilder};

const ERROR_KIND: SyntaxKind = SyntaxKind::new(u16::MAX, "ERROR");

/// Adapter that turns a tree-sitter grammar into immutable arena trees.
///
/// Every node, named or anonymous, becomes one arena node so that child
/// indices match what tree-sitter reports.
pub struct TreeSitterParser {
    name: String,
    language: Language,
    parser: Mutex<Parser>,
}

impl TreeSitterParser {
    pub fn new(name: impl Into<String>, language: Language) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&language)?;
        Ok(Self {
            name: name.into(),
            language,
            parser: Mutex::new(parser),
        })
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    fn convert(tree: &tree_sitter::Tree, text_len: usize) -> SyntaxTree {
        let root = tree.root_node();
        let root_kind = SyntaxKind::new(root.kind_id(), root.kind());
        let mut builder = TreeBuilder::new();
        let mut cursor = tree.walk();

        'walk: loop {
            let node = cursor.node();
            let kind = SyntaxKind::new(node.kind_id(), node.kind());
            let range = TextRange::new(node.start_byte(), node.end_byte());
            let has_children = node.child_count() > 0;
            let index = if has_children {
                builder.start_node(kind, range.start)
            } else {
                builder.token(kind, range)
            };
            if node.is_error() {
                builder.mark_error(index);
            }
            if node.is_missing() {
                builder.mark_missing(index);
            }

            if has_children && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    continue 'walk;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
                builder.finish_node(cursor.node().end_byte());
            }
        }

        builder.finish(root_kind, text_len)
    }
}

impl SourceParser for TreeSitterParser {
    fn parse(&self, text: &str, file: &FileId) -> SyntaxTree {
        let parsed = {
            let mut parser = self.parser.lock().recover_poison("TreeSitterParser::parse");
            parser.parse(text, None)
        };
        match parsed {
            Some(tree) => Self::convert(&tree, text.len()),
            None => {
                log::warn!(
                    target: "nodekeep::syntax",
                    "tree-sitter returned no tree for {}; using an error root",
                    file
                );
                let mut builder = TreeBuilder::new();
                let root = builder.start_node(ERROR_KIND, 0);
                builder.mark_error(root);
                builder.finish(ERROR_KIND, text.len())
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for TreeSitterParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSitterParser")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::NodeIndex;

    fn rust_parser() -> TreeSitterParser {
        TreeSitterParser::new("rust", tree_sitter_rust::LANGUAGE.into()).unwrap()
    }

    #[test]
    fn test_converts_every_node_in_preorder() {
        let text = "fn main() { let x = 1; }";
        let tree = rust_parser().parse(text, &FileId::new("main.rs"));

        let root = &tree[NodeIndex::ROOT];
        assert_eq!(root.kind().name(), "source_file");
        assert_eq!(root.range(), TextRange::new(0, text.len()));

        let identifiers: Vec<&str> = tree
            .indices()
            .filter(|&index| tree[index].kind().name() == "identifier")
            .map(|index| {
                let range = tree[index].range();
                &text[range.start..range.end]
            })
            .collect();
        assert_eq!(identifiers, vec!["main", "x"]);

        for index in tree.indices() {
            assert_eq!(tree.node_at_path(&tree.path(index)), Some(index));
        }
    }

    #[test]
    fn test_anonymous_tokens_are_kept() {
        let text = "fn f() {}";
        let tree = rust_parser().parse(text, &FileId::new("f.rs"));
        assert!(
            tree.indices()
                .any(|index| tree[index].kind().name() == "fn")
        );
    }

    #[test]
    fn test_preserves_error_flags() {
        let text = "fn main( { }";
        let tree = rust_parser().parse(text, &FileId::new("broken.rs"));
        assert!(tree.has_errors());
    }
}
