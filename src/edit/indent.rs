use crate::config::FormatSettings;
use crate::syntax::{NodeIndex, SyntaxTree};
use crate::text::{line_indentation, starts_line};

use super::printer::IndentContext;

/// Indentation for children of `list`.
///
/// Existing children that start their own line set the indentation;
/// otherwise it is one unit deeper than the nearest ancestor that begins
/// its own line.
pub fn child_indent(
    text: &str,
    tree: &SyntaxTree,
    list: NodeIndex,
    format: &FormatSettings,
) -> IndentContext {
    let unit = format.indent_unit();
    let existing = tree[list]
        .children()
        .iter()
        .map(|child| tree[*child].range().start)
        .find(|start| starts_line(text, *start));

    let base = match existing {
        Some(start) => line_indentation(text, start).to_string(),
        None => {
            let anchor = std::iter::once(list)
                .chain(tree.ancestors(list))
                .map(|index| tree[index].range().start)
                .find(|start| starts_line(text, *start))
                .unwrap_or(0);
            format!("{}{}", line_indentation(text, anchor), unit)
        }
    };
    IndentContext::new(base, unit, format.newline.clone())
}

/// Indentation of the line holding the start of `index`
pub fn line_indent_of(text: &str, tree: &SyntaxTree, index: NodeIndex) -> String {
    line_indentation(text, tree[index].range().start).to_string()
}

/// Whether the children of `list` sit on separate lines
pub fn is_multiline(text: &str, tree: &SyntaxTree, list: NodeIndex) -> bool {
    let range = tree[list].range();
    text.get(range.start..range.end)
        .is_some_and(|interior| interior.contains('\n'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::project::FileId;
    use crate::syntax::{BraceParser, SourceParser};

    #[test]
    fn test_indent_follows_existing_children() {
        let text = "class C {\n  a;\n}";
        let tree = BraceParser.parse(text, &FileId::new("a.brace"));
        let list = tree.node_at_path(&[0, 3]).unwrap();
        let indent = child_indent(text, &tree, list, &Settings::default().format);
        assert_eq!(indent.base, "  ");
        assert!(is_multiline(text, &tree, list));
    }

    #[test]
    fn test_indent_without_children_nests_under_line_start() {
        let text = "class A {\n    class B {}\n}";
        let tree = BraceParser.parse(text, &FileId::new("a.brace"));
        let inner_list = tree.node_at_path(&[0, 3, 0, 3]).unwrap();
        let indent = child_indent(text, &tree, inner_list, &Settings::default().format);
        assert_eq!(indent.base, "        ");
        assert!(!is_multiline(text, &tree, inner_list));
    }
}
