//! Turns manipulation requests into edit descriptors.
//!
//! Planning only reads the current text and tree. Offsets in the produced
//! descriptors refer to the text before the edit.

use crate::config::{EditSettings, FormatSettings};
use crate::error::{Error, Result};
use crate::project::SourceFile;
use crate::syntax::NodeIndex;
use crate::text::{Replacement, TextRange, reindent};

use super::descriptor::{EditDescriptor, ManipulationKind};
use super::indent::{child_indent, is_multiline, line_indent_of};
use super::printer::{Printer, StructuredContent};

fn check_span(source: &SourceFile, within: TextRange, start: usize, end: usize) -> Result<()> {
    if start > end || start < within.start || end > within.end {
        return Err(Error::invalid_range(
            start,
            end,
            format!("outside the target node at {within}"),
        ));
    }
    let text = source.text();
    if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
        return Err(Error::invalid_range(start, end, "not on a character boundary"));
    }
    Ok(())
}

/// Insert raw text at `offset` inside the node at `index`
pub fn insert_text(
    source: &SourceFile,
    index: NodeIndex,
    offset: usize,
    text: &str,
) -> Result<EditDescriptor> {
    check_span(source, source.tree()[index].range(), offset, offset)?;
    Ok(EditDescriptor::new(
        source.id().clone(),
        vec![Replacement::insert(offset, text)],
        ManipulationKind::InsertText,
    ))
}

/// Replace `[start, end)` inside the node at `index`
pub fn replace_range(
    source: &SourceFile,
    index: NodeIndex,
    start: usize,
    end: usize,
    text: &str,
) -> Result<EditDescriptor> {
    check_span(source, source.tree()[index].range(), start, end)?;
    Ok(EditDescriptor::new(
        source.id().clone(),
        vec![Replacement::new(start, end, text)],
        ManipulationKind::ReplaceRange,
    ))
}

/// Replace the whole text of a node.
///
/// A leaf is a literal-value edit; anything larger is re-indented to the
/// node's line and treated as an arbitrary replacement.
pub fn replace_text(
    source: &SourceFile,
    index: NodeIndex,
    text: &str,
    format: &FormatSettings,
) -> Result<EditDescriptor> {
    let node = &source.tree()[index];
    let range = node.range();
    let (new_text, kind) = if node.children().is_empty() && !node.is_error() {
        (text.to_string(), ManipulationKind::LiteralValue)
    } else {
        let base = line_indent_of(source.text(), source.tree(), index);
        (
            reindent(text, &base, &format.newline),
            ManipulationKind::ReplaceRange,
        )
    };
    Ok(EditDescriptor::new(
        source.id().clone(),
        vec![Replacement::new(range.start, range.end, new_text)],
        kind,
    ))
}

/// Only the root and the configured list kinds may receive or lose children.
///
/// Everything between the first and last child of such a node is separator
/// or trivia, so the planners below may rewrite it freely.
pub fn ensure_list(source: &SourceFile, list: NodeIndex, lists: &EditSettings) -> Result<()> {
    let tree = source.tree();
    let kind = tree[list].kind();
    if list == tree.root() || lists.is_list_kind(kind.name()) {
        Ok(())
    } else {
        Err(Error::NotAList {
            kind: kind.name().to_string(),
        })
    }
}

/// Insert structured content as child `position` of `list`
pub fn insert_child(
    source: &SourceFile,
    list: NodeIndex,
    position: usize,
    content: &StructuredContent,
    printer: &dyn Printer,
    format: &FormatSettings,
) -> Result<EditDescriptor> {
    let tree = source.tree();
    let text = source.text();
    let children = tree[list].children();
    if position > children.len() {
        return Err(Error::InvalidChildIndex {
            index: position,
            count: children.len(),
        });
    }

    let indent = child_indent(text, tree, list, format);
    let printed = printer.print(content, &indent);
    let multiline = is_multiline(text, tree, list);
    let separator = if multiline {
        format!("{}{}", indent.newline, indent.base)
    } else {
        " ".to_string()
    };

    let replacement = if children.is_empty() {
        let range = tree[list].range();
        let new_text = if multiline {
            let closing = line_indent_of(text, tree, list);
            format!("{separator}{printed}{}{closing}", indent.newline)
        } else {
            format!(" {printed} ")
        };
        Replacement::new(range.start, range.end, new_text)
    } else if position < children.len() {
        let at = tree[children[position]].range().start;
        Replacement::insert(at, format!("{printed}{separator}"))
    } else {
        let at = tree[children[children.len() - 1]].range().end;
        Replacement::insert(at, format!("{separator}{printed}"))
    };

    log::debug!(
        target: "nodekeep::edit",
        "Insert {} item(s) at child {} of {} in {}",
        content.item_count(),
        position,
        tree[list].kind(),
        source.id()
    );
    Ok(EditDescriptor::new(
        source.id().clone(),
        vec![replacement],
        ManipulationKind::InsertChild,
    )
    .with_child_change(list, position, content.item_count() as isize))
}

/// Remove child `position` of `list` together with its separator
pub fn remove_child(source: &SourceFile, list: NodeIndex, position: usize) -> Result<EditDescriptor> {
    let tree = source.tree();
    let children = tree[list].children();
    if position >= children.len() {
        return Err(Error::InvalidChildIndex {
            index: position,
            count: children.len(),
        });
    }

    let range = if children.len() == 1 {
        sole_child_span(source.text(), tree[list].range(), tree[children[0]].range())
    } else if position + 1 < children.len() {
        TextRange::new(
            tree[children[position]].range().start,
            tree[children[position + 1]].range().start,
        )
    } else {
        TextRange::new(
            tree[children[position - 1]].range().end,
            tree[children[position]].range().end,
        )
    };

    Ok(EditDescriptor::new(
        source.id().clone(),
        vec![Replacement::new(range.start, range.end, "")],
        ManipulationKind::RemoveChild,
    )
    .with_child_change(list, position, -1))
}

/// Span removed with the only child of a list.
///
/// A list holding nothing but the child and whitespace is emptied; otherwise
/// comments stay, and so does the line break that ends a comment before it.
fn sole_child_span(text: &str, list: TextRange, child: TextRange) -> TextRange {
    let before = text.get(list.start..child.start).unwrap_or_default();
    let after = text.get(child.end..list.end).unwrap_or_default();
    if before.trim().is_empty() && after.trim().is_empty() {
        return list;
    }
    let start = list.start + before.trim_end_matches([' ', '\t']).len();
    let end = child.end + (after.len() - after.trim_start().len());
    TextRange::new(start, end)
}

/// Replace every child of `list` with freshly printed content
pub fn replace_children(
    source: &SourceFile,
    list: NodeIndex,
    contents: &[StructuredContent],
    printer: &dyn Printer,
    format: &FormatSettings,
) -> Result<EditDescriptor> {
    let tree = source.tree();
    let text = source.text();
    let range = tree[list].range();
    let indent = child_indent(text, tree, list, format);
    let multiline = is_multiline(text, tree, list);

    let printed: Vec<String> = contents
        .iter()
        .map(|content| printer.print(content, &indent))
        .collect();
    let new_text = if printed.is_empty() {
        String::new()
    } else if multiline {
        let separator = format!("{}{}", indent.newline, indent.base);
        let closing = line_indent_of(text, tree, list);
        format!(
            "{separator}{}{}{closing}",
            printed.join(&separator),
            indent.newline
        )
    } else {
        format!(" {} ", printed.join(" "))
    };

    let added: usize = contents.iter().map(StructuredContent::item_count).sum();
    let descriptor = EditDescriptor::new(
        source.id().clone(),
        vec![Replacement::new(range.start, range.end, new_text)],
        ManipulationKind::ReplaceChildren,
    );
    Ok(descriptor.with_child_change(
        list,
        0,
        added as isize - tree[list].children().len() as isize,
    ))
}
