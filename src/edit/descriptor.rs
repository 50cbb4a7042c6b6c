use std::fmt;

use crate::project::FileId;
use crate::syntax::NodeIndex;
use crate::text::{Replacement, TextEdit, TextRange};

/// Reconciliation strategy, ordered from most to least identity-preserving
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strategy {
    /// No shape change: every wrapper is shifted and rebound in place
    Straight,
    /// Siblings inserted or removed at one index of one parent
    IndexedChild,
    /// The subtree around the edit is forgotten
    Forgetting,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Straight => "straight",
            Strategy::IndexedChild => "indexed-child",
            Strategy::Forgetting => "forgetting",
        })
    }
}

/// What the caller asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManipulationKind {
    Rename,
    LiteralValue,
    InsertChild,
    RemoveChild,
    ReplaceChildren,
    InsertText,
    ReplaceRange,
}

impl ManipulationKind {
    pub const fn strategy(self) -> Strategy {
        match self {
            ManipulationKind::Rename | ManipulationKind::LiteralValue => Strategy::Straight,
            ManipulationKind::InsertChild | ManipulationKind::RemoveChild => {
                Strategy::IndexedChild
            }
            ManipulationKind::ReplaceChildren
            | ManipulationKind::InsertText
            | ManipulationKind::ReplaceRange => Strategy::Forgetting,
        }
    }
}

/// One planned edit of one file.
///
/// Offsets refer to the file's text before the edit. Replacements are kept
/// in descending start order and never overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDescriptor {
    pub file: FileId,
    pub replacements: Vec<Replacement>,
    pub child_count_delta: isize,
    /// Parent whose child list changes, for indexed child edits
    pub inserted_into_parent: Option<NodeIndex>,
    pub child_index: Option<usize>,
    pub kind: ManipulationKind,
    pub strategy: Strategy,
}

impl EditDescriptor {
    pub fn new(file: FileId, replacements: Vec<Replacement>, kind: ManipulationKind) -> Self {
        Self {
            file,
            replacements,
            child_count_delta: 0,
            inserted_into_parent: None,
            child_index: None,
            kind,
            strategy: kind.strategy(),
        }
    }

    pub fn with_child_change(mut self, parent: NodeIndex, index: usize, delta: isize) -> Self {
        self.inserted_into_parent = Some(parent);
        self.child_index = Some(index);
        self.child_count_delta = delta;
        self
    }

    pub fn range_start(&self) -> usize {
        self.replacements
            .iter()
            .map(|replacement| replacement.start)
            .min()
            .unwrap_or(0)
    }

    pub fn range_end(&self) -> usize {
        self.replacements
            .iter()
            .map(|replacement| replacement.end)
            .max()
            .unwrap_or(0)
    }

    /// Hull of all replaced ranges in the old text
    pub fn hull(&self) -> TextRange {
        TextRange::new(self.range_start(), self.range_end())
    }

    /// Text of the leftmost replacement
    pub fn new_text(&self) -> &str {
        self.replacements
            .last()
            .map_or("", |replacement| replacement.new_text.as_str())
    }

    /// Edits in descending start order
    pub fn edits(&self) -> Vec<TextEdit> {
        self.replacements.iter().map(Replacement::edit).collect()
    }

    pub fn delta(&self) -> isize {
        self.edits().iter().map(TextEdit::delta).sum()
    }

    /// Ranges the replacement texts occupy after the edit, ascending
    pub fn new_ranges(&self) -> Vec<TextRange> {
        let mut shift = 0isize;
        self.replacements
            .iter()
            .rev()
            .map(|replacement| {
                let start = replacement.start.saturating_add_signed(shift);
                shift += replacement.edit().delta();
                TextRange::new(start, start + replacement.new_text.len())
            })
            .collect()
    }
}
