use std::collections::BTreeSet;
use std::fmt;

use crate::edit::Strategy;
use crate::text::{LineCol, TextRange};
use crate::wrapper::WrapperId;

use super::file::FileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The edited text no longer parses cleanly
    ManipulationError,
    /// Reconciliation had to forget every wrapper of the file
    TreeStructureChanged,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::ManipulationError => "ManipulationError",
            DiagnosticKind::TreeStructureChanged => "TreeStructureChanged",
        })
    }
}

/// Non-fatal outcome attached to an edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub file: FileId,
    /// Range in the file's new text
    pub range: TextRange,
    pub position: LineCol,
    pub message: String,
    pub snippet: Option<String>,
}

impl Diagnostic {
    pub fn manipulation_error(
        file: FileId,
        range: TextRange,
        position: LineCol,
        snippet: impl Into<String>,
    ) -> Self {
        let snippet = snippet.into();
        Self {
            kind: DiagnosticKind::ManipulationError,
            severity: Severity::Error,
            message: format!(
                "Syntax error at {}:{} after edit: {:?}",
                position.line + 1,
                position.col + 1,
                snippet
            ),
            file,
            range,
            position,
            snippet: Some(snippet),
        }
    }

    pub fn tree_structure_changed(file: FileId, range: TextRange, position: LineCol) -> Self {
        Self {
            kind: DiagnosticKind::TreeStructureChanged,
            severity: Severity::Warning,
            message: format!(
                "Tree structure around {} changed beyond the edit; all nodes of {} were forgotten",
                range, file
            ),
            file,
            range,
            position,
            snippet: None,
        }
    }
}

/// Outcome of one manipulation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    /// False when the edit introduced syntax errors
    pub success: bool,
    pub invalidated_wrappers: BTreeSet<WrapperId>,
    pub diagnostics: Vec<Diagnostic>,
    /// Least identity-preserving strategy applied across the edited files
    pub strategy: Strategy,
    pub files: Vec<FileId>,
}

impl EditResult {
    pub(crate) fn new(strategy: Strategy) -> Self {
        Self {
            success: true,
            invalidated_wrappers: BTreeSet::new(),
            diagnostics: Vec::new(),
            strategy,
            files: Vec::new(),
        }
    }

    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.kind == kind)
    }
}
