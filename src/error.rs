//! Error handling types for nodekeep
//!
//! Invariant violations (`RangeOverlapInconsistent`, `ReentrantManipulation`)
//! are hard failures. Recoverable outcomes of an edit (syntax errors in the
//! inserted text, escalated reconciliation) travel as diagnostics inside
//! `EditResult` instead.

use std::sync::PoisonError;
use thiserror::Error;

use crate::project::FileId;
use crate::text::{TextEdit, TextRange};
use crate::wrapper::WrapperId;

/// Error type for wrapper navigation and manipulation
#[derive(Debug, Error)]
pub enum Error {
    /// A wrapper was dereferenced after it transitioned to Forgotten
    #[error("Node {id} was forgotten and can no longer be navigated")]
    NodeForgotten { id: WrapperId },

    /// A planned edit does not align with node boundaries
    #[error("Range {range} partially overlaps edit {edit}")]
    RangeOverlapInconsistent { range: TextRange, edit: TextEdit },

    /// A modification subscriber tried to start an edit while one was in progress
    #[error("Cannot start a manipulation while another manipulation is in progress")]
    ReentrantManipulation,

    /// File is not part of the project
    #[error("File not found: {file}")]
    FileNotFound { file: FileId },

    /// File is already part of the project
    #[error("File already exists: {file}")]
    FileExists { file: FileId },

    /// Offsets outside the target or not on a character boundary
    #[error("Invalid range {start}..{end}: {message}")]
    InvalidRange {
        start: usize,
        end: usize,
        message: String,
    },

    /// Child index beyond the parent's child count
    #[error("Child index {index} out of bounds for {count} children")]
    InvalidChildIndex { index: usize, count: usize },

    /// Child insertion or removal targeted a node that does not hold list items
    #[error("Node of kind {kind} does not hold list children")]
    NotAList { kind: String },

    /// Rename requested on a node that is not a single token
    #[error("Node {id} cannot be renamed: {message}")]
    NotRenameable { id: WrapperId, message: String },

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Tree-sitter rejected the language (ABI mismatch)
    #[error("Language error: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for nodekeep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Helper trait to convert PoisonError into a recovered guard
pub trait LockResultExt<T> {
    /// Recover the guard from a poisoned lock, logging which operation hit it.
    fn recover_poison(self, context: &str) -> T;
}

impl<T> LockResultExt<T> for std::result::Result<T, PoisonError<T>> {
    fn recover_poison(self, context: &str) -> T {
        match self {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!(
                    target: "nodekeep::lock_recovery",
                    "Recovered from poisoned lock in {}",
                    context
                );
                poisoned.into_inner()
            }
        }
    }
}

/// Helper functions for common error patterns
impl Error {
    /// Create a node forgotten error
    pub fn forgotten(id: WrapperId) -> Self {
        Error::NodeForgotten { id }
    }

    /// Create a range overlap error
    pub fn overlap(range: TextRange, edit: TextEdit) -> Self {
        Error::RangeOverlapInconsistent { range, edit }
    }

    /// Create a file not found error
    pub fn file_not_found(file: &FileId) -> Self {
        Error::FileNotFound { file: file.clone() }
    }

    /// Create an invalid range error
    pub fn invalid_range(start: usize, end: usize, message: impl Into<String>) -> Self {
        Error::InvalidRange {
            start,
            end,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Whether this error is a forgotten-node access
    pub fn is_forgotten(&self) -> bool {
        matches!(self, Error::NodeForgotten { .. })
    }
}
