use crate::text::TextRange;

use super::file::FileId;

/// Notification sent to subscribers after a file changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Added(FileId),
    /// Text was edited; `range` is the edited span in the new text
    Modified { file: FileId, range: TextRange },
    Removed(FileId),
}

impl FileEvent {
    pub fn file(&self) -> &FileId {
        match self {
            FileEvent::Added(file) | FileEvent::Removed(file) => file,
            FileEvent::Modified { file, .. } => file,
        }
    }
}

/// Handle returned by `Project::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);
