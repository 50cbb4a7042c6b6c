use crate::project::FileId;

use super::tree::SyntaxTree;

/// Produces an immutable tree for a file's full text.
///
/// Implementations must be pure and total: the same text always yields the
/// same shape, and unparseable input yields error nodes instead of failing.
pub trait SourceParser: Send + Sync {
    fn parse(&self, text: &str, file: &FileId) -> SyntaxTree;

    /// Short name used in log messages
    fn name(&self) -> &str {
        "custom"
    }
}
