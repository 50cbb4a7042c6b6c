use std::collections::BTreeMap;

use crate::config::{RenameScope, RenameSettings};
use crate::error::{Error, Result};
use crate::project::{FileId, SourceFile};
use crate::syntax::NodeIndex;
use crate::text::{Replacement, TextRange, sort_replacements};
use crate::wrapper::WrapperId;

use super::descriptor::{EditDescriptor, ManipulationKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameOptions {
    /// Falls back to the configured default scope when unset
    pub scope: Option<RenameScope>,
}

impl RenameOptions {
    pub fn file() -> Self {
        Self {
            scope: Some(RenameScope::File),
        }
    }

    pub fn project() -> Self {
        Self {
            scope: Some(RenameScope::Project),
        }
    }
}

/// One span to rewrite during a rename
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenameLocation {
    pub file: FileId,
    pub range: TextRange,
}

impl RenameLocation {
    pub fn new(file: FileId, range: TextRange) -> Self {
        Self { file, range }
    }
}

/// Check that `index` is a token the settings allow renaming
pub(crate) fn check_renameable(
    id: WrapperId,
    source: &SourceFile,
    index: NodeIndex,
    settings: &RenameSettings,
) -> Result<()> {
    let node = &source.tree()[index];
    let reason = if !node.children().is_empty() {
        Some("only single tokens can be renamed".to_string())
    } else if node.is_error() {
        Some("error nodes cannot be renamed".to_string())
    } else if !settings.kinds.is_empty()
        && !settings.kinds.iter().any(|kind| kind == node.kind().name())
    {
        Some(format!("{} is not a renameable kind", node.kind()))
    } else {
        None
    };
    match reason {
        Some(message) => Err(Error::NotRenameable { id, message }),
        None => Ok(()),
    }
}

/// Every token of the same kind and text as `index` within `scope`
pub(crate) fn find_locations<'a>(
    files: impl IntoIterator<Item = &'a SourceFile>,
    origin: &SourceFile,
    index: NodeIndex,
    scope: RenameScope,
) -> Vec<RenameLocation> {
    let target = &origin.tree()[index];
    let name = &origin.text()[target.range().start..target.range().end];
    let kind = target.kind();

    let search = |source: &SourceFile| -> Vec<RenameLocation> {
        let tree = source.tree();
        tree.indices()
            .filter(|candidate| {
                let node = &tree[*candidate];
                node.children().is_empty()
                    && !node.is_error()
                    && node.kind() == kind
                    && source.text().get(node.range().start..node.range().end) == Some(name)
            })
            .map(|candidate| RenameLocation::new(source.id().clone(), tree[candidate].range()))
            .collect()
    };

    match scope {
        RenameScope::File => search(origin),
        RenameScope::Project => files.into_iter().flat_map(search).collect(),
    }
}

/// One straight descriptor per file, spans rewritten right to left
pub(crate) fn descriptors_for(
    locations: Vec<RenameLocation>,
    new_name: &str,
) -> Result<Vec<EditDescriptor>> {
    let mut by_file: BTreeMap<FileId, Vec<Replacement>> = BTreeMap::new();
    for location in locations {
        by_file
            .entry(location.file)
            .or_default()
            .push(Replacement::new(location.range.start, location.range.end, new_name));
    }

    by_file
        .into_iter()
        .map(|(file, mut replacements)| {
            replacements.sort_by_key(|replacement| (replacement.start, replacement.end));
            replacements.dedup();
            sort_replacements(&mut replacements)?;
            Ok(EditDescriptor::new(file, replacements, ManipulationKind::Rename))
        })
        .collect()
}
