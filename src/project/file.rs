use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::syntax::{SyntaxTree, TreeGeneration};
use crate::wrapper::TreeLookup;

/// Project-relative name of a source file, e.g. `lib/a.brace`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(Arc<str>);

impl FileId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path component without its extension
    pub fn stem(&self) -> &str {
        let name = self.0.rsplit('/').next().unwrap_or(&self.0);
        match name.rfind('.') {
            Some(dot) if dot > 0 => &name[..dot],
            _ => name,
        }
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.0.rsplit('/').next().unwrap_or(&self.0);
        name.rfind('.')
            .filter(|dot| *dot > 0)
            .map(|dot| &name[dot + 1..])
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Current text of one file and the tree parsed from it
#[derive(Debug, Clone)]
pub struct SourceFile {
    id: FileId,
    text: String,
    tree: SyntaxTree,
}

impl SourceFile {
    pub(crate) fn new(id: FileId, text: String, tree: SyntaxTree) -> Self {
        Self { id, text, tree }
    }

    pub fn id(&self) -> &FileId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn generation(&self) -> TreeGeneration {
        self.tree.generation()
    }

    /// Swap in a new text and tree, returning the previous tree
    pub(crate) fn replace(&mut self, text: String, tree: SyntaxTree) -> SyntaxTree {
        self.text = text;
        std::mem::replace(&mut self.tree, tree)
    }
}

impl TreeLookup for BTreeMap<FileId, SourceFile> {
    fn tree(&self, generation: TreeGeneration) -> Option<&SyntaxTree> {
        self.values()
            .map(SourceFile::tree)
            .find(|tree| tree.generation() == generation)
    }
}
