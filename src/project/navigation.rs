//! Wrapper navigation.
//!
//! Every step materializes the target through the identity cache, so
//! walking to the same node twice yields the same [`WrapperId`].

use crate::error::{Error, Result};
use crate::syntax::{NodeIndex, SyntaxKind};
use crate::text::TextRange;
use crate::wrapper::WrapperId;

use super::{FileId, Project, SourceFile};

impl Project {
    /// Current file and node of a live wrapper.
    ///
    /// A wrapper bound to a tree generation the file no longer holds counts
    /// as forgotten.
    pub(crate) fn resolve(&self, id: WrapperId) -> Result<(&SourceFile, NodeIndex)> {
        let entry = self.cache.entry(id).ok_or(Error::forgotten(id))?;
        let source = self
            .files
            .get(&entry.file)
            .filter(|source| source.generation() == entry.native.generation)
            .ok_or(Error::forgotten(id))?;
        Ok((source, entry.native.index))
    }

    fn wrap(&mut self, file: &FileId, index: NodeIndex) -> Result<WrapperId> {
        let key = self
            .files
            .get(file)
            .map(|source| source.tree().key(index))
            .ok_or_else(|| Error::file_not_found(file))?;
        Ok(self.cache.get_or_create(key, file))
    }

    fn step(
        &mut self,
        id: WrapperId,
        select: impl FnOnce(&SourceFile, NodeIndex) -> Option<NodeIndex>,
    ) -> Result<Option<WrapperId>> {
        let (source, index) = self.resolve(id)?;
        let file = source.id().clone();
        match select(source, index) {
            Some(target) => self.wrap(&file, target).map(Some),
            None => Ok(None),
        }
    }

    pub fn root(&mut self, file: &FileId) -> Result<WrapperId> {
        let root = self
            .files
            .get(file)
            .map(|source| source.tree().root())
            .ok_or_else(|| Error::file_not_found(file))?;
        self.wrap(file, root)
    }

    pub fn parent(&mut self, id: WrapperId) -> Result<Option<WrapperId>> {
        self.step(id, |source, index| source.tree()[index].parent())
    }

    pub fn children(&mut self, id: WrapperId) -> Result<Vec<WrapperId>> {
        let (source, index) = self.resolve(id)?;
        let file = source.id().clone();
        let children = source.tree()[index].children().to_vec();
        children
            .into_iter()
            .map(|child| self.wrap(&file, child))
            .collect()
    }

    pub fn child(&mut self, id: WrapperId, position: usize) -> Result<Option<WrapperId>> {
        self.step(id, |source, index| {
            source.tree()[index].children().get(position).copied()
        })
    }

    pub fn first_child(&mut self, id: WrapperId) -> Result<Option<WrapperId>> {
        self.step(id, |source, index| {
            source.tree()[index].children().first().copied()
        })
    }

    pub fn last_child(&mut self, id: WrapperId) -> Result<Option<WrapperId>> {
        self.step(id, |source, index| {
            source.tree()[index].children().last().copied()
        })
    }

    pub fn next_sibling(&mut self, id: WrapperId) -> Result<Option<WrapperId>> {
        self.step(id, |source, index| {
            let tree = source.tree();
            let parent = tree[index].parent()?;
            tree[parent]
                .children()
                .get(tree[index].index_in_parent() + 1)
                .copied()
        })
    }

    pub fn previous_sibling(&mut self, id: WrapperId) -> Result<Option<WrapperId>> {
        self.step(id, |source, index| {
            let tree = source.tree();
            let parent = tree[index].parent()?;
            let position = tree[index].index_in_parent().checked_sub(1)?;
            tree[parent].children().get(position).copied()
        })
    }

    /// Proper ancestors, nearest first
    pub fn ancestors(&mut self, id: WrapperId) -> Result<Vec<WrapperId>> {
        let (source, index) = self.resolve(id)?;
        let file = source.id().clone();
        let ancestors: Vec<NodeIndex> = source.tree().ancestors(index).collect();
        ancestors
            .into_iter()
            .map(|ancestor| self.wrap(&file, ancestor))
            .collect()
    }

    /// Deepest node at `offset`, preferring the node that starts there
    pub fn descendant_at(&mut self, file: &FileId, offset: usize) -> Result<WrapperId> {
        let source = self
            .files
            .get(file)
            .ok_or_else(|| Error::file_not_found(file))?;
        if offset > source.text().len() {
            return Err(Error::invalid_range(
                offset,
                offset,
                format!("past the end of {file}"),
            ));
        }
        let index = source.tree().node_at_offset(offset);
        self.wrap(file, index)
    }

    pub fn kind(&self, id: WrapperId) -> Result<SyntaxKind> {
        let (source, index) = self.resolve(id)?;
        Ok(source.tree()[index].kind())
    }

    pub fn range(&self, id: WrapperId) -> Result<TextRange> {
        let (source, index) = self.resolve(id)?;
        Ok(source.tree()[index].range())
    }

    pub fn text(&self, id: WrapperId) -> Result<&str> {
        let (source, index) = self.resolve(id)?;
        let range = source.tree()[index].range();
        Ok(&source.text()[range.start..range.end])
    }

    pub fn child_count(&self, id: WrapperId) -> Result<usize> {
        let (source, index) = self.resolve(id)?;
        Ok(source.tree()[index].children().len())
    }

    pub fn file_of(&self, id: WrapperId) -> Result<&FileId> {
        self.resolve(id).map(|(source, _)| source.id())
    }

    pub fn is_error(&self, id: WrapperId) -> Result<bool> {
        let (source, index) = self.resolve(id)?;
        let node = &source.tree()[index];
        Ok(node.is_error() || node.is_missing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(text: &str) -> (Project, FileId) {
        let mut project = Project::new();
        let file = project.add_file("a.brace", text).unwrap();
        (project, file)
    }

    #[test]
    fn test_navigation_materializes_once() {
        let (mut project, file) = project("class C { a; b; }");
        let root = project.root(&file).unwrap();
        let class = project.first_child(root).unwrap().unwrap();
        assert_eq!(project.kind(class).unwrap().name(), "class_declaration");

        let again = project.child(root, 0).unwrap().unwrap();
        assert_eq!(class, again);
        assert_eq!(project.parent(class).unwrap(), Some(root));
        assert_eq!(project.cache().len(), 2);
    }

    #[test]
    fn test_siblings_and_ancestors() {
        let (mut project, file) = project("class C { a; b; }");
        let a = project.descendant_at(&file, 10).unwrap();
        assert_eq!(project.text(a).unwrap(), "a");

        let statement = project.parent(a).unwrap().unwrap();
        let next = project.next_sibling(statement).unwrap().unwrap();
        assert_eq!(project.text(next).unwrap(), "b;");
        assert_eq!(project.previous_sibling(next).unwrap(), Some(statement));
        assert_eq!(project.previous_sibling(statement).unwrap(), None);

        let kinds: Vec<&str> = project
            .ancestors(a)
            .unwrap()
            .into_iter()
            .map(|ancestor| project.kind(ancestor).unwrap().name())
            .collect();
        assert_eq!(
            kinds,
            vec!["expression_statement", "member_list", "class_declaration", "source_file"]
        );
    }

    #[test]
    fn test_forgotten_wrapper_refuses_access() {
        let (mut project, file) = project("a;");
        let root = project.root(&file).unwrap();
        let statement = project.first_child(root).unwrap().unwrap();
        project.forget(statement).unwrap();

        assert!(project.was_forgotten(statement));
        assert!(project.kind(statement).unwrap_err().is_forgotten());
        assert!(project.children(statement).unwrap_err().is_forgotten());
        assert!(!project.was_forgotten(root));
    }

    #[test]
    fn test_descendant_at_rejects_offset_past_end() {
        let (mut project, file) = project("a;");
        assert!(matches!(
            project.descendant_at(&file, 3),
            Err(Error::InvalidRange { .. })
        ));
    }
}
