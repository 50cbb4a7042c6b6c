//! Lazily refreshed cross-file reference index.
//!
//! File events only mark entries dirty. An entry is recomputed when a query
//! needs it, so a burst of edits costs one refresh per file at most.

pub mod extractor;

use std::collections::{BTreeMap, BTreeSet};

use crate::config::ReferenceSettings;
use crate::error::{Error, Result};
use crate::project::{FileEvent, FileId, SourceFile};

pub use extractor::{FileReferences, KindReferenceExtractor, ReferenceExtractor};

/// Everything a refresh reads
pub struct ReferenceSources<'a> {
    pub files: &'a BTreeMap<FileId, SourceFile>,
    pub extractor: &'a dyn ReferenceExtractor,
    pub settings: &'a ReferenceSettings,
}

/// Last computed references of one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceEntry {
    /// Resolved imports plus whatever they re-export, transitively
    pub referenced: BTreeSet<FileId>,
    /// Import specifiers that matched no file
    pub unresolved: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ReferenceCoordinator {
    entries: BTreeMap<FileId, ReferenceEntry>,
    dirty: BTreeSet<FileId>,
    refresh_count: usize,
}

impl ReferenceCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_event(&mut self, event: &FileEvent) {
        match event {
            FileEvent::Added(file) => self.on_added(file),
            FileEvent::Modified { file, .. } => self.on_modified(file),
            FileEvent::Removed(file) => self.on_removed(file),
        }
    }

    fn on_added(&mut self, file: &FileId) {
        self.entries.insert(file.clone(), ReferenceEntry::default());
        self.dirty.insert(file.clone());
        // a new file may satisfy specifiers that failed to resolve before
        let waiting: Vec<FileId> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.unresolved.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        self.dirty.extend(waiting);
        log::debug!(target: "nodekeep::references", "Subscribed {}", file);
    }

    fn on_modified(&mut self, file: &FileId) {
        if !self.entries.contains_key(file) {
            return;
        }
        self.dirty.insert(file.clone());
        let referencing = self.referencing_entries(file);
        self.dirty.extend(referencing);
    }

    fn on_removed(&mut self, file: &FileId) {
        self.entries.remove(file);
        self.dirty.remove(file);
        let referencing = self.referencing_entries(file);
        self.dirty.extend(referencing);
        log::debug!(target: "nodekeep::references", "Unsubscribed {}", file);
    }

    fn referencing_entries(&self, file: &FileId) -> Vec<FileId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.referenced.contains(file))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn is_dirty(&self, file: &FileId) -> bool {
        self.dirty.contains(file)
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Number of entry recomputations since creation
    pub fn refresh_count(&self) -> usize {
        self.refresh_count
    }

    pub fn entry(&self, file: &FileId) -> Option<&ReferenceEntry> {
        self.entries.get(file)
    }

    /// Recompute one entry if it is dirty; returns whether it ran
    pub fn refresh_source_file_if_dirty(
        &mut self,
        file: &FileId,
        sources: &ReferenceSources<'_>,
    ) -> bool {
        if !self.dirty.contains(file) {
            return false;
        }
        self.dirty.remove(file);
        let Some(source) = sources.files.get(file) else {
            self.entries.remove(file);
            return false;
        };

        let entry = compute_entry(source, sources);
        log::debug!(
            target: "nodekeep::references",
            "Refreshed {}: {} referenced, {} unresolved",
            file,
            entry.referenced.len(),
            entry.unresolved.len()
        );
        self.entries.insert(file.clone(), entry);
        self.refresh_count += 1;
        true
    }

    /// Recompute every dirty entry; returns how many ran
    pub fn refresh_dirty_source_files(&mut self, sources: &ReferenceSources<'_>) -> usize {
        let dirty: Vec<FileId> = self.dirty.iter().cloned().collect();
        dirty
            .iter()
            .filter(|file| self.refresh_source_file_if_dirty(file, sources))
            .count()
    }

    /// Files `file` references, refreshing only its own entry
    pub fn referenced_files(
        &mut self,
        file: &FileId,
        sources: &ReferenceSources<'_>,
    ) -> Result<BTreeSet<FileId>> {
        if !self.entries.contains_key(file) {
            return Err(Error::file_not_found(file));
        }
        self.refresh_source_file_if_dirty(file, sources);
        Ok(self
            .entries
            .get(file)
            .map(|entry| entry.referenced.clone())
            .unwrap_or_default())
    }

    /// Files that reference `file`, after refreshing every dirty entry
    pub fn referencing_files(
        &mut self,
        file: &FileId,
        sources: &ReferenceSources<'_>,
    ) -> Result<BTreeSet<FileId>> {
        if !self.entries.contains_key(file) {
            return Err(Error::file_not_found(file));
        }
        self.refresh_dirty_source_files(sources);
        Ok(self.referencing_entries(file).into_iter().collect())
    }
}

fn compute_entry(source: &SourceFile, sources: &ReferenceSources<'_>) -> ReferenceEntry {
    let references = sources.extractor.extract(source.tree(), source.text());
    let mut entry = ReferenceEntry::default();
    let mut pending = Vec::new();

    for specifier in &references.imports {
        match resolve(specifier, sources) {
            Some(target) if &target != source.id() => {
                if entry.referenced.insert(target.clone()) {
                    pending.push(target);
                }
            }
            Some(_) => {}
            None => entry.unresolved.push(specifier.clone()),
        }
    }

    // follow re-exports of imported files
    while let Some(next) = pending.pop() {
        let Some(imported) = sources.files.get(&next) else {
            continue;
        };
        let exported = sources.extractor.extract(imported.tree(), imported.text());
        for specifier in &exported.exports {
            if let Some(target) = resolve(specifier, sources)
                && &target != source.id()
                && entry.referenced.insert(target.clone())
            {
                pending.push(target);
            }
        }
    }
    entry
}

/// Match a specifier by exact id, then by path or stem without extension
fn resolve(specifier: &str, sources: &ReferenceSources<'_>) -> Option<FileId> {
    let exact = FileId::new(specifier);
    if sources.files.contains_key(&exact) {
        return Some(exact);
    }
    let extensions = &sources.settings.extensions;
    sources
        .files
        .keys()
        .filter(|id| {
            extensions.is_empty()
                || id
                    .extension()
                    .is_some_and(|ext| extensions.iter().any(|allowed| allowed == ext))
        })
        .find(|id| {
            let without_extension = match id.extension() {
                Some(ext) => &id.as_str()[..id.as_str().len() - ext.len() - 1],
                None => id.as_str(),
            };
            without_extension == specifier || id.stem() == specifier
        })
        .cloned()
}
