mod events;
mod file;
mod navigation;
mod result;

pub use events::{FileEvent, SubscriptionId};
pub use file::{FileId, SourceFile};
pub use result::{Diagnostic, DiagnosticKind, EditResult, Severity};

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use crate::config::{NodekeepSettings, Settings, load_settings};
use crate::edit::printer::{DefaultPrinter, Printer, StructuredContent};
use crate::edit::rename::{self, RenameLocation, RenameOptions};
use crate::edit::{EditDescriptor, Strategy, planner};
use crate::error::{Error, Result};
use crate::reconcile::{self, ReconcileContext};
use crate::references::{
    KindReferenceExtractor, ReferenceCoordinator, ReferenceExtractor, ReferenceSources,
};
use crate::syntax::{BraceParser, SourceParser, SyntaxTree, TreeGeneration};
use crate::text::{TextRange, apply_replacements, line_col};
use crate::wrapper::{IdentityCache, WrapperId};

type Subscriber = Box<dyn FnMut(&mut Project, &FileEvent) + Send>;

/// Source files, their trees and every wrapper handed out over them.
///
/// All text mutation goes through one call path: plan, validate against the
/// old tree, apply the text, parse, reconcile wrappers, then notify. A
/// subscriber that tries to mutate the project while it is being notified
/// gets [`Error::ReentrantManipulation`].
pub struct Project {
    settings: Settings,
    parser: Box<dyn SourceParser>,
    printer: Box<dyn Printer>,
    extractor: Box<dyn ReferenceExtractor>,
    files: BTreeMap<FileId, SourceFile>,
    cache: IdentityCache,
    references: ReferenceCoordinator,
    next_generation: u64,
    manipulating: bool,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    cancelled: HashSet<SubscriptionId>,
    next_subscription: u64,
}

impl Project {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Create a project whose reference extractor follows `settings`.
    pub fn with_settings(settings: Settings) -> Self {
        let extractor = KindReferenceExtractor::new(&settings.references);
        Self {
            settings,
            parser: Box::new(BraceParser),
            printer: Box::new(DefaultPrinter),
            extractor: Box::new(extractor),
            files: BTreeMap::new(),
            cache: IdentityCache::new(),
            references: ReferenceCoordinator::new(),
            next_generation: 1,
            manipulating: false,
            subscribers: Vec::new(),
            cancelled: HashSet::new(),
            next_subscription: 0,
        }
    }

    /// Create a project from layered configuration rooted at `root_path`.
    pub fn load(root_path: Option<&Path>, override_settings: Option<NodekeepSettings>) -> Self {
        Self::with_settings(load_settings(root_path, override_settings).settings)
    }

    /// Replace the parser; files added earlier keep their trees.
    pub fn with_parser(mut self, parser: impl SourceParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn with_printer(mut self, printer: impl Printer + 'static) -> Self {
        self.printer = Box::new(printer);
        self
    }

    pub fn with_extractor(mut self, extractor: impl ReferenceExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }

    pub fn source(&self, file: &FileId) -> Option<&SourceFile> {
        self.files.get(file)
    }

    pub fn file_text(&self, file: &FileId) -> Option<&str> {
        self.files.get(file).map(SourceFile::text)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileId> {
        self.files.keys()
    }

    // ---- files ----

    pub fn add_file(&mut self, name: impl AsRef<str>, text: impl Into<String>) -> Result<FileId> {
        let id = FileId::new(name);
        let text = text.into();
        self.guarded(|project| {
            if project.files.contains_key(&id) {
                return Err(Error::FileExists { file: id.clone() });
            }
            let tree = project.parse(&text, &id);
            project
                .files
                .insert(id.clone(), SourceFile::new(id.clone(), text, tree));
            project.dispatch(&FileEvent::Added(id.clone()));
            Ok(id.clone())
        })
    }

    pub fn remove_file(&mut self, file: &FileId) -> Result<()> {
        self.guarded(|project| {
            if project.files.remove(file).is_none() {
                return Err(Error::file_not_found(file));
            }
            let dropped = project.cache.forget_file(file);
            log::debug!(
                target: "nodekeep::cache",
                "Removed {} and {} wrapper(s)",
                file,
                dropped.len()
            );
            project.dispatch(&FileEvent::Removed(file.clone()));
            Ok(())
        })
    }

    fn parse(&mut self, text: &str, file: &FileId) -> SyntaxTree {
        let mut tree = self.parser.parse(text, file);
        tree.set_generation(TreeGeneration(self.next_generation));
        self.next_generation += 1;
        log::debug!(
            target: "nodekeep::syntax",
            "Parsed {} with {} parser: {} nodes, {}",
            file,
            self.parser.name(),
            tree.len(),
            tree.generation()
        );
        tree
    }

    // ---- subscribers ----

    /// Run `callback` after every file event
    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&mut Project, &FileEvent) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscription, _)| *subscription != id);
        // only a dispatch in progress can hold a subscriber outside the list
        if self.subscribers.len() == before && self.manipulating {
            self.cancelled.insert(id);
        }
    }

    fn dispatch(&mut self, event: &FileEvent) {
        self.references.on_event(event);

        let mut dispatch = Dispatch::take(self);
        let Dispatch { project, taken } = &mut dispatch;
        for (id, callback) in taken.iter_mut() {
            if !project.cancelled.contains(id) {
                callback(&mut **project, event);
            }
        }
    }

    fn guarded<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.manipulating {
            log::warn!(
                target: "nodekeep::edit",
                "Rejected manipulation requested during another manipulation"
            );
            return Err(Error::ReentrantManipulation);
        }
        let mut guard = ManipulationGuard::enter(self);
        body(&mut *guard.project)
    }

    // ---- manipulation requests ----

    /// Insert `text` at the absolute file `offset`, which must lie inside `target`
    pub fn insert_text(&mut self, target: WrapperId, offset: usize, text: &str) -> Result<EditResult> {
        self.guarded(|project| {
            let (source, index) = project.resolve(target)?;
            let descriptor = planner::insert_text(source, index, offset, text)?;
            project.apply(vec![descriptor])
        })
    }

    /// Replace the absolute file range `[start, end)`, which must lie inside `target`
    pub fn replace_range(
        &mut self,
        target: WrapperId,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<EditResult> {
        self.guarded(|project| {
            let (source, index) = project.resolve(target)?;
            let descriptor = planner::replace_range(source, index, start, end, text)?;
            project.apply(vec![descriptor])
        })
    }

    /// Replace the whole text of `target`
    pub fn replace_text(&mut self, target: WrapperId, text: &str) -> Result<EditResult> {
        self.guarded(|project| {
            let (source, index) = project.resolve(target)?;
            let descriptor = planner::replace_text(source, index, text, &project.settings.format)?;
            project.apply(vec![descriptor])
        })
    }

    /// Rename `target` and every token of the same kind and text in scope
    pub fn rename(
        &mut self,
        target: WrapperId,
        new_name: &str,
        options: RenameOptions,
    ) -> Result<EditResult> {
        self.guarded(|project| {
            let (source, index) = project.resolve(target)?;
            rename::check_renameable(target, source, index, &project.settings.rename)?;
            let scope = options.scope.unwrap_or(project.settings.rename.default_scope);
            let locations = rename::find_locations(project.files.values(), source, index, scope);
            log::debug!(
                target: "nodekeep::edit",
                "Renaming {} location(s) to {:?}",
                locations.len(),
                new_name
            );
            let descriptors = rename::descriptors_for(locations, new_name)?;
            project.apply(descriptors)
        })
    }

    /// Rewrite explicit spans, e.g. produced by an external reference search
    pub fn rename_locations(
        &mut self,
        locations: Vec<RenameLocation>,
        new_name: &str,
    ) -> Result<EditResult> {
        self.guarded(|project| {
            if let Some(missing) = locations
                .iter()
                .find(|location| !project.files.contains_key(&location.file))
            {
                return Err(Error::file_not_found(&missing.file));
            }
            let descriptors = rename::descriptors_for(locations, new_name)?;
            project.apply(descriptors)
        })
    }

    /// Insert `content` as child `index` of the list node `list`
    pub fn insert_child(
        &mut self,
        list: WrapperId,
        index: usize,
        content: &StructuredContent,
    ) -> Result<EditResult> {
        self.guarded(|project| {
            let (source, node) = project.resolve(list)?;
            planner::ensure_list(source, node, &project.settings.edit)?;
            let descriptor = planner::insert_child(
                source,
                node,
                index,
                content,
                project.printer.as_ref(),
                &project.settings.format,
            )?;
            project.apply(vec![descriptor])
        })
    }

    pub fn remove_child(&mut self, list: WrapperId, index: usize) -> Result<EditResult> {
        self.guarded(|project| {
            let (source, node) = project.resolve(list)?;
            planner::ensure_list(source, node, &project.settings.edit)?;
            let descriptor = planner::remove_child(source, node, index)?;
            project.apply(vec![descriptor])
        })
    }

    pub fn replace_children(
        &mut self,
        list: WrapperId,
        contents: &[StructuredContent],
    ) -> Result<EditResult> {
        self.guarded(|project| {
            let (source, node) = project.resolve(list)?;
            planner::ensure_list(source, node, &project.settings.edit)?;
            let descriptor = planner::replace_children(
                source,
                node,
                contents,
                project.printer.as_ref(),
                &project.settings.format,
            )?;
            project.apply(vec![descriptor])
        })
    }

    /// Apply planned descriptors, at most one per file.
    ///
    /// Every descriptor is validated before any text changes, so a
    /// `RangeOverlapInconsistent` error leaves the project untouched.
    fn apply(&mut self, descriptors: Vec<EditDescriptor>) -> Result<EditResult> {
        let mut seen = BTreeSet::new();
        for descriptor in &descriptors {
            let source = self
                .files
                .get(&descriptor.file)
                .ok_or_else(|| Error::file_not_found(&descriptor.file))?;
            if !seen.insert(descriptor.file.clone()) {
                return Err(Error::invalid_range(
                    descriptor.range_start(),
                    descriptor.range_end(),
                    format!("{} is edited twice in one request", descriptor.file),
                ));
            }
            check_bounds(source.text(), descriptor)?;
            let live = self.cache.live_in(source.generation());
            reconcile::validate(descriptor, source.tree(), &live)?;
        }

        let mut result = EditResult::new(Strategy::Straight);
        let mut events = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            let file = descriptor.file.clone();
            let mut text = self
                .files
                .get(&file)
                .map(|source| source.text().to_string())
                .ok_or_else(|| Error::file_not_found(&file))?;
            apply_replacements(&mut text, &descriptor.replacements)?;
            let new_tree = self.parse(&text, &file);
            let Some(source) = self.files.get_mut(&file) else {
                return Err(Error::file_not_found(&file));
            };
            let old_tree = source.replace(text, new_tree);

            let source = &self.files[&file];
            let ctx = ReconcileContext {
                file: &file,
                old_tree: &old_tree,
                new_tree: source.tree(),
                descriptor,
                settings: &self.settings.reconcile,
            };
            let outcome = reconcile::reconcile(&mut self.cache, &ctx);

            let new_ranges = descriptor.new_ranges();
            let edited = match (new_ranges.first(), new_ranges.last()) {
                (Some(first), Some(last)) => TextRange::new(first.start, last.end),
                _ => TextRange::empty(descriptor.range_start()),
            };
            if outcome.escalated {
                result.diagnostics.push(Diagnostic::tree_structure_changed(
                    file.clone(),
                    edited,
                    line_col(source.text(), edited.start),
                ));
            }
            // errors carried over from the old tree are not reported
            let carried = reconcile::carried_errors(descriptor, &old_tree);
            let mut reported = BTreeSet::new();
            for range in &new_ranges {
                for error in source.tree().errors_touching(*range) {
                    let node = &source.tree()[error];
                    if carried.contains(&(node.kind(), node.range())) || !reported.insert(error) {
                        continue;
                    }
                    let error_range = node.range();
                    let snippet = source.text().get(range.start..range.end).unwrap_or_default();
                    result.diagnostics.push(Diagnostic::manipulation_error(
                        file.clone(),
                        error_range,
                        line_col(source.text(), error_range.start),
                        snippet,
                    ));
                }
            }

            log::debug!(
                target: "nodekeep::edit",
                "Applied {:?} to {} ({} replacement(s), delta {})",
                descriptor.kind,
                file,
                descriptor.replacements.len(),
                descriptor.delta()
            );
            result.strategy = result
                .strategy
                .max(outcome.strategy.unwrap_or(descriptor.strategy));
            result.invalidated_wrappers.extend(outcome.invalidated);
            result.files.push(file.clone());
            events.push(FileEvent::Modified {
                file,
                range: edited,
            });
        }

        result.success = !result.has(DiagnosticKind::ManipulationError);
        for event in &events {
            self.dispatch(event);
        }
        Ok(result)
    }

    // ---- forget points ----

    pub fn set_forget_point(&mut self) -> Result<()> {
        self.guarded(|project| {
            project.cache.set_forget_point();
            Ok(())
        })
    }

    /// Forget every wrapper created since the newest forget point
    pub fn forget_last_point(&mut self) -> Result<Vec<WrapperId>> {
        self.guarded(|project| Ok(project.cache.forget_last_point(&project.files)))
    }

    /// Keep `id` and its cached ancestors alive across the next `forget_last_point`
    pub fn remember_node(&mut self, id: WrapperId) -> Result<()> {
        self.guarded(|project| {
            project.resolve(id)?;
            project.cache.remember_node(id, &project.files);
            Ok(())
        })
    }

    /// Forget `id` and its cached descendants
    pub fn forget(&mut self, id: WrapperId) -> Result<Vec<WrapperId>> {
        self.guarded(|project| Ok(project.cache.forget(id, &project.files)))
    }

    /// Run `block` between a forget point and its pop
    pub fn forget_nodes_created_in<T>(
        &mut self,
        block: impl FnOnce(&mut Project) -> T,
    ) -> Result<T> {
        self.set_forget_point()?;
        let value = block(self);
        self.forget_last_point()?;
        Ok(value)
    }

    pub fn was_forgotten(&self, id: WrapperId) -> bool {
        self.resolve(id).is_err()
    }

    // ---- references ----

    /// Files `file` references; refreshes only `file` when it is dirty
    pub fn referenced_files(&mut self, file: &FileId) -> Result<BTreeSet<FileId>> {
        let sources = ReferenceSources {
            files: &self.files,
            extractor: self.extractor.as_ref(),
            settings: &self.settings.references,
        };
        self.references.referenced_files(file, &sources)
    }

    /// Files that reference `file`; refreshes every dirty file first
    pub fn referencing_files(&mut self, file: &FileId) -> Result<BTreeSet<FileId>> {
        let sources = ReferenceSources {
            files: &self.files,
            extractor: self.extractor.as_ref(),
            settings: &self.settings.references,
        };
        self.references.referencing_files(file, &sources)
    }

    pub fn refresh_source_file_if_dirty(&mut self, file: &FileId) -> bool {
        let sources = ReferenceSources {
            files: &self.files,
            extractor: self.extractor.as_ref(),
            settings: &self.settings.references,
        };
        self.references.refresh_source_file_if_dirty(file, &sources)
    }

    pub fn refresh_dirty_source_files(&mut self) -> usize {
        let sources = ReferenceSources {
            files: &self.files,
            extractor: self.extractor.as_ref(),
            settings: &self.settings.references,
        };
        self.references.refresh_dirty_source_files(&sources)
    }

    pub fn reference_refresh_count(&self) -> usize {
        self.references.refresh_count()
    }

    pub fn is_reference_dirty(&self, file: &FileId) -> bool {
        self.references.is_dirty(file)
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the manipulation flag for one request; released even on unwind
struct ManipulationGuard<'a> {
    project: &'a mut Project,
}

impl<'a> ManipulationGuard<'a> {
    fn enter(project: &'a mut Project) -> Self {
        project.manipulating = true;
        Self { project }
    }
}

impl Drop for ManipulationGuard<'_> {
    fn drop(&mut self) {
        self.project.manipulating = false;
    }
}

/// Subscribers taken out of the project while they are being notified.
///
/// On drop they are put back ahead of any subscribed during dispatch, and
/// cancelled ones are removed.
struct Dispatch<'a> {
    project: &'a mut Project,
    taken: Vec<(SubscriptionId, Subscriber)>,
}

impl<'a> Dispatch<'a> {
    fn take(project: &'a mut Project) -> Self {
        let taken = std::mem::take(&mut project.subscribers);
        Self { project, taken }
    }
}

impl Drop for Dispatch<'_> {
    fn drop(&mut self) {
        let taken = std::mem::take(&mut self.taken);
        let added = std::mem::replace(&mut self.project.subscribers, taken);
        self.project.subscribers.extend(added);
        let cancelled = std::mem::take(&mut self.project.cancelled);
        self.project
            .subscribers
            .retain(|(subscription, _)| !cancelled.contains(subscription));
    }
}

fn check_bounds(text: &str, descriptor: &EditDescriptor) -> Result<()> {
    for replacement in &descriptor.replacements {
        if replacement.start > replacement.end
            || replacement.end > text.len()
            || !text.is_char_boundary(replacement.start)
            || !text.is_char_boundary(replacement.end)
        {
            return Err(Error::invalid_range(
                replacement.start,
                replacement.end,
                format!("outside the text of {}", descriptor.file),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsubscribe_unknown_id_leaves_no_cancellation() {
        let mut project = Project::new();
        let id = project.subscribe(|_, _| {});
        project.unsubscribe(id);
        project.unsubscribe(id);
        project.unsubscribe(SubscriptionId(42));

        assert!(project.subscribers.is_empty());
        assert!(project.cancelled.is_empty());
    }

    #[test]
    fn test_unsubscribe_during_dispatch_takes_effect_afterwards() {
        let mut project = Project::new();
        let later = SubscriptionId(1);
        project.subscribe(move |project, _| project.unsubscribe(later));
        assert_eq!(project.subscribe(|_, _| {}), later);

        project.add_file("a.brace", "a;").unwrap();

        assert_eq!(project.subscribers.len(), 1);
        assert!(project.cancelled.is_empty());
        assert!(!project.manipulating);
    }
}
