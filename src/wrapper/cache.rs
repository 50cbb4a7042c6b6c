//! Identity cache: at most one live wrapper per native node.
//!
//! Wrappers live in generation-checked slots. The cache also keeps a stack
//! of forget points so that a block of work can drop every wrapper it
//! created, except the ones it explicitly remembers.

use std::collections::{BTreeMap, HashSet};

use crate::project::FileId;
use crate::syntax::{NativeKey, NodeIndex, SyntaxTree, TreeGeneration};

use super::node::{WrapperId, WrapperState};

/// Finds the tree a native key belongs to
pub trait TreeLookup {
    fn tree(&self, generation: TreeGeneration) -> Option<&SyntaxTree>;
}

impl TreeLookup for SyntaxTree {
    fn tree(&self, generation: TreeGeneration) -> Option<&SyntaxTree> {
        (self.generation() == generation).then_some(self)
    }
}

/// Backing data of one live wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperEntry {
    pub native: NativeKey,
    pub file: FileId,
    /// Creation order; rebinding keeps it
    pub seq: u64,
}

/// Snapshot of a live wrapper over one tree generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveWrapper {
    pub id: WrapperId,
    pub index: NodeIndex,
    pub seq: u64,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<WrapperEntry>,
}

#[derive(Debug)]
struct ForgetPoint {
    seq: u64,
    remembered: HashSet<WrapperId>,
}

#[derive(Debug, Default)]
pub struct IdentityCache {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_native: BTreeMap<NativeKey, WrapperId>,
    forget_points: Vec<ForgetPoint>,
    next_seq: u64,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live wrappers
    pub fn len(&self) -> usize {
        self.by_native.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_native.is_empty()
    }

    pub fn get(&self, native: NativeKey) -> Option<WrapperId> {
        self.by_native.get(&native).copied()
    }

    /// Return the live wrapper for `native`, creating it on first use
    pub fn get_or_create(&mut self, native: NativeKey, file: &FileId) -> WrapperId {
        if let Some(id) = self.get(native) {
            return id;
        }

        let entry = WrapperEntry {
            native,
            file: file.clone(),
            seq: self.next_seq,
        };
        self.next_seq += 1;

        let id = match self.free.pop() {
            Some(slot) => {
                let slot_ref = &mut self.slots[slot as usize];
                slot_ref.entry = Some(entry);
                WrapperId::new(slot, slot_ref.generation)
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                WrapperId::new(slot, 0)
            }
        };
        self.by_native.insert(native, id);
        id
    }

    /// Backing data of a live wrapper
    pub fn entry(&self, id: WrapperId) -> Option<&WrapperEntry> {
        self.slots
            .get(id.slot() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn was_forgotten(&self, id: WrapperId) -> bool {
        self.entry(id).is_none()
    }

    pub fn state(&self, id: WrapperId) -> WrapperState {
        if self.was_forgotten(id) {
            WrapperState::Forgotten
        } else {
            WrapperState::Live
        }
    }

    /// Rebind the wrapper of `old` to `new`, keeping its handle.
    ///
    /// Returns `None` when nothing is cached for `old` or when `new` already
    /// has a different live wrapper.
    pub fn replace(&mut self, old: NativeKey, new: NativeKey) -> Option<WrapperId> {
        let id = self.get(old)?;
        if old == new {
            return Some(id);
        }
        if self.by_native.contains_key(&new) {
            return None;
        }
        self.by_native.remove(&old);
        self.by_native.insert(new, id);
        if let Some(entry) = self.entry_mut(id) {
            entry.native = new;
        }
        Some(id)
    }

    fn entry_mut(&mut self, id: WrapperId) -> Option<&mut WrapperEntry> {
        self.slots
            .get_mut(id.slot() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entry.as_mut())
    }

    /// Forget exactly one wrapper. Returns false when it was already forgotten.
    pub(crate) fn forget_one(&mut self, id: WrapperId) -> bool {
        let Some(slot) = self.slots.get_mut(id.slot() as usize) else {
            return false;
        };
        if slot.generation != id.generation() {
            return false;
        }
        let Some(entry) = slot.entry.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.slot());
        self.by_native.remove(&entry.native);
        for point in &mut self.forget_points {
            point.remembered.remove(&id);
        }
        true
    }

    /// Live wrappers over the subtree of `index`, including `index` itself
    fn cached_subtree(&self, tree: &SyntaxTree, index: NodeIndex) -> Vec<WrapperId> {
        let (start, end) = tree.subtree_bounds(index);
        let generation = tree.generation();
        self.by_native
            .range(NativeKey::new(generation, start)..NativeKey::new(generation, end))
            .map(|(_, id)| *id)
            .collect()
    }

    /// Forget `id` and every cached descendant; ancestors are untouched.
    pub fn forget(&mut self, id: WrapperId, trees: &impl TreeLookup) -> Vec<WrapperId> {
        let Some(entry) = self.entry(id) else {
            return Vec::new();
        };
        let native = entry.native;
        let targets = match trees.tree(native.generation) {
            Some(tree) => self.cached_subtree(tree, native.index),
            None => vec![id],
        };
        let forgotten: Vec<WrapperId> = targets
            .into_iter()
            .filter(|target| self.forget_one(*target))
            .collect();
        log::debug!(
            target: "nodekeep::cache",
            "Forgot {} wrapper(s) under {}",
            forgotten.len(),
            id
        );
        forgotten
    }

    /// Forget every wrapper in `ids` without looking at descendants
    pub(crate) fn forget_all(&mut self, ids: impl IntoIterator<Item = WrapperId>) -> Vec<WrapperId> {
        ids.into_iter().filter(|id| self.forget_one(*id)).collect()
    }

    pub fn set_forget_point(&mut self) {
        self.forget_points.push(ForgetPoint {
            seq: self.next_seq,
            remembered: HashSet::new(),
        });
        log::debug!(
            target: "nodekeep::cache",
            "Forget point {} set at seq {}",
            self.forget_points.len(),
            self.next_seq
        );
    }

    pub fn forget_point_depth(&self) -> usize {
        self.forget_points.len()
    }

    /// Exempt `id` and its cached ancestors from the next `forget_last_point`
    pub fn remember_node(&mut self, id: WrapperId, trees: &impl TreeLookup) {
        let Some(entry) = self.entry(id) else {
            return;
        };
        let native = entry.native;
        let mut chain = vec![id];
        if let Some(tree) = trees.tree(native.generation) {
            chain.extend(
                tree.ancestors(native.index)
                    .filter_map(|ancestor| self.get(tree.key(ancestor))),
            );
        }
        match self.forget_points.last_mut() {
            Some(point) => point.remembered.extend(chain),
            None => log::debug!(
                target: "nodekeep::cache",
                "remember_node({}) without an active forget point",
                id
            ),
        }
    }

    /// Pop the newest forget point and forget what was created since.
    ///
    /// Wrappers created before the point survive unless they are cached
    /// descendants of something forgotten here. Remembered wrappers always
    /// survive this pop.
    pub fn forget_last_point(&mut self, trees: &impl TreeLookup) -> Vec<WrapperId> {
        let Some(point) = self.forget_points.pop() else {
            log::debug!(target: "nodekeep::cache", "forget_last_point without a forget point");
            return Vec::new();
        };

        let created_since: Vec<(WrapperId, NativeKey)> = self
            .by_native
            .iter()
            .filter(|(_, id)| !point.remembered.contains(*id))
            .filter_map(|(native, id)| {
                self.entry(*id)
                    .filter(|entry| entry.seq >= point.seq)
                    .map(|_| (*id, *native))
            })
            .collect();

        let mut targets = Vec::new();
        for (id, native) in created_since {
            match trees.tree(native.generation) {
                Some(tree) => targets.extend(
                    self.cached_subtree(tree, native.index)
                        .into_iter()
                        .filter(|target| !point.remembered.contains(target)),
                ),
                None => targets.push(id),
            }
        }
        let forgotten = self.forget_all(targets);
        log::debug!(
            target: "nodekeep::cache",
            "Forget point popped: {} forgotten, {} remembered",
            forgotten.len(),
            point.remembered.len()
        );
        forgotten
    }

    /// Drop every wrapper belonging to `file`
    pub fn forget_file(&mut self, file: &FileId) -> Vec<WrapperId> {
        let ids: Vec<WrapperId> = self
            .by_native
            .values()
            .copied()
            .filter(|id| self.entry(*id).is_some_and(|entry| &entry.file == file))
            .collect();
        self.forget_all(ids)
    }

    /// Live wrappers over one tree generation, oldest first
    pub fn live_in(&self, generation: TreeGeneration) -> Vec<LiveWrapper> {
        let low = NativeKey::new(generation, NodeIndex::ROOT);
        let high = NativeKey::new(generation, NodeIndex::from_raw(u32::MAX));
        let mut live: Vec<LiveWrapper> = self
            .by_native
            .range(low..=high)
            .filter_map(|(native, id)| {
                self.entry(*id).map(|entry| LiveWrapper {
                    id: *id,
                    index: native.index,
                    seq: entry.seq,
                })
            })
            .collect();
        live.sort_by_key(|wrapper| wrapper.seq);
        live
    }
}
