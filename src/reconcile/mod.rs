//! Reconciliation of live wrappers against a freshly parsed tree.
//!
//! Each strategy first builds a [`Plan`] without touching the cache. A plan
//! that fails verification for the straight or indexed strategy is replaced
//! by a forgetting plan; only then is the cache mutated.

mod forgetting;
mod indexed;
mod matcher;
mod straight;

use crate::config::ReconcileSettings;
use crate::edit::{EditDescriptor, Strategy};
use crate::error::{Error, Result};
use crate::project::FileId;
use crate::syntax::{NodeIndex, SyntaxKind, SyntaxTree};
use crate::text::{TextEdit, TextRange, grow, shift_range};
use crate::wrapper::{IdentityCache, LiveWrapper, WrapperId};

/// Inputs shared by every strategy
pub struct ReconcileContext<'a> {
    pub file: &'a FileId,
    pub old_tree: &'a SyntaxTree,
    pub new_tree: &'a SyntaxTree,
    pub descriptor: &'a EditDescriptor,
    pub settings: &'a ReconcileSettings,
}

/// What reconciliation did to the cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub strategy: Option<Strategy>,
    pub rebound: Vec<WrapperId>,
    pub invalidated: Vec<WrapperId>,
    /// Every wrapper of the file was forgotten because the container path broke
    pub escalated: bool,
}

/// Cache mutations decided by one strategy
#[derive(Debug, Default)]
pub(crate) struct Plan {
    pub rebinds: Vec<(LiveWrapper, NodeIndex)>,
    pub forgets: Vec<WrapperId>,
    pub escalated: bool,
}

/// Why a strategy refused to produce a plan
#[derive(Debug)]
pub(crate) struct Mismatch(pub String);

impl Mismatch {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Edits of one descriptor with, for each edit, the old node that encloses it.
///
/// The encloser and its ancestors grow with the edit; every other node is
/// shifted by position arithmetic.
pub(crate) struct EditFrame {
    edits: Vec<TextEdit>,
    enclosers: Vec<NodeIndex>,
}

impl EditFrame {
    /// Each edit enclosed by its own smallest containing node
    pub fn per_edit(descriptor: &EditDescriptor, tree: &SyntaxTree) -> Self {
        let edits = descriptor.edits();
        let enclosers = edits
            .iter()
            .map(|edit| tree.smallest_containing(edit.old_range()))
            .collect();
        Self { edits, enclosers }
    }

    /// Every edit enclosed by the same node
    pub fn enclosed_by(descriptor: &EditDescriptor, encloser: NodeIndex) -> Self {
        let edits = descriptor.edits();
        let enclosers = vec![encloser; edits.len()];
        Self { edits, enclosers }
    }

    /// Where `index` of the old tree is expected to end up
    pub fn expected_range(&self, tree: &SyntaxTree, index: NodeIndex) -> Result<TextRange> {
        self.edits
            .iter()
            .zip(&self.enclosers)
            .try_fold(tree[index].range(), |range, (edit, encloser)| {
                if tree.is_ancestor_or_self(index, *encloser) {
                    grow(range, edit)
                } else {
                    shift_range(range, edit)
                }
            })
    }
}

fn frame_for(descriptor: &EditDescriptor, tree: &SyntaxTree) -> Result<EditFrame> {
    Ok(match descriptor.strategy {
        Strategy::Straight => EditFrame::per_edit(descriptor, tree),
        Strategy::IndexedChild => {
            EditFrame::enclosed_by(descriptor, indexed::parent_of(descriptor, tree)?)
        }
        Strategy::Forgetting => {
            EditFrame::enclosed_by(descriptor, tree.smallest_containing(descriptor.hull()))
        }
    })
}

/// Check the plan against the old tree before anything is mutated.
///
/// Every live wrapper the planned strategy keeps must be shiftable;
/// a partial overlap means the plan does not align with node boundaries.
pub fn validate(descriptor: &EditDescriptor, tree: &SyntaxTree, live: &[LiveWrapper]) -> Result<()> {
    let frame = frame_for(descriptor, tree)?;
    let forgotten_region = match descriptor.strategy {
        Strategy::Straight => None,
        Strategy::IndexedChild => indexed::forgotten_region(descriptor, tree)?,
        Strategy::Forgetting => {
            let container = tree.smallest_containing(descriptor.hull());
            let (start, end) = tree.subtree_bounds(container);
            Some((NodeIndex::from_raw(start.raw() + 1), end))
        }
    };

    for wrapper in live {
        if forgotten_region.is_some_and(|(start, end)| start <= wrapper.index && wrapper.index < end)
        {
            continue;
        }
        frame.expected_range(tree, wrapper.index)?;
    }
    Ok(())
}

/// Syntax errors of the old tree that survive the edit, as kind and shifted range.
///
/// Errors overlapping an edit are left out; whatever the parser reports
/// there belongs to the edit.
pub(crate) fn carried_errors(
    descriptor: &EditDescriptor,
    old_tree: &SyntaxTree,
) -> Vec<(SyntaxKind, TextRange)> {
    let Ok(frame) = frame_for(descriptor, old_tree) else {
        return Vec::new();
    };
    old_tree
        .indices()
        .filter(|&index| old_tree[index].is_error() || old_tree[index].is_missing())
        .filter_map(|index| {
            let range = frame.expected_range(old_tree, index).ok()?;
            Some((old_tree[index].kind(), range))
        })
        .collect()
}

/// Reconcile every live wrapper of the edited file against the new tree
pub fn reconcile(cache: &mut IdentityCache, ctx: &ReconcileContext<'_>) -> Reconciliation {
    let live = cache.live_in(ctx.old_tree.generation());
    let requested = ctx.descriptor.strategy;

    let attempted = match requested {
        Strategy::Straight => straight::plan(ctx, &live),
        Strategy::IndexedChild => indexed::plan(ctx, &live),
        Strategy::Forgetting => Err(Mismatch::new("forgetting requested")),
    };
    let (strategy, plan) = match attempted {
        Ok(plan) => (requested, plan),
        Err(Mismatch(reason)) => {
            if requested != Strategy::Forgetting {
                log::warn!(
                    target: "nodekeep::reconcile",
                    "{} reconciliation of {} failed verification ({}); falling back to forgetting",
                    requested,
                    ctx.file,
                    reason
                );
            }
            (Strategy::Forgetting, forgetting::plan(ctx, &live))
        }
    };

    let outcome = apply(cache, ctx, plan, &live);
    log::debug!(
        target: "nodekeep::reconcile",
        "{} reconciled with {} strategy: {} rebound, {} invalidated",
        ctx.file,
        strategy,
        outcome.rebound.len(),
        outcome.invalidated.len()
    );
    Reconciliation {
        strategy: Some(strategy),
        ..outcome
    }
}

fn apply(
    cache: &mut IdentityCache,
    ctx: &ReconcileContext<'_>,
    plan: Plan,
    live: &[LiveWrapper],
) -> Reconciliation {
    let mut rebound = Vec::with_capacity(plan.rebinds.len());
    let mut invalidated = cache.forget_all(plan.forgets);

    for (wrapper, new_index) in plan.rebinds {
        let old_key = ctx.old_tree.key(wrapper.index);
        let new_key = ctx.new_tree.key(new_index);
        match cache.replace(old_key, new_key) {
            Some(id) => rebound.push(id),
            None => invalidated.extend(cache.forget_all([wrapper.id])),
        }
    }

    // nothing may stay bound to the old generation
    let stale: Vec<WrapperId> = live
        .iter()
        .map(|wrapper| wrapper.id)
        .filter(|id| {
            cache
                .entry(*id)
                .is_some_and(|entry| entry.native.generation == ctx.old_tree.generation())
        })
        .collect();
    if !stale.is_empty() {
        log::debug!(
            target: "nodekeep::reconcile",
            "Forgetting {} unmatched wrapper(s) in {}",
            stale.len(),
            ctx.file
        );
        invalidated.extend(cache.forget_all(stale));
    }

    Reconciliation {
        strategy: None,
        rebound,
        invalidated,
        escalated: plan.escalated,
    }
}

/// New node at the same path with the same kind and the expected range
pub(crate) fn same_path_match(
    ctx: &ReconcileContext<'_>,
    frame: &EditFrame,
    old_index: NodeIndex,
) -> std::result::Result<NodeIndex, Mismatch> {
    let old = &ctx.old_tree[old_index];
    let path = ctx.old_tree.path(old_index);
    let new_index = ctx
        .new_tree
        .node_at_path(&path)
        .ok_or_else(|| Mismatch::new(format!("no node at path {path:?}")))?;
    let new = &ctx.new_tree[new_index];
    if new.kind() != old.kind() {
        return Err(Mismatch::new(format!(
            "kind changed at path {path:?}: {} -> {}",
            old.kind(),
            new.kind()
        )));
    }
    let expected = frame
        .expected_range(ctx.old_tree, old_index)
        .map_err(|err| Mismatch::new(err.to_string()))?;
    if new.range() != expected {
        return Err(Mismatch::new(format!(
            "{} at path {path:?} expected at {expected}, found {}",
            old.kind(),
            new.range()
        )));
    }
    Ok(new_index)
}

pub(crate) fn invalid_child(index: usize, count: usize) -> Error {
    Error::InvalidChildIndex { index, count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::ManipulationKind;
    use crate::syntax::{BraceParser, SourceParser, TreeGeneration};
    use crate::text::Replacement;

    fn parse(text: &str, generation: u64) -> SyntaxTree {
        let mut tree = BraceParser.parse(text, &FileId::new("a.brace"));
        tree.set_generation(TreeGeneration(generation));
        tree
    }

    #[test]
    fn test_validate_rejects_straight_plan_splitting_a_node() {
        let tree = parse("let abc = 1;", 1);
        let mut cache = IdentityCache::new();
        let file = FileId::new("a.brace");
        let name = tree.node_at_path(&[0, 1]).unwrap();
        let let_keyword = tree.node_at_path(&[0, 0]).unwrap();
        cache.get_or_create(tree.key(name), &file);
        cache.get_or_create(tree.key(let_keyword), &file);

        // covers the end of `let` and the start of `abc`
        let descriptor = EditDescriptor::new(
            file,
            vec![Replacement::new(2, 5, "tx")],
            ManipulationKind::Rename,
        );
        let live = cache.live_in(tree.generation());
        let err = validate(&descriptor, &tree, &live).unwrap_err();
        assert!(matches!(err, Error::RangeOverlapInconsistent { .. }));
    }

    #[test]
    fn test_validate_ignores_wrappers_the_forgetting_strategy_drops() {
        let tree = parse("let abc = 1;", 1);
        let mut cache = IdentityCache::new();
        let file = FileId::new("a.brace");
        let name = tree.node_at_path(&[0, 1]).unwrap();
        cache.get_or_create(tree.key(name), &file);

        let descriptor = EditDescriptor::new(
            file,
            vec![Replacement::new(2, 5, "tx")],
            ManipulationKind::ReplaceRange,
        );
        let live = cache.live_in(tree.generation());
        assert!(validate(&descriptor, &tree, &live).is_ok());
    }
}
