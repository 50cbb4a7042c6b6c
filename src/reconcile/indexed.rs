//! Indexed child replace: `delta` siblings appear or disappear at index `k`
//! of one parent.
//!
//! The parent chain grows, everything before `k` and outside the parent is
//! rebound in place, and the children at or after `k` are forgotten so they
//! are recreated lazily at their new indices.

use crate::edit::EditDescriptor;
use crate::error::{Error, Result};
use crate::syntax::{NodeIndex, SyntaxTree};
use crate::wrapper::LiveWrapper;

use super::{EditFrame, Mismatch, Plan, ReconcileContext, invalid_child, same_path_match};

pub(super) fn parent_of(descriptor: &EditDescriptor, tree: &SyntaxTree) -> Result<NodeIndex> {
    descriptor
        .inserted_into_parent
        .filter(|parent| tree.get(*parent).is_some())
        .ok_or_else(|| {
            Error::invalid_range(
                descriptor.range_start(),
                descriptor.range_end(),
                "indexed child edit without a parent in the current tree",
            )
        })
}

/// Preorder bounds of the old children at or after the edited index
pub(super) fn forgotten_region(
    descriptor: &EditDescriptor,
    tree: &SyntaxTree,
) -> Result<Option<(NodeIndex, NodeIndex)>> {
    let parent = parent_of(descriptor, tree)?;
    let children = tree[parent].children();
    let index = descriptor.child_index.unwrap_or(children.len());
    if index > children.len() {
        return Err(invalid_child(index, children.len()));
    }
    Ok(children
        .get(index)
        .map(|first| (*first, tree.subtree_bounds(parent).1)))
}

pub(super) fn plan(
    ctx: &ReconcileContext<'_>,
    live: &[LiveWrapper],
) -> std::result::Result<Plan, Mismatch> {
    let old_tree = ctx.old_tree;
    let new_tree = ctx.new_tree;
    let parent = parent_of(ctx.descriptor, old_tree).map_err(|err| Mismatch::new(err.to_string()))?;
    let region = forgotten_region(ctx.descriptor, old_tree)
        .map_err(|err| Mismatch::new(err.to_string()))?;
    let delta = ctx.descriptor.child_count_delta;
    let k = ctx
        .descriptor
        .child_index
        .unwrap_or(old_tree[parent].children().len());

    let path = old_tree.path(parent);
    let new_parent = new_tree
        .node_at_path(&path)
        .ok_or_else(|| Mismatch::new(format!("parent path {path:?} vanished")))?;
    if new_tree[new_parent].kind() != old_tree[parent].kind() {
        return Err(Mismatch::new(format!(
            "parent kind changed from {} to {}",
            old_tree[parent].kind(),
            new_tree[new_parent].kind()
        )));
    }

    let old_children = old_tree[parent].children();
    let new_children = new_tree[new_parent].children();
    if old_children.len() as isize + delta != new_children.len() as isize {
        return Err(Mismatch::new(format!(
            "declared child delta {delta} but parent went from {} to {} children",
            old_children.len(),
            new_children.len()
        )));
    }
    for (i, old_child) in old_children.iter().enumerate().skip(k) {
        let shifted = i as isize + delta;
        if shifted < k as isize {
            continue;
        }
        let new_child = new_children[shifted as usize];
        if old_tree[*old_child].kind() != new_tree[new_child].kind() {
            return Err(Mismatch::new(format!(
                "old child {i} ({}) does not correspond to new child {shifted} ({})",
                old_tree[*old_child].kind(),
                new_tree[new_child].kind()
            )));
        }
    }

    let frame = EditFrame::enclosed_by(ctx.descriptor, parent);
    let mut plan = Plan::default();
    for wrapper in live {
        let forgotten =
            region.is_some_and(|(start, end)| start <= wrapper.index && wrapper.index < end);
        if forgotten {
            plan.forgets.push(wrapper.id);
        } else {
            plan.rebinds
                .push((*wrapper, same_path_match(ctx, &frame, wrapper.index)?));
        }
    }
    Ok(plan)
}
