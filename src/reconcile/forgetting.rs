//! Forgetting replace.
//!
//! The smallest old node containing the edit is the container. Its strict
//! descendants are forgotten; it and its ancestors are rebound by path after
//! checking kind and start. Everything else is rebound by path, or through
//! the candidate search when its path moved. When the container chain cannot
//! be found in the new tree the whole file is forgotten.

use std::collections::{HashMap, HashSet};

use crate::syntax::NodeIndex;
use crate::wrapper::LiveWrapper;

use super::{EditFrame, Plan, ReconcileContext, matcher, same_path_match};

pub(super) fn plan(ctx: &ReconcileContext<'_>, live: &[LiveWrapper]) -> Plan {
    let old_tree = ctx.old_tree;
    let new_tree = ctx.new_tree;
    let container = old_tree.smallest_containing(ctx.descriptor.hull());
    let frame = EditFrame::enclosed_by(ctx.descriptor, container);

    let mut chain = HashMap::new();
    for node in std::iter::once(container).chain(old_tree.ancestors(container)) {
        let path = old_tree.path(node);
        let matched = new_tree.node_at_path(&path).filter(|new| {
            new_tree[*new].kind() == old_tree[node].kind()
                && new_tree[*new].range().start == old_tree[node].range().start
        });
        match matched {
            Some(new) => {
                chain.insert(node, new);
            }
            None => return escalate(ctx, live, node),
        }
    }

    let (subtree_start, subtree_end) = old_tree.subtree_bounds(container);
    let mut plan = Plan::default();
    let mut claimed: HashSet<NodeIndex> = chain.values().copied().collect();
    let mut outside = Vec::new();

    for wrapper in live {
        if let Some(new) = chain.get(&wrapper.index) {
            plan.rebinds.push((*wrapper, *new));
        } else if subtree_start < wrapper.index && wrapper.index < subtree_end {
            plan.forgets.push(wrapper.id);
        } else {
            outside.push(*wrapper);
        }
    }

    let mut unmatched = Vec::new();
    for wrapper in outside {
        match same_path_match(ctx, &frame, wrapper.index) {
            Ok(new) if claimed.insert(new) => plan.rebinds.push((wrapper, new)),
            _ => unmatched.push(wrapper),
        }
    }

    if ctx.settings.candidate_search && !unmatched.is_empty() {
        let assigned = matcher::assign(ctx, &frame, &unmatched, &claimed);
        let found: HashSet<_> = assigned.iter().map(|(wrapper, _)| wrapper.id).collect();
        log::debug!(
            target: "nodekeep::reconcile",
            "Candidate search matched {} of {} moved wrapper(s)",
            found.len(),
            unmatched.len()
        );
        unmatched.retain(|wrapper| !found.contains(&wrapper.id));
        plan.rebinds.extend(assigned);
    }
    plan.forgets.extend(unmatched.iter().map(|wrapper| wrapper.id));
    plan
}

fn escalate(ctx: &ReconcileContext<'_>, live: &[LiveWrapper], broken: NodeIndex) -> Plan {
    log::warn!(
        target: "nodekeep::reconcile",
        "Path to {} at {} no longer exists in {}; forgetting all {} wrapper(s) of the file",
        ctx.old_tree[broken].kind(),
        ctx.old_tree[broken].range(),
        ctx.file,
        live.len()
    );
    Plan {
        rebinds: Vec::new(),
        forgets: live.iter().map(|wrapper| wrapper.id).collect(),
        escalated: true,
    }
}
