//! Candidate search for wrappers whose path moved.
//!
//! New nodes are indexed in an interval tree; a wrapper's candidates are the
//! nodes of its kind overlapping its shifted range. Competing matches are
//! resolved greedily by position delta, then depth, then wrapper age.

use std::collections::HashSet;

use rust_lapper::{Interval, Lapper};

use crate::syntax::{NodeIndex, SyntaxTree};
use crate::text::TextRange;
use crate::wrapper::{LiveWrapper, WrapperId};

use super::{EditFrame, ReconcileContext};

type NodeInterval = Interval<usize, NodeIndex>;

/// Interval index over every node of a tree
pub(crate) struct NodeIntervals {
    lapper: Lapper<usize, NodeIndex>,
}

impl NodeIntervals {
    pub fn new(tree: &SyntaxTree) -> Self {
        let intervals: Vec<NodeInterval> = tree
            .indices()
            .map(|index| {
                let range = tree[index].range();
                NodeInterval {
                    start: range.start,
                    // zero-width nodes still occupy their position
                    stop: range.end.max(range.start + 1),
                    val: index,
                }
            })
            .collect();
        Self {
            lapper: Lapper::new(intervals),
        }
    }

    pub fn overlapping(&self, range: TextRange) -> impl Iterator<Item = NodeIndex> + '_ {
        self.lapper
            .find(range.start, range.end.max(range.start + 1))
            .map(|interval| interval.val)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    delta: usize,
    depth: usize,
    seq: u64,
    node: NodeIndex,
    id: WrapperId,
}

/// Pair each wrapper with at most one unclaimed new node of the same kind
pub(super) fn assign(
    ctx: &ReconcileContext<'_>,
    frame: &EditFrame,
    wrappers: &[LiveWrapper],
    claimed: &HashSet<NodeIndex>,
) -> Vec<(LiveWrapper, NodeIndex)> {
    if wrappers.is_empty() {
        return Vec::new();
    }
    let intervals = NodeIntervals::new(ctx.new_tree);
    let max_delta = ctx.settings.max_candidate_distance;

    let mut candidates = Vec::new();
    for wrapper in wrappers {
        let Ok(expected) = frame.expected_range(ctx.old_tree, wrapper.index) else {
            continue;
        };
        let kind = ctx.old_tree[wrapper.index].kind();
        for node in intervals.overlapping(expected) {
            let new = &ctx.new_tree[node];
            if new.kind() != kind || claimed.contains(&node) {
                continue;
            }
            let delta = expected.distance(new.range());
            if max_delta.is_some_and(|max| delta > max) {
                continue;
            }
            candidates.push(Candidate {
                delta,
                depth: new.depth(),
                seq: wrapper.seq,
                node,
                id: wrapper.id,
            });
        }
    }
    candidates.sort();

    let mut used_nodes = HashSet::new();
    let mut used_wrappers = HashSet::new();
    let mut assigned = Vec::new();
    for candidate in candidates {
        if used_wrappers.contains(&candidate.id) || used_nodes.contains(&candidate.node) {
            continue;
        }
        used_wrappers.insert(candidate.id);
        used_nodes.insert(candidate.node);
        if let Some(wrapper) = wrappers.iter().find(|wrapper| wrapper.id == candidate.id) {
            assigned.push((*wrapper, candidate.node));
        }
    }
    assigned
}
