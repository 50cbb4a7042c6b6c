//! Straight replace: the tree keeps its shape, every wrapper is rebound to
//! the node at the same path after shifting its range.

use crate::wrapper::LiveWrapper;

use super::{EditFrame, Mismatch, Plan, ReconcileContext, same_path_match};

pub(super) fn plan(
    ctx: &ReconcileContext<'_>,
    live: &[LiveWrapper],
) -> Result<Plan, Mismatch> {
    if ctx.old_tree.len() != ctx.new_tree.len() {
        return Err(Mismatch::new(format!(
            "node count changed from {} to {}",
            ctx.old_tree.len(),
            ctx.new_tree.len()
        )));
    }

    let frame = EditFrame::per_edit(ctx.descriptor, ctx.old_tree);
    let rebinds = live
        .iter()
        .map(|wrapper| Ok((*wrapper, same_path_match(ctx, &frame, wrapper.index)?)))
        .collect::<Result<Vec<_>, Mismatch>>()?;

    Ok(Plan {
        rebinds,
        forgets: Vec::new(),
        escalated: false,
    })
}
