//! Spheres and moves
//!
//! A sphere occupies a primary or secondary slot, each slot kind with its own
//! ceiling. Moves need their sphere selected and count against the move
//! budget. Removing a sphere removes its moves.

use crate::engine::{Rejection, RuleContext};
use crate::selection::{Selection, SelectionKind, SelectionSet, SphereTier};

pub(crate) fn toggle_sphere(
    _ctx: &RuleContext<'_>,
    set: &SelectionSet,
    proposed: Selection,
    tier: SphereTier,
) -> Result<SelectionSet, Rejection> {
    match set.get(&proposed.id).map(|s| &s.kind) {
        Some(SelectionKind::Sphere { tier: current }) if *current == tier => {
            let root = proposed.root;
            Ok(set.without(|s| s.root == root))
        }
        // Same sphere in the other slot: move it, keeping its moves
        Some(_) => Ok(set.replacing(proposed)),
        None => Ok(set.clone().with(proposed)),
    }
}

pub(crate) fn toggle_move(
    ctx: &RuleContext<'_>,
    set: &SelectionSet,
    proposed: Selection,
) -> Result<SelectionSet, Rejection> {
    if set.contains(&proposed.id) {
        return Ok(set.without(|s| s.id == proposed.id));
    }
    let root = proposed.root;
    let has_sphere = set
        .under_root(root)
        .any(|s| matches!(s.kind, SelectionKind::Sphere { .. }));
    if !has_sphere {
        return Err(Rejection::DependencyMissing {
            id: proposed.id,
            required: format!("sphere {}", ctx.segment_name(root)),
        });
    }
    Ok(set.clone().with(proposed))
}
