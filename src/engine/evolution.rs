//! Esper evolution trees
//!
//! A character follows one archetype root and at most one evolution chain
//! beneath it. Only the deepest stage is stored; its path implies the
//! stages above it.

use crate::budget::{ceiling, BudgetName};
use crate::core::types::Subsystem;
use crate::engine::{Rejection, RuleContext};
use crate::selection::{RuleFamily, Selection, SelectionSet};

pub(crate) fn toggle(
    ctx: &RuleContext<'_>,
    set: &SelectionSet,
    proposed: Selection,
) -> Result<SelectionSet, Rejection> {
    if proposed.is_root() {
        toggle_root(ctx, set, proposed)
    } else {
        toggle_stage(ctx, set, proposed)
    }
}

fn toggle_root(
    ctx: &RuleContext<'_>,
    set: &SelectionSet,
    proposed: Selection,
) -> Result<SelectionSet, Rejection> {
    let root = proposed.root;
    if set.contains(&proposed.id) {
        return Ok(set.without(|s| s.family() == RuleFamily::Evolution && s.root == root));
    }
    Ok(ctx
        .clear_for_new_root(set, Subsystem::Evolution)
        .with(proposed))
}

fn toggle_stage(
    ctx: &RuleContext<'_>,
    set: &SelectionSet,
    proposed: Selection,
) -> Result<SelectionSet, Rejection> {
    let root = proposed.root;
    let in_chain = |s: &Selection| s.family() == RuleFamily::Evolution && s.root == root;

    // Collapses the chain back to the root
    if set.contains(&proposed.id) {
        return Ok(set.without(|s| s.id == proposed.id));
    }

    if !set.iter().any(|s| in_chain(s) && s.is_root()) {
        return Err(Rejection::DependencyMissing {
            id: proposed.id,
            required: format!("archetype {}", ctx.segment_name(root)),
        });
    }

    let limit = ceiling(ctx.lineage, ctx.rank, BudgetName::DepthLimit).unwrap_or(0);
    if proposed.depth as u32 > limit {
        return Err(Rejection::DepthExceeded {
            id: proposed.id,
            depth: proposed.depth,
            limit,
        });
    }

    // The parent must already be held: the root itself, or a prefix of the
    // current stage's path
    let Some(parent) = proposed.path.parent() else {
        return Err(Rejection::SkippedStage { id: proposed.id });
    };
    let reachable = match set.find(|s| in_chain(s) && !s.is_root()) {
        Some(stage) => stage.path.starts_with(parent),
        None => parent.len() == 1,
    };
    if !reachable {
        return Err(Rejection::SkippedStage { id: proposed.id });
    }

    Ok(set
        .without(|s| in_chain(s) && !s.is_root())
        .with(proposed))
}
