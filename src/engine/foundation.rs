//! Mentalist foundations and combinatorial grants
//!
//! An archetype is followed by two independent choices, polarity and scope.
//! The polarity implies a fixed grant. The (polarity, scope) combination
//! names a candidate list: one candidate is granted automatically, several
//! need an explicit pick, none grants nothing. Picks are stored; implied
//! grants never are.

use std::mem::discriminant;

use crate::catalog::{AbilityCatalog, AbilityDefinition};
use crate::core::types::Subsystem;
use crate::engine::{Rejection, RuleContext};
use crate::selection::{Polarity, Scope, SegmentId, Selection, SelectionKind, SelectionSet};

pub(crate) fn toggle_archetype(
    ctx: &RuleContext<'_>,
    set: &SelectionSet,
    proposed: Selection,
) -> Result<SelectionSet, Rejection> {
    if set.contains(&proposed.id) {
        return Ok(set.without(|s| s.subsystem == Some(Subsystem::Mentalist)));
    }
    Ok(ctx
        .clear_for_new_root(set, Subsystem::Mentalist)
        .with(proposed))
}

/// Polarity or scope; changing either drops the explicit pick
pub(crate) fn toggle_choice(
    ctx: &RuleContext<'_>,
    set: &SelectionSet,
    proposed: Selection,
) -> Result<SelectionSet, Rejection> {
    let root = proposed.root;
    if set.contains(&proposed.id) {
        return Ok(set.without(|s| s.id == proposed.id || is_pick(s, root)));
    }
    require_archetype(ctx, set, &proposed)?;

    let group = discriminant(&proposed.kind);
    Ok(set
        .without(|s| (s.root == root && discriminant(&s.kind) == group) || is_pick(s, root))
        .with(proposed))
}

pub(crate) fn toggle_pick(
    ctx: &RuleContext<'_>,
    set: &SelectionSet,
    proposed: Selection,
) -> Result<SelectionSet, Rejection> {
    let root = proposed.root;
    if set.contains(&proposed.id) {
        return Ok(set.without(|s| s.id == proposed.id));
    }
    require_archetype(ctx, set, &proposed)?;

    let (Some(polarity), Some(scope)) = (polarity_of(set, root), scope_of(set, root)) else {
        return Err(Rejection::DependencyMissing {
            id: proposed.id,
            required: "a polarity and a scope".into(),
        });
    };

    let candidates = ctx.catalog.candidates(root, polarity, scope);
    if candidates.len() < 2 {
        return Err(Rejection::Ineligible {
            id: proposed.id,
            reason: "the current combination leaves nothing to choose".into(),
        });
    }
    if !candidates.iter().any(|d| d.id == proposed.id) {
        return Err(Rejection::Ineligible {
            id: proposed.id,
            reason: "not a candidate for the current combination".into(),
        });
    }

    Ok(set.without(|s| is_pick(s, root)).with(proposed))
}

/// Grants implied by the foundational choices in a set
pub(crate) fn implied<'c>(catalog: &'c AbilityCatalog, set: &SelectionSet) -> Vec<&'c AbilityDefinition> {
    let mut granted = Vec::new();
    for archetype in set
        .iter()
        .filter(|s| matches!(s.kind, SelectionKind::MentalistArchetype))
    {
        let root = archetype.root;
        let Some(polarity) = polarity_of(set, root) else {
            continue;
        };
        granted.extend(catalog.polarity_grant(root, polarity));

        if let Some(scope) = scope_of(set, root) {
            let candidates = catalog.candidates(root, polarity, scope);
            if candidates.len() == 1 {
                granted.extend(candidates);
            }
        }
    }
    granted
}

fn require_archetype(
    ctx: &RuleContext<'_>,
    set: &SelectionSet,
    proposed: &Selection,
) -> Result<(), Rejection> {
    let root = proposed.root;
    let held = set
        .under_root(root)
        .any(|s| matches!(s.kind, SelectionKind::MentalistArchetype));
    if held {
        Ok(())
    } else {
        Err(Rejection::DependencyMissing {
            id: proposed.id.clone(),
            required: format!("archetype {}", ctx.segment_name(root)),
        })
    }
}

fn is_pick(s: &Selection, root: SegmentId) -> bool {
    s.root == root && matches!(s.kind, SelectionKind::GrantPick)
}

fn polarity_of(set: &SelectionSet, root: SegmentId) -> Option<Polarity> {
    set.under_root(root).find_map(|s| match s.kind {
        SelectionKind::Polarity { polarity } => Some(polarity),
        _ => None,
    })
}

fn scope_of(set: &SelectionSet, root: SegmentId) -> Option<Scope> {
    set.under_root(root).find_map(|s| match s.kind {
        SelectionKind::Scope { scope } => Some(scope),
        _ => None,
    })
}
