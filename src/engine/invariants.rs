//! Structural checks over a whole selection set
//!
//! Every set reachable through the engine at a fixed rank passes `check`.
//! Sets carried across a rank decrease may fail the budget checks; those
//! are reported but never repaired.

use ahash::AHashSet;
use serde::Serialize;

use crate::budget::{self, BudgetName};
use crate::catalog::AbilityCatalog;
use crate::core::config::EngineConfig;
use crate::core::types::{AbilityId, Lineage, PriorityRank, Subsystem};
use crate::selection::{RuleFamily, Selection, SelectionKind, SelectionSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    DuplicateSelection { id: AbilityId },
    ForeignLineage { id: AbilityId, lineage: Lineage },
    OverBudget { budget: BudgetName, used: u32, ceiling: u32 },
    /// More than one selection where a family allows one
    Exclusive { family: RuleFamily, group: String, count: usize },
    /// A selection whose prerequisite is not held
    Orphaned { id: AbilityId, requires: String },
    /// Evolution and Mentalist held together below a dual rank
    MixedSubsystems,
    /// An explicit pick that is not a valid choice for its combination
    InvalidPick { id: AbilityId },
}

/// Every violation found in the set, in a stable order
pub fn check(
    set: &SelectionSet,
    catalog: &AbilityCatalog,
    rank: PriorityRank,
    config: &EngineConfig,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let name = |s: &Selection| {
        catalog
            .arena()
            .name(s.root)
            .unwrap_or("?")
            .to_string()
    };

    let mut seen: AHashSet<&AbilityId> = AHashSet::new();
    for sel in set.iter() {
        if !seen.insert(&sel.id) {
            violations.push(Violation::DuplicateSelection { id: sel.id.clone() });
        }
        if sel.lineage != set.lineage() {
            violations.push(Violation::ForeignLineage {
                id: sel.id.clone(),
                lineage: sel.lineage,
            });
        }
    }

    for line in budget::report(set, rank) {
        if let Some(ceiling) = line.ceiling.filter(|c| line.used > *c) {
            violations.push(Violation::OverBudget {
                budget: line.budget,
                used: line.used,
                ceiling,
            });
        }
    }

    // Radio groups: (family, group label) -> count, kept in first-seen order
    let mut groups: Vec<((RuleFamily, String), usize)> = Vec::new();
    let mut bump = |family: RuleFamily, group: String| {
        match groups.iter_mut().find(|(key, _)| key.0 == family && key.1 == group) {
            Some((_, count)) => *count += 1,
            None => groups.push(((family, group), 1)),
        }
    };
    for sel in set.iter() {
        match &sel.kind {
            SelectionKind::Tiered => bump(RuleFamily::Tiered, name(sel)),
            SelectionKind::Evolution if sel.is_root() => {
                bump(RuleFamily::Evolution, "archetype".into())
            }
            SelectionKind::Evolution => bump(RuleFamily::Evolution, format!("{} stage", name(sel))),
            SelectionKind::MentalistArchetype => bump(RuleFamily::Foundation, "archetype".into()),
            SelectionKind::Polarity { .. } => {
                bump(RuleFamily::Foundation, format!("{} polarity", name(sel)))
            }
            SelectionKind::Scope { .. } => bump(RuleFamily::Foundation, format!("{} scope", name(sel))),
            SelectionKind::GrantPick => bump(RuleFamily::Foundation, format!("{} pick", name(sel))),
            SelectionKind::Package { .. } => bump(RuleFamily::Package, "package".into()),
            SelectionKind::Sphere { .. } | SelectionKind::Move => {}
        }
    }
    for ((family, group), count) in groups {
        if count > 1 {
            violations.push(Violation::Exclusive {
                family,
                group,
                count,
            });
        }
    }

    for sel in set.iter() {
        if let Some(requires) = missing_prerequisite(set, sel) {
            violations.push(Violation::Orphaned {
                id: sel.id.clone(),
                requires: format!("{} {}", requires, name(sel)),
            });
        }
        if matches!(sel.kind, SelectionKind::GrantPick) && !valid_pick(set, catalog, sel) {
            violations.push(Violation::InvalidPick { id: sel.id.clone() });
        }
    }

    if !config.is_dual_rank(rank) {
        let has = |sub: Subsystem| set.iter().any(|s| s.subsystem == Some(sub));
        if has(Subsystem::Evolution) && has(Subsystem::Mentalist) {
            violations.push(Violation::MixedSubsystems);
        }
    }

    violations
}

fn holds(set: &SelectionSet, sel: &Selection, pred: impl Fn(&Selection) -> bool) -> bool {
    set.under_root(sel.root).any(pred)
}

fn missing_prerequisite(set: &SelectionSet, sel: &Selection) -> Option<&'static str> {
    match &sel.kind {
        SelectionKind::Move => {
            (!holds(set, sel, |s| matches!(s.kind, SelectionKind::Sphere { .. }))).then_some("sphere")
        }
        SelectionKind::Evolution if !sel.is_root() => {
            (!holds(set, sel, |s| s.family() == RuleFamily::Evolution && s.is_root()))
                .then_some("archetype")
        }
        SelectionKind::Polarity { .. } | SelectionKind::Scope { .. } | SelectionKind::GrantPick => {
            (!holds(set, sel, |s| matches!(s.kind, SelectionKind::MentalistArchetype)))
                .then_some("archetype")
        }
        _ => None,
    }
}

fn valid_pick(set: &SelectionSet, catalog: &AbilityCatalog, pick: &Selection) -> bool {
    let polarity = set.under_root(pick.root).find_map(|s| match s.kind {
        SelectionKind::Polarity { polarity } => Some(polarity),
        _ => None,
    });
    let scope = set.under_root(pick.root).find_map(|s| match s.kind {
        SelectionKind::Scope { scope } => Some(scope),
        _ => None,
    });
    let (Some(polarity), Some(scope)) = (polarity, scope) else {
        return false;
    };
    let candidates = catalog.candidates(pick.root, polarity, scope);
    candidates.len() > 1 && candidates.iter().any(|d| d.id == pick.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::Harness;

    #[test]
    fn test_engine_built_sets_are_clean() {
        let h = Harness::new();
        let set = h.build(
            Lineage::Esper,
            PriorityRank::A,
            &[
                "esper.sentinel",
                "esper.sentinel.alpha",
                "esper.oracle",
                "esper.oracle.receiver",
                "esper.oracle.aural",
                "esper.oracle.receiver.aural.echo",
            ],
        );
        assert!(h.engine().check(&set, PriorityRank::A).is_empty());
    }

    #[test]
    fn test_mixed_subsystems_flagged_below_dual_rank() {
        let h = Harness::new();
        let set = h.build(
            Lineage::Esper,
            PriorityRank::A,
            &["esper.sentinel", "esper.oracle"],
        );
        let violations = h.engine().check(&set, PriorityRank::B);
        assert_eq!(violations, vec![Violation::MixedSubsystems]);
    }

    #[test]
    fn test_rank_decrease_reports_over_budget() {
        let h = Harness::new();
        let set = h.build(
            Lineage::Sorcery,
            PriorityRank::A,
            &["sorcery.creation", "sorcery.destruction"],
        );
        let violations = h.engine().check(&set, PriorityRank::B);
        assert_eq!(
            violations,
            vec![Violation::OverBudget {
                budget: BudgetName::PrimarySpheres,
                used: 2,
                ceiling: 1
            }]
        );
    }

    #[test]
    fn test_hand_built_set_with_orphan_and_duplicate_tier() {
        let h = Harness::new();
        let set = SelectionSet::new(Lineage::NeoSapien)
            .with(h.proposal("neo.reflex.1"))
            .with(h.proposal("neo.reflex.2"));
        let violations = h.engine().check(&set, PriorityRank::A);
        assert_eq!(
            violations,
            vec![Violation::Exclusive {
                family: RuleFamily::Tiered,
                group: "reflex".into(),
                count: 2
            }]
        );

        let orphan = SelectionSet::new(Lineage::Sorcery).with(h.proposal("sorcery.creation.spark"));
        let violations = h.engine().check(&orphan, PriorityRank::A);
        assert_eq!(
            violations,
            vec![Violation::Orphaned {
                id: "sorcery.creation.spark".into(),
                requires: "sphere creation".into()
            }]
        );
    }
}
