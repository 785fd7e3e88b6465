//! Automata packages
//!
//! A package (chassis, branch, quality) is the only Automata selection and
//! at most one is held. Its powers are looked up at read time, so raising
//! the quality swaps one selection rather than individual powers.

use crate::catalog::{AbilityCatalog, AbilityDefinition};
use crate::engine::{Rejection, RuleContext};
use crate::selection::{RuleFamily, Selection, SelectionKind, SelectionSet};

pub(crate) fn toggle(
    ctx: &RuleContext<'_>,
    set: &SelectionSet,
    proposed: Selection,
) -> Result<SelectionSet, Rejection> {
    if set.contains(&proposed.id) {
        return Ok(set.without(|s| s.id == proposed.id));
    }
    let SelectionKind::Package { key } = &proposed.kind else {
        return Err(Rejection::UnknownAbility { id: proposed.id });
    };

    let unlocked = ctx.catalog.unlocked_qualities(&key.chassis, ctx.rank);
    if !unlocked.contains(&key.quality) {
        let reason = format!(
            "{} quality is locked for {} at rank {}",
            key.quality, key.chassis, ctx.rank
        );
        return Err(Rejection::Ineligible {
            id: proposed.id,
            reason,
        });
    }

    Ok(set
        .without(|s| s.family() == RuleFamily::Package)
        .with(proposed))
}

/// Powers of the held package, if any
pub(crate) fn powers<'c>(catalog: &'c AbilityCatalog, set: &SelectionSet) -> Vec<&'c AbilityDefinition> {
    set.iter()
        .find_map(|s| match &s.kind {
            SelectionKind::Package { key } => Some(catalog.powers_for_package(key)),
            _ => None,
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use crate::core::types::{Lineage, PriorityRank};
    use crate::engine::test_support::Harness;
    use crate::engine::{Rejection, Verdict};
    use crate::selection::{PackageKey, Quality, SelectionSet};

    fn package(h: &Harness, branch: &str, quality: Quality) -> crate::selection::Selection {
        h.catalog
            .package_selection(&PackageKey::new("warden", branch, quality))
            .unwrap()
    }

    #[test]
    fn test_raising_quality_replaces_package() {
        let h = Harness::new();
        let engine = h.engine();
        let empty = SelectionSet::new(Lineage::Automata);

        let basic = engine.toggle(
            &empty,
            Lineage::Automata,
            PriorityRank::A,
            &package(&h, "bulwark", Quality::Basic),
        );
        assert!(basic.is_applied());

        let advanced = engine.toggle(
            &basic.set,
            Lineage::Automata,
            PriorityRank::A,
            &package(&h, "bulwark", Quality::Advanced),
        );
        match &advanced.verdict {
            Verdict::Applied(delta) => {
                assert_eq!(delta.added.len(), 1);
                assert_eq!(delta.removed.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(advanced.set.len(), 1);

        let powers: Vec<&str> = engine
            .granted(&advanced.set)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(
            powers,
            vec![
                "automata.baseline.link",
                "automata.warden.frame",
                "automata.warden.bulwark.plating",
                "automata.warden.bulwark.aegis",
                "automata.warden.bulwark.fortress"
            ]
        );
    }

    #[test]
    fn test_locked_quality_rejected() {
        let h = Harness::new();
        let set = SelectionSet::new(Lineage::Automata);
        // rank C unlocks up to standard
        let outcome = h.engine().toggle(
            &set,
            Lineage::Automata,
            PriorityRank::C,
            &package(&h, "bulwark", Quality::Advanced),
        );
        assert_eq!(outcome.rejection().map(Rejection::code), Some("ineligible"));

        // warden caps at advanced regardless of rank
        let outcome = h.engine().toggle(
            &set,
            Lineage::Automata,
            PriorityRank::A,
            &package(&h, "bulwark", Quality::Superior),
        );
        assert_eq!(outcome.rejection().map(Rejection::code), Some("ineligible"));
    }

    #[test]
    fn test_switching_branch_replaces_package() {
        let h = Harness::new();
        let engine = h.engine();
        let set = engine
            .toggle(
                &SelectionSet::new(Lineage::Automata),
                Lineage::Automata,
                PriorityRank::B,
                &package(&h, "bulwark", Quality::Standard),
            )
            .into_set();
        let lancer = engine
            .toggle(
                &set,
                Lineage::Automata,
                PriorityRank::B,
                &package(&h, "lancer", Quality::Basic),
            )
            .into_set();
        let ids: Vec<&str> = lancer.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["automata.package.warden.lancer.basic"]);
    }

    #[test]
    fn test_unknown_branch_rejected() {
        let h = Harness::new();
        let mut forged = package(&h, "bulwark", Quality::Basic);
        forged.kind = crate::selection::SelectionKind::Package {
            key: PackageKey::new("warden", "sniper", Quality::Basic),
        };
        let outcome = h.engine().toggle(
            &SelectionSet::new(Lineage::Automata),
            Lineage::Automata,
            PriorityRank::A,
            &forged,
        );
        assert_eq!(outcome.rejection().map(Rejection::code), Some("unknown_ability"));
    }
}
