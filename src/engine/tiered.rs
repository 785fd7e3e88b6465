//! Flat tiered family (NeoSapien augments, Chimera mutations)
//!
//! Tiers under one root behave like a radio group: selecting a tier replaces
//! any other tier of the same root, and toggling the selected tier clears the
//! root. Cost limits are enforced by the generic budget check.

use crate::engine::{Rejection, RuleContext};
use crate::selection::{RuleFamily, Selection, SelectionSet};

pub(crate) fn toggle(
    _ctx: &RuleContext<'_>,
    set: &SelectionSet,
    proposed: Selection,
) -> Result<SelectionSet, Rejection> {
    if set.contains(&proposed.id) {
        return Ok(set.without(|s| s.id == proposed.id));
    }
    let root = proposed.root;
    Ok(set
        .without(|s| s.family() == RuleFamily::Tiered && s.root == root)
        .with(proposed))
}

#[cfg(test)]
mod tests {
    use crate::budget::BudgetName;
    use crate::core::types::{Lineage, PriorityRank};
    use crate::engine::test_support::Harness;
    use crate::engine::Rejection;

    #[test]
    fn test_higher_tier_replaces_lower() {
        let h = Harness::new();
        let set = h.build(
            Lineage::NeoSapien,
            PriorityRank::B,
            &["neo.reflex.1", "neo.reflex.2"],
        );
        assert_eq!(set.len(), 1);
        assert_eq!(h.engine().used(&set, BudgetName::Slots), 2);
        assert_eq!(h.engine().used(&set, BudgetName::Strain), 2);
    }

    #[test]
    fn test_toggle_selected_tier_clears_root() {
        let h = Harness::new();
        let set = h.build(
            Lineage::NeoSapien,
            PriorityRank::B,
            &["neo.reflex.3", "neo.optics.1"],
        );
        let outcome = h.toggle(&set, PriorityRank::B, "neo.reflex.3");
        assert!(outcome.is_applied());
        assert_eq!(outcome.set.len(), 1);
        assert!(outcome.set.get(&"neo.optics.1".into()).is_some());
    }

    #[test]
    fn test_replacement_over_ceiling_rejected_as_a_whole() {
        let h = Harness::new();
        // rank C: 5 slots
        let set = h.build(
            Lineage::NeoSapien,
            PriorityRank::C,
            &["neo.reflex.2", "neo.optics.3"],
        );
        let outcome = h.toggle(&set, PriorityRank::C, "neo.reflex.3");
        assert_eq!(
            outcome.rejection(),
            Some(&Rejection::BudgetExceeded {
                budget: BudgetName::Slots,
                requested: 6,
                ceiling: 5
            })
        );
        assert_eq!(outcome.set, set);
    }

    #[test]
    fn test_chimera_explicit_cost_overrides_tier_default() {
        let h = Harness::new();
        // venom.2 declares mutation_points = 3; rank D allows 4
        let set = h.build(Lineage::Chimera, PriorityRank::D, &["chimera.venom.2"]);
        assert_eq!(h.engine().used(&set, BudgetName::MutationPoints), 3);
        let outcome = h.toggle(&set, PriorityRank::D, "chimera.carapace.2");
        assert_eq!(outcome.rejection().map(Rejection::code), Some("budget_exceeded"));
        assert!(h.toggle(&set, PriorityRank::D, "chimera.carapace.1").is_applied());
    }

    #[test]
    fn test_rank_e_admits_nothing() {
        let h = Harness::new();
        let set = crate::selection::SelectionSet::new(Lineage::Chimera);
        let outcome = h.toggle(&set, PriorityRank::E, "chimera.carapace.1");
        assert_eq!(outcome.rejection().map(Rejection::code), Some("budget_exceeded"));
    }
}
