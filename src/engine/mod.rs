//! Allocation engine
//!
//! A pure reducer over `SelectionSet`: every toggle takes the current set
//! and a proposed selection and returns a new set plus a verdict. The input
//! set is never modified, and a rejected toggle hands the input back
//! unchanged.
//!
//! Dispatch is an exhaustive match on `SelectionKind`, one rule module per
//! family. Summed budgets are checked generically after the family rule has
//! produced its candidate set.

pub mod evolution;
pub mod foundation;
pub mod invariants;
pub mod package;
pub mod rejection;
pub mod sorcery;
pub mod tiered;

pub use invariants::{check, Violation};
pub use rejection::Rejection;

use serde::Serialize;

use crate::budget::{self, BudgetLine, BudgetName, Measure, Warning};
use crate::catalog::{AbilityCatalog, AbilityDefinition, AbilityRole};
use crate::core::config::EngineConfig;
use crate::core::types::{AbilityId, Lineage, PriorityRank, Subsystem};
use crate::selection::{PackageKey, Polarity, Scope, Selection, SelectionKind, SelectionSet, SegmentId};

/// What a successful toggle changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Delta {
    pub added: Vec<AbilityId>,
    pub removed: Vec<AbilityId>,
    /// Present before and after but with a different slot (sphere re-tier)
    pub updated: Vec<AbilityId>,
}

impl Delta {
    fn between(before: &SelectionSet, after: &SelectionSet) -> Self {
        let mut delta = Delta::default();
        for sel in after.iter() {
            match before.get(&sel.id) {
                None => delta.added.push(sel.id.clone()),
                Some(prev) if prev != sel => delta.updated.push(sel.id.clone()),
                Some(_) => {}
            }
        }
        delta.removed = before
            .iter()
            .filter(|s| !after.contains(&s.id))
            .map(|s| s.id.clone())
            .collect();
        delta
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Applied(Delta),
    Rejected(Rejection),
}

/// Result of a toggle: the set to keep using and why it looks that way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub set: SelectionSet,
    pub verdict: Verdict,
}

impl ToggleOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self.verdict, Verdict::Applied(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.verdict {
            Verdict::Rejected(r) => Some(r),
            Verdict::Applied(_) => None,
        }
    }

    pub fn into_set(self) -> SelectionSet {
        self.set
    }
}

/// Everything a rule needs besides the set and the proposal
pub(crate) struct RuleContext<'a> {
    pub catalog: &'a AbilityCatalog,
    pub config: &'a EngineConfig,
    pub lineage: Lineage,
    pub rank: PriorityRank,
}

impl RuleContext<'_> {
    /// Readable name of a segment for rejection messages
    pub fn segment_name(&self, id: SegmentId) -> String {
        self.catalog
            .arena()
            .name(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("segment #{}", id.0))
    }

    /// Set left behind when a new Esper root is taken
    ///
    /// At a dual rank only the incoming subsystem is cleared, otherwise the
    /// whole Esper set is.
    pub fn clear_for_new_root(&self, set: &SelectionSet, incoming: Subsystem) -> SelectionSet {
        if self.config.is_dual_rank(self.rank) {
            set.without(|s| s.subsystem == Some(incoming))
        } else {
            set.without(|s| s.subsystem.is_some())
        }
    }
}

/// Validates and applies toggles against a catalog
#[derive(Debug, Clone, Copy)]
pub struct AllocationEngine<'c> {
    catalog: &'c AbilityCatalog,
    config: &'c EngineConfig,
}

impl<'c> AllocationEngine<'c> {
    pub fn new(catalog: &'c AbilityCatalog, config: &'c EngineConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &'c AbilityCatalog {
        self.catalog
    }

    pub fn config(&self) -> &'c EngineConfig {
        self.config
    }

    /// Apply or reject one proposed selection
    pub fn toggle(
        &self,
        set: &SelectionSet,
        lineage: Lineage,
        rank: PriorityRank,
        proposed: &Selection,
    ) -> ToggleOutcome {
        match self.apply(set, lineage, rank, proposed) {
            Ok(next) => {
                let delta = Delta::between(set, &next);
                tracing::debug!(
                    ability = %proposed.id,
                    added = delta.added.len(),
                    removed = delta.removed.len(),
                    "toggle applied"
                );
                ToggleOutcome {
                    set: next,
                    verdict: Verdict::Applied(delta),
                }
            }
            Err(rejection) => {
                tracing::debug!(
                    ability = %proposed.id,
                    code = rejection.code(),
                    "toggle rejected: {}",
                    rejection
                );
                ToggleOutcome {
                    set: set.clone(),
                    verdict: Verdict::Rejected(rejection),
                }
            }
        }
    }

    /// Toggle by ability id, building the proposal from the catalog
    ///
    /// A sphere already in the set is proposed at its held tier, so toggling
    /// it by id removes it. New spheres are proposed as primary.
    pub fn toggle_id(
        &self,
        set: &SelectionSet,
        lineage: Lineage,
        rank: PriorityRank,
        id: &AbilityId,
    ) -> ToggleOutcome {
        let held_tier = set.get(id).and_then(|held| match held.kind {
            SelectionKind::Sphere { tier } => Some(tier),
            _ => None,
        });
        let proposed = match held_tier {
            Some(tier) => self.catalog.sphere_selection(id, tier),
            None => self.catalog.selection(id),
        };
        match proposed {
            Some(proposed) => self.toggle(set, lineage, rank, &proposed),
            None => {
                let rejection = match self.catalog.get(id) {
                    Some(_) => Rejection::NotSelectable { id: id.clone() },
                    None => Rejection::UnknownAbility { id: id.clone() },
                };
                ToggleOutcome {
                    set: set.clone(),
                    verdict: Verdict::Rejected(rejection),
                }
            }
        }
    }

    /// Empty set for the same lineage
    pub fn clear(&self, set: &SelectionSet) -> SelectionSet {
        set.cleared()
    }

    fn apply(
        &self,
        set: &SelectionSet,
        lineage: Lineage,
        rank: PriorityRank,
        proposed: &Selection,
    ) -> Result<SelectionSet, Rejection> {
        if set.lineage() != lineage {
            return Err(Rejection::LineageMismatch {
                expected: lineage,
                found: set.lineage(),
            });
        }
        let proposed = self.canonicalize(lineage, proposed)?;

        if let Some(floor) = self.catalog.get(&proposed.id).and_then(|d| d.min_rank) {
            if !set.contains(&proposed.id) && !rank.meets(Some(floor)) {
                return Err(Rejection::Ineligible {
                    id: proposed.id.clone(),
                    reason: format!("requires rank {} or better", floor),
                });
            }
        }

        let ctx = RuleContext {
            catalog: self.catalog,
            config: self.config,
            lineage,
            rank,
        };
        let next = match proposed.kind.clone() {
            SelectionKind::Tiered => tiered::toggle(&ctx, set, proposed),
            SelectionKind::Sphere { tier } => sorcery::toggle_sphere(&ctx, set, proposed, tier),
            SelectionKind::Move => sorcery::toggle_move(&ctx, set, proposed),
            SelectionKind::Evolution => evolution::toggle(&ctx, set, proposed),
            SelectionKind::MentalistArchetype => foundation::toggle_archetype(&ctx, set, proposed),
            SelectionKind::Polarity { .. } | SelectionKind::Scope { .. } => {
                foundation::toggle_choice(&ctx, set, proposed)
            }
            SelectionKind::GrantPick => foundation::toggle_pick(&ctx, set, proposed),
            SelectionKind::Package { .. } => package::toggle(&ctx, set, proposed),
        }?;

        check_budgets(lineage, rank, set, &next)?;
        Ok(next)
    }

    /// Rebuild the proposal from the catalog so costs and paths are trusted
    fn canonicalize(&self, lineage: Lineage, proposed: &Selection) -> Result<Selection, Rejection> {
        let unknown = || Rejection::UnknownAbility {
            id: proposed.id.clone(),
        };

        let canonical = match &proposed.kind {
            SelectionKind::Package { key } => {
                self.catalog.package_selection(key).ok_or_else(unknown)?
            }
            kind => {
                let def = self.catalog.get(&proposed.id).ok_or_else(unknown)?;
                if !def.is_selectable() {
                    return Err(Rejection::NotSelectable {
                        id: proposed.id.clone(),
                    });
                }
                match (kind, &def.role) {
                    (SelectionKind::Sphere { tier }, AbilityRole::Sphere) => {
                        self.catalog.sphere_selection(&def.id, *tier)
                    }
                    _ => self.catalog.selection(&def.id),
                }
                .ok_or_else(unknown)?
            }
        };

        if canonical.lineage != lineage {
            return Err(Rejection::LineageMismatch {
                expected: lineage,
                found: canonical.lineage,
            });
        }
        Ok(canonical)
    }

    // === QUERIES ===

    pub fn used(&self, set: &SelectionSet, budget: BudgetName) -> u32 {
        budget::used(set, budget)
    }

    pub fn ceiling(&self, lineage: Lineage, rank: PriorityRank, budget: BudgetName) -> Option<u32> {
        budget::ceiling(lineage, rank, budget)
    }

    pub fn budgets_for(&self, lineage: Lineage, rank: PriorityRank) -> Vec<(BudgetName, u32)> {
        budget::budgets_for(lineage, rank)
    }

    /// Remaining allowance floored at zero; None for uncapped attributes
    pub fn remaining(&self, set: &SelectionSet, rank: PriorityRank, budget: BudgetName) -> Option<u32> {
        self.ceiling(set.lineage(), rank, budget)
            .map(|c| c.saturating_sub(self.used(set, budget)))
    }

    pub fn report(&self, set: &SelectionSet, rank: PriorityRank) -> Vec<BudgetLine> {
        budget::report(set, rank)
    }

    pub fn warnings(&self, set: &SelectionSet, rank: PriorityRank) -> Vec<Warning> {
        budget::warnings(set, rank)
    }

    /// Abilities the character holds without selecting them directly
    ///
    /// Lineage core abilities, Mentalist grants implied by the foundational
    /// choices, and the powers of the selected Automata package.
    pub fn granted(&self, set: &SelectionSet) -> Vec<&'c AbilityDefinition> {
        let mut granted: Vec<&'c AbilityDefinition> =
            self.catalog.core_abilities(set.lineage()).collect();
        granted.extend(foundation::implied(self.catalog, set));
        granted.extend(package::powers(self.catalog, set));
        granted
    }

    pub fn candidates_for(
        &self,
        archetype: &str,
        polarity: Polarity,
        scope: Scope,
    ) -> Vec<&'c AbilityDefinition> {
        self.catalog.candidates_for(archetype, polarity, scope)
    }

    pub fn powers_for_package(&self, key: &PackageKey) -> Vec<&'c AbilityDefinition> {
        self.catalog.powers_for_package(key)
    }

    /// Structural violations in a set at a rank
    pub fn check(&self, set: &SelectionSet, rank: PriorityRank) -> Vec<Violation> {
        invariants::check(set, self.catalog, rank, self.config)
    }
}

/// Reject only if a summed budget grows past its ceiling
///
/// A toggle that leaves a budget unchanged or lower is allowed even when the
/// set is already over (after a rank decrease), so users can always shrink
/// their way back under.
fn check_budgets(
    lineage: Lineage,
    rank: PriorityRank,
    before: &SelectionSet,
    after: &SelectionSet,
) -> Result<(), Rejection> {
    for &name in budget::capped_budgets(lineage) {
        if name.measure() != Measure::Summed {
            continue;
        }
        let Some(limit) = budget::ceiling(lineage, rank, name) else {
            continue;
        };
        let was = budget::used(before, name);
        let now = budget::used(after, name);
        if now > was && now > limit {
            return Err(Rejection::BudgetExceeded {
                budget: name,
                requested: now,
                ceiling: limit,
            });
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::Harness;
    use super::*;

    #[test]
    fn test_rejected_toggle_returns_input_unchanged() {
        let h = Harness::new();
        let set = h.build(Lineage::Sorcery, PriorityRank::C, &["sorcery.creation"]);
        let outcome = h.toggle(&set, PriorityRank::C, "sorcery.destruction.blast");
        assert_eq!(outcome.set, set);
        assert_eq!(outcome.rejection().map(Rejection::code), Some("dependency_missing"));
    }

    #[test]
    fn test_lineage_mismatch() {
        let h = Harness::new();
        let set = SelectionSet::new(Lineage::NeoSapien);
        let outcome = h.engine().toggle(
            &set,
            Lineage::NeoSapien,
            PriorityRank::A,
            &h.proposal("chimera.carapace.1"),
        );
        assert!(matches!(
            outcome.rejection(),
            Some(Rejection::LineageMismatch {
                expected: Lineage::NeoSapien,
                found: Lineage::Chimera
            })
        ));

        let outcome = h.engine().toggle(
            &set,
            Lineage::Chimera,
            PriorityRank::A,
            &h.proposal("chimera.carapace.1"),
        );
        assert!(matches!(outcome.rejection(), Some(Rejection::LineageMismatch { .. })));
    }

    #[test]
    fn test_forged_cost_is_ignored() {
        let h = Harness::new();
        let mut forged = h.proposal("neo.reflex.4");
        forged.cost.insert("slots".into(), 0);
        let outcome = h.engine().toggle(
            &SelectionSet::new(Lineage::NeoSapien),
            Lineage::NeoSapien,
            PriorityRank::D,
            &forged,
        );
        assert_eq!(outcome.rejection().map(Rejection::code), Some("budget_exceeded"));
    }

    #[test]
    fn test_toggle_id_rejects_core_and_unknown() {
        let h = Harness::new();
        let set = SelectionSet::new(Lineage::NeoSapien);
        let core = h.engine().toggle_id(
            &set,
            Lineage::NeoSapien,
            PriorityRank::A,
            &AbilityId::from("neo.baseline.interface"),
        );
        assert_eq!(core.rejection().map(Rejection::code), Some("not_selectable"));

        let unknown = h.engine().toggle_id(
            &set,
            Lineage::NeoSapien,
            PriorityRank::A,
            &AbilityId::from("neo.telepathy.1"),
        );
        assert_eq!(unknown.rejection().map(Rejection::code), Some("unknown_ability"));
    }

    #[test]
    fn test_min_rank_eligibility() {
        let h = Harness::new();
        let set = SelectionSet::new(Lineage::Esper);
        let outcome = h.toggle(&set, PriorityRank::C, "esper.paragon");
        assert_eq!(outcome.rejection().map(Rejection::code), Some("ineligible"));
        assert!(h.toggle(&set, PriorityRank::B, "esper.paragon").is_applied());
    }

    #[test]
    fn test_shrinking_allowed_while_over_budget() {
        let h = Harness::new();
        let set = h.build(
            Lineage::NeoSapien,
            PriorityRank::A,
            &["neo.reflex.4", "neo.optics.3"],
        );
        // 7 slots used, rank C allows 5
        assert_eq!(h.engine().warnings(&set, PriorityRank::C).len(), 1);

        let lower = h.toggle(&set, PriorityRank::C, "neo.reflex.2");
        assert!(lower.is_applied());
        assert_eq!(h.engine().used(&lower.set, BudgetName::Slots), 5);

        // at rank D (3 slots) a downgrade to 5 is fine, growing back to 6 is not
        let shrunk = h.toggle(&set, PriorityRank::D, "neo.optics.1");
        assert!(shrunk.is_applied(), "{:?}", shrunk.verdict);
        let grow = h.toggle(&shrunk.set, PriorityRank::D, "neo.optics.2");
        assert_eq!(grow.rejection().map(Rejection::code), Some("budget_exceeded"));
    }

    #[test]
    fn test_granted_includes_core() {
        let h = Harness::new();
        let granted = h.engine().granted(&SelectionSet::new(Lineage::Chimera));
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].id.as_str(), "chimera.baseline.adaptive");
    }

    #[test]
    fn test_delta_reports_cascade() {
        let h = Harness::new();
        let set = h.build(
            Lineage::Sorcery,
            PriorityRank::A,
            &["sorcery.creation", "sorcery.creation.spark", "sorcery.creation.forge"],
        );
        let outcome = h.toggle(&set, PriorityRank::A, "sorcery.creation");
        match outcome.verdict {
            Verdict::Applied(delta) => {
                assert!(delta.added.is_empty());
                assert_eq!(delta.removed.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_remaining() {
        let h = Harness::new();
        let set = h.build(Lineage::Chimera, PriorityRank::B, &["chimera.venom.2"]);
        let engine = h.engine();
        assert_eq!(engine.remaining(&set, PriorityRank::B, BudgetName::MutationPoints), Some(6));
        assert_eq!(engine.remaining(&set, PriorityRank::B, BudgetName::PermanentCorruption), None);
    }
}
