//! In-memory character draft
//!
//! Holds what a host document would: the lineage, its rank and the current
//! selection set. All rule decisions go through the engine; the draft only
//! stores results.

use serde::Serialize;

use crate::budget::Warning;
use crate::core::types::{AbilityId, Lineage, PriorityRank};
use crate::engine::{AllocationEngine, Verdict};
use crate::selection::{Selection, SelectionSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterDraft {
    lineage: Lineage,
    rank: PriorityRank,
    selections: SelectionSet,
}

impl CharacterDraft {
    pub fn new(lineage: Lineage, rank: PriorityRank) -> Self {
        Self {
            lineage,
            rank,
            selections: SelectionSet::new(lineage),
        }
    }

    pub fn lineage(&self) -> Lineage {
        self.lineage
    }

    pub fn rank(&self) -> PriorityRank {
        self.rank
    }

    pub fn selections(&self) -> &SelectionSet {
        &self.selections
    }

    /// Switch lineage; selections never carry across
    pub fn set_lineage(&mut self, lineage: Lineage) {
        self.lineage = lineage;
        self.selections = self.selections.switch_lineage(lineage);
    }

    /// Change rank, keeping every selection
    ///
    /// Returns the warnings the new rank raises. Nothing is trimmed.
    pub fn set_rank(&mut self, engine: &AllocationEngine<'_>, rank: PriorityRank) -> Vec<Warning> {
        self.rank = rank;
        let warnings = engine.warnings(&self.selections, rank);
        for warning in &warnings {
            tracing::warn!(rank = %rank, ?warning, "selection set exceeds rank limits");
        }
        warnings
    }

    pub fn toggle(&mut self, engine: &AllocationEngine<'_>, proposed: &Selection) -> Verdict {
        let outcome = engine.toggle(&self.selections, self.lineage, self.rank, proposed);
        self.selections = outcome.set;
        outcome.verdict
    }

    pub fn toggle_id(&mut self, engine: &AllocationEngine<'_>, id: &AbilityId) -> Verdict {
        let outcome = engine.toggle_id(&self.selections, self.lineage, self.rank, id);
        self.selections = outcome.set;
        outcome.verdict
    }

    pub fn clear(&mut self, engine: &AllocationEngine<'_>) {
        self.selections = engine.clear(&self.selections);
    }
}
