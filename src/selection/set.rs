//! Selections and the lineage-scoped selection set

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{AbilityId, Lineage, Subsystem};
use crate::selection::kind::{RuleFamily, SelectionKind};
use crate::selection::path::{AbilityPath, SegmentId};

/// Named cost attributes (`slots`, `mutation_points`, ...)
pub type CostMap = BTreeMap<String, u32>;

/// One acquired ability, with enough denormalized metadata to validate and
/// cascade without going back to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub id: AbilityId,
    pub lineage: Lineage,
    pub kind: SelectionKind,
    /// Esper subsystem the selection belongs to (None outside Esper)
    pub subsystem: Option<Subsystem>,
    pub cost: CostMap,
    pub path: AbilityPath,
    pub root: SegmentId,
    pub depth: usize,
}

impl Selection {
    pub fn new(
        id: AbilityId,
        lineage: Lineage,
        kind: SelectionKind,
        subsystem: Option<Subsystem>,
        cost: CostMap,
        path: AbilityPath,
    ) -> Self {
        let root = path.root();
        let depth = path.depth();
        Self {
            id,
            lineage,
            kind,
            subsystem,
            cost,
            path,
            root,
            depth,
        }
    }

    pub fn family(&self) -> RuleFamily {
        self.kind.family()
    }

    /// Amount of a cost attribute (0 if absent)
    pub fn cost_of(&self, attribute: &str) -> u32 {
        self.cost.get(attribute).copied().unwrap_or(0)
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }
}

/// The acquired abilities for one lineage
///
/// Values are never mutated in place by the engine: every operation returns
/// a new set. Insertion order is preserved so that replaying the same
/// toggles yields identical sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    lineage: Lineage,
    selections: Vec<Selection>,
}

impl SelectionSet {
    /// Create an empty set for a lineage
    pub fn new(lineage: Lineage) -> Self {
        Self {
            lineage,
            selections: Vec::new(),
        }
    }

    pub fn lineage(&self) -> Lineage {
        self.lineage
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selection> {
        self.selections.iter()
    }

    pub fn contains(&self, id: &AbilityId) -> bool {
        self.selections.iter().any(|s| &s.id == id)
    }

    pub fn get(&self, id: &AbilityId) -> Option<&Selection> {
        self.selections.iter().find(|s| &s.id == id)
    }

    pub fn ids(&self) -> Vec<&AbilityId> {
        self.selections.iter().map(|s| &s.id).collect()
    }

    /// Selections under a root segment
    pub fn under_root(&self, root: SegmentId) -> impl Iterator<Item = &Selection> {
        self.selections.iter().filter(move |s| s.root == root)
    }

    /// First selection matching a predicate
    pub fn find(&self, pred: impl Fn(&Selection) -> bool) -> Option<&Selection> {
        self.selections.iter().find(|s| pred(s))
    }

    /// Sum of one cost attribute across the set
    ///
    /// Saturates at `u32::MAX`.
    pub fn total(&self, attribute: &str) -> u32 {
        self.selections
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.cost_of(attribute)))
    }

    /// Empty set for the same lineage
    pub fn cleared(&self) -> Self {
        Self::new(self.lineage)
    }

    /// Empty set for another lineage; nothing carries across
    pub fn switch_lineage(&self, lineage: Lineage) -> Self {
        Self::new(lineage)
    }

    /// Copy of the set without the selections matching `pred`
    pub(crate) fn without(&self, pred: impl Fn(&Selection) -> bool) -> Self {
        Self {
            lineage: self.lineage,
            selections: self
                .selections
                .iter()
                .filter(|s| !pred(s))
                .cloned()
                .collect(),
        }
    }

    /// Append a selection (callers guarantee id uniqueness)
    pub(crate) fn with(mut self, selection: Selection) -> Self {
        self.selections.push(selection);
        self
    }

    /// Replace a selection in place, keeping its position
    pub(crate) fn replacing(&self, selection: Selection) -> Self {
        Self {
            lineage: self.lineage,
            selections: self
                .selections
                .iter()
                .map(|s| {
                    if s.id == selection.id {
                        selection.clone()
                    } else {
                        s.clone()
                    }
                })
                .collect(),
        }
    }
}
