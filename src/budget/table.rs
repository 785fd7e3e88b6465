//! Per-lineage, per-rank ceiling tables
//!
//! Columns are ranks A..E. A ceiling of zero means nothing can be allocated
//! at that rank; it never means unlimited. Uncapped attributes are listed
//! separately so they can be accumulated for display.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::types::{Lineage, PriorityRank};

/// A named budget family or tracked attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetName {
    Slots,
    MutationPoints,
    PrimarySpheres,
    SecondarySpheres,
    Moves,
    DepthLimit,
    QualityCeiling,
    Strain,
    PermanentCorruption,
}

/// How usage of a budget is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Sum of the matching cost attribute across the set
    Summed,
    /// Highest ordinal reached (evolution depth, package quality)
    Ordinal,
}

impl BudgetName {
    pub const ALL: [BudgetName; 9] = [
        BudgetName::Slots,
        BudgetName::MutationPoints,
        BudgetName::PrimarySpheres,
        BudgetName::SecondarySpheres,
        BudgetName::Moves,
        BudgetName::DepthLimit,
        BudgetName::QualityCeiling,
        BudgetName::Strain,
        BudgetName::PermanentCorruption,
    ];

    /// Cost attribute key used in catalog entries and selections
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetName::Slots => "slots",
            BudgetName::MutationPoints => "mutation_points",
            BudgetName::PrimarySpheres => "primary_spheres",
            BudgetName::SecondarySpheres => "secondary_spheres",
            BudgetName::Moves => "moves",
            BudgetName::DepthLimit => "depth_limit",
            BudgetName::QualityCeiling => "quality_ceiling",
            BudgetName::Strain => "strain",
            BudgetName::PermanentCorruption => "permanent_corruption",
        }
    }

    pub fn measure(&self) -> Measure {
        match self {
            BudgetName::DepthLimit | BudgetName::QualityCeiling => Measure::Ordinal,
            _ => Measure::Summed,
        }
    }
}

impl fmt::Display for BudgetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BudgetName::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| format!("unknown budget '{}'", s))
    }
}

// === CEILING TABLES (A, B, C, D, E) ===

const NEOSAPIEN_SLOTS: [u32; 5] = [10, 7, 5, 3, 0];

const CHIMERA_MUTATION_POINTS: [u32; 5] = [12, 9, 6, 4, 0];

const SORCERY_PRIMARY_SPHERES: [u32; 5] = [2, 1, 1, 1, 0];
const SORCERY_SECONDARY_SPHERES: [u32; 5] = [2, 2, 1, 0, 0];
const SORCERY_MOVES: [u32; 5] = [12, 9, 6, 4, 0];

/// Deepest evolution stage reachable; 0 still permits archetype roots
const ESPER_DEPTH_LIMIT: [u32; 5] = [3, 2, 2, 1, 0];

/// Highest unlocked quality ordinal (Basic = 1); 0 unlocks nothing
const AUTOMATA_QUALITY_CEILING: [u32; 5] = [4, 3, 2, 1, 0];

/// Budget families with a ceiling for a lineage
pub fn capped_budgets(lineage: Lineage) -> &'static [BudgetName] {
    match lineage {
        Lineage::NeoSapien => &[BudgetName::Slots],
        Lineage::Chimera => &[BudgetName::MutationPoints],
        Lineage::Sorcery => &[
            BudgetName::PrimarySpheres,
            BudgetName::SecondarySpheres,
            BudgetName::Moves,
        ],
        Lineage::Esper => &[BudgetName::DepthLimit],
        Lineage::Automata => &[BudgetName::QualityCeiling],
    }
}

/// Attributes accumulated for display but never capped
pub fn tracked_attributes(lineage: Lineage) -> &'static [BudgetName] {
    match lineage {
        Lineage::NeoSapien => &[BudgetName::Strain],
        Lineage::Chimera => &[BudgetName::PermanentCorruption],
        Lineage::Sorcery | Lineage::Esper | Lineage::Automata => &[],
    }
}

/// Ceiling for one budget, or None if the lineage does not cap it
pub fn ceiling(lineage: Lineage, rank: PriorityRank, budget: BudgetName) -> Option<u32> {
    let table = match (lineage, budget) {
        (Lineage::NeoSapien, BudgetName::Slots) => &NEOSAPIEN_SLOTS,
        (Lineage::Chimera, BudgetName::MutationPoints) => &CHIMERA_MUTATION_POINTS,
        (Lineage::Sorcery, BudgetName::PrimarySpheres) => &SORCERY_PRIMARY_SPHERES,
        (Lineage::Sorcery, BudgetName::SecondarySpheres) => &SORCERY_SECONDARY_SPHERES,
        (Lineage::Sorcery, BudgetName::Moves) => &SORCERY_MOVES,
        (Lineage::Esper, BudgetName::DepthLimit) => &ESPER_DEPTH_LIMIT,
        (Lineage::Automata, BudgetName::QualityCeiling) => &AUTOMATA_QUALITY_CEILING,
        _ => return None,
    };
    Some(table[rank.table_index()])
}

/// All ceilings for a lineage at a rank, in table order
pub fn budgets_for(lineage: Lineage, rank: PriorityRank) -> Vec<(BudgetName, u32)> {
    capped_budgets(lineage)
        .iter()
        .filter_map(|b| ceiling(lineage, rank, *b).map(|c| (*b, c)))
        .collect()
}

/// Capped attribute that a flat tier's number defaults to
pub fn tier_budget(lineage: Lineage) -> Option<BudgetName> {
    match lineage {
        Lineage::NeoSapien => Some(BudgetName::Slots),
        Lineage::Chimera => Some(BudgetName::MutationPoints),
        _ => None,
    }
}
