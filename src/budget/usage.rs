//! Budget usage, remaining balances and over-budget warnings

use serde::Serialize;

use crate::budget::table::{capped_budgets, ceiling, tracked_attributes, BudgetName, Measure};
use crate::core::types::PriorityRank;
use crate::selection::{Quality, RuleFamily, SelectionKind, SelectionSet};

/// Current usage of a budget
///
/// Summed budgets add up the matching cost attribute. Ordinal budgets report
/// the deepest evolution depth (`depth_limit`) or the selected package's
/// quality ordinal (`quality_ceiling`), 0 when nothing applies.
pub fn used(set: &SelectionSet, budget: BudgetName) -> u32 {
    match budget.measure() {
        Measure::Summed => set.total(budget.as_str()),
        Measure::Ordinal => match budget {
            BudgetName::DepthLimit => set
                .iter()
                .filter(|s| s.family() == RuleFamily::Evolution)
                .map(|s| s.depth as u32)
                .max()
                .unwrap_or(0),
            BudgetName::QualityCeiling => selected_quality(set).map_or(0, |q| q.ordinal()),
            _ => 0,
        },
    }
}

fn selected_quality(set: &SelectionSet) -> Option<Quality> {
    set.iter().find_map(|s| match &s.kind {
        SelectionKind::Package { key } => Some(key.quality),
        _ => None,
    })
}

/// One row of a budget report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetLine {
    pub budget: BudgetName,
    /// None for tracked, uncapped attributes
    pub ceiling: Option<u32>,
    pub used: u32,
}

impl BudgetLine {
    /// Remaining allowance floored at zero for display
    pub fn remaining(&self) -> Option<u32> {
        self.ceiling.map(|c| c.saturating_sub(self.used))
    }

    /// Signed balance; negative when a rank decrease left the set over budget
    pub fn balance(&self) -> Option<i64> {
        self.ceiling.map(|c| c as i64 - self.used as i64)
    }

    pub fn is_over(&self) -> bool {
        self.ceiling.map_or(false, |c| self.used > c)
    }
}

/// Usage of every capped budget and tracked attribute for the set's lineage
pub fn report(set: &SelectionSet, rank: PriorityRank) -> Vec<BudgetLine> {
    let lineage = set.lineage();
    capped_budgets(lineage)
        .iter()
        .chain(tracked_attributes(lineage))
        .map(|budget| BudgetLine {
            budget: *budget,
            ceiling: ceiling(lineage, rank, *budget),
            used: used(set, *budget),
        })
        .collect()
}

/// Conditions a host should surface after a rank decrease
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum Warning {
    OverBudget {
        budget: BudgetName,
        used: u32,
        ceiling: u32,
    },
    DepthBeyondLimit {
        depth: u32,
        limit: u32,
    },
    LockedQuality {
        quality: Quality,
        ceiling: u32,
    },
}

/// Warn-only view: the engine never trims selections retroactively
pub fn warnings(set: &SelectionSet, rank: PriorityRank) -> Vec<Warning> {
    report(set, rank)
        .into_iter()
        .filter(BudgetLine::is_over)
        .filter_map(|line| {
            let ceiling = line.ceiling?;
            Some(match line.budget {
                BudgetName::DepthLimit => Warning::DepthBeyondLimit {
                    depth: line.used,
                    limit: ceiling,
                },
                BudgetName::QualityCeiling => Warning::LockedQuality {
                    quality: selected_quality(set)?,
                    ceiling,
                },
                budget => Warning::OverBudget {
                    budget,
                    used: line.used,
                    ceiling,
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_balance_and_remaining() {
        let line = BudgetLine {
            budget: BudgetName::Slots,
            ceiling: Some(5),
            used: 7,
        };
        assert_eq!(line.remaining(), Some(0));
        assert_eq!(line.balance(), Some(-2));
        assert!(line.is_over());

        let tracked = BudgetLine {
            budget: BudgetName::Strain,
            ceiling: None,
            used: 40,
        };
        assert_eq!(tracked.remaining(), None);
        assert!(!tracked.is_over());
    }

    #[test]
    fn test_empty_set_reports_zero_usage() {
        let set = SelectionSet::new(crate::core::types::Lineage::Chimera);
        let rows = report(&set, PriorityRank::B);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.used == 0));
        assert_eq!(rows[0].ceiling, Some(9));
        assert_eq!(rows[1].budget, BudgetName::PermanentCorruption);
        assert!(warnings(&set, PriorityRank::E).is_empty());
    }
}
