//! Budget ceilings and usage
//!
//! Ceilings are a pure lookup from (lineage, rank). Usage is derived from a
//! selection set on demand; nothing is cached.

pub mod table;
pub mod usage;

pub use table::{
    budgets_for, capped_budgets, ceiling, tier_budget, tracked_attributes, BudgetName, Measure,
};
pub use usage::{report, used, warnings, BudgetLine, Warning};
