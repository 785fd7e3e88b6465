//! Selection data model
//!
//! A `SelectionSet` is the authoritative list of acquired abilities for one
//! lineage. Each `Selection` carries its rule-family kind, cost attributes
//! and interned path so that the engine can validate and cascade without
//! re-querying the catalog.

pub mod kind;
pub mod path;
pub mod set;

pub use kind::{PackageKey, Polarity, Quality, RuleFamily, Scope, SelectionKind, SphereTier};
pub use path::{AbilityPath, SegmentArena, SegmentId};
pub use set::{CostMap, Selection, SelectionSet};
