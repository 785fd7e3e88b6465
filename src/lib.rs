//! Lineage Forge - Character Ability Allocation Engine
//!
//! Validates and applies ability selections for five lineages, each under
//! its own rule family: flat tiers (NeoSapien, Chimera), spheres and moves
//! (Sorcery), evolution trees and combinatorial grants (Esper), and atomic
//! packages (Automata).

pub mod budget;
pub mod catalog;
pub mod core;
pub mod engine;
pub mod replay;
pub mod selection;

pub use crate::catalog::{AbilityCatalog, CatalogBuilder};
pub use crate::core::{AbilityId, EngineConfig, ForgeError, Lineage, PriorityRank, Result};
pub use crate::engine::{AllocationEngine, Delta, Rejection, ToggleOutcome, Verdict};
pub use crate::selection::{Selection, SelectionKind, SelectionSet};
