//! Ability catalog adapter
//!
//! The catalog is supplied by an external content pipeline as TOML. It is
//! consumed read-only: malformed entries are excluded and reported, never
//! fatal.

pub mod definition;
pub mod registry;
pub mod schema;

pub use definition::{AbilityDefinition, AbilityRole, CatalogIssue, Chassis};
pub use registry::{AbilityCatalog, CatalogBuilder};
