pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{ForgeError, Result};
pub use types::{AbilityId, Lineage, PriorityRank, Subsystem};
