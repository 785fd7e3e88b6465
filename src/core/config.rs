//! Engine configuration
//!
//! Budget ceilings live in `budget::table`; this holds the rule switches
//! that are a matter of design intent rather than fixed tables.

use serde::Deserialize;

use crate::core::error::{ForgeError, Result};
use crate::core::types::PriorityRank;

/// Configuration for the allocation engine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ranks at which the Esper lineage may hold both subsystems at once
    ///
    /// At a dual rank, choosing a new root in one subsystem (evolution or
    /// mentalist) only clears that subsystem. At every other rank a new
    /// root clears the whole Esper selection set.
    pub dual_ranks: Vec<PriorityRank>,

    /// Maximum number of steps accepted by a single replay script
    ///
    /// Guards the CLI against runaway generated scripts. The engine itself
    /// has no step limit.
    pub max_replay_steps: usize,

    /// Maximum evolution depth any catalog entry may declare
    ///
    /// Entries deeper than this are reported as malformed and excluded.
    pub max_path_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dual_ranks: vec![PriorityRank::A],
            max_replay_steps: 10_000,
            max_path_depth: 8,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing keys fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// True if the rank lets Esper hold both subsystems simultaneously
    pub fn is_dual_rank(&self, rank: PriorityRank) -> bool {
        self.dual_ranks.contains(&rank)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_path_depth == 0 {
            return Err(ForgeError::ConfigError(
                "max_path_depth must be at least 1".into(),
            ));
        }

        if self.max_replay_steps == 0 {
            return Err(ForgeError::ConfigError(
                "max_replay_steps must be positive".into(),
            ));
        }

        let mut seen = Vec::with_capacity(self.dual_ranks.len());
        for rank in &self.dual_ranks {
            if seen.contains(rank) {
                return Err(ForgeError::ConfigError(format!(
                    "dual rank {} listed twice",
                    rank
                )));
            }
            seen.push(*rank);
        }

        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Get the global engine config (initializes with defaults if not set)
pub fn config() -> &'static EngineConfig {
    CONFIG.get_or_init(EngineConfig::default)
}

/// Set the global engine config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: EngineConfig) -> std::result::Result<(), EngineConfig> {
    CONFIG.set(config)
}
