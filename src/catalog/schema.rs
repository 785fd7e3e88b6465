//! Raw TOML shapes for catalog documents
//!
//! Every field is optional here. Entries are deserialized one at a time so
//! that a malformed entry is reported and skipped instead of failing the
//! whole document; `definition` turns raw entries into validated ones.

use serde::Deserialize;
use std::collections::BTreeMap;

/// A single `[[abilities]]` entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAbility {
    pub id: Option<String>,
    pub label: Option<String>,
    pub lineage: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub cost: BTreeMap<String, i64>,
    pub tier: Option<i64>,
    pub min_rank: Option<String>,
    pub subsystem: Option<String>,
    pub polarity: Option<String>,
    pub scope: Option<String>,
    pub chassis: Option<String>,
    pub branch: Option<String>,
    pub quality: Option<String>,
    #[serde(default)]
    pub general: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A single `[[chassis]]` entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChassis {
    pub id: Option<String>,
    pub label: Option<String>,
    #[serde(default)]
    pub branches: Vec<String>,
    pub max_quality: Option<String>,
}

/// A single `[[grants]]` entry; no scope means a polarity-level grant
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGrant {
    pub archetype: Option<String>,
    pub polarity: Option<String>,
    pub scope: Option<String>,
    #[serde(default)]
    pub abilities: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_entry_parses() {
        let value: toml::Value = toml::from_str("id = \"x\"").unwrap();
        let raw: RawAbility = value.try_into().unwrap();
        assert_eq!(raw.id.as_deref(), Some("x"));
        assert!(raw.path.is_empty());
        assert!(!raw.general);
    }

    #[test]
    fn test_wrong_field_type_fails_only_this_entry() {
        let value: toml::Value = toml::from_str("id = \"x\"\npath = 3").unwrap();
        assert!(value.try_into::<RawAbility>().is_err());
    }
}
