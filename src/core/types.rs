//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an ability definition
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(pub String);

impl AbilityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AbilityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The five mutually exclusive ability systems a character may draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Lineage {
    NeoSapien,
    Chimera,
    Sorcery,
    Esper,
    Automata,
}

impl Lineage {
    pub const ALL: [Lineage; 5] = [
        Lineage::NeoSapien,
        Lineage::Chimera,
        Lineage::Sorcery,
        Lineage::Esper,
        Lineage::Automata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lineage::NeoSapien => "neosapien",
            Lineage::Chimera => "chimera",
            Lineage::Sorcery => "sorcery",
            Lineage::Esper => "esper",
            Lineage::Automata => "automata",
        }
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lineage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Lineage::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown lineage '{}'", s))
    }
}

impl TryFrom<String> for Lineage {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Priority rank assigned to the lineage category (A = highest privilege)
///
/// Variants are declared lowest first so that the derived ordering gives
/// `A > B > C > D > E`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PriorityRank {
    E,
    D,
    C,
    B,
    A,
}

impl PriorityRank {
    /// Highest to lowest
    pub const ALL: [PriorityRank; 5] = [
        PriorityRank::A,
        PriorityRank::B,
        PriorityRank::C,
        PriorityRank::D,
        PriorityRank::E,
    ];

    /// Column index into the per-rank budget tables (A = 0)
    pub fn table_index(&self) -> usize {
        match self {
            PriorityRank::A => 0,
            PriorityRank::B => 1,
            PriorityRank::C => 2,
            PriorityRank::D => 3,
            PriorityRank::E => 4,
        }
    }

    /// Returns true if this rank outranks the other
    pub fn outranks(&self, other: &PriorityRank) -> bool {
        self > other
    }

    /// True if this rank meets an optional eligibility floor
    pub fn meets(&self, floor: Option<PriorityRank>) -> bool {
        floor.map_or(true, |min| *self >= min)
    }
}

impl fmt::Display for PriorityRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            PriorityRank::A => "A",
            PriorityRank::B => "B",
            PriorityRank::C => "C",
            PriorityRank::D => "D",
            PriorityRank::E => "E",
        };
        f.write_str(letter)
    }
}

impl FromStr for PriorityRank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(PriorityRank::A),
            "B" => Ok(PriorityRank::B),
            "C" => Ok(PriorityRank::C),
            "D" => Ok(PriorityRank::D),
            "E" => Ok(PriorityRank::E),
            _ => Err(format!("unknown priority rank '{}'", s)),
        }
    }
}

impl TryFrom<String> for PriorityRank {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Parallel ability systems hosted by the Esper lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    /// Archetype evolution trees
    Evolution,
    /// Foundational polarity/scope grants
    Mentalist,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_ordering() {
        assert!(PriorityRank::A.outranks(&PriorityRank::B));
        assert!(PriorityRank::D.outranks(&PriorityRank::E));
        assert!(!PriorityRank::C.outranks(&PriorityRank::C));
        assert_eq!(PriorityRank::ALL.iter().max(), Some(&PriorityRank::A));
    }

    #[test]
    fn test_rank_meets_floor() {
        assert!(PriorityRank::B.meets(Some(PriorityRank::C)));
        assert!(PriorityRank::C.meets(Some(PriorityRank::C)));
        assert!(!PriorityRank::D.meets(Some(PriorityRank::C)));
        assert!(PriorityRank::E.meets(None));
    }

    #[test]
    fn test_rank_parse_roundtrip() {
        for rank in PriorityRank::ALL {
            assert_eq!(rank.to_string().parse::<PriorityRank>(), Ok(rank));
        }
        assert_eq!("b".parse::<PriorityRank>(), Ok(PriorityRank::B));
        assert!("F".parse::<PriorityRank>().is_err());
    }

    #[test]
    fn test_lineage_parse() {
        assert_eq!("Sorcery".parse::<Lineage>(), Ok(Lineage::Sorcery));
        assert_eq!("neosapien".parse::<Lineage>(), Ok(Lineage::NeoSapien));
        assert!("dragon".parse::<Lineage>().is_err());
    }

    #[test]
    fn test_lineage_serde_lowercase() {
        let json = serde_json::to_string(&Lineage::NeoSapien).unwrap();
        assert_eq!(json, "\"neosapien\"");
    }

    #[test]
    fn test_deserialize_ignores_case() {
        let lineage: Lineage = serde_json::from_str("\"NeoSapien\"").unwrap();
        assert_eq!(lineage, Lineage::NeoSapien);
        let rank: PriorityRank = serde_json::from_str("\"b\"").unwrap();
        assert_eq!(rank, PriorityRank::B);
        assert!(serde_json::from_str::<PriorityRank>("\"F\"").is_err());
    }
}
