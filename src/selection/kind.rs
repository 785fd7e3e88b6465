//! Rule-family discriminants carried by every selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five constraint models that govern selections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFamily {
    /// Flat radio-group tiers (NeoSapien augments, Chimera mutations)
    Tiered,
    /// Spheres and their moves
    Sorcery,
    /// Esper archetype evolution trees
    Evolution,
    /// Mentalist foundational choices and grants
    Foundation,
    /// Automata chassis packages
    Package,
}

/// Which sphere ceiling a sphere selection occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SphereTier {
    Primary,
    Secondary,
}

impl SphereTier {
    pub fn other(&self) -> SphereTier {
        match self {
            SphereTier::Primary => SphereTier::Secondary,
            SphereTier::Secondary => SphereTier::Primary,
        }
    }
}

/// First foundational choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Receiver,
    Transmitter,
}

impl FromStr for Polarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "receiver" => Ok(Polarity::Receiver),
            "transmitter" => Ok(Polarity::Transmitter),
            _ => Err(format!("unknown polarity '{}'", s)),
        }
    }
}

/// Second foundational choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Aural,
    Contact,
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aural" => Ok(Scope::Aural),
            "contact" => Ok(Scope::Contact),
            _ => Err(format!("unknown scope '{}'", s)),
        }
    }
}

/// Package quality on the fixed ordering Basic < Standard < Advanced < Superior
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Basic,
    Standard,
    Advanced,
    Superior,
}

impl Quality {
    pub const ALL: [Quality; 4] = [
        Quality::Basic,
        Quality::Standard,
        Quality::Advanced,
        Quality::Superior,
    ];

    /// Position on the quality ordering (Basic = 1)
    pub fn ordinal(&self) -> u32 {
        match self {
            Quality::Basic => 1,
            Quality::Standard => 2,
            Quality::Advanced => 3,
            Quality::Superior => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Basic => "basic",
            Quality::Standard => "standard",
            Quality::Advanced => "advanced",
            Quality::Superior => "superior",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quality::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown quality '{}'", s))
    }
}

/// An Automata package: chassis × branch × quality
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageKey {
    pub chassis: String,
    pub branch: String,
    pub quality: Quality,
}

impl PackageKey {
    pub fn new(chassis: impl Into<String>, branch: impl Into<String>, quality: Quality) -> Self {
        Self {
            chassis: chassis.into(),
            branch: branch.into(),
            quality,
        }
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.chassis, self.branch, self.quality)
    }
}

impl FromStr for PackageKey {
    type Err = String;

    /// Parses `chassis/branch/quality`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [chassis, branch, quality] if !chassis.is_empty() && !branch.is_empty() => {
                Ok(PackageKey::new(*chassis, *branch, quality.parse()?))
            }
            _ => Err(format!("expected chassis/branch/quality, got '{}'", s)),
        }
    }
}

/// Role of a selection within its rule family
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionKind {
    /// One tier under a flat tiered root
    Tiered,
    /// A sorcery sphere occupying a primary or secondary slot
    Sphere { tier: SphereTier },
    /// A move beneath a sphere
    Move,
    /// An Esper archetype root (depth 0) or evolution stage
    Evolution,
    /// A Mentalist archetype root
    MentalistArchetype,
    Polarity { polarity: Polarity },
    Scope { scope: Scope },
    /// Explicit pick among several combination candidates
    GrantPick,
    Package { key: PackageKey },
}

impl SelectionKind {
    pub fn family(&self) -> RuleFamily {
        match self {
            SelectionKind::Tiered => RuleFamily::Tiered,
            SelectionKind::Sphere { .. } | SelectionKind::Move => RuleFamily::Sorcery,
            SelectionKind::Evolution => RuleFamily::Evolution,
            SelectionKind::MentalistArchetype
            | SelectionKind::Polarity { .. }
            | SelectionKind::Scope { .. }
            | SelectionKind::GrantPick => RuleFamily::Foundation,
            SelectionKind::Package { .. } => RuleFamily::Package,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_dispatch_is_exhaustive() {
        assert_eq!(SelectionKind::Tiered.family(), RuleFamily::Tiered);
        assert_eq!(SelectionKind::Move.family(), RuleFamily::Sorcery);
        assert_eq!(
            SelectionKind::Sphere { tier: SphereTier::Secondary }.family(),
            RuleFamily::Sorcery
        );
        assert_eq!(SelectionKind::GrantPick.family(), RuleFamily::Foundation);
        let key = PackageKey::new("warden", "bulwark", Quality::Basic);
        assert_eq!(SelectionKind::Package { key }.family(), RuleFamily::Package);
    }

    #[test]
    fn test_quality_ordering() {
        assert!(Quality::Basic < Quality::Standard);
        assert!(Quality::Advanced < Quality::Superior);
        assert_eq!(Quality::Superior.ordinal(), 4);
    }

    #[test]
    fn test_package_key_parse() {
        let key: PackageKey = "warden/bulwark/advanced".parse().unwrap();
        assert_eq!(key, PackageKey::new("warden", "bulwark", Quality::Advanced));
        assert_eq!(key.to_string(), "warden/bulwark/advanced");
        assert!("warden/bulwark".parse::<PackageKey>().is_err());
        assert!("warden/bulwark/shiny".parse::<PackageKey>().is_err());
    }

    #[test]
    fn test_sphere_tier_other() {
        assert_eq!(SphereTier::Primary.other(), SphereTier::Secondary);
        assert_eq!(SphereTier::Secondary.other(), SphereTier::Primary);
    }
}
