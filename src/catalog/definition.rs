//! Validated ability definitions
//!
//! `AbilityDefinition::from_raw` is the single place where catalog entries
//! are checked. Anything it rejects is excluded from the selectable universe.

use serde::Serialize;
use std::fmt;

use crate::budget::tier_budget;
use crate::catalog::schema::{RawAbility, RawChassis};
use crate::core::types::{AbilityId, Lineage, PriorityRank, Subsystem};
use crate::selection::{AbilityPath, CostMap, Polarity, Quality, Scope, SegmentArena};

/// What an ability is within its lineage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum AbilityRole {
    Tier {
        tier: u32,
    },
    Sphere,
    Move,
    Evolution,
    MentalistArchetype,
    Polarity {
        polarity: Polarity,
    },
    Scope {
        scope: Scope,
    },
    /// Derived ability reached through foundational choices
    Grant,
    /// Member of an Automata package, never selected directly
    PackagePower {
        chassis: String,
        branch: Option<String>,
        quality: Option<Quality>,
        general: bool,
    },
    /// Lineage-wide ability, always granted
    Core,
}

impl AbilityRole {
    fn allowed_in(&self, lineage: Lineage) -> bool {
        match self {
            AbilityRole::Core => true,
            AbilityRole::Tier { .. } => {
                matches!(lineage, Lineage::NeoSapien | Lineage::Chimera)
            }
            AbilityRole::Sphere | AbilityRole::Move => lineage == Lineage::Sorcery,
            AbilityRole::Evolution
            | AbilityRole::MentalistArchetype
            | AbilityRole::Polarity { .. }
            | AbilityRole::Scope { .. }
            | AbilityRole::Grant => lineage == Lineage::Esper,
            AbilityRole::PackagePower { .. } => lineage == Lineage::Automata,
        }
    }

    /// Esper subsystem implied by the role
    fn subsystem(&self) -> Option<Subsystem> {
        match self {
            AbilityRole::Evolution => Some(Subsystem::Evolution),
            AbilityRole::MentalistArchetype
            | AbilityRole::Polarity { .. }
            | AbilityRole::Scope { .. }
            | AbilityRole::Grant => Some(Subsystem::Mentalist),
            _ => None,
        }
    }

    /// Required path depth for the role, if fixed
    fn required_depth(&self) -> Option<usize> {
        match self {
            AbilityRole::Sphere | AbilityRole::MentalistArchetype => Some(0),
            AbilityRole::Tier { .. }
            | AbilityRole::Move
            | AbilityRole::Polarity { .. }
            | AbilityRole::Scope { .. } => Some(1),
            _ => None,
        }
    }
}

/// A read-only ability from the content catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbilityDefinition {
    pub id: AbilityId,
    pub label: String,
    pub lineage: Lineage,
    pub role: AbilityRole,
    pub subsystem: Option<Subsystem>,
    pub cost: CostMap,
    pub path: AbilityPath,
    /// Lowest rank at which the ability may be chosen
    pub min_rank: Option<PriorityRank>,
    pub tags: Vec<String>,
}

impl AbilityDefinition {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Always granted, never user-toggled
    pub fn is_core(&self) -> bool {
        self.role == AbilityRole::Core || self.has_tag("core")
    }

    /// Can be proposed to the engine directly
    pub fn is_selectable(&self) -> bool {
        !self.is_core() && !matches!(self.role, AbilityRole::PackagePower { .. })
    }

    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    /// Validate a raw entry, interning its path into the arena
    pub fn from_raw(
        raw: RawAbility,
        default_lineage: Option<Lineage>,
        max_depth: usize,
        arena: &mut SegmentArena,
    ) -> Result<Self, String> {
        let id = raw
            .id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or("missing id")?;

        let lineage = match raw.lineage.as_deref() {
            Some(s) => s.parse::<Lineage>()?,
            None => default_lineage.ok_or("missing lineage")?,
        };

        let role_name = raw.role.as_deref().ok_or("missing role")?;
        let role = parse_role(role_name, &raw)?;
        if !role.allowed_in(lineage) {
            return Err(format!("role '{}' not valid for {}", role_name, lineage));
        }

        if raw.path.is_empty() {
            return Err("empty path".into());
        }
        if raw.path.iter().any(|s| s.trim().is_empty()) {
            return Err("blank path segment".into());
        }
        if raw.path.len() - 1 > max_depth {
            return Err(format!("path depth {} exceeds {}", raw.path.len() - 1, max_depth));
        }
        if let Some(depth) = role.required_depth() {
            if raw.path.len() - 1 != depth {
                return Err(format!(
                    "role '{}' requires depth {}, got {}",
                    role_name,
                    depth,
                    raw.path.len() - 1
                ));
            }
        }

        let subsystem = match (raw.subsystem.as_deref(), role.subsystem()) {
            (None, implied) => implied,
            (Some(declared), implied) => {
                let declared = parse_subsystem(declared)?;
                if implied != Some(declared) {
                    return Err(format!("subsystem '{:?}' conflicts with role", declared));
                }
                Some(declared)
            }
        };

        let mut cost = CostMap::new();
        for (name, amount) in raw.cost {
            let amount = u32::try_from(amount)
                .map_err(|_| format!("cost '{}' must be a non-negative integer", name))?;
            cost.insert(name, amount);
        }
        if let (AbilityRole::Tier { tier }, Some(budget)) = (&role, tier_budget(lineage)) {
            cost.entry(budget.as_str().to_string()).or_insert(*tier);
        }

        let min_rank = raw
            .min_rank
            .as_deref()
            .map(str::parse::<PriorityRank>)
            .transpose()?;

        let segments = raw.path.iter().map(|s| arena.intern(s)).collect();
        let path = AbilityPath::new(segments).ok_or("empty path")?;

        Ok(Self {
            label: raw.label.unwrap_or_else(|| id.clone()),
            id: AbilityId(id),
            lineage,
            role,
            subsystem,
            cost,
            path,
            min_rank,
            tags: raw.tags,
        })
    }
}

fn parse_role(name: &str, raw: &RawAbility) -> Result<AbilityRole, String> {
    let role = match name {
        "tier" => {
            let tier = raw.tier.ok_or("tier role without tier number")?;
            let tier = u32::try_from(tier)
                .ok()
                .filter(|t| *t >= 1)
                .ok_or("tier number must be at least 1")?;
            AbilityRole::Tier { tier }
        }
        "sphere" => AbilityRole::Sphere,
        "move" => AbilityRole::Move,
        "evolution" => AbilityRole::Evolution,
        "mentalist_archetype" => AbilityRole::MentalistArchetype,
        "polarity" => AbilityRole::Polarity {
            polarity: raw
                .polarity
                .as_deref()
                .ok_or("polarity role without polarity")?
                .parse()?,
        },
        "scope" => AbilityRole::Scope {
            scope: raw
                .scope
                .as_deref()
                .ok_or("scope role without scope")?
                .parse()?,
        },
        "grant" => AbilityRole::Grant,
        "package_power" => {
            let chassis = raw
                .chassis
                .clone()
                .ok_or("package power without chassis")?;
            let quality = raw
                .quality
                .as_deref()
                .map(str::parse::<Quality>)
                .transpose()?;
            if !raw.general && (raw.branch.is_none() || quality.is_none()) {
                return Err("non-general package power needs branch and quality".into());
            }
            AbilityRole::PackagePower {
                chassis,
                branch: raw.branch.clone(),
                quality,
                general: raw.general,
            }
        }
        "core" => AbilityRole::Core,
        other => return Err(format!("unknown role '{}'", other)),
    };
    Ok(role)
}

fn parse_subsystem(name: &str) -> Result<Subsystem, String> {
    match name.to_ascii_lowercase().as_str() {
        "evolution" => Ok(Subsystem::Evolution),
        "mentalist" => Ok(Subsystem::Mentalist),
        other => Err(format!("unknown subsystem '{}'", other)),
    }
}

/// An Automata chassis and the branches it offers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chassis {
    pub id: String,
    pub label: String,
    pub branches: Vec<String>,
    /// Per-chassis quality cap, applied on top of the rank ceiling
    pub max_quality: Option<Quality>,
}

impl Chassis {
    pub fn from_raw(raw: RawChassis) -> Result<Self, String> {
        let id = raw
            .id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or("chassis missing id")?;
        if raw.branches.is_empty() {
            return Err(format!("chassis '{}' has no branches", id));
        }
        let max_quality = raw
            .max_quality
            .as_deref()
            .map(str::parse::<Quality>)
            .transpose()?;
        Ok(Self {
            label: raw.label.unwrap_or_else(|| id.clone()),
            id,
            branches: raw.branches,
            max_quality,
        })
    }

    pub fn has_branch(&self, branch: &str) -> bool {
        self.branches.iter().any(|b| b == branch)
    }
}

/// A catalog entry that was excluded or trimmed during loading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogIssue {
    /// Entry id, or `source#index` when the id itself is unusable
    pub entry: String,
    pub reason: String,
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entry, self.reason)
    }
}
