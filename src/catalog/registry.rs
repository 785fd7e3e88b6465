//! Ability catalog loading and lookup
//!
//! `CatalogBuilder` collects TOML documents and `build` validates them into
//! an immutable `AbilityCatalog`. The catalog owns the segment arena, the
//! Mentalist grant tables and the Automata chassis list, and constructs the
//! proposed `Selection` values the engine consumes.

use ahash::{AHashMap, AHashSet};
use std::path::Path;

use crate::budget::{ceiling, BudgetName};
use crate::catalog::definition::{AbilityDefinition, AbilityRole, CatalogIssue, Chassis};
use crate::catalog::schema::{RawAbility, RawChassis, RawGrant};
use crate::core::config::{config, EngineConfig};
use crate::core::error::Result;
use crate::core::types::{AbilityId, Lineage, PriorityRank};
use crate::selection::{
    AbilityPath, CostMap, PackageKey, Polarity, Quality, Scope, SegmentArena, SegmentId,
    Selection, SelectionKind, SphereTier,
};

/// Collects catalog documents before validation
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    documents: Vec<(String, toml::Value)>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a TOML document; only syntax errors fail here
    pub fn add_toml_str(&mut self, source: &str, content: &str) -> Result<&mut Self> {
        let value: toml::Value = toml::from_str(content)?;
        self.documents.push((source.to_string(), value));
        Ok(self)
    }

    /// Add a catalog file
    pub fn add_file(&mut self, path: &Path) -> Result<&mut Self> {
        let content = std::fs::read_to_string(path)?;
        self.add_toml_str(&path.display().to_string(), &content)
    }

    /// Add all .toml files from a directory recursively, in name order
    pub fn add_directory(&mut self, path: &Path) -> Result<usize> {
        let mut entries: Vec<_> = std::fs::read_dir(path)?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|e| e.path())
            .collect();
        entries.sort();

        let mut added = 0;
        for entry_path in entries {
            if entry_path.is_dir() {
                added += self.add_directory(&entry_path)?;
            } else if entry_path.extension().map_or(false, |ext| ext == "toml") {
                self.add_file(&entry_path)?;
                added += 1;
            }
        }
        Ok(added)
    }

    /// Validate every entry and build the catalog
    pub fn build(self, config: &EngineConfig) -> AbilityCatalog {
        let mut catalog = AbilityCatalog::default();
        let mut raw_grants = Vec::new();

        for (source, document) in &self.documents {
            let default_lineage = document
                .get("lineage")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<Lineage>().ok());

            for (index, entry) in entries(document, "abilities").enumerate() {
                let fallback = format!("{}#abilities[{}]", source, index);
                catalog.ingest_ability(entry.clone(), default_lineage, config, fallback);
            }

            for (index, entry) in entries(document, "chassis").enumerate() {
                let fallback = format!("{}#chassis[{}]", source, index);
                catalog.ingest_chassis(entry.clone(), fallback);
            }

            for (index, entry) in entries(document, "grants").enumerate() {
                raw_grants.push((format!("{}#grants[{}]", source, index), entry.clone()));
            }
        }

        // Grants may reference abilities from any document
        for (label, entry) in raw_grants {
            catalog.ingest_grant(entry, label);
        }

        for issue in &catalog.issues {
            tracing::warn!(entry = %issue.entry, "excluded catalog entry: {}", issue.reason);
        }
        tracing::info!(
            abilities = catalog.definitions.len(),
            chassis = catalog.chassis.len(),
            issues = catalog.issues.len(),
            "ability catalog loaded"
        );

        catalog
    }
}

fn entries<'a>(document: &'a toml::Value, key: &str) -> impl Iterator<Item = &'a toml::Value> {
    document
        .get(key)
        .and_then(|v| v.as_array())
        .map(|a| a.iter())
        .into_iter()
        .flatten()
}

/// Read-only ability catalog for all lineages
#[derive(Debug, Clone, Default)]
pub struct AbilityCatalog {
    definitions: Vec<AbilityDefinition>,
    by_id: AHashMap<AbilityId, usize>,
    arena: SegmentArena,
    chassis: Vec<Chassis>,
    chassis_by_id: AHashMap<String, usize>,
    polarity_grants: AHashMap<(SegmentId, Polarity), Vec<AbilityId>>,
    combination_grants: AHashMap<(SegmentId, Polarity, Scope), Vec<AbilityId>>,
    /// Every ability placed in a grant table; each may appear once
    granted: AHashSet<AbilityId>,
    issues: Vec<CatalogIssue>,
}

impl AbilityCatalog {
    /// Parse a single TOML document using the global engine config
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut builder = CatalogBuilder::new();
        builder.add_toml_str("<inline>", content)?;
        Ok(builder.build(config()))
    }

    /// Load a catalog file or directory using the global engine config
    pub fn load(path: &Path) -> Result<Self> {
        let mut builder = CatalogBuilder::new();
        if path.is_dir() {
            builder.add_directory(path)?;
        } else {
            builder.add_file(path)?;
        }
        Ok(builder.build(config()))
    }

    fn ingest_ability(
        &mut self,
        entry: toml::Value,
        default_lineage: Option<Lineage>,
        config: &EngineConfig,
        fallback: String,
    ) {
        let raw: RawAbility = match entry.try_into() {
            Ok(raw) => raw,
            Err(e) => return self.issue(fallback, e.to_string()),
        };
        let label = raw.id.clone().unwrap_or(fallback);

        match AbilityDefinition::from_raw(raw, default_lineage, config.max_path_depth, &mut self.arena)
        {
            Ok(def) if self.by_id.contains_key(&def.id) => {
                self.issue(label, "duplicate id".to_string())
            }
            Ok(def) => {
                self.by_id.insert(def.id.clone(), self.definitions.len());
                self.definitions.push(def);
            }
            Err(reason) => self.issue(label, reason),
        }
    }

    fn ingest_chassis(&mut self, entry: toml::Value, fallback: String) {
        let raw: RawChassis = match entry.try_into() {
            Ok(raw) => raw,
            Err(e) => return self.issue(fallback, e.to_string()),
        };
        let label = raw.id.clone().unwrap_or(fallback);

        match Chassis::from_raw(raw) {
            Ok(chassis) if self.chassis_by_id.contains_key(&chassis.id) => {
                self.issue(label, "duplicate chassis".to_string())
            }
            Ok(chassis) => {
                // Package selections carry [chassis, branch, quality] paths
                self.arena.intern(&chassis.id);
                for branch in &chassis.branches {
                    self.arena.intern(branch);
                }
                for quality in Quality::ALL {
                    self.arena.intern(quality.as_str());
                }
                self.chassis_by_id
                    .insert(chassis.id.clone(), self.chassis.len());
                self.chassis.push(chassis);
            }
            Err(reason) => self.issue(label, reason),
        }
    }

    fn ingest_grant(&mut self, entry: toml::Value, label: String) {
        let raw: RawGrant = match entry.try_into() {
            Ok(raw) => raw,
            Err(e) => return self.issue(label, e.to_string()),
        };

        let archetype_name = raw.archetype.clone().unwrap_or_default();
        let Some(archetype) = self.arena.lookup(&archetype_name) else {
            return self.issue(label, "grant references unknown archetype".to_string());
        };
        if !self.is_mentalist_archetype(archetype) {
            return self.issue(
                label,
                format!("{} is not a mentalist archetype", archetype_name),
            );
        }
        let polarity = match raw.polarity.as_deref().map(str::parse::<Polarity>) {
            Some(Ok(p)) => p,
            Some(Err(reason)) => return self.issue(label, reason),
            None => return self.issue(label, "grant missing polarity".to_string()),
        };
        let scope = match raw.scope.as_deref().map(str::parse::<Scope>).transpose() {
            Ok(scope) => scope,
            Err(reason) => return self.issue(label, reason),
        };

        let mut abilities = Vec::new();
        for id in raw.abilities {
            let id = AbilityId(id);
            let reason = match self.get(&id) {
                None => Some(format!("unknown grant ability {}", id)),
                Some(def) if def.role != AbilityRole::Grant => {
                    Some(format!("{} is not a grant ability", id))
                }
                Some(def) if def.path.root() != archetype => Some(format!(
                    "{} is not under archetype {}",
                    id, archetype_name
                )),
                Some(_) if self.granted.contains(&id) => {
                    Some(format!("{} already appears in another grant", id))
                }
                Some(_) => None,
            };
            match reason {
                Some(reason) => self.issue(label.clone(), reason),
                None => {
                    self.granted.insert(id.clone());
                    abilities.push(id);
                }
            }
        }

        match scope {
            Some(scope) => self
                .combination_grants
                .entry((archetype, polarity, scope))
                .or_default()
                .extend(abilities),
            None => self
                .polarity_grants
                .entry((archetype, polarity))
                .or_default()
                .extend(abilities),
        }
    }

    fn is_mentalist_archetype(&self, segment: SegmentId) -> bool {
        self.definitions
            .iter()
            .any(|d| d.role == AbilityRole::MentalistArchetype && d.path.root() == segment)
    }

    fn issue(&mut self, entry: String, reason: String) {
        self.issues.push(CatalogIssue { entry, reason });
    }

    // === LOOKUP ===

    pub fn get(&self, id: &AbilityId) -> Option<&AbilityDefinition> {
        self.by_id.get(id).map(|&i| &self.definitions[i])
    }

    pub fn get_str(&self, id: &str) -> Option<&AbilityDefinition> {
        self.get(&AbilityId::from(id))
    }

    /// All valid definitions in load order
    pub fn definitions(&self) -> &[AbilityDefinition] {
        &self.definitions
    }

    pub fn for_lineage(&self, lineage: Lineage) -> impl Iterator<Item = &AbilityDefinition> {
        self.definitions.iter().filter(move |d| d.lineage == lineage)
    }

    /// Abilities a user may propose directly
    pub fn selectable(&self, lineage: Lineage) -> impl Iterator<Item = &AbilityDefinition> {
        self.for_lineage(lineage).filter(|d| d.is_selectable())
    }

    /// Lineage-wide abilities that are always granted
    pub fn core_abilities(&self, lineage: Lineage) -> impl Iterator<Item = &AbilityDefinition> {
        self.for_lineage(lineage).filter(|d| d.is_core())
    }

    pub fn arena(&self) -> &SegmentArena {
        &self.arena
    }

    pub fn segment(&self, name: &str) -> Option<SegmentId> {
        self.arena.lookup(name)
    }

    pub fn display_path(&self, path: &AbilityPath) -> String {
        path.display(&self.arena)
    }

    /// Entries excluded or trimmed while loading
    pub fn issues(&self) -> &[CatalogIssue] {
        &self.issues
    }

    // === MENTALIST GRANTS ===

    /// Abilities implied once an archetype's polarity is chosen
    pub fn polarity_grant(&self, archetype: SegmentId, polarity: Polarity) -> Vec<&AbilityDefinition> {
        self.resolve(self.polarity_grants.get(&(archetype, polarity)))
    }

    /// Candidates for an (archetype, polarity, scope) combination
    pub fn candidates(
        &self,
        archetype: SegmentId,
        polarity: Polarity,
        scope: Scope,
    ) -> Vec<&AbilityDefinition> {
        self.resolve(self.combination_grants.get(&(archetype, polarity, scope)))
    }

    /// Candidates by archetype name; empty for unknown archetypes
    pub fn candidates_for(
        &self,
        archetype: &str,
        polarity: Polarity,
        scope: Scope,
    ) -> Vec<&AbilityDefinition> {
        self.segment(archetype)
            .map(|a| self.candidates(a, polarity, scope))
            .unwrap_or_default()
    }

    fn resolve(&self, ids: Option<&Vec<AbilityId>>) -> Vec<&AbilityDefinition> {
        ids.map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    // === AUTOMATA PACKAGES ===

    pub fn chassis(&self, id: &str) -> Option<&Chassis> {
        self.chassis_by_id.get(id).map(|&i| &self.chassis[i])
    }

    pub fn chassis_list(&self) -> &[Chassis] {
        &self.chassis
    }

    /// Qualities available for a chassis at a rank, lowest first
    pub fn unlocked_qualities(&self, chassis: &str, rank: PriorityRank) -> Vec<Quality> {
        let Some(chassis) = self.chassis(chassis) else {
            return Vec::new();
        };
        let rank_cap = ceiling(Lineage::Automata, rank, BudgetName::QualityCeiling).unwrap_or(0);
        Quality::ALL
            .into_iter()
            .filter(|q| q.ordinal() <= rank_cap)
            .filter(|q| chassis.max_quality.map_or(true, |cap| *q <= cap))
            .collect()
    }

    /// Abilities belonging to a package, computed at read time
    ///
    /// Includes the chassis' general powers plus branch powers at or below
    /// the package quality.
    pub fn powers_for_package(&self, key: &PackageKey) -> Vec<&AbilityDefinition> {
        self.for_lineage(Lineage::Automata)
            .filter(|d| match &d.role {
                AbilityRole::PackagePower {
                    chassis,
                    branch,
                    quality,
                    general,
                } if *chassis == key.chassis => {
                    *general
                        || (branch.as_deref() == Some(key.branch.as_str())
                            && quality.map_or(false, |q| q <= key.quality))
                }
                _ => false,
            })
            .collect()
    }

    // === PROPOSALS ===

    /// Build a proposed selection for a selectable ability
    ///
    /// Spheres default to the primary tier; see `sphere_selection`.
    pub fn selection(&self, id: &AbilityId) -> Option<Selection> {
        let def = self.get(id).filter(|d| d.is_selectable())?;
        let kind = match &def.role {
            AbilityRole::Tier { .. } => SelectionKind::Tiered,
            AbilityRole::Sphere => SelectionKind::Sphere {
                tier: SphereTier::Primary,
            },
            AbilityRole::Move => SelectionKind::Move,
            AbilityRole::Evolution => SelectionKind::Evolution,
            AbilityRole::MentalistArchetype => SelectionKind::MentalistArchetype,
            AbilityRole::Polarity { polarity } => SelectionKind::Polarity {
                polarity: *polarity,
            },
            AbilityRole::Scope { scope } => SelectionKind::Scope { scope: *scope },
            AbilityRole::Grant => SelectionKind::GrantPick,
            AbilityRole::PackagePower { .. } | AbilityRole::Core => return None,
        };
        Some(Self::build_selection(def, kind))
    }

    /// Build a proposed sphere selection for a specific tier
    pub fn sphere_selection(&self, id: &AbilityId, tier: SphereTier) -> Option<Selection> {
        let def = self.get(id).filter(|d| d.role == AbilityRole::Sphere)?;
        Some(Self::build_selection(def, SelectionKind::Sphere { tier }))
    }

    /// Build a proposed package selection; None for unknown chassis or branch
    pub fn package_selection(&self, key: &PackageKey) -> Option<Selection> {
        let chassis = self.chassis(&key.chassis)?;
        if !chassis.has_branch(&key.branch) {
            return None;
        }
        let path = AbilityPath::new(vec![
            self.arena.lookup(&chassis.id)?,
            self.arena.lookup(&key.branch)?,
            self.arena.lookup(key.quality.as_str())?,
        ])?;
        Some(Selection::new(
            AbilityId(format!(
                "automata.package.{}.{}.{}",
                key.chassis, key.branch, key.quality
            )),
            Lineage::Automata,
            SelectionKind::Package { key: key.clone() },
            None,
            CostMap::new(),
            path,
        ))
    }

    fn build_selection(def: &AbilityDefinition, kind: SelectionKind) -> Selection {
        let mut cost = def.cost.clone();
        let unit = match &kind {
            SelectionKind::Sphere {
                tier: SphereTier::Primary,
            } => Some(BudgetName::PrimarySpheres),
            SelectionKind::Sphere {
                tier: SphereTier::Secondary,
            } => Some(BudgetName::SecondarySpheres),
            SelectionKind::Move => Some(BudgetName::Moves),
            _ => None,
        };
        if let Some(budget) = unit {
            cost.insert(budget.as_str().to_string(), 1);
        }
        Selection::new(
            def.id.clone(),
            def.lineage,
            kind,
            def.subsystem,
            cost,
            def.path.clone(),
        )
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::demo_catalog;
    use super::*;

    #[test]
    fn test_demo_catalog_loads_cleanly() {
        let catalog = demo_catalog();
        assert!(catalog.issues().is_empty(), "{:?}", catalog.issues());
        assert!(catalog.get_str("neo.reflex.1").is_some());
        assert!(catalog.chassis("warden").is_some());
    }

    #[test]
    fn test_malformed_entries_are_excluded_not_fatal() {
        let toml = r#"
lineage = "chimera"

[[abilities]]
id = "chimera.claws.1"
role = "tier"
tier = 1
path = ["claws", "1"]

[[abilities]]
id = "chimera.claws.2"
role = "tier"
path = ["claws", "2"]

[[abilities]]
id = "chimera.claws.1"
role = "tier"
tier = 1
path = ["claws", "1"]

[[abilities]]
role = "tier"
tier = 3
path = "claws"
"#;
        let mut builder = CatalogBuilder::new();
        builder.add_toml_str("bad.toml", toml).unwrap();
        let catalog = builder.build(&EngineConfig::default());

        assert_eq!(catalog.definitions().len(), 1);
        assert_eq!(catalog.issues().len(), 3);
        assert!(catalog.get_str("chimera.claws.2").is_none());
        assert!(catalog.issues()[2].entry.starts_with("bad.toml#abilities[3]"));
    }

    #[test]
    fn test_syntax_error_fails_load() {
        let mut builder = CatalogBuilder::new();
        assert!(builder.add_toml_str("broken.toml", "[[abilities]\nid = ").is_err());
    }

    #[test]
    fn test_sphere_selection_synthesizes_unit_cost() {
        let catalog = demo_catalog();
        let id = AbilityId::from("sorcery.creation");
        let primary = catalog.selection(&id).unwrap();
        assert_eq!(primary.cost_of("primary_spheres"), 1);
        assert_eq!(primary.cost_of("secondary_spheres"), 0);

        let secondary = catalog.sphere_selection(&id, SphereTier::Secondary).unwrap();
        assert_eq!(secondary.cost_of("secondary_spheres"), 1);
        assert_eq!(secondary.depth, 0);
    }

    #[test]
    fn test_core_and_package_powers_not_proposable() {
        let catalog = demo_catalog();
        assert!(catalog.selection(&AbilityId::from("neo.baseline.interface")).is_none());
        assert!(catalog.selection(&AbilityId::from("automata.warden.frame")).is_none());
        assert_eq!(catalog.core_abilities(Lineage::NeoSapien).count(), 1);
    }

    #[test]
    fn test_candidates_lookup() {
        let catalog = demo_catalog();
        let two = catalog.candidates_for("oracle", Polarity::Receiver, Scope::Aural);
        assert_eq!(two.len(), 2);
        let one = catalog.candidates_for("oracle", Polarity::Receiver, Scope::Contact);
        assert_eq!(one.len(), 1);
        let none = catalog.candidates_for("oracle", Polarity::Transmitter, Scope::Contact);
        assert!(none.is_empty());
        assert!(catalog
            .candidates_for("nobody", Polarity::Receiver, Scope::Aural)
            .is_empty());
    }

    #[test]
    fn test_unlocked_qualities_respect_rank_and_chassis_cap() {
        let catalog = demo_catalog();
        assert_eq!(
            catalog.unlocked_qualities("warden", PriorityRank::C),
            vec![Quality::Basic, Quality::Standard]
        );
        // warden caps at advanced even at rank A
        assert_eq!(
            catalog.unlocked_qualities("warden", PriorityRank::A).last(),
            Some(&Quality::Advanced)
        );
        assert!(catalog.unlocked_qualities("warden", PriorityRank::E).is_empty());
        assert!(catalog.unlocked_qualities("ghost", PriorityRank::A).is_empty());
    }

    #[test]
    fn test_powers_for_package() {
        let catalog = demo_catalog();
        let basic = catalog.powers_for_package(&PackageKey::new("warden", "bulwark", Quality::Basic));
        let advanced =
            catalog.powers_for_package(&PackageKey::new("warden", "bulwark", Quality::Advanced));

        let ids = |defs: &[&AbilityDefinition]| {
            defs.iter().map(|d| d.id.0.clone()).collect::<Vec<_>>()
        };
        assert_eq!(
            ids(&basic),
            vec!["automata.warden.frame", "automata.warden.bulwark.plating"]
        );
        assert_eq!(
            ids(&advanced),
            vec![
                "automata.warden.frame",
                "automata.warden.bulwark.plating",
                "automata.warden.bulwark.aegis",
                "automata.warden.bulwark.fortress"
            ]
        );
    }

    #[test]
    fn test_package_selection_rejects_unknown_branch() {
        let catalog = demo_catalog();
        assert!(catalog
            .package_selection(&PackageKey::new("warden", "sniper", Quality::Basic))
            .is_none());
        let sel = catalog
            .package_selection(&PackageKey::new("warden", "lancer", Quality::Basic))
            .unwrap();
        assert_eq!(sel.id.as_str(), "automata.package.warden.lancer.basic");
        assert_eq!(sel.depth, 2);
    }
}
