//! Replay scripts and reports
//!
//! A script is a TOML document naming a starting lineage and rank followed
//! by ordered `[[steps]]`, each carrying exactly one action:
//!
//! ```toml
//! lineage = "sorcery"
//! rank = "B"
//!
//! [[steps]]
//! ability = "sorcery.creation"
//! sphere_tier = "secondary"
//!
//! [[steps]]
//! rank = "C"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::budget::{BudgetLine, Warning};
use crate::core::error::{ForgeError, Result};
use crate::core::types::{AbilityId, Lineage, PriorityRank};
use crate::engine::{AllocationEngine, Delta, Verdict, Violation};
use crate::replay::draft::CharacterDraft;
use crate::selection::{PackageKey, SphereTier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayScript {
    pub lineage: Lineage,
    pub rank: PriorityRank,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl ReplayScript {
    pub fn new(lineage: Lineage, rank: PriorityRank) -> Self {
        Self {
            lineage,
            rank,
            steps: Vec::new(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ForgeError::ScriptError(e.to_string()))
    }

    pub fn push(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }
}

/// One scripted action, as written in TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sphere_tier: Option<SphereTier>,
    /// `chassis/branch/quality`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<PriorityRank>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage: Option<Lineage>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub clear: bool,
}

/// A validated step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Toggle {
        id: AbilityId,
        tier: Option<SphereTier>,
    },
    Package(PackageKey),
    Rank(PriorityRank),
    Lineage(Lineage),
    Clear,
}

impl Step {
    pub fn ability(id: impl Into<String>) -> Self {
        Self {
            ability: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn sphere(id: impl Into<String>, tier: SphereTier) -> Self {
        Self {
            ability: Some(id.into()),
            sphere_tier: Some(tier),
            ..Self::default()
        }
    }

    pub fn package(key: &PackageKey) -> Self {
        Self {
            package: Some(key.to_string()),
            ..Self::default()
        }
    }

    pub fn rank(rank: PriorityRank) -> Self {
        Self {
            rank: Some(rank),
            ..Self::default()
        }
    }

    pub fn lineage(lineage: Lineage) -> Self {
        Self {
            lineage: Some(lineage),
            ..Self::default()
        }
    }

    pub fn clear() -> Self {
        Self {
            clear: true,
            ..Self::default()
        }
    }

    /// Exactly one action per step; `sphere_tier` only qualifies `ability`
    pub fn action(&self) -> std::result::Result<Action, String> {
        let present = [
            self.ability.is_some(),
            self.package.is_some(),
            self.rank.is_some(),
            self.lineage.is_some(),
            self.clear,
        ]
        .iter()
        .filter(|p| **p)
        .count();
        if present != 1 {
            return Err(format!("expected exactly one action, found {}", present));
        }
        if self.sphere_tier.is_some() && self.ability.is_none() {
            return Err("sphere_tier without ability".into());
        }

        if let Some(id) = &self.ability {
            return Ok(Action::Toggle {
                id: AbilityId::new(id.as_str()),
                tier: self.sphere_tier,
            });
        }
        if let Some(key) = &self.package {
            return key.parse().map(Action::Package);
        }
        if let Some(rank) = self.rank {
            return Ok(Action::Rank(rank));
        }
        if let Some(lineage) = self.lineage {
            return Ok(Action::Lineage(lineage));
        }
        Ok(Action::Clear)
    }
}

/// What happened at one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied(Delta),
    Rejected { code: &'static str, message: String },
    RankChanged { warnings: Vec<Warning> },
    LineageChanged,
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub action: String,
    pub outcome: StepOutcome,
}

/// Everything a host would show after running a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub lineage: Lineage,
    pub rank: PriorityRank,
    pub steps: Vec<StepRecord>,
    pub selections: Vec<AbilityId>,
    pub budgets: Vec<BudgetLine>,
    pub warnings: Vec<Warning>,
    pub granted: Vec<AbilityId>,
    pub violations: Vec<Violation>,
}

impl ReplayReport {
    pub fn applied(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Applied(_)))
            .count()
    }

    pub fn rejected(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Rejected { .. }))
            .count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run a script against a fresh draft
///
/// Malformed steps and over-long scripts are errors; rejected toggles are
/// ordinary outcomes recorded in the report.
pub fn replay(engine: &AllocationEngine<'_>, script: &ReplayScript) -> Result<ReplayReport> {
    let limit = engine.config().max_replay_steps;
    if script.steps.len() > limit {
        return Err(ForgeError::ScriptError(format!(
            "script has {} steps, limit is {}",
            script.steps.len(),
            limit
        )));
    }

    let mut draft = CharacterDraft::new(script.lineage, script.rank);
    let mut records = Vec::with_capacity(script.steps.len());

    for (index, step) in script.steps.iter().enumerate() {
        let action = step
            .action()
            .map_err(|reason| ForgeError::ScriptError(format!("step {}: {}", index, reason)))?;
        let outcome = run_step(engine, &mut draft, &action);
        records.push(StepRecord {
            index,
            action: describe(&action),
            outcome,
        });
    }

    let set = draft.selections();
    let report = ReplayReport {
        lineage: draft.lineage(),
        rank: draft.rank(),
        steps: records,
        selections: set.ids().into_iter().cloned().collect(),
        budgets: engine.report(set, draft.rank()),
        warnings: engine.warnings(set, draft.rank()),
        granted: engine.granted(set).iter().map(|d| d.id.clone()).collect(),
        violations: engine.check(set, draft.rank()),
    };
    tracing::info!(
        steps = report.steps.len(),
        applied = report.applied(),
        rejected = report.rejected(),
        "replay finished"
    );
    Ok(report)
}

pub(crate) fn run_step(
    engine: &AllocationEngine<'_>,
    draft: &mut CharacterDraft,
    action: &Action,
) -> StepOutcome {
    let verdict = match action {
        Action::Toggle { id, tier: Some(tier) } => match engine.catalog().sphere_selection(id, *tier) {
            Some(proposed) => draft.toggle(engine, &proposed),
            None => draft.toggle_id(engine, id),
        },
        Action::Toggle { id, tier: None } => draft.toggle_id(engine, id),
        Action::Package(key) => match engine.catalog().package_selection(key) {
            Some(proposed) => draft.toggle(engine, &proposed),
            None => {
                return StepOutcome::Rejected {
                    code: "unknown_ability",
                    message: format!("unknown package {}", key),
                }
            }
        },
        Action::Rank(rank) => {
            return StepOutcome::RankChanged {
                warnings: draft.set_rank(engine, *rank),
            }
        }
        Action::Lineage(lineage) => {
            draft.set_lineage(*lineage);
            return StepOutcome::LineageChanged;
        }
        Action::Clear => {
            draft.clear(engine);
            return StepOutcome::Cleared;
        }
    };

    match verdict {
        Verdict::Applied(delta) => StepOutcome::Applied(delta),
        Verdict::Rejected(rejection) => StepOutcome::Rejected {
            code: rejection.code(),
            message: rejection.to_string(),
        },
    }
}

fn describe(action: &Action) -> String {
    match action {
        Action::Toggle { id, tier: Some(tier) } => format!("toggle {} ({:?})", id, tier),
        Action::Toggle { id, tier: None } => format!("toggle {}", id),
        Action::Package(key) => format!("package {}", key),
        Action::Rank(rank) => format!("rank {}", rank),
        Action::Lineage(lineage) => format!("lineage {}", lineage),
        Action::Clear => "clear".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::engine::test_support::Harness;
    use crate::selection::Quality;

    #[test]
    fn test_parse_script() {
        let script = ReplayScript::from_toml_str(
            r#"
lineage = "sorcery"
rank = "B"

[[steps]]
ability = "sorcery.creation"
sphere_tier = "secondary"

[[steps]]
rank = "C"

[[steps]]
package = "warden/bulwark/basic"

[[steps]]
clear = true
"#,
        )
        .unwrap();
        assert_eq!(script.lineage, Lineage::Sorcery);
        assert_eq!(script.rank, PriorityRank::B);
        assert_eq!(
            script.steps[0].action(),
            Ok(Action::Toggle {
                id: "sorcery.creation".into(),
                tier: Some(SphereTier::Secondary)
            })
        );
        assert_eq!(script.steps[1].action(), Ok(Action::Rank(PriorityRank::C)));
        assert_eq!(
            script.steps[2].action(),
            Ok(Action::Package(PackageKey::new("warden", "bulwark", Quality::Basic)))
        );
        assert_eq!(script.steps[3].action(), Ok(Action::Clear));
    }

    #[test]
    fn test_parse_script_ignores_case() {
        let script = ReplayScript::from_toml_str(
            r#"
lineage = "Esper"
rank = "b"

[[steps]]
lineage = "AUTOMATA"

[[steps]]
rank = "d"
"#,
        )
        .unwrap();
        assert_eq!(script.lineage, Lineage::Esper);
        assert_eq!(script.rank, PriorityRank::B);
        assert_eq!(script.steps[0].action(), Ok(Action::Lineage(Lineage::Automata)));
        assert_eq!(script.steps[1].action(), Ok(Action::Rank(PriorityRank::D)));
    }

    #[test]
    fn test_step_with_two_actions_fails_replay() {
        let h = Harness::new();
        let mut script = ReplayScript::new(Lineage::NeoSapien, PriorityRank::A);
        script.push(Step {
            ability: Some("neo.reflex.1".into()),
            clear: true,
            ..Step::default()
        });
        let err = replay(&h.engine(), &script).unwrap_err();
        assert!(matches!(err, ForgeError::ScriptError(_)));
    }

    #[test]
    fn test_step_limit() {
        let catalog = crate::catalog::registry::fixtures::demo_catalog();
        let config = EngineConfig {
            max_replay_steps: 2,
            ..EngineConfig::default()
        };
        let engine = AllocationEngine::new(&catalog, &config);
        let mut script = ReplayScript::new(Lineage::NeoSapien, PriorityRank::A);
        for _ in 0..3 {
            script.push(Step::ability("neo.reflex.1"));
        }
        assert!(replay(&engine, &script).is_err());
    }

    #[test]
    fn test_report_collects_outcomes() {
        let h = Harness::new();
        let mut script = ReplayScript::new(Lineage::Sorcery, PriorityRank::A);
        script
            .push(Step::ability("sorcery.creation"))
            .push(Step::ability("sorcery.creation.spark"))
            .push(Step::ability("sorcery.divination.glimpse"))
            .push(Step::ability("sorcery.nothing"))
            .push(Step::rank(PriorityRank::E));

        let report = replay(&h.engine(), &script).unwrap();
        assert_eq!(report.applied(), 2);
        assert_eq!(report.rejected(), 2);
        assert_eq!(report.rank, PriorityRank::E);
        assert_eq!(report.selections.len(), 2);
        assert_eq!(report.granted, Vec::<AbilityId>::new());
        assert!(matches!(
            &report.steps[4].outcome,
            StepOutcome::RankChanged { warnings } if warnings.len() == 2
        ));
        assert!(!report.violations.is_empty());

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        let outcome = &json["steps"][2]["outcome"];
        assert_eq!(outcome["status"], "rejected");
        assert_eq!(outcome["code"], "dependency_missing");
        assert_eq!(json["steps"][3]["outcome"]["code"], "unknown_ability");
        assert_eq!(json["steps"][4]["outcome"]["status"], "rank_changed");
    }

    #[test]
    fn test_script_round_trips_through_toml() {
        let mut script = ReplayScript::new(Lineage::Automata, PriorityRank::B);
        script
            .push(Step::package(&PackageKey::new("warden", "lancer", Quality::Basic)))
            .push(Step::clear());
        let text = script.to_toml_string().unwrap();
        assert_eq!(ReplayScript::from_toml_str(&text).unwrap(), script);
    }
}
