//! Seeded random walks for soak testing
//!
//! A walk is an ordinary `ReplayScript` built from every step the catalog
//! makes possible for a lineage, so a failing walk can be saved and
//! replayed by hand.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::catalog::{AbilityCatalog, AbilityRole};
use crate::core::error::{ForgeError, Result};
use crate::core::types::{Lineage, PriorityRank};
use crate::engine::{AllocationEngine, Violation};
use crate::replay::draft::CharacterDraft;
use crate::replay::script::{run_step, ReplayScript, Step, StepOutcome};
use crate::selection::{PackageKey, Quality, SphereTier};

/// Every toggle step the catalog offers for a lineage, in catalog order
pub fn step_pool(catalog: &AbilityCatalog, lineage: Lineage) -> Vec<Step> {
    let mut pool = Vec::new();
    for def in catalog.selectable(lineage) {
        match def.role {
            AbilityRole::Sphere => {
                pool.push(Step::sphere(def.id.as_str(), SphereTier::Primary));
                pool.push(Step::sphere(def.id.as_str(), SphereTier::Secondary));
            }
            _ => pool.push(Step::ability(def.id.as_str())),
        }
    }
    if lineage == Lineage::Automata {
        for chassis in catalog.chassis_list() {
            for branch in &chassis.branches {
                // Locked qualities are included on purpose to exercise rejection
                for quality in Quality::ALL {
                    pool.push(Step::package(&PackageKey::new(
                        chassis.id.as_str(),
                        branch.as_str(),
                        quality,
                    )));
                }
            }
        }
    }
    pool
}

/// Deterministic random script of `steps` toggles at a fixed rank
///
/// Roughly one step in forty clears the set so walks revisit empty states.
pub fn random_walk(
    catalog: &AbilityCatalog,
    lineage: Lineage,
    rank: PriorityRank,
    steps: usize,
    seed: u64,
) -> ReplayScript {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let pool = step_pool(catalog, lineage);
    let mut script = ReplayScript::new(lineage, rank);

    for _ in 0..steps {
        let step = if rng.gen_ratio(1, 40) {
            Step::clear()
        } else {
            pool.choose(&mut rng).cloned().unwrap_or_else(Step::clear)
        };
        script.push(step);
    }
    script
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoakFailure {
    pub seed: u64,
    pub step: usize,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SoakReport {
    pub walks: usize,
    pub steps: usize,
    pub applied: usize,
    pub rejected: usize,
    pub failures: Vec<SoakFailure>,
}

impl SoakReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run `walks` random walks, checking the invariants after every step
///
/// Walk `i` uses seed `seed + i`. Only the first failing step of each walk
/// is recorded.
pub fn soak(
    engine: &AllocationEngine<'_>,
    lineage: Lineage,
    rank: PriorityRank,
    walks: usize,
    steps: usize,
    seed: u64,
) -> Result<SoakReport> {
    if steps > engine.config().max_replay_steps {
        return Err(ForgeError::ScriptError(format!(
            "{} steps per walk exceeds the limit of {}",
            steps,
            engine.config().max_replay_steps
        )));
    }

    let mut report = SoakReport {
        walks,
        ..SoakReport::default()
    };
    for walk in 0..walks {
        let walk_seed = seed.wrapping_add(walk as u64);
        let script = random_walk(engine.catalog(), lineage, rank, steps, walk_seed);
        let mut draft = CharacterDraft::new(lineage, rank);

        for (index, step) in script.steps.iter().enumerate() {
            let action = step
                .action()
                .map_err(|reason| ForgeError::ScriptError(format!("step {}: {}", index, reason)))?;
            match run_step(engine, &mut draft, &action) {
                StepOutcome::Applied(_) => report.applied += 1,
                StepOutcome::Rejected { .. } => report.rejected += 1,
                _ => {}
            }
            report.steps += 1;

            let violations = engine.check(draft.selections(), rank);
            if !violations.is_empty() {
                tracing::warn!(seed = walk_seed, step = index, "invariant violated");
                report.failures.push(SoakFailure {
                    seed: walk_seed,
                    step: index,
                    violations,
                });
                break;
            }
        }
    }
    tracing::info!(
        walks = report.walks,
        steps = report.steps,
        failures = report.failures.len(),
        "soak finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::Harness;

    #[test]
    fn test_same_seed_same_script() {
        let h = Harness::new();
        let a = random_walk(&h.catalog, Lineage::Esper, PriorityRank::B, 200, 7);
        let b = random_walk(&h.catalog, Lineage::Esper, PriorityRank::B, 200, 7);
        let c = random_walk(&h.catalog, Lineage::Esper, PriorityRank::B, 200, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.steps.len(), 200);
    }

    #[test]
    fn test_pool_covers_sphere_tiers_and_packages() {
        let h = Harness::new();
        // 3 spheres x 2 tiers + 5 moves
        assert_eq!(step_pool(&h.catalog, Lineage::Sorcery).len(), 11);
        // (2 warden branches + 1 courier branch) x 4 qualities
        assert_eq!(step_pool(&h.catalog, Lineage::Automata).len(), 12);
    }

    #[test]
    fn test_soak_every_lineage_and_rank() {
        let h = Harness::new();
        let engine = h.engine();
        for lineage in Lineage::ALL {
            for rank in PriorityRank::ALL {
                let report = soak(&engine, lineage, rank, 4, 150, 1234).unwrap();
                assert!(report.is_clean(), "{} {}: {:?}", lineage, rank, report.failures);
                assert_eq!(report.steps, 600);
            }
        }
    }
}
