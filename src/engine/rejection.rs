//! Reasons a toggle was refused
//!
//! All of these are expected, recoverable outcomes: the engine returns the
//! input set unchanged and reports the reason alongside it.

use serde::Serialize;
use thiserror::Error;

use crate::budget::BudgetName;
use crate::core::types::{AbilityId, Lineage};

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Rejection {
    #[error("{budget} would reach {requested}, above the ceiling of {ceiling}")]
    BudgetExceeded {
        budget: BudgetName,
        requested: u32,
        ceiling: u32,
    },

    #[error("{id} requires {required} to be selected first")]
    DependencyMissing { id: AbilityId, required: String },

    #[error("{id} is at depth {depth}, beyond the depth limit of {limit}")]
    DepthExceeded {
        id: AbilityId,
        depth: usize,
        limit: u32,
    },

    #[error("{id} does not continue the current evolution chain")]
    SkippedStage { id: AbilityId },

    #[error("{id} is not available: {reason}")]
    Ineligible { id: AbilityId, reason: String },

    #[error("unknown ability: {id}")]
    UnknownAbility { id: AbilityId },

    #[error("{id} is always granted and cannot be toggled")]
    NotSelectable { id: AbilityId },

    #[error("expected a {expected} selection, got {found}")]
    LineageMismatch { expected: Lineage, found: Lineage },
}

impl Rejection {
    /// Stable reason code for UI messaging
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::BudgetExceeded { .. } => "budget_exceeded",
            Rejection::DependencyMissing { .. } => "dependency_missing",
            Rejection::DepthExceeded { .. } => "depth_exceeded",
            Rejection::SkippedStage { .. } => "skipped_stage",
            Rejection::Ineligible { .. } => "ineligible",
            Rejection::UnknownAbility { .. } => "unknown_ability",
            Rejection::NotSelectable { .. } => "not_selectable",
            Rejection::LineageMismatch { .. } => "lineage_mismatch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_ability() {
        let r = Rejection::DependencyMissing {
            id: AbilityId::from("sorcery.creation.spark"),
            required: "creation".into(),
        };
        assert_eq!(
            r.to_string(),
            "sorcery.creation.spark requires creation to be selected first"
        );
        assert_eq!(r.code(), "dependency_missing");
    }

    #[test]
    fn test_serialized_tag_matches_code() {
        let r = Rejection::BudgetExceeded {
            budget: BudgetName::Slots,
            requested: 9,
            ceiling: 7,
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["code"], r.code());
        assert_eq!(json["budget"], "slots");
    }

    #[test]
    fn test_ineligible_keeps_its_reason_field() {
        let r = Rejection::Ineligible {
            id: AbilityId::from("automata.package.warden.bulwark.superior"),
            reason: "quality superior is locked at rank C".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["code"], "ineligible");
        assert_eq!(json["reason"], "quality superior is locked at rank C");
    }
}
