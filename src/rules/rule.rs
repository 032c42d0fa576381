//! Special rules.
//!
//! Rules are a closed set. Each one has a trigger condition over the round's
//! choices and an outcome that replaces the ordinary scoring for that round.
//! The evaluator matches on `RuleId` exhaustively, so a new rule cannot be
//! added without giving it a trigger and an outcome.

use serde::{Deserialize, Serialize};

/// Identifier of a special rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleId {
    /// If someone picks 0, a player picking 100 wins the round.
    ZeroBeatsHundred,
    /// Hitting the target exactly doubles everyone else's penalty.
    ExactHitDoublePenalty,
    /// Duplicated numbers are invalid and lose a point.
    DuplicateInvalidation,
}

impl RuleId {
    /// The canonical definition order. The rule stack pops from the end.
    pub const CANONICAL: [RuleId; 3] = [
        RuleId::ZeroBeatsHundred,
        RuleId::ExactHitDoublePenalty,
        RuleId::DuplicateInvalidation,
    ];

    /// Short name for announcements.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            RuleId::ZeroBeatsHundred => "Zero beats hundred",
            RuleId::ExactHitDoublePenalty => "Exact hit",
            RuleId::DuplicateInvalidation => "Duplicates invalid",
        }
    }

    /// Full rule text shown to players when the rule activates.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            RuleId::ZeroBeatsHundred => {
                "If someone chooses 0, a player who chooses 100 wins the round."
            }
            RuleId::ExactHitDoublePenalty => {
                "If someone hits the target exactly, every other player loses 2 points."
            }
            RuleId::DuplicateInvalidation => {
                "If two or more players choose the same number, that number is invalid and its choosers lose 1 point."
            }
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
