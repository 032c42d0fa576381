//! Rule escalation stack.
//!
//! Special rules start out pending. Each elimination round promotes one of
//! them to active. Pending rules are popped LIFO from the canonical order, so
//! the last-defined rule activates first:
//!
//! 1. Duplicate invalidation
//! 2. Exact hit, double penalty
//! 3. Zero beats hundred
//!
//! Active rules are kept oldest first and consulted newest first; only the
//! newest matching rule fires in a round.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::EngineError;
use crate::rules::RuleId;

/// Pending and active special rules.
///
/// ```
/// use rust_kod::rules::RuleId;
/// use rust_kod::stack::RuleEscalationStack;
///
/// let mut stack = RuleEscalationStack::new();
/// assert!(stack.should_escalate(5));
/// assert_eq!(stack.escalate().unwrap(), RuleId::DuplicateInvalidation);
/// assert_eq!(stack.active(), &[RuleId::DuplicateInvalidation]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEscalationStack {
    /// Pending rules (index 0 = bottom, last = next to activate).
    pending: Vec<RuleId>,

    /// Active rules, oldest first.
    active: Vec<RuleId>,
}

impl Default for RuleEscalationStack {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEscalationStack {
    /// Create a stack holding every rule as pending.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: RuleId::CANONICAL.to_vec(),
            active: Vec::new(),
        }
    }

    /// Create a stack with `rules` already active (oldest first).
    ///
    /// The active rules are removed from the pending stack.
    #[must_use]
    pub fn with_active(rules: &[RuleId]) -> Self {
        let mut active = Vec::new();
        for &rule in rules {
            if !active.contains(&rule) {
                active.push(rule);
            }
        }
        let pending = RuleId::CANONICAL
            .iter()
            .copied()
            .filter(|r| !active.contains(r))
            .collect();

        Self { pending, active }
    }

    /// Should a rule be promoted now?
    ///
    /// Needs a pending rule and at least two players left to play it.
    #[must_use]
    pub fn should_escalate(&self, active_player_count: usize) -> bool {
        !self.pending.is_empty() && active_player_count >= 2
    }

    /// Promote the top pending rule.
    ///
    /// Guard with [`should_escalate`](Self::should_escalate); an empty pending
    /// stack is reported as [`EngineError::EmptyRuleStack`].
    pub fn escalate(&mut self) -> Result<RuleId, EngineError> {
        let rule = self.pending.pop().ok_or(EngineError::EmptyRuleStack)?;
        self.active.push(rule);
        info!(rule = %rule, active = self.active.len(), "rule activated");
        Ok(rule)
    }

    /// Active rules, oldest first.
    #[must_use]
    pub fn active(&self) -> &[RuleId] {
        &self.active
    }

    /// Active rules in evaluation order, newest first.
    pub fn newest_first(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.active.iter().rev().copied()
    }

    /// Is `rule` active?
    #[must_use]
    pub fn is_active(&self, rule: RuleId) -> bool {
        self.active.contains(&rule)
    }

    /// Number of rules still pending.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Peek at the next rule to activate.
    #[must_use]
    pub fn peek_next(&self) -> Option<RuleId> {
        self.pending.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stack() {
        let stack = RuleEscalationStack::new();
        assert_eq!(stack.pending_count(), 3);
        assert!(stack.active().is_empty());
        assert_eq!(stack.peek_next(), Some(RuleId::DuplicateInvalidation));
    }

    #[test]
    fn test_escalation_order() {
        let mut stack = RuleEscalationStack::new();

        assert_eq!(stack.escalate(), Ok(RuleId::DuplicateInvalidation));
        assert_eq!(stack.escalate(), Ok(RuleId::ExactHitDoublePenalty));
        assert_eq!(stack.escalate(), Ok(RuleId::ZeroBeatsHundred));

        assert_eq!(
            stack.active(),
            &[
                RuleId::DuplicateInvalidation,
                RuleId::ExactHitDoublePenalty,
                RuleId::ZeroBeatsHundred,
            ]
        );
        let newest: Vec<_> = stack.newest_first().collect();
        assert_eq!(newest[0], RuleId::ZeroBeatsHundred);
    }

    #[test]
    fn test_escalate_empty_is_error() {
        let mut stack = RuleEscalationStack::new();
        for _ in 0..3 {
            stack.escalate().unwrap();
        }

        assert_eq!(stack.escalate(), Err(EngineError::EmptyRuleStack));
        assert_eq!(stack.active().len(), 3);
    }

    #[test]
    fn test_should_escalate() {
        let mut stack = RuleEscalationStack::new();
        assert!(stack.should_escalate(2));
        assert!(!stack.should_escalate(1));
        assert!(!stack.should_escalate(0));

        for _ in 0..3 {
            stack.escalate().unwrap();
        }
        assert!(!stack.should_escalate(8));
    }

    #[test]
    fn test_with_active() {
        let stack = RuleEscalationStack::with_active(&[
            RuleId::ZeroBeatsHundred,
            RuleId::ZeroBeatsHundred,
        ]);

        assert_eq!(stack.active(), &[RuleId::ZeroBeatsHundred]);
        assert_eq!(stack.pending_count(), 2);
        assert!(stack.is_active(RuleId::ZeroBeatsHundred));
        assert!(!stack.is_active(RuleId::DuplicateInvalidation));
        assert_eq!(stack.peek_next(), Some(RuleId::DuplicateInvalidation));
    }
}
