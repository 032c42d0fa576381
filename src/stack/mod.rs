//! Rule escalation.
//!
//! The game gets harsher as players fall: every round that eliminates
//! somebody promotes one pending special rule to active. See
//! [`RuleEscalationStack`] for the ordering contract.

mod escalation;

pub use escalation::RuleEscalationStack;
