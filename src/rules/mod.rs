//! Round rules.
//!
//! - `rule`: The closed set of special rules
//! - `evaluator`: Target derivation and round scoring

pub mod evaluator;
pub mod rule;

pub use evaluator::{PlayerList, RoundEvaluator, RoundResult, Target};
pub use rule::RuleId;
