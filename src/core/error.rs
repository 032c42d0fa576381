//! Engine errors.
//!
//! Two layers:
//!
//! - [`Rejected`]: a request the engine refused. Never mutates state, so the
//!   caller can show it to the player and carry on.
//! - [`EngineError`]: anything `evaluate_round` and the rule stack can fail
//!   with, including wrapped rejections.
//!
//! [`EngineError::kind`] groups errors by what the caller should do about them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::player::PlayerId;

/// A refused request. State is untouched when one of these is returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("the game has already started")]
    AlreadyStarted,
    #[error("the game has not started yet")]
    NotStarted,
    #[error("at least {min} players are needed to start (have {have})")]
    NotEnoughPlayers { min: usize, have: usize },
    #[error("the roster is full ({max} players)")]
    RosterFull { max: usize },
    #[error("{0} has already joined")]
    DuplicatePlayer(PlayerId),
    #[error("{0} is not in this game")]
    UnknownPlayer(PlayerId),
    #[error("{0} has been eliminated")]
    PlayerEliminated(PlayerId),
    #[error("{number} is outside 0..=100")]
    NumberOutOfRange { number: i64 },
    #[error("{0} has already submitted this round")]
    AlreadySubmitted(PlayerId),
    #[error("not allowed during the {0} phase")]
    WrongPhase(&'static str),
    #[error("the game is over")]
    GameOver,
    #[error("no round is accepting answers")]
    NoOpenRound,
    #[error("a player cannot pair with themselves")]
    SelfPairing,
    #[error("{0} already has a teammate")]
    AlreadyPaired(PlayerId),
    #[error("{proposer} has not proposed to {target}")]
    NoProposal { proposer: PlayerId, target: PlayerId },
}

/// Errors raised while running a round.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Rejected(#[from] Rejected),
    #[error("{} player(s) have not submitted", .missing.len())]
    IncompleteSubmissions { missing: Vec<PlayerId> },
    #[error("no round is open for evaluation")]
    RoundNotOpen,
    #[error("no active players to evaluate")]
    EmptyChoiceSet,
    #[error("no pending rules left to activate")]
    EmptyRuleStack,
}

/// What the caller should do about an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad input. Report it and ignore.
    ValidationRejected,
    /// Called too early. Wait or force-fill, then retry.
    PreconditionViolated,
    /// The caller broke the protocol. Abort the round.
    InvariantBroken,
}

impl EngineError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Rejected(_) => ErrorKind::ValidationRejected,
            EngineError::IncompleteSubmissions { .. } | EngineError::RoundNotOpen => {
                ErrorKind::PreconditionViolated
            }
            EngineError::EmptyChoiceSet | EngineError::EmptyRuleStack => ErrorKind::InvariantBroken,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let rejected: EngineError = Rejected::SelfPairing.into();
        assert_eq!(rejected.kind(), ErrorKind::ValidationRejected);

        let incomplete = EngineError::IncompleteSubmissions {
            missing: vec![PlayerId::new(1)],
        };
        assert_eq!(incomplete.kind(), ErrorKind::PreconditionViolated);
        assert_eq!(EngineError::RoundNotOpen.kind(), ErrorKind::PreconditionViolated);

        assert_eq!(EngineError::EmptyChoiceSet.kind(), ErrorKind::InvariantBroken);
        assert_eq!(EngineError::EmptyRuleStack.kind(), ErrorKind::InvariantBroken);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Rejected::NumberOutOfRange { number: 101 }.to_string(),
            "101 is outside 0..=100"
        );
        assert_eq!(
            EngineError::IncompleteSubmissions {
                missing: vec![PlayerId::new(1), PlayerId::new(2)],
            }
            .to_string(),
            "2 player(s) have not submitted"
        );
        // Transparent wrapping keeps the rejection's own message.
        let wrapped: EngineError = Rejected::AlreadySubmitted(PlayerId::new(3)).into();
        assert_eq!(wrapped.to_string(), "Player 3 has already submitted this round");
    }
}
