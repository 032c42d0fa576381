//! # rust-kod
//!
//! Rules engine for an averaging-game elimination contest.
//!
//! Every round each active player secretly picks a whole number in
//! `0..=100`. The target is 0.8 × the mean of the picks; whoever lands
//! closest wins the round and everyone else loses a point. Players at or
//! below the elimination threshold are out. As players fall, special rules
//! are switched on one at a time and the game eventually moves into a team
//! phase where pairs answer together. Last player standing wins.
//!
//! ## Design Principles
//!
//! 1. **Transport-Agnostic**: No chat, network or UI code. The caller feeds
//!    in answers and renders [`RoundResult::message`] however it likes.
//!
//! 2. **Reject, Don't Corrupt**: Invalid requests come back as [`Rejected`]
//!    and leave the session untouched.
//!
//! 3. **Deterministic When Seeded**: The only randomness is the timeout
//!    fill, driven by a seedable ChaCha RNG.
//!
//! ## Modules
//!
//! - `core`: Player ids, configuration, errors, phases, RNG
//! - `players`: Player state and the roster
//! - `rules`: Special rules and round evaluation
//! - `stack`: Rule escalation
//! - `teams`: Team phase pairing
//! - `session`: The game state machine
//!
//! The free functions below mirror the [`GameSession`] methods for callers
//! that prefer a procedural surface.

pub mod core;
pub mod players;
pub mod rules;
pub mod stack;
pub mod teams;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    EngineConfig, EngineError, ErrorKind, GameRng, GameRngState, Phase, PlayerId, Rejected,
};

pub use crate::players::{Player, PlayerRegistry, MAX_CHOICE, MIN_CHOICE};

pub use crate::rules::{PlayerList, RoundEvaluator, RoundResult, RuleId, Target};

pub use crate::stack::RuleEscalationStack;

pub use crate::teams::TeamFormationManager;

pub use crate::session::{GameSession, RoundSummary, SessionState};

// === Session Surface ===

/// Create a session with the default configuration.
#[must_use]
pub fn create_session() -> GameSession {
    GameSession::new()
}

/// Create a session with a custom configuration.
#[must_use]
pub fn create_session_with(config: EngineConfig) -> GameSession {
    GameSession::with_config(config)
}

pub fn add_player(
    session: &mut GameSession,
    id: PlayerId,
    name: impl Into<String>,
) -> Result<(), Rejected> {
    session.add_player(id, name)
}

pub fn start_game(session: &mut GameSession) -> Result<(), Rejected> {
    session.start_game()
}

/// Open the next round. Returns its number.
pub fn start_round(session: &mut GameSession) -> Result<u32, Rejected> {
    session.start_round()
}

pub fn submit_number(session: &mut GameSession, id: PlayerId, number: i64) -> Result<(), Rejected> {
    session.submit_number(id, number)
}

#[must_use]
pub fn all_submitted(session: &GameSession) -> bool {
    session.all_submitted()
}

/// Fill in random answers for players who ran out of time.
pub fn force_random_fill(session: &mut GameSession) -> Vec<(PlayerId, u8)> {
    session.force_random_fill()
}

pub fn evaluate_round(session: &mut GameSession) -> Result<RoundResult, EngineError> {
    session.evaluate_round()
}

pub fn check_eliminations(session: &mut GameSession) -> Vec<PlayerId> {
    session.check_eliminations()
}

#[must_use]
pub fn is_game_over(session: &GameSession) -> bool {
    session.is_game_over()
}

/// The last player standing, if the game is over.
#[must_use]
pub fn get_winner(session: &GameSession) -> Option<Player> {
    session.get_winner().cloned()
}

pub fn propose_team(session: &mut GameSession, a: PlayerId, b: PlayerId) -> Result<(), Rejected> {
    session.propose_team(a, b)
}

pub fn confirm_team(
    session: &mut GameSession,
    b: PlayerId,
    a: PlayerId,
    number: i64,
) -> Result<(), Rejected> {
    session.confirm_team(b, a, number)
}
