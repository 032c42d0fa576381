//! Game sessions: lobby, rounds and the end of the game.

pub mod game;

pub use game::{GameSession, RoundSummary, SessionState, MIN_PLAYERS};
