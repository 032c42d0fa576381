//! Core engine types: player ids, configuration, errors, RNG.
//!
//! Everything here is free of game rules; the rule-bearing modules build on it.

pub mod player;
pub mod config;
pub mod error;
pub mod phase;
pub mod rng;

pub use player::PlayerId;
pub use config::EngineConfig;
pub use error::{EngineError, ErrorKind, Rejected};
pub use phase::Phase;
pub use rng::{GameRng, GameRngState};
