//! Player system: runtime state and the roster.
//!
//! ## Key Types
//!
//! - `Player`: One player's score, answer, pairing and elimination state
//! - `PlayerRegistry`: The roster, in join order

pub mod player;
pub mod registry;

pub use player::Player;
pub use registry::{validate_choice, PlayerRegistry, MAX_CHOICE, MIN_CHOICE};
