//! Team phase pairing.

pub mod formation;

pub use formation::TeamFormationManager;
