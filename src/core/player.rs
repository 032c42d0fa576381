//! Player identification.
//!
//! ## PlayerId
//!
//! Opaque, caller-assigned player identifier. The presentation layer usually
//! hands in the chat platform's user id; the engine only compares ids for
//! equality and never interprets them.

use serde::{Deserialize, Serialize};

/// Caller-assigned player identifier.
///
/// ```
/// use rust_kod::core::PlayerId;
///
/// let alice = PlayerId::new(1001);
/// assert_eq!(alice.raw(), 1001);
/// assert_eq!(format!("{}", alice), "Player 1001");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for PlayerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}
