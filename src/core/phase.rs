//! Game phases.

use serde::{Deserialize, Serialize};

/// Gameplay phase.
///
/// Every game starts `Individual` and switches to `Team` once when few
/// players remain. There is no way back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Everyone answers alone.
    #[default]
    Individual,
    /// Players may pair up and answer jointly.
    Team,
}

impl Phase {
    /// Lowercase name for messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Individual => "individual",
            Phase::Team => "team",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
