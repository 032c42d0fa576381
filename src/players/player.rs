//! Player runtime state.
//!
//! A `Player` is created when someone joins the lobby and lives for the whole
//! game. Elimination only flips a flag, so ids stay stable for leaderboards.

use serde::{Deserialize, Serialize};

use crate::core::player::PlayerId;

/// A player's per-game state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    /// Caller-assigned identifier.
    pub id: PlayerId,

    /// Name shown in round results.
    pub display_name: String,

    /// Current score. Starts at the configured value (10).
    pub score: i32,

    /// Eliminated players never come back.
    pub is_eliminated: bool,

    /// Has this player answered in the current round?
    pub has_submitted: bool,

    /// This round's answer, cleared when a round starts.
    pub submitted_number: Option<u8>,

    /// Partner in the team phase. Always symmetric.
    pub teammate_id: Option<PlayerId>,

    /// The pair's shared answer in the team phase.
    pub combined_number: Option<u8>,

    /// Gate for the life-reduction mechanic.
    pub extra_lives: i32,
}

impl Player {
    /// Create a player with a fresh score.
    #[must_use]
    pub fn new(id: PlayerId, display_name: impl Into<String>, score: i32, extra_lives: i32) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            score,
            is_eliminated: false,
            has_submitted: false,
            submitted_number: None,
            teammate_id: None,
            combined_number: None,
            extra_lives,
        }
    }

    /// Not eliminated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_eliminated
    }

    /// Is this player currently in a pair?
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.teammate_id.is_some()
    }

    /// Does this player have an answer for the current round?
    ///
    /// A paired player is covered by the pair's combined number.
    #[must_use]
    pub fn has_choice(&self) -> bool {
        self.has_submitted || (self.is_paired() && self.combined_number.is_some())
    }

    /// Clear this round's answer.
    pub fn clear_submission(&mut self) {
        self.has_submitted = false;
        self.submitted_number = None;
    }

    /// Break this player's side of a pairing.
    pub fn clear_pairing(&mut self) {
        self.teammate_id = None;
        self.combined_number = None;
    }
}
