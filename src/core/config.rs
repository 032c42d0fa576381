//! Engine configuration.
//!
//! Every number the rules depend on lives here so the presentation layer can
//! run house variants without touching the engine. The defaults reproduce the
//! standard game: eight seats, ten points each, elimination at zero, team play
//! from four survivors, and a target of 0.8 times the mean.

use serde::{Deserialize, Serialize};

/// Engine configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum roster size.
    pub max_players: usize,

    /// Score every player starts with.
    pub starting_score: i32,

    /// Extra lives every player starts with.
    /// Gates the life-reduction mechanic; never decremented by the engine.
    pub starting_extra_lives: i32,

    /// A player whose score is at or below this value is eliminated.
    ///
    /// Player-facing text has historically quoted -10; the rules have always
    /// eliminated at 0.
    pub elimination_threshold: i32,

    /// The game switches to team play once the active count is at or below this.
    pub team_phase_at: usize,

    /// Multiplier applied to the mean of all choices to derive the target.
    pub target_ratio: f64,

    /// Points lost by an ordinary round loser.
    pub default_penalty: i32,

    /// Seed for the random-fill RNG. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_players: 8,
            starting_score: 10,
            starting_extra_lives: 1,
            elimination_threshold: 0,
            team_phase_at: 4,
            target_ratio: 0.8,
            default_penalty: 1,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Set the maximum roster size.
    #[must_use]
    pub fn with_max_players(mut self, max: usize) -> Self {
        self.max_players = max;
        self
    }

    /// Set the starting score.
    #[must_use]
    pub fn with_starting_score(mut self, score: i32) -> Self {
        self.starting_score = score;
        self
    }

    /// Use a fixed RNG seed (reproducible random fills).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
