//! Player roster.
//!
//! The `PlayerRegistry` owns every player who joined the game, in join order.
//! Join order is significant: it is the iteration order for results, the
//! tie-break order where one is needed, and the stable order of the leaderboard.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::player::Player;
use crate::core::config::EngineConfig;
use crate::core::error::Rejected;
use crate::core::player::PlayerId;
use crate::core::rng::GameRng;

/// Lowest accepted choice.
pub const MIN_CHOICE: i64 = 0;
/// Highest accepted choice.
pub const MAX_CHOICE: i64 = 100;

/// Validate a raw choice and narrow it to a `u8`.
pub fn validate_choice(number: i64) -> Result<u8, Rejected> {
    if (MIN_CHOICE..=MAX_CHOICE).contains(&number) {
        Ok(number as u8)
    } else {
        Err(Rejected::NumberOutOfRange { number })
    }
}

/// Roster of players.
///
/// ## Example
///
/// ```
/// use rust_kod::core::{EngineConfig, PlayerId};
/// use rust_kod::players::PlayerRegistry;
///
/// let mut roster = PlayerRegistry::new(&EngineConfig::default());
/// roster.add(PlayerId::new(1), "Alice").unwrap();
/// roster.add(PlayerId::new(2), "Bob").unwrap();
///
/// roster.submit(PlayerId::new(1), 40).unwrap();
/// assert!(!roster.all_submitted());
/// roster.submit(PlayerId::new(2), 60).unwrap();
/// assert!(roster.all_submitted());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerRegistry {
    players: Vec<Player>,
    max_players: usize,
    starting_score: i32,
    starting_extra_lives: i32,
}

impl PlayerRegistry {
    /// Create an empty roster sized and scored from `config`.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            players: Vec::new(),
            max_players: config.max_players,
            starting_score: config.starting_score,
            starting_extra_lives: config.starting_extra_lives,
        }
    }

    // === Roster ===

    /// Add a player.
    ///
    /// Rejected when the roster is full or the id already joined.
    pub fn add(&mut self, id: PlayerId, name: impl Into<String>) -> Result<(), Rejected> {
        if self.contains(id) {
            return Err(Rejected::DuplicatePlayer(id));
        }
        if self.players.len() >= self.max_players {
            return Err(Rejected::RosterFull {
                max: self.max_players,
            });
        }

        let player = Player::new(id, name, self.starting_score, self.starting_extra_lives);
        debug!(player = %id, name = %player.display_name, "player joined");
        self.players.push(player);
        Ok(())
    }

    /// Get a player by ID.
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Get a mutable player by ID.
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Get an active player, rejecting unknown and eliminated ids.
    pub fn active(&self, id: PlayerId) -> Result<&Player, Rejected> {
        match self.get(id) {
            None => Err(Rejected::UnknownPlayer(id)),
            Some(p) if p.is_eliminated => Err(Rejected::PlayerEliminated(id)),
            Some(p) => Ok(p),
        }
    }

    /// Mutable variant of [`active`](Self::active).
    pub fn active_mut(&mut self, id: PlayerId) -> Result<&mut Player, Rejected> {
        match self.get_mut(id) {
            None => Err(Rejected::UnknownPlayer(id)),
            Some(p) if p.is_eliminated => Err(Rejected::PlayerEliminated(id)),
            Some(p) => Ok(p),
        }
    }

    /// Check if a player ID has joined.
    #[must_use]
    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    /// Number of players ever joined (eliminated included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Check if nobody has joined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Iterate over all players in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Iterate over active players in join order.
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_active())
    }

    /// Mutable iteration over active players.
    pub fn active_players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut().filter(|p| p.is_active())
    }

    /// Number of active players.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_players().count()
    }

    /// All players ranked by score, highest first.
    ///
    /// Equal scores keep join order.
    #[must_use]
    pub fn leaderboard(&self) -> Vec<&Player> {
        let mut ranked: Vec<_> = self.players.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    // === Submissions ===

    /// Record a player's answer for this round.
    ///
    /// A second answer in the same round is rejected and leaves the first
    /// answer in place.
    pub fn submit(&mut self, id: PlayerId, number: i64) -> Result<(), Rejected> {
        let number = validate_choice(number)?;
        let player = self.active_mut(id)?;
        if player.has_submitted {
            return Err(Rejected::AlreadySubmitted(id));
        }

        player.submitted_number = Some(number);
        player.has_submitted = true;
        debug!(player = %id, "submission recorded");
        Ok(())
    }

    /// Has every active player answered?
    #[must_use]
    pub fn all_submitted(&self) -> bool {
        self.active_players().all(Player::has_choice)
    }

    /// Active players still owing an answer, in join order.
    #[must_use]
    pub fn missing(&self) -> Vec<PlayerId> {
        self.active_players()
            .filter(|p| !p.has_choice())
            .map(|p| p.id)
            .collect()
    }

    /// Give every active player without an answer a random one.
    ///
    /// Returns the assignments made, in join order.
    pub fn assign_random_to_stragglers(&mut self, rng: &mut GameRng) -> Vec<(PlayerId, u8)> {
        let mut assigned = Vec::new();
        for player in self.active_players_mut().filter(|p| !p.has_choice()) {
            let number = rng.gen_choice();
            player.submitted_number = Some(number);
            player.has_submitted = true;
            assigned.push((player.id, number));
        }
        assigned
    }

    /// Clear every active player's answer (start of a round).
    pub fn clear_submissions(&mut self) {
        for player in self.active_players_mut() {
            player.clear_submission();
        }
    }

    // === Scoring ===

    /// Take points from an active player. Eliminated players are untouched.
    pub fn apply_penalty(&mut self, id: PlayerId, points: i32) {
        if let Ok(player) = self.active_mut(id) {
            player.score -= points;
        }
    }

    /// Life reduction: costs 2 points while the player has extra lives.
    ///
    /// `extra_lives` is never decremented here, so the gate never closes once
    /// a player starts with a life. Returns the new score. Does not eliminate;
    /// run the elimination pass afterwards.
    pub fn reduce_life(&mut self, id: PlayerId) -> Result<i32, Rejected> {
        let player = self.active_mut(id)?;
        if player.extra_lives > 0 {
            player.score -= 2;
        }
        Ok(player.score)
    }

    /// Eliminate every active player at or below `threshold`.
    ///
    /// Returns the newly eliminated ids in join order.
    pub fn eliminate_depleted(&mut self, threshold: i32) -> Vec<PlayerId> {
        let mut eliminated = Vec::new();
        for player in self.active_players_mut().filter(|p| p.score <= threshold) {
            player.is_eliminated = true;
            player.clear_submission();
            eliminated.push(player.id);
        }
        eliminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(n: u64) -> PlayerRegistry {
        let mut registry = PlayerRegistry::new(&EngineConfig::default());
        for i in 1..=n {
            registry.add(PlayerId::new(i), format!("P{}", i)).unwrap();
        }
        registry
    }

    #[test]
    fn test_add_and_get() {
        let registry = roster(2);

        let p1 = registry.get(PlayerId::new(1)).unwrap();
        assert_eq!(p1.display_name, "P1");
        assert_eq!(p1.score, 10);
        assert_eq!(p1.extra_lives, 1);
        assert!(!p1.is_eliminated);

        assert!(registry.get(PlayerId::new(99)).is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_add_duplicate_rejected() {
        let mut registry = roster(1);
        assert_eq!(
            registry.add(PlayerId::new(1), "Again"),
            Err(Rejected::DuplicatePlayer(PlayerId::new(1)))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_roster_capacity() {
        let mut registry = roster(8);
        assert_eq!(
            registry.add(PlayerId::new(9), "Late"),
            Err(Rejected::RosterFull { max: 8 })
        );
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn test_submit_validation() {
        let mut registry = roster(2);

        assert_eq!(
            registry.submit(PlayerId::new(1), 101),
            Err(Rejected::NumberOutOfRange { number: 101 })
        );
        assert_eq!(
            registry.submit(PlayerId::new(1), -1),
            Err(Rejected::NumberOutOfRange { number: -1 })
        );
        assert_eq!(
            registry.submit(PlayerId::new(9), 50),
            Err(Rejected::UnknownPlayer(PlayerId::new(9)))
        );
        assert!(!registry.get(PlayerId::new(1)).unwrap().has_submitted);

        registry.submit(PlayerId::new(1), 0).unwrap();
        assert_eq!(
            registry.submit(PlayerId::new(1), 100),
            Err(Rejected::AlreadySubmitted(PlayerId::new(1)))
        );
        // First answer stands
        assert_eq!(registry.get(PlayerId::new(1)).unwrap().submitted_number, Some(0));
    }

    #[test]
    fn test_all_submitted_ignores_eliminated() {
        let mut registry = roster(3);
        registry.get_mut(PlayerId::new(3)).unwrap().score = 0;
        assert_eq!(registry.eliminate_depleted(0), vec![PlayerId::new(3)]);

        registry.submit(PlayerId::new(1), 10).unwrap();
        assert!(!registry.all_submitted());
        assert_eq!(registry.missing(), vec![PlayerId::new(2)]);

        registry.submit(PlayerId::new(2), 20).unwrap();
        assert!(registry.all_submitted());

        assert_eq!(
            registry.submit(PlayerId::new(3), 30),
            Err(Rejected::PlayerEliminated(PlayerId::new(3)))
        );
    }

    #[test]
    fn test_random_fill() {
        let mut registry = roster(3);
        registry.submit(PlayerId::new(2), 77).unwrap();

        let mut rng = GameRng::new(42);
        let assigned = registry.assign_random_to_stragglers(&mut rng);

        let ids: Vec<_> = assigned.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![PlayerId::new(1), PlayerId::new(3)]);
        assert!(assigned.iter().all(|(_, n)| *n <= 100));
        assert!(registry.all_submitted());
        assert_eq!(registry.get(PlayerId::new(2)).unwrap().submitted_number, Some(77));
    }

    #[test]
    fn test_clear_submissions() {
        let mut registry = roster(2);
        registry.submit(PlayerId::new(1), 5).unwrap();
        registry.clear_submissions();

        let p1 = registry.get(PlayerId::new(1)).unwrap();
        assert!(!p1.has_submitted);
        assert_eq!(p1.submitted_number, None);
    }

    #[test]
    fn test_penalty_skips_eliminated() {
        let mut registry = roster(2);
        registry.get_mut(PlayerId::new(2)).unwrap().score = -1;
        registry.eliminate_depleted(0);

        registry.apply_penalty(PlayerId::new(1), 3);
        registry.apply_penalty(PlayerId::new(2), 3);

        assert_eq!(registry.get(PlayerId::new(1)).unwrap().score, 7);
        assert_eq!(registry.get(PlayerId::new(2)).unwrap().score, -1);
    }

    #[test]
    fn test_eliminate_depleted_is_idempotent() {
        let mut registry = roster(3);
        registry.get_mut(PlayerId::new(1)).unwrap().score = 0;
        registry.get_mut(PlayerId::new(3)).unwrap().score = -4;

        assert_eq!(
            registry.eliminate_depleted(0),
            vec![PlayerId::new(1), PlayerId::new(3)]
        );
        assert!(registry.eliminate_depleted(0).is_empty());
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn test_reduce_life_gate_never_closes() {
        let mut registry = roster(1);
        let id = PlayerId::new(1);

        assert_eq!(registry.reduce_life(id), Ok(8));
        assert_eq!(registry.reduce_life(id), Ok(6));
        assert_eq!(registry.get(id).unwrap().extra_lives, 1);

        registry.get_mut(id).unwrap().extra_lives = 0;
        assert_eq!(registry.reduce_life(id), Ok(6));
    }

    #[test]
    fn test_leaderboard_is_stable() {
        let mut registry = roster(3);
        registry.apply_penalty(PlayerId::new(1), 2);

        let order: Vec<_> = registry.leaderboard().iter().map(|p| p.id).collect();
        assert_eq!(order, vec![PlayerId::new(2), PlayerId::new(3), PlayerId::new(1)]);
    }
}
