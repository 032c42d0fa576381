//! Game session state machine.
//!
//! ```text
//! Lobby -> Started(Individual) -> Started(Team) -> Over
//! ```
//!
//! A session owns the roster, the rule stack, the pairing state and the
//! random-fill RNG. The caller drives it one round at a time:
//!
//! 1. `start_round`
//! 2. `submit_number` as answers arrive (`force_random_fill` on timeout)
//! 3. `evaluate_round` once `all_submitted`
//! 4. repeat until `is_game_over`
//!
//! `evaluate_round` scores the round, then runs the elimination, escalation
//! and phase passes in that order.

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, Rejected};
use crate::core::phase::Phase;
use crate::core::player::PlayerId;
use crate::core::rng::{GameRng, GameRngState};
use crate::players::{Player, PlayerRegistry};
use crate::rules::{PlayerList, RoundEvaluator, RoundResult, RuleId};
use crate::stack::RuleEscalationStack;
use crate::teams::TeamFormationManager;

/// Players needed to start a game.
pub const MIN_PLAYERS: usize = 2;

/// Where a session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Accepting players.
    Lobby,
    /// Rounds in progress.
    Started(Phase),
    /// At most one player left.
    Over,
}

/// Compact record of a finished round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u32,
    pub phase: Phase,
    pub target: f64,
    pub winners: PlayerList,
    pub rule: Option<RuleId>,
    pub eliminated: Vec<PlayerId>,
}

impl From<&RoundResult> for RoundSummary {
    fn from(result: &RoundResult) -> Self {
        Self {
            round: result.round,
            phase: result.phase,
            target: result.target,
            winners: result.winners.clone(),
            rule: result.rule,
            eliminated: result.eliminated.clone(),
        }
    }
}

/// What one elimination pass changed.
struct EliminationPass {
    eliminated: Vec<PlayerId>,
    escalated: Option<RuleId>,
    entered_team_phase: bool,
}

/// One game, from lobby to winner.
///
/// Sessions hold no global state; the caller keeps as many as it likes.
///
/// ## Example
///
/// ```
/// use rust_kod::core::PlayerId;
/// use rust_kod::session::GameSession;
///
/// let mut game = GameSession::new();
/// for (id, name) in [(1, "Alice"), (2, "Bob"), (3, "Carol")] {
///     game.add_player(PlayerId::new(id), name).unwrap();
/// }
/// game.start_game().unwrap();
/// game.start_round().unwrap();
///
/// game.submit_number(PlayerId::new(1), 0).unwrap();
/// game.submit_number(PlayerId::new(2), 50).unwrap();
/// game.submit_number(PlayerId::new(3), 100).unwrap();
///
/// let result = game.evaluate_round().unwrap();
/// assert_eq!(result.target, 40.0);
/// assert_eq!(result.winners.as_slice(), &[PlayerId::new(2)]);
/// ```
#[derive(Clone, Debug)]
pub struct GameSession {
    config: EngineConfig,
    players: PlayerRegistry,
    rules: RuleEscalationStack,
    teams: TeamFormationManager,
    evaluator: RoundEvaluator,
    rng: GameRng,

    /// Current round (0 before the first round starts).
    round: u32,
    phase: Phase,
    started: bool,
    /// Is the current round waiting for answers or evaluation?
    round_open: bool,

    history: Vector<RoundSummary>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    /// Create a session with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a session with a custom configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            players: PlayerRegistry::new(&config),
            rules: RuleEscalationStack::new(),
            teams: TeamFormationManager::new(),
            evaluator: RoundEvaluator::new(&config),
            rng: GameRng::from_seed_option(config.seed),
            round: 0,
            phase: Phase::Individual,
            started: false,
            round_open: false,
            history: Vector::new(),
            config,
        }
    }

    /// Replace the rule stack before the game starts.
    ///
    /// Lets house games begin with rules already active.
    pub fn set_rules(&mut self, rules: RuleEscalationStack) -> Result<(), Rejected> {
        if self.started {
            return Err(Rejected::AlreadyStarted);
        }
        self.rules = rules;
        Ok(())
    }

    // === Lobby ===

    /// Add a player to the lobby.
    pub fn add_player(&mut self, id: PlayerId, name: impl Into<String>) -> Result<(), Rejected> {
        if self.started {
            return Err(Rejected::AlreadyStarted);
        }
        self.players.add(id, name)
    }

    /// Close the lobby and start the game.
    ///
    /// Calling it again reports `AlreadyStarted` and changes nothing.
    pub fn start_game(&mut self) -> Result<(), Rejected> {
        if self.started {
            return Err(Rejected::AlreadyStarted);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(Rejected::NotEnoughPlayers {
                min: MIN_PLAYERS,
                have: self.players.len(),
            });
        }

        self.started = true;
        info!(players = self.players.len(), seed = self.rng.seed(), "game started");
        Ok(())
    }

    // === Rounds ===

    /// Open the next round and clear every active player's answer.
    ///
    /// Pairings carry over. Returns the new round number.
    pub fn start_round(&mut self) -> Result<u32, Rejected> {
        self.ensure_running()?;

        self.round += 1;
        self.players.clear_submissions();
        self.round_open = true;
        info!(round = self.round, phase = %self.phase, active = self.active_count(), "round started");
        Ok(self.round)
    }

    /// Record a player's answer.
    ///
    /// In the team phase a paired player answers for the pair.
    pub fn submit_number(&mut self, id: PlayerId, number: i64) -> Result<(), Rejected> {
        self.ensure_running()?;
        if !self.round_open {
            return Err(Rejected::NoOpenRound);
        }

        match self.phase {
            Phase::Individual => self.players.submit(id, number),
            Phase::Team => self.teams.submit_joint(&mut self.players, id, number),
        }
    }

    /// Has every active player answered?
    #[must_use]
    pub fn all_submitted(&self) -> bool {
        self.players.all_submitted()
    }

    /// Active players still owing an answer.
    #[must_use]
    pub fn missing(&self) -> Vec<PlayerId> {
        self.players.missing()
    }

    /// Give every player still owing an answer a random one.
    ///
    /// Meant for timeouts. Returns the assignments; empty when no round is open.
    pub fn force_random_fill(&mut self) -> Vec<(PlayerId, u8)> {
        if !self.round_open {
            return Vec::new();
        }
        let assigned = self.players.assign_random_to_stragglers(&mut self.rng);
        if !assigned.is_empty() {
            warn!(round = self.round, count = assigned.len(), "answers filled at random");
        }
        assigned
    }

    /// Score the open round and run the elimination, escalation and phase
    /// passes.
    ///
    /// Fails without side effects if the round is not open or answers are
    /// missing.
    pub fn evaluate_round(&mut self) -> Result<RoundResult, EngineError> {
        if !self.started {
            return Err(Rejected::NotStarted.into());
        }
        if !self.round_open {
            return Err(EngineError::RoundNotOpen);
        }

        let mut result = self
            .evaluator
            .evaluate(self.round, self.phase, &mut self.players, &self.rules)?;
        self.round_open = false;

        let pass = self.elimination_pass(true);
        result.eliminated = pass.eliminated;
        result.escalated = pass.escalated;
        result.entered_team_phase = pass.entered_team_phase;

        self.append_announcements(&mut result);
        self.history.push_back(RoundSummary::from(&result));
        info!(
            round = self.round,
            target = result.target,
            winners = result.winners.len(),
            eliminated = result.eliminated.len(),
            "round evaluated"
        );
        if self.is_game_over() {
            info!(winner = ?self.get_winner().map(|p| p.id), "game over");
        }
        Ok(result)
    }

    /// Eliminate every active player at or below the threshold.
    ///
    /// Eliminated players leave their pair and their proposals. Any
    /// elimination also runs the escalation and phase passes, so a table
    /// thinned outside a round evaluation still switches to team play.
    /// Returns the newly eliminated ids; calling it again returns nothing.
    pub fn check_eliminations(&mut self) -> Vec<PlayerId> {
        self.elimination_pass(false).eliminated
    }

    /// Life reduction: 2 points off while the player has extra lives.
    ///
    /// Run `check_eliminations` afterwards. Returns the new score.
    pub fn reduce_life(&mut self, id: PlayerId) -> Result<i32, Rejected> {
        self.ensure_running()?;
        self.players.reduce_life(id)
    }

    // === Teams ===

    /// `a` proposes to pair with `b`. Team phase only.
    pub fn propose_team(&mut self, a: PlayerId, b: PlayerId) -> Result<(), Rejected> {
        self.ensure_team_phase()?;
        self.teams.propose(&self.players, a, b)
    }

    /// `b` accepts `a`'s proposal with the pair's number. Team phase only.
    pub fn confirm_team(&mut self, b: PlayerId, a: PlayerId, number: i64) -> Result<(), Rejected> {
        self.ensure_team_phase()?;
        self.teams.confirm(&mut self.players, b, a, number)
    }

    /// Withdraw `a`'s open proposal.
    pub fn withdraw_proposal(&mut self, a: PlayerId) -> Option<PlayerId> {
        self.teams.withdraw(a)
    }

    /// Break up `id`'s pair. Returns the former teammate.
    pub fn dissolve_team(&mut self, id: PlayerId) -> Option<PlayerId> {
        self.teams.dissolve(&mut self.players, id)
    }

    // === Queries ===

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if !self.started {
            SessionState::Lobby
        } else if self.is_game_over() {
            SessionState::Over
        } else {
            SessionState::Started(self.phase)
        }
    }

    /// Is the game finished? Only a started game can be over.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.started && self.active_count() <= 1
    }

    /// The last player standing. `None` while the game runs or if nobody is left.
    #[must_use]
    pub fn get_winner(&self) -> Option<&Player> {
        if !self.is_game_over() {
            return None;
        }
        self.players.active_players().next()
    }

    /// Current round number (0 before the first round).
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Is a round waiting for answers or evaluation?
    #[must_use]
    pub fn is_round_open(&self) -> bool {
        self.round_open
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The roster.
    #[must_use]
    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    /// Look up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Number of active players.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.players.active_count()
    }

    /// Ranking by score, highest first.
    #[must_use]
    pub fn leaderboard(&self) -> Vec<&Player> {
        self.players.leaderboard()
    }

    /// Active rules, oldest first.
    #[must_use]
    pub fn active_rules(&self) -> &[RuleId] {
        self.rules.active()
    }

    /// Number of rules still pending.
    #[must_use]
    pub fn pending_rule_count(&self) -> usize {
        self.rules.pending_count()
    }

    /// Summaries of every evaluated round.
    #[must_use]
    pub fn history(&self) -> &Vector<RoundSummary> {
        &self.history
    }

    /// The session's configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Random-fill RNG state, for replaying a session.
    #[must_use]
    pub fn rng_state(&self) -> GameRngState {
        self.rng.state()
    }

    // === Internals ===

    /// Elimination, then escalation (only if somebody fell), then the switch
    /// to team play. `after_round` runs the phase check even without an
    /// elimination, for tables that started at or below `team_phase_at`.
    fn elimination_pass(&mut self, after_round: bool) -> EliminationPass {
        let eliminated = self
            .players
            .eliminate_depleted(self.config.elimination_threshold);
        for &id in &eliminated {
            self.teams.dissolve(&mut self.players, id);
            self.teams.forget(id);
            info!(player = %id, round = self.round, "player eliminated");
        }

        let escalated = if !eliminated.is_empty() && self.rules.should_escalate(self.active_count())
        {
            // should_escalate guarantees a pending rule
            self.rules.escalate().ok()
        } else {
            None
        };

        let entered_team_phase =
            (after_round || !eliminated.is_empty()) && self.enter_team_phase_if_due();

        EliminationPass {
            eliminated,
            escalated,
            entered_team_phase,
        }
    }

    /// Individual -> Team once the table is small enough. Never on the
    /// round that ends the game.
    fn enter_team_phase_if_due(&mut self) -> bool {
        if !self.started
            || self.phase != Phase::Individual
            || self.is_game_over()
            || self.active_count() > self.config.team_phase_at
        {
            return false;
        }
        self.phase = Phase::Team;
        self.teams.clear(&mut self.players);
        info!(round = self.round, active = self.active_count(), "team phase started");
        true
    }

    fn ensure_running(&self) -> Result<(), Rejected> {
        if !self.started {
            return Err(Rejected::NotStarted);
        }
        if self.is_game_over() {
            return Err(Rejected::GameOver);
        }
        Ok(())
    }

    fn ensure_team_phase(&self) -> Result<(), Rejected> {
        self.ensure_running()?;
        if self.phase != Phase::Team {
            return Err(Rejected::WrongPhase(self.phase.name()));
        }
        Ok(())
    }

    fn names(&self, ids: &[PlayerId]) -> String {
        ids.iter()
            .filter_map(|&id| self.players.get(id))
            .map(|p| p.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn append_announcements(&self, result: &mut RoundResult) {
        if !result.eliminated.is_empty() {
            result
                .message
                .push_str(&format!("\nEliminated: {}", self.names(&result.eliminated)));
        }
        if let Some(rule) = result.escalated {
            result
                .message
                .push_str(&format!("\nNew rule: {}", rule.description()));
        }
        if result.entered_team_phase {
            result.message.push_str(&format!(
                "\n{} players remain. The team phase begins.",
                self.active_count()
            ));
        }
        if self.is_game_over() {
            match self.get_winner() {
                Some(winner) => result
                    .message
                    .push_str(&format!("\n{} wins the game!", winner.display_name)),
                None => result.message.push_str("\nNo players remain."),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> PlayerId {
        PlayerId::new(n)
    }

    fn lobby(n: u64) -> GameSession {
        let mut game = GameSession::with_config(EngineConfig::default().with_seed(42));
        for i in 1..=n {
            game.add_player(id(i), format!("P{}", i)).unwrap();
        }
        game
    }

    #[test]
    fn test_session_is_send_and_clone() {
        fn assert_send_clone<T: Send + Clone>() {}
        assert_send_clone::<GameSession>();
    }

    #[test]
    fn test_lobby_state() {
        let game = lobby(3);
        assert_eq!(game.state(), SessionState::Lobby);
        assert!(!game.is_game_over());
        assert_eq!(game.round(), 0);
    }

    #[test]
    fn test_start_game_guards() {
        let mut game = lobby(1);
        assert_eq!(
            game.start_game(),
            Err(Rejected::NotEnoughPlayers { min: 2, have: 1 })
        );

        game.add_player(id(2), "P2").unwrap();
        game.start_game().unwrap();
        assert_eq!(game.state(), SessionState::Started(Phase::Individual));

        assert_eq!(game.start_game(), Err(Rejected::AlreadyStarted));
        assert_eq!(game.add_player(id(3), "Late"), Err(Rejected::AlreadyStarted));
        assert_eq!(game.players().len(), 2);
    }

    #[test]
    fn test_submit_requires_open_round() {
        let mut game = lobby(5);
        assert_eq!(game.submit_number(id(1), 5), Err(Rejected::NotStarted));

        game.start_game().unwrap();
        assert_eq!(game.submit_number(id(1), 5), Err(Rejected::NoOpenRound));

        game.start_round().unwrap();
        game.submit_number(id(1), 5).unwrap();
    }

    #[test]
    fn test_evaluate_preconditions() {
        let mut game = lobby(5);
        assert_eq!(
            game.evaluate_round(),
            Err(EngineError::Rejected(Rejected::NotStarted))
        );

        game.start_game().unwrap();
        assert_eq!(game.evaluate_round(), Err(EngineError::RoundNotOpen));

        game.start_round().unwrap();
        game.submit_number(id(1), 5).unwrap();
        let err = game.evaluate_round().unwrap_err();
        assert_eq!(
            err,
            EngineError::IncompleteSubmissions {
                missing: vec![id(2), id(3), id(4), id(5)]
            }
        );
        // Still open, nothing scored
        assert!(game.is_round_open());
        assert!(game.players().iter().all(|p| p.score == 10));
    }

    #[test]
    fn test_round_closes_after_evaluation() {
        let mut game = lobby(5);
        game.start_game().unwrap();
        game.start_round().unwrap();
        game.force_random_fill();
        game.evaluate_round().unwrap();

        assert!(!game.is_round_open());
        assert_eq!(game.evaluate_round(), Err(EngineError::RoundNotOpen));
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn test_force_random_fill() {
        let mut game = lobby(3);
        game.start_game().unwrap();
        assert!(game.force_random_fill().is_empty());

        game.start_round().unwrap();
        game.submit_number(id(2), 33).unwrap();
        let assigned = game.force_random_fill();

        assert_eq!(assigned.len(), 2);
        assert!(game.all_submitted());
        assert_eq!(game.player(id(2)).unwrap().submitted_number, Some(33));
    }

    #[test]
    fn test_seeded_fill_is_reproducible() {
        let fill = || {
            let mut game = lobby(6);
            game.start_game().unwrap();
            game.start_round().unwrap();
            game.force_random_fill()
        };
        assert_eq!(fill(), fill());
    }

    #[test]
    fn test_team_ops_need_team_phase() {
        let mut game = lobby(5);
        game.start_game().unwrap();

        assert_eq!(
            game.propose_team(id(1), id(2)),
            Err(Rejected::WrongPhase("individual"))
        );
        assert_eq!(
            game.confirm_team(id(2), id(1), 50),
            Err(Rejected::WrongPhase("individual"))
        );
    }

    #[test]
    fn test_reduce_life() {
        let mut game = lobby(2);
        assert_eq!(game.reduce_life(id(1)), Err(Rejected::NotStarted));

        game.start_game().unwrap();
        for _ in 0..5 {
            game.reduce_life(id(1)).unwrap();
        }
        assert_eq!(game.player(id(1)).unwrap().score, 0);
        assert_eq!(game.check_eliminations(), vec![id(1)]);
        assert!(game.check_eliminations().is_empty());

        assert!(game.is_game_over());
        assert_eq!(game.state(), SessionState::Over);
        assert_eq!(game.get_winner().map(|p| p.id), Some(id(2)));
        assert_eq!(game.start_round(), Err(Rejected::GameOver));
    }

    #[test]
    fn test_set_rules_before_start_only() {
        let mut game = lobby(2);
        game.set_rules(RuleEscalationStack::with_active(&[RuleId::ZeroBeatsHundred]))
            .unwrap();
        assert_eq!(game.active_rules(), &[RuleId::ZeroBeatsHundred]);

        game.start_game().unwrap();
        assert_eq!(
            game.set_rules(RuleEscalationStack::new()),
            Err(Rejected::AlreadyStarted)
        );
    }

    #[test]
    fn test_rng_state_replays_fills() {
        let mut game = lobby(4);
        game.start_game().unwrap();
        let snapshot = game.rng_state();
        assert_eq!(snapshot.seed, 42);

        game.start_round().unwrap();
        let filled: Vec<u8> = game.force_random_fill().iter().map(|&(_, n)| n).collect();

        let mut replay = GameRng::from_state(&snapshot);
        let replayed: Vec<u8> = (0..4).map(|_| replay.gen_choice()).collect();
        assert_eq!(filled, replayed);
    }

    #[test]
    fn test_dissolve_team() {
        let mut game = lobby(4);
        game.start_game().unwrap();
        game.start_round().unwrap();
        game.force_random_fill();
        game.evaluate_round().unwrap();
        assert_eq!(game.phase(), Phase::Team);

        game.propose_team(id(1), id(2)).unwrap();
        game.confirm_team(id(2), id(1), 30).unwrap();
        assert_eq!(game.dissolve_team(id(2)), Some(id(1)));
        assert!(!game.player(id(1)).unwrap().is_paired());
        assert_eq!(game.dissolve_team(id(1)), None);
    }

    #[test]
    fn test_check_eliminations_runs_phase_pass() {
        let mut game = lobby(5);
        game.start_game().unwrap();
        for _ in 0..5 {
            game.reduce_life(id(5)).unwrap();
        }

        assert_eq!(game.check_eliminations(), vec![id(5)]);
        assert_eq!(game.phase(), Phase::Team);
        assert_eq!(game.active_rules(), &[RuleId::DuplicateInvalidation]);

        game.start_round().unwrap();
        assert_eq!(game.state(), SessionState::Started(Phase::Team));
    }
}
