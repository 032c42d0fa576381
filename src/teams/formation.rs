//! Team formation for the team phase.
//!
//! Pairing takes consent from both sides: A proposes to B, then B confirms
//! A's proposal together with the pair's shared number. Only the confirmation
//! touches player state. Proposals are plain intents and can be replaced or
//! withdrawn at will.
//!
//! Pairings are symmetric (`A.teammate_id == Some(B)` iff
//! `B.teammate_id == Some(A)`) and a player is in at most one pair.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::Rejected;
use crate::core::player::PlayerId;
use crate::players::{validate_choice, PlayerRegistry};

/// Open proposals and pairing operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamFormationManager {
    /// proposer -> proposed partner
    proposals: FxHashMap<PlayerId, PlayerId>,
}

impl TeamFormationManager {
    /// Create a manager with no open proposals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `a`'s intent to pair with `b`.
    ///
    /// Both must be active and unpaired. A new proposal from `a` replaces
    /// the previous one. `b` is not modified.
    pub fn propose(
        &mut self,
        registry: &PlayerRegistry,
        a: PlayerId,
        b: PlayerId,
    ) -> Result<(), Rejected> {
        if a == b {
            return Err(Rejected::SelfPairing);
        }
        let proposer = registry.active(a)?;
        let partner = registry.active(b)?;
        if proposer.is_paired() {
            return Err(Rejected::AlreadyPaired(a));
        }
        if partner.is_paired() {
            return Err(Rejected::AlreadyPaired(b));
        }

        self.proposals.insert(a, b);
        debug!(proposer = %a, partner = %b, "team proposed");
        Ok(())
    }

    /// `b` accepts `a`'s proposal with the pair's shared number.
    ///
    /// On success both players point at each other and carry
    /// `combined_number`. Every open proposal involving either of them is
    /// dropped.
    pub fn confirm(
        &mut self,
        registry: &mut PlayerRegistry,
        b: PlayerId,
        a: PlayerId,
        combined_number: i64,
    ) -> Result<(), Rejected> {
        if a == b {
            return Err(Rejected::SelfPairing);
        }
        let number = validate_choice(combined_number)?;
        let proposer = registry.active(a)?;
        let partner = registry.active(b)?;
        if self.proposals.get(&a) != Some(&b) {
            return Err(Rejected::NoProposal {
                proposer: a,
                target: b,
            });
        }
        if proposer.is_paired() {
            return Err(Rejected::AlreadyPaired(a));
        }
        if partner.is_paired() {
            return Err(Rejected::AlreadyPaired(b));
        }

        for (id, teammate) in [(a, b), (b, a)] {
            if let Some(player) = registry.get_mut(id) {
                player.teammate_id = Some(teammate);
                player.combined_number = Some(number);
            }
        }
        self.forget(a);
        self.forget(b);
        debug!(proposer = %a, partner = %b, "team confirmed");
        Ok(())
    }

    /// A paired player answers for the pair.
    ///
    /// Sets the combined number on both members and marks both as answered.
    pub fn submit_joint(
        &self,
        registry: &mut PlayerRegistry,
        id: PlayerId,
        number: i64,
    ) -> Result<(), Rejected> {
        let number = validate_choice(number)?;
        let player = registry.active(id)?;
        if player.has_submitted {
            return Err(Rejected::AlreadySubmitted(id));
        }
        let Some(teammate) = player.teammate_id else {
            return registry.submit(id, i64::from(number));
        };

        for member in [id, teammate] {
            if let Ok(p) = registry.active_mut(member) {
                p.combined_number = Some(number);
                p.submitted_number = Some(number);
                p.has_submitted = true;
            }
        }
        debug!(player = %id, teammate = %teammate, "joint submission recorded");
        Ok(())
    }

    /// Withdraw `a`'s open proposal, returning who it was for.
    pub fn withdraw(&mut self, a: PlayerId) -> Option<PlayerId> {
        self.proposals.remove(&a)
    }

    /// Who `a` has proposed to, if anyone.
    #[must_use]
    pub fn proposal_of(&self, a: PlayerId) -> Option<PlayerId> {
        self.proposals.get(&a).copied()
    }

    /// Number of open proposals.
    #[must_use]
    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    /// Break up `id`'s pair. Returns the former teammate.
    pub fn dissolve(&mut self, registry: &mut PlayerRegistry, id: PlayerId) -> Option<PlayerId> {
        let teammate = registry.get(id)?.teammate_id?;
        for member in [id, teammate] {
            if let Some(p) = registry.get_mut(member) {
                p.clear_pairing();
            }
        }
        debug!(player = %id, teammate = %teammate, "team dissolved");
        Some(teammate)
    }

    /// Drop every proposal made by or to `id`.
    pub fn forget(&mut self, id: PlayerId) {
        self.proposals.retain(|&from, &mut to| from != id && to != id);
    }

    /// Remove all pairings and proposals.
    pub fn clear(&mut self, registry: &mut PlayerRegistry) {
        self.proposals.clear();
        for player in registry.active_players_mut() {
            player.clear_pairing();
        }
    }
}
