//! Round evaluation.
//!
//! Given a complete set of answers, the evaluator derives the target, picks
//! winners and hands out penalties. It does not eliminate, escalate or change
//! phase; the session runs those passes on the result.
//!
//! ## Target
//!
//! `round(mean(choices) * ratio, 2)`, with ratio 0.8 by default. The target is
//! held in integer hundredths and every distance comparison is made in
//! hundredths, so ties are exact.
//!
//! ## Individual phase
//!
//! Active rules are consulted newest first. The first whose trigger holds
//! decides the round alone. Without a firing rule:
//!
//! - any duplicated number costs every active player a point, no winner;
//! - otherwise everyone at minimal distance wins and the rest lose a point.
//!
//! ## Team phase
//!
//! Each pair contributes one entry with its combined number, everyone else
//! their own answer. Closest entries win; a player loses a point unless they
//! or their teammate won.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::config::EngineConfig;
use crate::core::error::EngineError;
use crate::core::phase::Phase;
use crate::core::player::PlayerId;
use crate::players::PlayerRegistry;
use crate::stack::RuleEscalationStack;

use super::rule::RuleId;

/// Player list sized for a full roster.
pub type PlayerList = SmallVec<[PlayerId; 8]>;

/// The number players aim for, in hundredths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    centi: i64,
}

impl Target {
    /// Create from a value in hundredths.
    #[must_use]
    pub const fn from_centi(centi: i64) -> Self {
        Self { centi }
    }

    /// Derive the target from a set of choices.
    ///
    /// Returns `None` for an empty set.
    ///
    /// ```
    /// use rust_kod::rules::Target;
    ///
    /// let target = Target::from_choices(&[0, 50, 100], 0.8).unwrap();
    /// assert_eq!(target.centi(), 4000);
    /// assert_eq!(target.value(), 40.0);
    /// ```
    #[must_use]
    pub fn from_choices(choices: &[u8], ratio: f64) -> Option<Self> {
        if choices.is_empty() {
            return None;
        }
        let sum: u32 = choices.iter().map(|&n| u32::from(n)).sum();
        let mean = f64::from(sum) / choices.len() as f64;
        Some(Self {
            centi: (mean * ratio * 100.0).round() as i64,
        })
    }

    /// The target in hundredths.
    #[must_use]
    pub const fn centi(self) -> i64 {
        self.centi
    }

    /// The target as a decimal.
    #[must_use]
    pub fn value(self) -> f64 {
        self.centi as f64 / 100.0
    }

    /// The target rounded to a whole number, halves away from zero.
    #[must_use]
    pub const fn rounded(self) -> i64 {
        if self.centi >= 0 {
            (self.centi + 50) / 100
        } else {
            (self.centi - 50) / 100
        }
    }

    /// Distance from `number` to the target, in hundredths.
    #[must_use]
    pub const fn distance(self, number: u8) -> i64 {
        (number as i64 * 100 - self.centi).abs()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.value())
    }
}

/// Outcome of one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Round number (starts at 1).
    pub round: u32,

    /// Phase the round was played in.
    pub phase: Phase,

    /// Announcement text.
    pub message: String,

    /// Every entry that counted, as (name, number), in join order.
    pub choices: Vec<(String, u8)>,

    /// The target, two decimals.
    pub target: f64,

    /// Round winners. May be empty.
    pub winners: PlayerList,

    /// Special rule that decided the round, if any.
    pub rule: Option<RuleId>,

    /// Players who lost points, with the points lost.
    pub losers: SmallVec<[(PlayerId, i32); 8]>,

    /// Players eliminated after scoring.
    pub eliminated: Vec<PlayerId>,

    /// Rule activated after this round, if any.
    pub escalated: Option<RuleId>,

    /// Did this round move the game into the team phase?
    pub entered_team_phase: bool,
}

impl RoundResult {
    /// Did `player` win this round?
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        self.winners.contains(&player)
    }

    /// Points `player` lost this round (0 if none).
    #[must_use]
    pub fn penalty_of(&self, player: PlayerId) -> i32 {
        self.losers
            .iter()
            .find(|(id, _)| *id == player)
            .map_or(0, |(_, points)| *points)
    }
}

/// One counted choice. A pair is a single entry with two members.
#[derive(Clone, Debug)]
struct Entry {
    members: SmallVec<[PlayerId; 2]>,
    label: String,
    number: u8,
}

/// Winners and penalties before they are applied.
#[derive(Debug, Default)]
struct Scoring {
    rule: Option<RuleId>,
    winners: PlayerList,
    losers: SmallVec<[(PlayerId, i32); 8]>,
    note: Option<&'static str>,
}

/// Scores rounds.
#[derive(Clone, Debug)]
pub struct RoundEvaluator {
    target_ratio: f64,
    penalty: i32,
}

impl RoundEvaluator {
    /// Create an evaluator using the ratio and penalty from `config`.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            target_ratio: config.target_ratio,
            penalty: config.default_penalty,
        }
    }

    /// Score a round and apply the penalties to `registry`.
    ///
    /// Every active player must have an answer, otherwise
    /// [`EngineError::IncompleteSubmissions`] is returned and nothing changes.
    /// The returned result has empty `eliminated`/`escalated` fields; those
    /// passes belong to the caller.
    pub fn evaluate(
        &self,
        round: u32,
        phase: Phase,
        registry: &mut PlayerRegistry,
        rules: &RuleEscalationStack,
    ) -> Result<RoundResult, EngineError> {
        if registry.active_count() == 0 {
            return Err(EngineError::EmptyChoiceSet);
        }
        if !registry.all_submitted() {
            return Err(EngineError::IncompleteSubmissions {
                missing: registry.missing(),
            });
        }

        let entries = match phase {
            Phase::Individual => individual_entries(registry),
            Phase::Team => team_entries(registry),
        };
        let numbers: Vec<u8> = entries.iter().map(|e| e.number).collect();
        let target =
            Target::from_choices(&numbers, self.target_ratio).ok_or(EngineError::EmptyChoiceSet)?;

        let scoring = match phase {
            Phase::Individual => self.score_individual(&entries, target, rules),
            Phase::Team => self.score_team(&entries, target, registry),
        };

        for &(id, points) in &scoring.losers {
            registry.apply_penalty(id, points);
        }

        let message = compose_message(&entries, target, &scoring, registry);
        Ok(RoundResult {
            round,
            phase,
            message,
            choices: entries.into_iter().map(|e| (e.label, e.number)).collect(),
            target: target.value(),
            winners: scoring.winners,
            rule: scoring.rule,
            losers: scoring.losers,
            eliminated: Vec::new(),
            escalated: None,
            entered_team_phase: false,
        })
    }

    // === Individual Phase ===

    fn score_individual(
        &self,
        entries: &[Entry],
        target: Target,
        rules: &RuleEscalationStack,
    ) -> Scoring {
        let counts = count_numbers(entries);

        for rule in rules.newest_first() {
            if let Some(scoring) = self.apply_rule(rule, entries, target, &counts) {
                return scoring;
            }
        }

        if counts.values().any(|&c| c >= 2) {
            return Scoring {
                losers: entries
                    .iter()
                    .flat_map(|e| e.members.iter().map(|&id| (id, self.penalty)))
                    .collect(),
                note: Some("Duplicate numbers! Every player loses a point."),
                ..Scoring::default()
            };
        }

        self.closest_wins(entries, target)
    }

    /// Run one rule. `None` when its trigger does not hold.
    fn apply_rule(
        &self,
        rule: RuleId,
        entries: &[Entry],
        target: Target,
        counts: &FxHashMap<u8, usize>,
    ) -> Option<Scoring> {
        match rule {
            RuleId::ZeroBeatsHundred => {
                let zeros: Vec<_> = entries.iter().filter(|e| e.number == 0).collect();
                let hundreds: Vec<_> = entries.iter().filter(|e| e.number == 100).collect();
                if zeros.is_empty() || hundreds.is_empty() {
                    return None;
                }
                Some(Scoring {
                    rule: Some(rule),
                    winners: hundreds.iter().flat_map(|e| e.members.iter().copied()).collect(),
                    losers: zeros
                        .iter()
                        .flat_map(|e| e.members.iter().map(|&id| (id, self.penalty)))
                        .collect(),
                    note: None,
                })
            }
            RuleId::ExactHitDoublePenalty => {
                let hit = target.rounded();
                if !entries.iter().any(|e| i64::from(e.number) == hit) {
                    return None;
                }
                let (hitters, others): (Vec<_>, Vec<_>) =
                    entries.iter().partition(|e| i64::from(e.number) == hit);
                Some(Scoring {
                    rule: Some(rule),
                    winners: hitters.iter().flat_map(|e| e.members.iter().copied()).collect(),
                    losers: others
                        .iter()
                        .flat_map(|e| e.members.iter().map(|&id| (id, self.penalty * 2)))
                        .collect(),
                    note: None,
                })
            }
            // Duplicated answers lose a point; the closest unique answer wins
            // and the other unique answers lose the default point.
            RuleId::DuplicateInvalidation => {
                if !counts.values().any(|&c| c >= 2) {
                    return None;
                }
                let (unique, duplicated): (Vec<_>, Vec<_>) =
                    entries.iter().partition(|e| counts[&e.number] == 1);

                // First in join order among the closest unique answers
                let winner = unique.iter().min_by_key(|e| target.distance(e.number)).copied();

                let mut losers: SmallVec<[(PlayerId, i32); 8]> = duplicated
                    .iter()
                    .flat_map(|e| e.members.iter().map(|&id| (id, self.penalty)))
                    .collect();
                let mut winners = PlayerList::new();
                if let Some(winner) = winner {
                    winners.extend(winner.members.iter().copied());
                    losers.extend(
                        unique
                            .iter()
                            .filter(|e| !std::ptr::eq(**e, winner))
                            .flat_map(|e| e.members.iter().map(|&id| (id, self.penalty))),
                    );
                }
                Some(Scoring {
                    rule: Some(rule),
                    winners,
                    losers,
                    note: None,
                })
            }
        }
    }

    /// Everyone at minimal distance wins, everyone else pays the penalty.
    fn closest_wins(&self, entries: &[Entry], target: Target) -> Scoring {
        let best = entries
            .iter()
            .map(|e| target.distance(e.number))
            .min()
            .unwrap_or(0);

        let mut scoring = Scoring::default();
        for entry in entries {
            if target.distance(entry.number) == best {
                scoring.winners.extend(entry.members.iter().copied());
            } else {
                scoring
                    .losers
                    .extend(entry.members.iter().map(|&id| (id, self.penalty)));
            }
        }
        scoring
    }

    // === Team Phase ===

    fn score_team(&self, entries: &[Entry], target: Target, registry: &PlayerRegistry) -> Scoring {
        let mut scoring = self.closest_wins(entries, target);

        // Penalise per player, sparing anyone whose teammate won.
        scoring.losers = registry
            .active_players()
            .filter(|p| !scoring.winners.contains(&p.id))
            .filter(|p| p.teammate_id.map_or(true, |t| !scoring.winners.contains(&t)))
            .map(|p| (p.id, self.penalty))
            .collect();
        scoring
    }
}

fn individual_entries(registry: &PlayerRegistry) -> Vec<Entry> {
    registry
        .active_players()
        .map(|p| Entry {
            members: smallvec::smallvec![p.id],
            label: p.display_name.clone(),
            number: p.submitted_number.unwrap_or(0),
        })
        .collect()
}

/// One entry per pair (at the first member's position), one per solo player.
fn team_entries(registry: &PlayerRegistry) -> Vec<Entry> {
    let mut entries: Vec<Entry> = Vec::new();
    for player in registry.active_players() {
        let partner = player
            .teammate_id
            .and_then(|t| registry.get(t))
            .filter(|t| t.is_active() && t.teammate_id == Some(player.id));

        match (partner, player.combined_number) {
            (Some(partner), Some(combined)) => {
                if entries.iter().any(|e| e.members.contains(&player.id)) {
                    continue;
                }
                entries.push(Entry {
                    members: smallvec::smallvec![player.id, partner.id],
                    label: format!("{} & {}", player.display_name, partner.display_name),
                    number: combined,
                });
            }
            _ => entries.push(Entry {
                members: smallvec::smallvec![player.id],
                label: player.display_name.clone(),
                number: player.submitted_number.unwrap_or(0),
            }),
        }
    }
    entries
}

fn count_numbers(entries: &[Entry]) -> FxHashMap<u8, usize> {
    let mut counts = FxHashMap::default();
    for entry in entries {
        *counts.entry(entry.number).or_insert(0) += 1;
    }
    counts
}

fn compose_message(
    entries: &[Entry],
    target: Target,
    scoring: &Scoring,
    registry: &PlayerRegistry,
) -> String {
    let mut lines = Vec::new();

    let picks: Vec<String> = entries
        .iter()
        .map(|e| format!("{}: {}", e.label, e.number))
        .collect();
    lines.push(format!("Choices: {}", picks.join(", ")));
    lines.push(format!("Regal's number: {}", target));

    if let Some(rule) = scoring.rule {
        lines.push(format!("Rule in effect: {}", rule.name()));
    }
    if let Some(note) = scoring.note {
        lines.push(note.to_string());
    }

    let names: Vec<&str> = scoring
        .winners
        .iter()
        .filter_map(|&id| registry.get(id).map(|p| p.display_name.as_str()))
        .collect();
    match names.len() {
        0 => lines.push("No winner this round.".to_string()),
        1 => lines.push(format!("Winner: {}", names[0])),
        _ => lines.push(format!("Winners: {}", names.join(", "))),
    }

    lines.join("\n")
}
