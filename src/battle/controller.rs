//! Turn controller - the battle state machine
//!
//! NotStarted -> PlayerTurn -> Resolving -> (OpponentTurn | PlayerTurn | GameOver)
//!
//! A resolution happens in two steps so a presenter can animate between
//! them: [`land_strike`](TurnController::land_strike) rolls damage and
//! applies it, [`settle`](TurnController::settle) checks for a knockout and
//! passes the turn. Everything here is synchronous; timing lives in
//! [`crate::battle::session`].

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;

use crate::battle::damage::{resolve_damage, DamageOutcome};
use crate::battle::opponent::{policy_for, OpponentPolicy};
use crate::battle::participant::BattleParticipant;
use crate::battle::state::{BattleSnapshot, BattleState, Resolution, TurnPhase};
use crate::core::config::ArenaConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{BattleId, Side, TemplateId};
use crate::creature::CreatureRegistry;
use crate::llm::commentary::{ActionSummary, CommentaryEvent};

/// Why a move submission was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    NoBattle,
    NotYourTurn,
    ResolutionInFlight,
    GameOver,
    UnknownMove,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            MoveRejection::NoBattle => "no battle in progress",
            MoveRejection::NotYourTurn => "not your turn",
            MoveRejection::ResolutionInFlight => "a move is still resolving",
            MoveRejection::GameOver => "the battle is over",
            MoveRejection::UnknownMove => "no such move",
        };
        f.write_str(reason)
    }
}

/// What happened when a strike landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrikeReport {
    pub battle_id: BattleId,
    pub attacker: Side,
    pub attacker_name: String,
    pub move_name: String,
    pub defender_name: String,
    pub outcome: DamageOutcome,
    pub defender_health: u32,
}

impl StrikeReport {
    pub fn commentary(&self) -> CommentaryEvent {
        CommentaryEvent::Action(ActionSummary {
            attacker: self.attacker_name.clone(),
            move_name: self.move_name.clone(),
            defender: self.defender_name.clone(),
            damage: self.outcome.damage,
            critical: self.outcome.critical,
            fainted: self.defender_health == 0,
        })
    }
}

/// Owns the battle state and enforces turn order
pub struct TurnController {
    registry: CreatureRegistry,
    rng: ChaCha8Rng,
    policy: Box<dyn OpponentPolicy>,
    phase: TurnPhase,
    battle: Option<BattleState>,
}

impl TurnController {
    pub fn new(registry: CreatureRegistry, config: &ArenaConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            registry,
            rng,
            policy: policy_for(config.opponent_style),
            phase: TurnPhase::NotStarted,
            battle: None,
        }
    }

    /// Replace the opponent's move selection policy
    pub fn with_policy(mut self, policy: Box<dyn OpponentPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &CreatureRegistry {
        &self.registry
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn state(&self) -> Option<&BattleState> {
        self.battle.as_ref()
    }

    pub fn battle_id(&self) -> Option<BattleId> {
        self.battle.as_ref().map(|b| b.battle_id)
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            phase: self.phase,
            battle: self.battle.clone(),
        }
    }

    /// Start a fresh battle with the player's pick and a random opponent
    ///
    /// An unknown template id is an error and leaves the controller as it was.
    pub fn initialize_battle(&mut self, player_id: TemplateId) -> Result<&BattleState> {
        let player_template = self.registry.require(player_id)?;
        let opponent_template = *self
            .registry
            .opponent_pool(player_id)
            .choose(&mut self.rng)
            .ok_or_else(|| ArenaError::InvalidRoster("no opponent available".into()))?;

        let state = BattleState::new(
            BattleParticipant::from_template(player_template),
            BattleParticipant::from_template(opponent_template),
        );

        tracing::info!(
            "Battle {:?} started: {} vs {}",
            state.battle_id.0,
            state.player.name,
            state.opponent.name
        );

        self.phase = TurnPhase::PlayerTurn;
        Ok(self.battle.insert(state))
    }

    /// Intro line for the current battle
    pub fn intro_commentary(&self) -> Option<CommentaryEvent> {
        self.battle.as_ref().map(|b| CommentaryEvent::Intro {
            player: b.player.name.clone(),
            opponent: b.opponent.name.clone(),
        })
    }

    /// Accept `side`'s move if it is that side's turn and nothing is resolving
    ///
    /// A rejected submission leaves every piece of state untouched.
    pub fn submit_move(
        &mut self,
        side: Side,
        move_index: usize,
    ) -> std::result::Result<(), MoveRejection> {
        let battle = self.battle.as_ref().ok_or(MoveRejection::NoBattle)?;

        match self.phase {
            TurnPhase::NotStarted => return Err(MoveRejection::NoBattle),
            TurnPhase::GameOver => return Err(MoveRejection::GameOver),
            TurnPhase::Resolving(_) => return Err(MoveRejection::ResolutionInFlight),
            TurnPhase::PlayerTurn | TurnPhase::OpponentTurn => {}
        }

        if self.phase.awaiting() != Some(side) {
            return Err(MoveRejection::NotYourTurn);
        }

        if move_index >= battle.participant(side).moves.len() {
            return Err(MoveRejection::UnknownMove);
        }

        self.phase = TurnPhase::Resolving(Resolution {
            attacker: side,
            move_index,
            landed: None,
        });
        Ok(())
    }

    /// Let the opponent policy choose and submit a move
    ///
    /// Only acts during the opponent's turn. Returns the chosen move index.
    pub fn take_opponent_turn(&mut self) -> Option<usize> {
        if self.phase != TurnPhase::OpponentTurn {
            return None;
        }
        let battle = self.battle.as_ref()?;

        let move_count = battle.opponent.moves.len();
        let mut index = self
            .policy
            .select_move(&battle.opponent, &battle.player, &mut self.rng);

        // A bad pick must not stall the turn
        if index >= move_count && move_count > 0 {
            let fallback = self.rng.gen_range(0..move_count);
            tracing::warn!(
                "Opponent policy '{}' chose move {} of {}, using {} instead",
                self.policy.name(),
                index,
                move_count,
                fallback
            );
            index = fallback;
        }

        match self.submit_move(Side::Opponent, index) {
            Ok(()) => Some(index),
            Err(rejection) => {
                tracing::warn!(
                    "Opponent policy '{}' chose move {}: {}",
                    self.policy.name(),
                    index,
                    rejection
                );
                None
            }
        }
    }

    /// Roll damage for the pending move and apply it to the defender
    ///
    /// Returns `None` unless a move is resolving and has not landed yet.
    pub fn land_strike(&mut self) -> Option<StrikeReport> {
        let TurnPhase::Resolving(resolution) = self.phase else {
            return None;
        };
        if resolution.landed.is_some() {
            return None;
        }
        let battle = self.battle.as_mut()?;
        let battle_id = battle.battle_id;

        let (attacker, defender) = battle.combatants_mut(resolution.attacker);
        let chosen = attacker.moves.get(resolution.move_index)?;

        let outcome = resolve_damage(attacker, defender, chosen, &mut self.rng);
        let report = StrikeReport {
            battle_id,
            attacker: resolution.attacker,
            attacker_name: attacker.name.clone(),
            move_name: chosen.name.clone(),
            defender_name: defender.name.clone(),
            outcome,
            defender_health: defender.apply_damage(outcome.damage),
        };

        tracing::debug!(
            "{} used {} on {}: {} damage (critical: {}, {}), {} HP left",
            report.attacker_name,
            report.move_name,
            report.defender_name,
            outcome.damage,
            outcome.critical,
            outcome.effectiveness,
            report.defender_health
        );

        self.phase = TurnPhase::Resolving(Resolution {
            landed: Some(outcome),
            ..resolution
        });
        Some(report)
    }

    /// Finish a landed strike: knockout check, then pass the turn
    pub fn settle(&mut self) -> Option<TurnPhase> {
        let TurnPhase::Resolving(resolution) = self.phase else {
            return None;
        };
        if resolution.landed.is_none() {
            return None;
        }
        let battle = self.battle.as_mut()?;

        let defender = resolution.attacker.other();
        if battle.participant(defender).is_fainted() {
            battle.finish(resolution.attacker);
            self.phase = TurnPhase::GameOver;
            tracing::info!(
                "Battle {:?} over: {} wins",
                battle.battle_id.0,
                battle.participant(resolution.attacker).name
            );
        } else {
            battle.turn = defender;
            self.phase = TurnPhase::turn_of(defender);
        }

        Some(self.phase)
    }

    /// Land and settle in one step (no pacing)
    pub fn resolve_pending(&mut self) -> Option<StrikeReport> {
        let report = self.land_strike()?;
        self.settle();
        Some(report)
    }

    /// Append a commentary line if it belongs to the current battle
    pub fn append_commentary(&mut self, battle_id: BattleId, text: String) -> bool {
        match self.battle.as_mut() {
            Some(battle) if battle.battle_id == battle_id => {
                battle.log.push(text);
                true
            }
            _ => {
                tracing::debug!("Dropping commentary for a discarded battle");
                false
            }
        }
    }

    /// Discard the current battle and return to `NotStarted`
    pub fn abandon(&mut self) -> Option<BattleId> {
        self.phase = TurnPhase::NotStarted;
        let abandoned = self.battle.take().map(|b| b.battle_id);
        if let Some(id) = abandoned {
            tracing::info!("Battle {:?} abandoned", id.0);
        }
        abandoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::opponent::RandomPolicy;

    fn controller(seed: u64) -> TurnController {
        TurnController::new(
            CreatureRegistry::builtin(),
            &ArenaConfig::headless().with_seed(seed),
        )
    }

    #[test]
    fn test_initialize_battle() {
        let mut c = controller(1);
        assert_eq!(c.phase(), TurnPhase::NotStarted);

        let state = c.initialize_battle(25).unwrap().clone();
        assert_eq!(c.phase(), TurnPhase::PlayerTurn);
        assert_eq!(state.player.name, "Pikachu");
        assert_ne!(state.opponent.template_id, 25);
        assert_eq!(state.player.current_health, state.player.max_health);
        assert_eq!(state.opponent.current_health, state.opponent.max_health);
        assert!(state.log.is_empty());
        assert!(!state.game_over);
        assert!(state.winner.is_none());
    }

    #[test]
    fn test_opponent_is_never_the_player() {
        let mut c = controller(8);
        for _ in 0..200 {
            let state = c.initialize_battle(4).unwrap();
            assert_ne!(state.opponent.template_id, 4);
        }
    }

    #[test]
    fn test_unknown_template_keeps_previous_state() {
        let mut c = controller(2);
        c.initialize_battle(1).unwrap();
        let before = c.snapshot();

        assert!(matches!(
            c.initialize_battle(404),
            Err(ArenaError::UnknownTemplate(404))
        ));
        assert_eq!(c.snapshot(), before);
    }

    #[test]
    fn test_unknown_template_from_fresh_controller() {
        let mut c = controller(2);
        assert!(c.initialize_battle(404).is_err());
        assert_eq!(c.phase(), TurnPhase::NotStarted);
        assert!(c.state().is_none());
    }

    #[test]
    fn test_submit_without_battle() {
        let mut c = controller(3);
        assert_eq!(c.submit_move(Side::Player, 0), Err(MoveRejection::NoBattle));
    }

    #[test]
    fn test_opponent_cannot_move_on_player_turn() {
        let mut c = controller(3);
        c.initialize_battle(7).unwrap();
        let before = c.snapshot();
        assert_eq!(
            c.submit_move(Side::Opponent, 0),
            Err(MoveRejection::NotYourTurn)
        );
        assert_eq!(c.snapshot(), before);
    }

    #[test]
    fn test_unknown_move_rejected() {
        let mut c = controller(3);
        c.initialize_battle(7).unwrap();
        assert_eq!(c.submit_move(Side::Player, 99), Err(MoveRejection::UnknownMove));
        assert_eq!(c.phase(), TurnPhase::PlayerTurn);
    }

    #[test]
    fn test_second_submit_while_resolving_is_ignored() {
        let mut c = controller(4);
        c.initialize_battle(7).unwrap();
        c.submit_move(Side::Player, 0).unwrap();
        let before = c.snapshot();

        assert_eq!(
            c.submit_move(Side::Player, 1),
            Err(MoveRejection::ResolutionInFlight)
        );
        assert_eq!(
            c.submit_move(Side::Opponent, 1),
            Err(MoveRejection::ResolutionInFlight)
        );
        assert_eq!(c.snapshot(), before);
    }

    #[test]
    fn test_land_then_settle_passes_turn() {
        let mut c = controller(5);
        c.initialize_battle(133).unwrap();
        c.submit_move(Side::Player, 0).unwrap();

        let report = c.land_strike().unwrap();
        let state = c.state().unwrap();
        assert_eq!(report.attacker, Side::Player);
        assert_eq!(
            state.opponent.current_health,
            state.opponent.max_health - report.outcome.damage
        );
        // Player's health is untouched by their own attack
        assert_eq!(state.player.current_health, state.player.max_health);
        // Still resolving until settled
        assert!(c.phase().is_resolving());
        assert!(c.land_strike().is_none());

        assert_eq!(c.settle(), Some(TurnPhase::OpponentTurn));
        assert_eq!(c.state().unwrap().turn, Side::Opponent);
        assert!(!c.state().unwrap().game_over);
    }

    #[test]
    fn test_settle_before_landing_does_nothing() {
        let mut c = controller(5);
        c.initialize_battle(133).unwrap();
        c.submit_move(Side::Player, 0).unwrap();
        assert_eq!(c.settle(), None);
        assert!(c.phase().is_resolving());
    }

    #[test]
    fn test_opponent_turn_uses_policy() {
        let mut c = controller(6).with_policy(Box::new(RandomPolicy));
        c.initialize_battle(1).unwrap();
        assert!(c.take_opponent_turn().is_none());

        c.submit_move(Side::Player, 0).unwrap();
        c.resolve_pending().unwrap();

        let index = c.take_opponent_turn().unwrap();
        let TurnPhase::Resolving(resolution) = c.phase() else {
            panic!("expected a resolving phase, got {:?}", c.phase());
        };
        assert_eq!(resolution.attacker, Side::Opponent);
        assert_eq!(resolution.move_index, index);

        let report = c.resolve_pending().unwrap();
        assert_eq!(report.attacker, Side::Opponent);
        assert_eq!(c.phase(), TurnPhase::PlayerTurn);
    }

    #[test]
    fn test_knockout_ends_battle() {
        let mut c = controller(7);
        c.initialize_battle(94).unwrap();
        c.battle.as_mut().unwrap().opponent.current_health = 1;

        c.submit_move(Side::Player, 1).unwrap();
        let report = c.resolve_pending().unwrap();

        assert!(!report.outcome.survived);
        assert_eq!(report.defender_health, 0);
        assert_eq!(c.phase(), TurnPhase::GameOver);

        let state = c.state().unwrap();
        assert!(state.game_over);
        assert_eq!(state.winner, Some(Side::Player));
        assert!(state.is_consistent());

        assert_eq!(c.submit_move(Side::Player, 0), Err(MoveRejection::GameOver));
        assert_eq!(c.submit_move(Side::Opponent, 0), Err(MoveRejection::GameOver));
    }

    #[test]
    fn test_opponent_can_win() {
        let mut c = controller(9);
        c.initialize_battle(1).unwrap();
        c.submit_move(Side::Player, 0).unwrap();
        c.resolve_pending().unwrap();

        c.battle.as_mut().unwrap().player.current_health = 1;
        c.take_opponent_turn().unwrap();
        c.resolve_pending().unwrap();

        let state = c.state().unwrap();
        assert_eq!(c.phase(), TurnPhase::GameOver);
        assert_eq!(state.winner, Some(Side::Opponent));
        assert!(state.is_consistent());
    }

    #[test]
    fn test_full_battle_always_terminates_consistently() {
        let mut c = controller(10);
        c.initialize_battle(25).unwrap();

        for _ in 0..1000 {
            match c.phase() {
                TurnPhase::PlayerTurn => c.submit_move(Side::Player, 2).unwrap(),
                TurnPhase::OpponentTurn => {
                    c.take_opponent_turn().unwrap();
                }
                TurnPhase::Resolving(_) => {
                    c.resolve_pending().unwrap();
                }
                TurnPhase::GameOver => break,
                TurnPhase::NotStarted => unreachable!(),
            }
            assert!(c.state().unwrap().is_consistent());
        }

        assert_eq!(c.phase(), TurnPhase::GameOver);
    }

    #[test]
    fn test_commentary_for_other_battle_is_dropped() {
        let mut c = controller(11);
        c.initialize_battle(4).unwrap();
        let old = c.battle_id().unwrap();

        c.initialize_battle(4).unwrap();
        assert!(!c.append_commentary(old, "stale".into()));
        assert!(c.state().unwrap().log.is_empty());

        let current = c.battle_id().unwrap();
        assert!(c.append_commentary(current, "fresh".into()));
        assert_eq!(c.state().unwrap().log, vec!["fresh".to_string()]);
    }

    #[test]
    fn test_abandon_discards_battle() {
        let mut c = controller(12);
        c.initialize_battle(4).unwrap();
        c.submit_move(Side::Player, 0).unwrap();

        let id = c.abandon().unwrap();
        assert_eq!(c.phase(), TurnPhase::NotStarted);
        assert!(c.land_strike().is_none());
        assert!(!c.append_commentary(id, "late".into()));
    }

    #[test]
    fn test_reinitialize_resets_health() {
        let mut c = controller(13);
        c.initialize_battle(7).unwrap();
        c.submit_move(Side::Player, 0).unwrap();
        c.resolve_pending().unwrap();

        let state = c.initialize_battle(7).unwrap();
        assert_eq!(state.player.current_health, state.player.max_health);
        assert_eq!(state.opponent.current_health, state.opponent.max_health);
        assert_eq!(c.phase(), TurnPhase::PlayerTurn);
    }

    #[test]
    fn test_strike_commentary_reports_faint() {
        let mut c = controller(14);
        c.initialize_battle(94).unwrap();
        c.battle.as_mut().unwrap().opponent.current_health = 1;
        c.submit_move(Side::Player, 0).unwrap();
        let report = c.resolve_pending().unwrap();

        match report.commentary() {
            CommentaryEvent::Action(action) => {
                assert_eq!(action.attacker, "Gengar");
                assert_eq!(action.move_name, "Lick");
                assert!(action.fainted);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    struct OutOfRange;

    impl OpponentPolicy for OutOfRange {
        fn select_move(
            &mut self,
            _own: &BattleParticipant,
            _target: &BattleParticipant,
            _rng: &mut dyn rand::RngCore,
        ) -> usize {
            99
        }

        fn name(&self) -> &'static str {
            "out_of_range"
        }
    }

    #[test]
    fn test_bad_policy_pick_still_takes_turn() {
        let mut c = controller(15).with_policy(Box::new(OutOfRange));
        c.initialize_battle(25).unwrap();
        c.submit_move(Side::Player, 0).unwrap();
        c.resolve_pending().unwrap();
        assert_eq!(c.phase(), TurnPhase::OpponentTurn);

        let index = c.take_opponent_turn().unwrap();
        assert!(index < c.state().unwrap().opponent.moves.len());
        assert!(c.phase().is_resolving());

        c.resolve_pending().unwrap();
        assert!(matches!(
            c.phase(),
            TurnPhase::PlayerTurn | TurnPhase::GameOver
        ));
    }
}
