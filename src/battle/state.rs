//! Battle state - the aggregate owned by the turn controller
//!
//! Presenters only ever see this through [`BattleSnapshot`].

use serde::{Deserialize, Serialize};

use crate::battle::damage::DamageOutcome;
use crate::battle::participant::BattleParticipant;
use crate::core::types::{BattleId, Side};

/// A move that has been accepted and is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub attacker: Side,
    pub move_index: usize,
    /// Set once damage has been applied to the defender
    pub landed: Option<DamageOutcome>,
}

/// Turn state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    NotStarted,
    PlayerTurn,
    OpponentTurn,
    Resolving(Resolution),
    GameOver,
}

impl TurnPhase {
    /// The waiting phase for `side`'s turn
    pub fn turn_of(side: Side) -> Self {
        match side {
            Side::Player => TurnPhase::PlayerTurn,
            Side::Opponent => TurnPhase::OpponentTurn,
        }
    }

    /// Side allowed to submit a move right now, if any
    pub fn awaiting(&self) -> Option<Side> {
        match self {
            TurnPhase::PlayerTurn => Some(Side::Player),
            TurnPhase::OpponentTurn => Some(Side::Opponent),
            _ => None,
        }
    }

    pub fn is_resolving(&self) -> bool {
        matches!(self, TurnPhase::Resolving(_))
    }
}

/// Complete battle state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    pub battle_id: BattleId,
    pub player: BattleParticipant,
    pub opponent: BattleParticipant,
    pub turn: Side,
    /// Commentary lines in display order
    pub log: Vec<String>,
    pub game_over: bool,
    pub winner: Option<Side>,
}

impl BattleState {
    pub fn new(player: BattleParticipant, opponent: BattleParticipant) -> Self {
        Self {
            battle_id: BattleId::new(),
            player,
            opponent,
            turn: Side::Player,
            log: Vec::new(),
            game_over: false,
            winner: None,
        }
    }

    pub fn participant(&self, side: Side) -> &BattleParticipant {
        match side {
            Side::Player => &self.player,
            Side::Opponent => &self.opponent,
        }
    }

    /// Attacker (read-only) and defender (mutable) for a strike by `attacker`
    pub fn combatants_mut(
        &mut self,
        attacker: Side,
    ) -> (&BattleParticipant, &mut BattleParticipant) {
        match attacker {
            Side::Player => (&self.player, &mut self.opponent),
            Side::Opponent => (&self.opponent, &mut self.player),
        }
    }

    /// Mark the battle won by `winner`
    pub fn finish(&mut self, winner: Side) {
        self.game_over = true;
        self.winner = Some(winner);
    }

    /// Winner is set iff the game is over and exactly the loser has fainted
    pub fn is_consistent(&self) -> bool {
        match (self.game_over, self.winner) {
            (false, None) => true,
            (true, Some(winner)) => {
                self.participant(winner.other()).is_fainted()
                    && !self.participant(winner).is_fainted()
            }
            _ => false,
        }
    }
}

/// Read-only view handed to presenters after every transition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub phase: TurnPhase,
    pub battle: Option<BattleState>,
}

impl BattleSnapshot {
    pub fn to_json(&self) -> crate::core::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::CreatureRegistry;

    fn state() -> BattleState {
        let registry = CreatureRegistry::builtin();
        BattleState::new(
            BattleParticipant::from_template(registry.get(4).unwrap()),
            BattleParticipant::from_template(registry.get(1).unwrap()),
        )
    }

    #[test]
    fn test_new_state_is_consistent() {
        let s = state();
        assert_eq!(s.turn, Side::Player);
        assert!(s.log.is_empty());
        assert!(!s.game_over);
        assert!(s.is_consistent());
    }

    #[test]
    fn test_winner_requires_fainted_loser() {
        let mut s = state();
        s.finish(Side::Player);
        assert!(!s.is_consistent());

        s.opponent.apply_damage(u32::MAX);
        assert!(s.is_consistent());
    }

    #[test]
    fn test_combatants_mut_targets_other_side() {
        let mut s = state();
        let (attacker, defender) = s.combatants_mut(Side::Opponent);
        assert_eq!(attacker.name, "Bulbasaur");
        defender.apply_damage(10);
        assert_eq!(s.player.current_health, s.player.max_health - 10);
    }

    #[test]
    fn test_phase_awaiting() {
        assert_eq!(TurnPhase::PlayerTurn.awaiting(), Some(Side::Player));
        assert_eq!(TurnPhase::turn_of(Side::Opponent), TurnPhase::OpponentTurn);
        assert_eq!(TurnPhase::GameOver.awaiting(), None);
        assert_eq!(TurnPhase::NotStarted.awaiting(), None);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = BattleSnapshot {
            phase: TurnPhase::PlayerTurn,
            battle: Some(state()),
        };
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"phase\":\"player_turn\""));
        assert!(json.contains("Charmander"));
    }
}
