//! Battle system - one-on-one turn-based creature battles
//!
//! The player picks a move, the scripted opponent answers, and the first
//! creature to reach 0 health loses. Damage rolls and turn order live here;
//! presenters only read snapshots and submit moves.

pub mod constants;
pub mod controller;
pub mod damage;
pub mod effectiveness;
pub mod opponent;
pub mod participant;
pub mod session;
pub mod state;

// Re-exports for convenient access
pub use constants::*;
pub use controller::{MoveRejection, StrikeReport, TurnController};
pub use damage::{resolve_damage, resolve_with_rolls, roll_damage, DamageOutcome, DamageRolls};
pub use effectiveness::{effectiveness, Effectiveness};
pub use opponent::{policy_for, GreedyPolicy, OpponentPolicy, RandomPolicy};
pub use participant::BattleParticipant;
pub use session::{BattleSession, MoveResult, SessionHandle};
pub use state::{BattleSnapshot, BattleState, Resolution, TurnPhase};
