//! Opponent move selection
//!
//! Architecture mirrors the battle AI seam: an `OpponentPolicy` trait so the
//! scripted opponent can be swapped without touching the turn controller.
//! Every policy must return an index into the participant's move list.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::battle::effectiveness::effectiveness;
use crate::battle::participant::BattleParticipant;
use crate::core::config::OpponentStyle;

/// Trait for automated move selection
pub trait OpponentPolicy: Send {
    /// Pick a move index for `own` to use against `target`
    ///
    /// `own.moves` is never empty (the registry rejects such templates).
    fn select_move(
        &mut self,
        own: &BattleParticipant,
        target: &BattleParticipant,
        rng: &mut dyn RngCore,
    ) -> usize;

    fn name(&self) -> &'static str;
}

/// Uniform choice with no regard for the situation
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPolicy;

impl OpponentPolicy for RandomPolicy {
    fn select_move(
        &mut self,
        own: &BattleParticipant,
        _target: &BattleParticipant,
        rng: &mut dyn RngCore,
    ) -> usize {
        if own.moves.len() <= 1 {
            return 0;
        }
        rng.gen_range(0..own.moves.len())
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Picks the move with the highest power after type effectiveness
///
/// Ties are broken uniformly so the opponent is not fully predictable.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPolicy;

impl GreedyPolicy {
    fn score(own: &BattleParticipant, index: usize, target: &BattleParticipant) -> f64 {
        let chosen = &own.moves[index];
        chosen.power as f64 * effectiveness(chosen.element, target.element).multiplier()
    }
}

impl OpponentPolicy for GreedyPolicy {
    fn select_move(
        &mut self,
        own: &BattleParticipant,
        target: &BattleParticipant,
        rng: &mut dyn RngCore,
    ) -> usize {
        let best = (0..own.moves.len())
            .map(|i| Self::score(own, i, target))
            .fold(f64::MIN, f64::max);

        let candidates: Vec<usize> = (0..own.moves.len())
            .filter(|&i| Self::score(own, i, target) >= best)
            .collect();

        candidates.choose(rng).copied().unwrap_or(0)
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

/// Policy matching a configured style
pub fn policy_for(style: OpponentStyle) -> Box<dyn OpponentPolicy> {
    match style {
        OpponentStyle::Random => Box::new(RandomPolicy),
        OpponentStyle::Greedy => Box::new(GreedyPolicy),
    }
}
