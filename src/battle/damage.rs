//! Damage resolution for a single move use
//!
//! raw = (attack / defense) * power * 0.5 * effectiveness * variance
//! A critical hit multiplies raw by 1.5. The result is floored and never
//! below 1. Nothing here mutates a participant.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    CRITICAL_CHANCE, CRITICAL_MULTIPLIER, DAMAGE_SCALE, MIN_DAMAGE, VARIANCE_MAX, VARIANCE_MIN,
};
use crate::battle::effectiveness::{effectiveness, Effectiveness};
use crate::battle::participant::BattleParticipant;
use crate::creature::Move;

/// The two random draws behind one hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRolls {
    /// Uniform in [0.85, 1.0)
    pub variance: f64,
    pub critical: bool,
}

impl DamageRolls {
    /// No variance loss, no critical
    pub fn steady() -> Self {
        Self {
            variance: 1.0,
            critical: false,
        }
    }
}

/// Result of resolving one move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageOutcome {
    /// Always >= 1
    pub damage: u32,
    pub critical: bool,
    pub effectiveness: Effectiveness,
    /// Whether the defender stays above 0 health once `damage` lands
    pub survived: bool,
}

/// Draw variance first, then the critical roll
pub fn roll_damage<R: Rng + ?Sized>(rng: &mut R) -> DamageRolls {
    let variance = rng.gen_range(VARIANCE_MIN..VARIANCE_MAX);
    let critical = rng.gen::<f64>() < CRITICAL_CHANCE;
    DamageRolls { variance, critical }
}

/// Deterministic half of the resolver
pub fn resolve_with_rolls(
    attacker: &BattleParticipant,
    defender: &BattleParticipant,
    chosen: &Move,
    rolls: DamageRolls,
) -> DamageOutcome {
    let effectiveness = effectiveness(chosen.element, defender.element);

    // Templates are validated with defense > 0; floor anyway so a hand-built
    // participant cannot divide by zero.
    let defense = defender.defense.max(1) as f64;

    let mut raw = (attacker.attack as f64 / defense)
        * chosen.power as f64
        * DAMAGE_SCALE
        * effectiveness.multiplier()
        * rolls.variance;

    if rolls.critical {
        raw *= CRITICAL_MULTIPLIER;
    }

    let damage = (raw.floor() as u32).max(MIN_DAMAGE);

    DamageOutcome {
        damage,
        critical: rolls.critical,
        effectiveness,
        survived: defender.current_health > damage,
    }
}

/// Resolve one move use against `defender`, drawing from `rng`
pub fn resolve_damage<R: Rng + ?Sized>(
    attacker: &BattleParticipant,
    defender: &BattleParticipant,
    chosen: &Move,
    rng: &mut R,
) -> DamageOutcome {
    let rolls = roll_damage(rng);
    resolve_with_rolls(attacker, defender, chosen, rolls)
}
