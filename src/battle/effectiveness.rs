//! Type effectiveness lookup
//!
//! The chart is deliberately partial. Any (move, defender) pair that is not
//! listed is neutral.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::ElementType;

/// Damage scaling from move type against defender type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effectiveness {
    #[default]
    Neutral,
    SuperEffective,
}

impl Effectiveness {
    pub fn multiplier(self) -> f64 {
        match self {
            Effectiveness::Neutral => 1.0,
            Effectiveness::SuperEffective => 2.0,
        }
    }
}

impl fmt::Display for Effectiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effectiveness::Neutral => write!(f, "neutral"),
            Effectiveness::SuperEffective => write!(f, "super effective"),
        }
    }
}

/// (move type, defender type) pairs that deal double damage
const SUPER_EFFECTIVE: &[(ElementType, ElementType)] = &[
    (ElementType::Fire, ElementType::Grass),
    (ElementType::Water, ElementType::Fire),
    (ElementType::Electric, ElementType::Water),
    (ElementType::Grass, ElementType::Water),
];

/// Effectiveness of a move of `attack` type against a `defender` type creature
pub fn effectiveness(attack: ElementType, defender: ElementType) -> Effectiveness {
    if SUPER_EFFECTIVE.contains(&(attack, defender)) {
        Effectiveness::SuperEffective
    } else {
        Effectiveness::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ElementType::*;

    #[test]
    fn test_listed_pairs_are_super_effective() {
        assert_eq!(effectiveness(Fire, Grass).multiplier(), 2.0);
        assert_eq!(effectiveness(Water, Fire).multiplier(), 2.0);
        assert_eq!(effectiveness(Electric, Water).multiplier(), 2.0);
        assert_eq!(effectiveness(Grass, Water).multiplier(), 2.0);
    }

    #[test]
    fn test_unlisted_pairs_are_neutral() {
        assert_eq!(effectiveness(Normal, Grass), Effectiveness::Neutral);
        assert_eq!(effectiveness(Normal, Grass).multiplier(), 1.0);
        // Lookup is ordered: the reverse of a listed pair is not implied
        assert_eq!(effectiveness(Grass, Fire), Effectiveness::Neutral);
        assert_eq!(effectiveness(Fire, Water), Effectiveness::Neutral);
        assert_eq!(effectiveness(Ghost, Ghost), Effectiveness::Neutral);
    }
}
