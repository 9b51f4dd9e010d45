//! Move definitions

use serde::{Deserialize, Serialize};

use crate::core::types::ElementType;

/// A single attack a creature knows
///
/// Moves are defined with the roster and never change during a battle.
/// `accuracy` and `max_uses` are carried for display; the resolver treats
/// every move as a guaranteed hit and does not count uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub name: String,
    pub element: ElementType,
    pub power: u32,
    /// Hit chance in percent
    pub accuracy: u8,
    pub max_uses: u8,
}

impl Move {
    pub fn new(
        name: impl Into<String>,
        element: ElementType,
        power: u32,
        accuracy: u8,
        max_uses: u8,
    ) -> Self {
        Self {
            name: name.into(),
            element,
            power,
            accuracy,
            max_uses,
        }
    }
}
