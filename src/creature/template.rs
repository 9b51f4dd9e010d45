//! Creature templates - the static definition of a playable creature

use serde::{Deserialize, Serialize};

use crate::core::types::{ElementType, TemplateId};
use crate::creature::moves::Move;

/// Base stats and move list shared by every battle instance of a creature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureTemplate {
    pub id: TemplateId,
    pub name: String,
    pub element: ElementType,
    pub max_health: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub moves: Vec<Move>,
    pub sprite_front: String,
    pub sprite_back: String,
}

impl CreatureTemplate {
    /// Check the stats a battle depends on
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("template {} has no name", self.id));
        }
        if self.max_health == 0 {
            return Err(format!("{} has zero max health", self.name));
        }
        if self.defense == 0 {
            return Err(format!("{} has zero defense", self.name));
        }
        if self.moves.is_empty() {
            return Err(format!("{} knows no moves", self.name));
        }
        if let Some(m) = self.moves.iter().find(|m| m.power == 0) {
            return Err(format!("{}'s move {} has zero power", self.name, m.name));
        }
        Ok(())
    }

    /// Look up a move by name (case-insensitive)
    pub fn find_move(&self, name: &str) -> Option<usize> {
        self.moves
            .iter()
            .position(|m| m.name.eq_ignore_ascii_case(name))
    }
}
