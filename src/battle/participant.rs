//! Battle participants - one side's live creature

use serde::{Deserialize, Serialize};

use crate::core::types::{ElementType, TemplateId};
use crate::creature::{CreatureTemplate, Move};

/// Mutable copy of a template for the duration of one battle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleParticipant {
    pub template_id: TemplateId,
    pub name: String,
    pub element: ElementType,
    pub max_health: u32,
    pub current_health: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub moves: Vec<Move>,
    pub sprite_front: String,
    pub sprite_back: String,
}

impl BattleParticipant {
    /// Fresh participant at full health
    pub fn from_template(template: &CreatureTemplate) -> Self {
        Self {
            template_id: template.id,
            name: template.name.clone(),
            element: template.element,
            max_health: template.max_health,
            current_health: template.max_health,
            attack: template.attack,
            defense: template.defense,
            speed: template.speed,
            moves: template.moves.clone(),
            sprite_front: template.sprite_front.clone(),
            sprite_back: template.sprite_back.clone(),
        }
    }

    /// Subtract damage, flooring at 0. Returns the new health.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        self.current_health = self.current_health.saturating_sub(amount);
        self.current_health
    }

    pub fn is_fainted(&self) -> bool {
        self.current_health == 0
    }

    /// Remaining health as a fraction of max (0.0 - 1.0)
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.current_health as f32 / self.max_health as f32
    }
}
