//! Creature registry - the fixed roster battles are drawn from
//!
//! The built-in roster ships with the binary. A roster can also be loaded
//! from TOML; either way it is validated once and is read-only afterwards.

use serde::Deserialize;
use std::collections::HashSet;

use crate::core::error::{ArenaError, Result};
use crate::core::types::{ElementType, TemplateId};
use crate::creature::moves::Move;
use crate::creature::template::CreatureTemplate;

const SPRITE_BASE_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";

/// Read-only set of creature templates
#[derive(Debug, Clone)]
pub struct CreatureRegistry {
    templates: Vec<CreatureTemplate>,
}

#[derive(Deserialize)]
struct RosterFile {
    creatures: Vec<CreatureTemplate>,
}

impl CreatureRegistry {
    /// Build a registry, rejecting rosters a battle could not run on
    pub fn from_templates(templates: Vec<CreatureTemplate>) -> Result<Self> {
        // A battle needs an opponent distinct from the player's pick
        if templates.len() < 2 {
            return Err(ArenaError::InvalidRoster(format!(
                "need at least 2 creatures, found {}",
                templates.len()
            )));
        }

        let mut seen = HashSet::new();
        for template in &templates {
            if !seen.insert(template.id) {
                return Err(ArenaError::InvalidRoster(format!(
                    "duplicate template id {}",
                    template.id
                )));
            }
            template.validate().map_err(ArenaError::InvalidRoster)?;
        }

        Ok(Self { templates })
    }

    /// Parse a `[[creatures]]` roster from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let roster: RosterFile = toml::from_str(contents)?;
        Self::from_templates(roster.creatures)
    }

    /// The roster that ships with the game
    pub fn builtin() -> Self {
        Self {
            templates: builtin_roster(),
        }
    }

    pub fn templates(&self) -> &[CreatureTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, id: TemplateId) -> Option<&CreatureTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Like [`get`](Self::get) but an unknown id is an error
    pub fn require(&self, id: TemplateId) -> Result<&CreatureTemplate> {
        self.get(id).ok_or(ArenaError::UnknownTemplate(id))
    }

    /// Every template the opponent may be drawn from when the player picks `player_id`
    pub fn opponent_pool(&self, player_id: TemplateId) -> Vec<&CreatureTemplate> {
        self.templates.iter().filter(|t| t.id != player_id).collect()
    }
}

impl Default for CreatureRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[allow(clippy::too_many_arguments)]
fn creature(
    id: TemplateId,
    name: &str,
    element: ElementType,
    max_health: u32,
    attack: u32,
    defense: u32,
    speed: u32,
    moves: Vec<Move>,
) -> CreatureTemplate {
    CreatureTemplate {
        id,
        name: name.to_string(),
        element,
        max_health,
        attack,
        defense,
        speed,
        moves,
        sprite_front: format!("{}/{}.png", SPRITE_BASE_URL, id),
        sprite_back: format!("{}/back/{}.png", SPRITE_BASE_URL, id),
    }
}

fn builtin_roster() -> Vec<CreatureTemplate> {
    use ElementType::*;

    vec![
        creature(
            25,
            "Pikachu",
            Electric,
            95,
            55,
            40,
            90,
            vec![
                Move::new("Thunder Shock", Electric, 40, 100, 30),
                Move::new("Quick Attack", Normal, 40, 100, 30),
                Move::new("Thunderbolt", Electric, 90, 100, 15),
                Move::new("Iron Tail", Steel, 100, 75, 15),
            ],
        ),
        creature(
            4,
            "Charmander",
            Fire,
            99,
            52,
            43,
            65,
            vec![
                Move::new("Ember", Fire, 40, 100, 25),
                Move::new("Scratch", Normal, 40, 100, 35),
                Move::new("Flamethrower", Fire, 90, 100, 15),
                Move::new("Dragon Breath", Dragon, 60, 100, 20),
            ],
        ),
        creature(
            7,
            "Squirtle",
            Water,
            104,
            48,
            65,
            43,
            vec![
                Move::new("Water Gun", Water, 40, 100, 25),
                Move::new("Tackle", Normal, 40, 100, 35),
                Move::new("Bubble Beam", Water, 65, 100, 20),
                Move::new("Bite", Dark, 60, 100, 25),
            ],
        ),
        creature(
            1,
            "Bulbasaur",
            Grass,
            105,
            49,
            49,
            45,
            vec![
                Move::new("Vine Whip", Grass, 45, 100, 25),
                Move::new("Tackle", Normal, 40, 100, 35),
                Move::new("Razor Leaf", Grass, 55, 95, 25),
                Move::new("Seed Bomb", Grass, 80, 100, 15),
            ],
        ),
        creature(
            133,
            "Eevee",
            Normal,
            115,
            55,
            50,
            55,
            vec![
                Move::new("Tackle", Normal, 40, 100, 35),
                Move::new("Quick Attack", Normal, 40, 100, 30),
                Move::new("Swift", Normal, 60, 100, 20),
                Move::new("Bite", Dark, 60, 100, 25),
            ],
        ),
        creature(
            94,
            "Gengar",
            Ghost,
            120,
            65,
            60,
            110,
            vec![
                Move::new("Lick", Ghost, 30, 100, 30),
                Move::new("Shadow Ball", Ghost, 80, 100, 15),
                Move::new("Sludge Bomb", Poison, 90, 100, 10),
                Move::new("Dark Pulse", Dark, 80, 100, 15),
            ],
        ),
    ]
}
