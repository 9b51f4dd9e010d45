//! Creature data - moves, templates and the roster

pub mod moves;
pub mod registry;
pub mod template;

pub use moves::Move;
pub use registry::CreatureRegistry;
pub use template::CreatureTemplate;
