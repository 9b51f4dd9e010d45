pub mod config;
pub mod error;
pub mod types;

pub use config::{ArenaConfig, OpponentStyle};
pub use error::{ArenaError, Result};
pub use types::{BattleId, ElementType, Side, TemplateId};
