use thiserror::Error;

use crate::core::types::TemplateId;

#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("Unknown creature template: {0}")]
    UnknownTemplate(TemplateId),

    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Battle session is closed")]
    SessionClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ArenaError>;
