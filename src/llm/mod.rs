//! LLM-backed battle commentary

pub mod client;
pub mod commentary;

pub use client::{LlmClient, LlmSettings, Provider};
pub use commentary::{
    ActionSummary, CommentaryEvent, CommentaryGateway, CommentaryLine, LlmCommentator, Narrator,
};
