//! Pocket Arena - turn-based creature battles with generated commentary

pub mod battle;
pub mod core;
pub mod creature;
pub mod llm;
