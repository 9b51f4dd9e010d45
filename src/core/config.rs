//! Arena configuration with documented constants
//!
//! The pacing delays exist only so a presenter has time to animate. A
//! headless run sets them all to zero and the battle logic is unaffected.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::core::error::{ArenaError, Result};

/// How the automated side picks its moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpponentStyle {
    /// Uniform choice among all moves
    #[default]
    Random,
    /// Prefers the move with the highest effective power
    Greedy,
}

/// Configuration for a battle session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    // === PACING ===
    /// Pause between a move being chosen and its damage landing (ms)
    ///
    /// The attacker's lunge animation plays during this window.
    pub strike_delay_ms: u64,

    /// Pause after damage lands before the turn passes (ms)
    ///
    /// Covers the defender's shake animation.
    pub recovery_delay_ms: u64,

    /// Pause before the automated side acts once its turn begins (ms)
    pub opponent_delay_ms: u64,

    // === COMMENTARY ===
    /// Upper bound on a single commentary request (ms)
    ///
    /// On expiry the fallback line is logged instead.
    pub commentary_timeout_ms: u64,

    /// Language the commentator is asked to write in
    pub commentary_language: String,

    // === OPPONENT ===
    /// Move selection policy for the automated side
    pub opponent_style: OpponentStyle,

    /// Seed for the battle RNG (random when absent)
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            strike_delay_ms: 300,
            recovery_delay_ms: 600,
            opponent_delay_ms: 1500,
            commentary_timeout_ms: 8000,
            commentary_language: "English".to_string(),
            opponent_style: OpponentStyle::Random,
            seed: None,
        }
    }
}

impl ArenaConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Config with every pacing delay collapsed to zero
    pub fn headless() -> Self {
        Self {
            strike_delay_ms: 0,
            recovery_delay_ms: 0,
            opponent_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn strike_delay(&self) -> Duration {
        Duration::from_millis(self.strike_delay_ms)
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_delay_ms)
    }

    pub fn opponent_delay(&self) -> Duration {
        Duration::from_millis(self.opponent_delay_ms)
    }

    pub fn commentary_timeout(&self) -> Duration {
        Duration::from_millis(self.commentary_timeout_ms)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.commentary_timeout_ms == 0 {
            return Err("commentary_timeout_ms must be positive".into());
        }

        if self.commentary_language.trim().is_empty() {
            return Err("commentary_language must not be empty".into());
        }

        Ok(())
    }

    /// Parse and validate a config from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ArenaConfig = toml::from_str(contents)?;
        config.validate().map_err(ArenaError::InvalidConfig)?;
        Ok(config)
    }

    /// Load a config file, falling back to defaults when it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
