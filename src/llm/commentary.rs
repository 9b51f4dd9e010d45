//! Battle commentary
//!
//! The turn controller hands each event to a [`Narrator`], which asks the
//! configured [`CommentaryGateway`] for a line in the background and posts
//! the result to a channel. The battle never waits for it. Any failure,
//! timeout or missing credential produces a deterministic fallback line
//! built from the same event.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::core::error::Result;
use crate::core::types::BattleId;
use crate::llm::client::LlmClient;

/// One resolved move, as described to the commentator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSummary {
    pub attacker: String,
    pub move_name: String,
    pub defender: String,
    pub damage: u32,
    pub critical: bool,
    pub fainted: bool,
}

/// Something worth a line in the battle log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentaryEvent {
    Intro { player: String, opponent: String },
    Action(ActionSummary),
}

impl CommentaryEvent {
    /// Line used when the commentator fails or is not configured
    pub fn fallback(&self) -> String {
        match self {
            CommentaryEvent::Intro { .. } => "The battle begins! A fated showdown!".to_string(),
            CommentaryEvent::Action(action) => {
                let mut line = format!(
                    "{} hit {}, dealing {} damage!",
                    action.attacker, action.defender, action.damage
                );
                if action.fainted {
                    line.push_str(&format!(" {} fainted!", action.defender));
                }
                line
            }
        }
    }

    /// Line used when the commentator answers with nothing
    pub fn blank_fallback(&self) -> String {
        match self {
            CommentaryEvent::Intro { .. } => "The battle has begun!".to_string(),
            CommentaryEvent::Action(action) => {
                format!("{} used {}!", action.attacker, action.move_name)
            }
        }
    }
}

/// External text generator for battle flavour text
#[async_trait]
pub trait CommentaryGateway: Send + Sync {
    async fn describe_action(&self, action: &ActionSummary) -> Result<String>;

    async fn describe_intro(&self, player: &str, opponent: &str) -> Result<String>;
}

/// Gateway backed by an LLM completion endpoint
pub struct LlmCommentator {
    client: LlmClient,
    language: String,
}

impl LlmCommentator {
    pub fn new(client: LlmClient, language: impl Into<String>) -> Self {
        Self {
            client,
            language: language.into(),
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are an enthusiastic anime-style announcer for a creature battle. \
             Always answer in {}. Output plain text only, never JSON.",
            self.language
        )
    }
}

#[async_trait]
impl CommentaryGateway for LlmCommentator {
    async fn describe_action(&self, action: &ActionSummary) -> Result<String> {
        self.client
            .complete(&self.system_prompt(), &action_prompt(action, &self.language))
            .await
    }

    async fn describe_intro(&self, player: &str, opponent: &str) -> Result<String> {
        self.client
            .complete(
                &self.system_prompt(),
                &intro_prompt(player, opponent, &self.language),
            )
            .await
    }
}

fn action_prompt(action: &ActionSummary, language: &str) -> String {
    format!(
        "Current battle action:\n\
         Attacker: {}\n\
         Move: {}\n\
         Defender: {}\n\
         Damage dealt: {}\n\
         Critical hit: {}\n\
         Defender fainted: {}\n\n\
         Task: write a very short, enthusiastic, anime-style battle commentary in {} \
         describing this specific action.\n\
         - If it is a critical hit, be very excited.\n\
         - If the defender fainted, announce the knockout dramatically.\n\
         - Keep it under 25 words.\n\
         - Do not output JSON. Just the text.",
        action.attacker,
        action.move_name,
        action.defender,
        action.damage,
        action.critical,
        action.fainted,
        language
    )
}

fn intro_prompt(player: &str, opponent: &str, language: &str) -> String {
    format!(
        "Two creatures are about to battle: {} vs {}.\n\
         Write a one-sentence hype intro in {} for this match-up.",
        player, opponent, language
    )
}

/// A finished commentary line, tagged with the battle it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentaryLine {
    pub battle_id: BattleId,
    pub text: String,
}

/// Fire-and-forget dispatcher between the turn controller and a gateway
#[derive(Clone)]
pub struct Narrator {
    gateway: Option<Arc<dyn CommentaryGateway>>,
    timeout: Duration,
    lines: mpsc::UnboundedSender<CommentaryLine>,
}

impl Narrator {
    /// `gateway = None` means commentary is not configured; every event
    /// then gets its fallback line straight away.
    pub fn new(
        gateway: Option<Arc<dyn CommentaryGateway>>,
        timeout: Duration,
        lines: mpsc::UnboundedSender<CommentaryLine>,
    ) -> Self {
        if gateway.is_none() {
            tracing::warn!("Commentary gateway not configured - using fallback battle log lines");
        }
        Self {
            gateway,
            timeout,
            lines,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.gateway.is_some()
    }

    /// Queue a line for `event`. Returns immediately.
    ///
    /// Must be called from inside a tokio runtime when a gateway is set.
    pub fn narrate(&self, battle_id: BattleId, event: CommentaryEvent) {
        let Some(gateway) = self.gateway.clone() else {
            self.post(battle_id, event.fallback());
            return;
        };

        let timeout = self.timeout;
        let lines = self.lines.clone();
        tokio::spawn(async move {
            let text = describe_with_timeout(gateway.as_ref(), &event, timeout).await;
            // The receiver is gone once the session shuts down
            let _ = lines.send(CommentaryLine { battle_id, text });
        });
    }

    fn post(&self, battle_id: BattleId, text: String) {
        let _ = self.lines.send(CommentaryLine { battle_id, text });
    }
}

/// Ask the gateway once, falling back on error, timeout or blank text
pub async fn describe_with_timeout(
    gateway: &dyn CommentaryGateway,
    event: &CommentaryEvent,
    timeout: Duration,
) -> String {
    let request = async {
        match event {
            CommentaryEvent::Intro { player, opponent } => {
                gateway.describe_intro(player, opponent).await
            }
            CommentaryEvent::Action(action) => gateway.describe_action(action).await,
        }
    };

    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(Ok(_)) => event.blank_fallback(),
        Ok(Err(e)) => {
            tracing::warn!("Commentary request failed: {}", e);
            event.fallback()
        }
        Err(_) => {
            tracing::warn!("Commentary request timed out after {:?}", timeout);
            event.fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ArenaError;

    struct Scripted(&'static str);

    #[async_trait]
    impl CommentaryGateway for Scripted {
        async fn describe_action(&self, _action: &ActionSummary) -> Result<String> {
            Ok(self.0.to_string())
        }

        async fn describe_intro(&self, _player: &str, _opponent: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl CommentaryGateway for Broken {
        async fn describe_action(&self, _action: &ActionSummary) -> Result<String> {
            Err(ArenaError::LlmError("service unavailable".into()))
        }

        async fn describe_intro(&self, _player: &str, _opponent: &str) -> Result<String> {
            Err(ArenaError::LlmError("service unavailable".into()))
        }
    }

    struct Stalled;

    #[async_trait]
    impl CommentaryGateway for Stalled {
        async fn describe_action(&self, _action: &ActionSummary) -> Result<String> {
            std::future::pending().await
        }

        async fn describe_intro(&self, _player: &str, _opponent: &str) -> Result<String> {
            std::future::pending().await
        }
    }

    fn knockout() -> CommentaryEvent {
        CommentaryEvent::Action(ActionSummary {
            attacker: "Pikachu".into(),
            move_name: "Thunderbolt".into(),
            defender: "Squirtle".into(),
            damage: 42,
            critical: true,
            fainted: true,
        })
    }

    #[test]
    fn test_action_fallback_text() {
        assert_eq!(
            knockout().fallback(),
            "Pikachu hit Squirtle, dealing 42 damage! Squirtle fainted!"
        );
        assert_eq!(knockout().blank_fallback(), "Pikachu used Thunderbolt!");
    }

    #[test]
    fn test_prompt_carries_event_data() {
        let CommentaryEvent::Action(action) = knockout() else {
            unreachable!()
        };
        let prompt = action_prompt(&action, "Japanese");
        assert!(prompt.contains("Thunderbolt"));
        assert!(prompt.contains("Critical hit: true"));
        assert!(prompt.contains("Defender fainted: true"));
        assert!(prompt.contains("in Japanese"));
        assert!(intro_prompt("Eevee", "Gengar", "English").contains("Eevee vs Gengar"));
    }

    #[tokio::test]
    async fn test_gateway_text_is_trimmed() {
        let text = describe_with_timeout(
            &Scripted("  What a shock!\n"),
            &knockout(),
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(text, "What a shock!");
    }

    #[tokio::test]
    async fn test_blank_answer_uses_short_line() {
        let text =
            describe_with_timeout(&Scripted("   "), &knockout(), Duration::from_secs(1)).await;
        assert_eq!(text, "Pikachu used Thunderbolt!");

        // An endpoint answering with no choices at all reads as blank text
        let text = describe_with_timeout(&Scripted(""), &knockout(), Duration::from_secs(1)).await;
        assert_eq!(text, "Pikachu used Thunderbolt!");
    }

    #[tokio::test]
    async fn test_failure_uses_fallback() {
        let text = describe_with_timeout(&Broken, &knockout(), Duration::from_secs(1)).await;
        assert_eq!(text, knockout().fallback());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_uses_fallback() {
        let intro = CommentaryEvent::Intro {
            player: "Eevee".into(),
            opponent: "Gengar".into(),
        };
        let text = describe_with_timeout(&Stalled, &intro, Duration::from_millis(50)).await;
        assert_eq!(text, "The battle begins! A fated showdown!");
    }

    #[tokio::test]
    async fn test_unconfigured_narrator_posts_fallback() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let narrator = Narrator::new(None, Duration::from_secs(1), tx);
        assert!(!narrator.is_configured());

        let battle_id = BattleId::new();
        narrator.narrate(battle_id, knockout());

        let line = rx.recv().await.unwrap();
        assert_eq!(line.battle_id, battle_id);
        assert_eq!(line.text, knockout().fallback());
    }

    #[tokio::test]
    async fn test_configured_narrator_posts_in_background() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let narrator = Narrator::new(
            Some(Arc::new(Scripted("Electrifying!"))),
            Duration::from_secs(1),
            tx,
        );

        narrator.narrate(BattleId::new(), knockout());
        assert_eq!(rx.recv().await.unwrap().text, "Electrifying!");
    }
}
