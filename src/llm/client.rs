//! HTTP client for the commentary model
//!
//! Talks to either the Anthropic messages API or any OpenAI-compatible
//! chat completions endpoint (DeepSeek, local servers, etc). The provider
//! is picked from the endpoint URL. Replies are plain text; the model
//! never decides anything about the battle itself.

use crate::core::error::{ArenaError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Commentary lines are a sentence or two
const COMMENTARY_MAX_TOKENS: u32 = 256;

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Wire format spoken by the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAiCompatible,
}

impl Provider {
    pub fn from_url(url: &str) -> Self {
        if url.contains("anthropic.com") {
            Provider::Anthropic
        } else {
            Provider::OpenAiCompatible
        }
    }
}

/// Where to send requests and as whom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
}

impl LlmSettings {
    /// Settings with the default endpoint and model. A blank key is rejected.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ArenaError::LlmError("API key is empty".into()));
        }
        Ok(Self {
            api_key,
            api_url: DEFAULT_API_URL.into(),
            model: DEFAULT_MODEL.into(),
        })
    }

    /// Read `LLM_API_KEY` (required), `LLM_API_URL` and `LLM_MODEL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| ArenaError::LlmError("LLM_API_KEY not set".into()))?;
        let mut settings = Self::new(api_key)?;
        if let Ok(url) = std::env::var("LLM_API_URL") {
            settings.api_url = url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            settings.model = model;
        }
        Ok(settings)
    }
}

/// Async client for single-turn text completions
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    settings: LlmSettings,
    provider: Provider,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: Client::new(),
            provider: Provider::from_url(&settings.api_url),
            settings,
        }
    }

    pub fn from_env() -> Result<Self> {
        LlmSettings::from_env().map(Self::new)
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Send one system + user exchange and return the reply text
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = CompletionRequest::build(self.provider, &self.settings.model, system, user);

        let request = self.http.post(&self.settings.api_url).json(&body);
        let request = match self.provider {
            Provider::Anthropic => request
                .header("x-api-key", &self.settings.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            Provider::OpenAiCompatible => request.bearer_auth(&self.settings.api_key),
        };

        let response = request.send().await.map_err(llm_error)?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ArenaError::LlmError(format!("API error {}: {}", status, detail)));
        }

        // No content blocks or choices is an empty answer, not a failure
        let reply: CompletionResponse = response.json().await.map_err(llm_error)?;
        Ok(reply.into_text())
    }
}

fn llm_error(e: reqwest::Error) -> ArenaError {
    ArenaError::LlmError(e.to_string())
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum CompletionRequest<'a> {
    Anthropic {
        model: &'a str,
        max_tokens: u32,
        system: &'a str,
        messages: Vec<Message<'a>>,
    },
    OpenAi {
        model: &'a str,
        max_tokens: u32,
        messages: Vec<Message<'a>>,
    },
}

impl<'a> CompletionRequest<'a> {
    fn build(provider: Provider, model: &'a str, system: &'a str, user: &'a str) -> Self {
        let user = Message {
            role: "user",
            content: user,
        };
        match provider {
            Provider::Anthropic => CompletionRequest::Anthropic {
                model,
                max_tokens: COMMENTARY_MAX_TOKENS,
                system,
                messages: vec![user],
            },
            // The system prompt travels as the first chat message
            Provider::OpenAiCompatible => CompletionRequest::OpenAi {
                model,
                max_tokens: COMMENTARY_MAX_TOKENS,
                messages: vec![
                    Message {
                        role: "system",
                        content: system,
                    },
                    user,
                ],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CompletionResponse {
    Anthropic { content: Vec<TextBlock> },
    OpenAi { choices: Vec<Choice> },
}

#[derive(Debug, Deserialize)]
struct TextBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl CompletionResponse {
    fn into_text(self) -> String {
        let text = match self {
            CompletionResponse::Anthropic { content } => content.into_iter().next().map(|b| b.text),
            CompletionResponse::OpenAi { choices } => {
                choices.into_iter().next().map(|c| c.message.content)
            }
        };
        text.unwrap_or_default()
    }
}
