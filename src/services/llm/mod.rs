//! Model client: one `ModelProvider` trait with a chat-completions adapter
//! (Hugging Face router, Groq, xAI Grok, OpenAI) and a Gemini adapter, plus the
//! candidate-model walk shared by the report client and the analyzer.

pub mod chat;
pub mod gemini;
pub mod parse;

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::AiSettings;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single prompt as sent to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Sends one prompt to one model and returns the raw model text.
pub trait ModelProvider: Send + Sync {
    fn name(&self) -> &str;

    fn send<'a>(&'a self, model: &'a str, prompt: &'a Prompt)
        -> BoxFuture<'a, Result<String, LlmError>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("{0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned {status}: {message}")]
    Http { status: u16, message: String },

    /// A 2xx response whose body is an error payload.
    #[error("provider rejected the request: {0}")]
    Rejected(String),

    #[error("unparseable model output: {0}")]
    Unparseable(String),
}

impl LlmError {
    /// Whether the next candidate model should be tried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, message } => {
                *status >= 500 || *status == 404 || is_model_not_found(message)
            }
            _ => false,
        }
    }

    /// Whether the provider produced an HTTP response at all.
    pub fn reached_provider(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Rejected(_) | Self::Unparseable(_)
        )
    }
}

pub fn is_model_not_found(message: &str) -> bool {
    let normalized = message.to_lowercase();
    normalized.contains("model not found") || normalized.contains("unknown model")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    HuggingFace,
    Groq,
    Grok,
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HuggingFace => "huggingface",
            Self::Groq => "groq",
            Self::Grok => "grok",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    /// Display name used in user-facing notes.
    pub fn label(&self) -> &'static str {
        match self {
            Self::HuggingFace => "Hugging Face",
            Self::Groq => "Groq",
            Self::Grok => "Grok",
            Self::OpenAi => "OpenAI",
            Self::Gemini => "Gemini",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::HuggingFace => "https://router.huggingface.co/v1/chat/completions",
            Self::Groq => "https://api.groq.com/openai/v1/chat/completions",
            Self::Grok => "https://api.x.ai/v1/chat/completions",
            Self::OpenAi => "https://api.openai.com/v1/chat/completions",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn default_models(&self) -> &'static [&'static str] {
        match self {
            Self::HuggingFace => &[
                "Qwen/Qwen2.5-72B-Instruct",
                "mistralai/Mixtral-8x7B-Instruct-v0.1",
            ],
            Self::Groq => &["llama-3.1-8b-instant"],
            Self::Grok => &["grok-2-latest"],
            Self::OpenAi => &["gpt-4o-mini"],
            Self::Gemini => &["gemini-2.0-flash"],
        }
    }

    /// Vendor-specific key variable consulted when `AI_API_KEY` is unset.
    pub fn key_env_var(&self) -> &'static str {
        match self {
            Self::HuggingFace => "HF_API_KEY",
            Self::Groq => "GROQ_API_KEY",
            Self::Grok => "XAI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn model_env_var(&self) -> &'static str {
        match self {
            Self::HuggingFace => "HF_MODEL",
            Self::Groq => "GROQ_MODEL",
            Self::Grok => "XAI_MODEL",
            Self::OpenAi => "OPENAI_MODEL",
            Self::Gemini => "GEMINI_MODEL",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hugging_face" | "hf" => Ok(Self::HuggingFace),
            "groq" => Ok(Self::Groq),
            "grok" | "xai" | "x.ai" => Ok(Self::Grok),
            "openai" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(format!("unknown AI provider: {}", other)),
        }
    }
}

/// Successful answer from one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub model: String,
    pub text: String,
}

/// Every candidate failed (or none was tried).
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct CandidateFailure {
    pub error: LlmError,
    pub reached_provider: bool,
}

pub struct LlmClient {
    provider: Arc<dyn ModelProvider>,
    candidates: Vec<String>,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn ModelProvider>, candidates: Vec<String>) -> Self {
        Self { provider, candidates }
    }

    /// Build the configured provider. Fails with a `Config` error carrying a
    /// remediation hint when no key or no model is available.
    pub fn from_settings(ai: &AiSettings) -> Result<Self, LlmError> {
        let api_key = ai.api_key().ok_or_else(|| {
            LlmError::Config(format!(
                "Missing API key for {}. Set AI_API_KEY or {} in the environment or .env file.",
                ai.provider.label(),
                ai.provider.key_env_var()
            ))
        })?;

        let candidates = ai.candidate_models();
        if candidates.is_empty() {
            return Err(LlmError::Config(
                "No AI model configured. Set AI_MODEL or AI_MODEL_FALLBACKS.".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(ai.connect_timeout_secs))
            .timeout(Duration::from_secs(ai.timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = ai.endpoint();
        let provider: Arc<dyn ModelProvider> = match ai.provider {
            ProviderKind::Gemini => Arc::new(gemini::GeminiProvider::new(
                client,
                endpoint,
                api_key.to_string(),
            )),
            kind => Arc::new(chat::ChatCompletions::new(
                client,
                endpoint,
                api_key.to_string(),
                kind.label(),
            )),
        };

        Ok(Self::new(provider, candidates))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Try each candidate model in order. Network errors, 5xx and
    /// "model not found" move on to the next candidate; anything else stops.
    pub async fn complete(&self, prompt: &Prompt) -> Result<Completion, CandidateFailure> {
        let mut last_error = LlmError::Config("No candidate models configured.".to_string());
        let mut reached_provider = false;

        for model in &self.candidates {
            match self.provider.send(model, prompt).await {
                Ok(text) => {
                    log::debug!("{} answered with model {}", self.provider.name(), model);
                    return Ok(Completion {
                        model: model.clone(),
                        text,
                    });
                }
                Err(e) => {
                    log::warn!("{} model {} failed: {}", self.provider.name(), model, e);
                    reached_provider |= e.reached_provider();
                    let retry = e.is_retryable();
                    last_error = e;
                    if !retry {
                        break;
                    }
                }
            }
        }

        Err(CandidateFailure {
            error: last_error,
            reached_provider,
        })
    }
}

/// Ordered, de-duplicated candidate list: primary, configured fallbacks, then
/// provider defaults. Blank and placeholder names are dropped.
pub fn candidate_models(
    primary: Option<&str>,
    fallbacks: &[String],
    defaults: &[&str],
) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    let all = primary
        .into_iter()
        .chain(fallbacks.iter().map(String::as_str))
        .chain(defaults.iter().copied());

    for name in all {
        let name = name.trim();
        if name.is_empty() || crate::settings::is_placeholder(name) {
            continue;
        }
        if !models.iter().any(|m| m == name) {
            models.push(name.to_string());
        }
    }
    models
}
