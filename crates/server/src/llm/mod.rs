//! LLM provider selection with backend fallback

pub mod gemini;
pub mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use async_trait::async_trait;
use claimbeaver_core::{ChatMessage, InquiryError};

use crate::config::{LlmConfig, ModelType};

/// Answer returned by every call when no backend could be initialized
pub const UNAVAILABLE_MESSAGE: &str = "ERROR: No LLM service is available. Please make sure LM Studio is running or Google API key is valid.";

/// A chat-completion capable language model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Short backend name for logs and health output
    fn name(&self) -> &str;

    /// False for the inert stub
    fn is_available(&self) -> bool {
        true
    }

    /// Complete without stop sequences
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, InquiryError> {
        self.complete_with_stop(messages, &[]).await
    }

    /// Complete, halting generation at any of `stop`
    async fn complete_with_stop(
        &self,
        messages: &[ChatMessage],
        stop: &[&str],
    ) -> Result<String, InquiryError>;
}

/// The language model backend chosen at startup
#[derive(Clone)]
pub enum LlmProvider {
    OpenAi(OpenAiClient),
    Gemini(GeminiClient),
    /// Neither backend could be built; every call returns [`UNAVAILABLE_MESSAGE`]
    Unavailable,
}

impl LlmProvider {
    /// Build the requested backend, falling back to the other one and finally
    /// to the inert stub. Never fails.
    pub fn initialize(config: &LlmConfig) -> Self {
        let requested = config.model_type;

        let err = match Self::build(requested, config) {
            Ok(provider) => {
                tracing::info!(model_type = %requested, "LLM backend initialized");
                return provider;
            }
            Err(e) => e,
        };

        tracing::error!(model_type = %requested, error = %err, "Error initializing model");
        let fallback = requested.other();
        tracing::info!(model_type = %fallback, "Trying fallback model type");

        match Self::build(fallback, config) {
            Ok(provider) => {
                tracing::info!(model_type = %fallback, "Successfully initialized fallback model");
                provider
            }
            Err(e) => {
                tracing::error!(model_type = %fallback, error = %e, "Error initializing fallback model");
                tracing::warn!(
                    "No LLM backend available; make sure either LM Studio is running or the Google API key is valid"
                );
                LlmProvider::Unavailable
            }
        }
    }

    fn build(kind: ModelType, config: &LlmConfig) -> Result<Self, InquiryError> {
        let model_name = config.model_name.as_deref();
        match kind {
            ModelType::OpenAi => OpenAiClient::new(
                config.openai_api_key.as_deref(),
                model_name,
                config.api_base.as_deref(),
            )
            .map(LlmProvider::OpenAi),
            ModelType::Gemini => GeminiClient::new(config.google_api_key.as_deref(), model_name)
                .map(LlmProvider::Gemini),
        }
    }

    /// Backend in use, `None` for the stub
    pub fn kind(&self) -> Option<ModelType> {
        match self {
            LlmProvider::OpenAi(_) => Some(ModelType::OpenAi),
            LlmProvider::Gemini(_) => Some(ModelType::Gemini),
            LlmProvider::Unavailable => None,
        }
    }
}

#[async_trait]
impl ChatModel for LlmProvider {
    fn name(&self) -> &str {
        match self {
            LlmProvider::OpenAi(_) => "openai",
            LlmProvider::Gemini(_) => "gemini",
            LlmProvider::Unavailable => "unavailable",
        }
    }

    fn is_available(&self) -> bool {
        !matches!(self, LlmProvider::Unavailable)
    }

    async fn complete_with_stop(
        &self,
        messages: &[ChatMessage],
        stop: &[&str],
    ) -> Result<String, InquiryError> {
        let result = match self {
            LlmProvider::OpenAi(client) => client.chat(messages, stop).await,
            LlmProvider::Gemini(client) => client.chat(messages, stop).await,
            LlmProvider::Unavailable => return Ok(UNAVAILABLE_MESSAGE.to_string()),
        };

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(
            "llm_requests_total",
            "provider" => self.name().to_string(),
            "outcome" => outcome
        )
        .increment(1);

        result
    }
}
