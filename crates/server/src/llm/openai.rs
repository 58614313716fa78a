//! Client for OpenAI-compatible chat completion APIs (OpenAI, LM Studio, vLLM)

use claimbeaver_core::{ChatMessage, InquiryError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "http://localhost:1234/v1";
pub const DEFAULT_MODEL: &str = "llama-3.2-3b-instruct";

/// Key value meaning "local server, no key needed"
const NO_KEY_SENTINEL: &str = "lm-studio";
/// Placeholder sent in place of the sentinel; local servers accept any non-empty key
const NO_KEY_PLACEHOLDER: &str = "sk-no-key-required";

const TEMPERATURE: f32 = 0.7;

/// Client for an OpenAI-compatible `/chat/completions` endpoint
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

/// Request body for the chat completions API
#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [&'a str]>,
}

/// Response from the chat completions API
#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Error detail returned by OpenAI-compatible servers
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiClient {
    /// Create a client, failing if no API key is configured
    pub fn new(
        api_key: Option<&str>,
        model: Option<&str>,
        api_base: Option<&str>,
    ) -> Result<Self, InquiryError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                InquiryError::Config("OPENAI_API_KEY environment variable is not set".to_string())
            })?;

        let api_key = if api_key.eq_ignore_ascii_case(NO_KEY_SENTINEL) {
            NO_KEY_PLACEHOLDER
        } else {
            api_key
        };

        Ok(Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            api_base: api_base
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send messages and return the first choice's text
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        stop: &[&str],
    ) -> Result<String, InquiryError> {
        let request = ApiRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            stop: (!stop.is_empty()).then_some(stop),
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| InquiryError::Llm(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if let Ok(api_err) = serde_json::from_str::<ApiError>(&body) {
                return Err(InquiryError::Llm(format!(
                    "OpenAI API error ({}): {}",
                    status, api_err.error.message
                )));
            }
            return Err(InquiryError::Llm(format!(
                "OpenAI API error ({}): {}",
                status, body
            )));
        }

        let parsed = response
            .json::<ApiResponse>()
            .await
            .map_err(|e| InquiryError::Llm(format!("Failed to parse response: {}", e)))?;

        extract_text(parsed)
    }
}

fn extract_text(response: ApiResponse) -> Result<String, InquiryError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| InquiryError::Llm("No text content in response".to_string()))
}
