//! Client for the Google Gemini `generateContent` API

use claimbeaver_core::{ChatMessage, InquiryError, Role};
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const TEMPERATURE: f32 = 0.7;

/// Client for Google Gemini
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GeminiClient {
    /// Create a client, failing if no API key is configured
    pub fn new(api_key: Option<&str>, model: Option<&str>) -> Result<Self, InquiryError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                InquiryError::Config("GOOGLE_API_KEY environment variable is not set".to_string())
            })?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: API_BASE.to_string(),
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        })
    }

    /// Point the client at a different API root (proxies, test servers)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send messages and return the first candidate's text
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        stop: &[&str],
    ) -> Result<String, InquiryError> {
        let request = build_request(messages, stop);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| InquiryError::Llm(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if let Ok(api_err) = serde_json::from_str::<ApiError>(&body) {
                return Err(InquiryError::Llm(format!(
                    "Gemini API error ({}): {}",
                    status, api_err.error.message
                )));
            }
            return Err(InquiryError::Llm(format!(
                "Gemini API error ({}): {}",
                status, body
            )));
        }

        let parsed = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| InquiryError::Llm(format!("Failed to parse response: {}", e)))?;

        extract_text(parsed)
    }
}

/// System messages become the system instruction; assistant turns use the `model` role.
fn build_request(messages: &[ChatMessage], stop: &[&str]) -> GenerateRequest {
    let mut contents = Vec::new();
    let mut system_parts = Vec::new();

    for message in messages {
        let part = Part {
            text: message.content.clone(),
        };
        match message.role {
            Role::System => system_parts.push(part),
            Role::User => contents.push(Content {
                role: Some("user"),
                parts: vec![part],
            }),
            Role::Assistant => contents.push(Content {
                role: Some("model"),
                parts: vec![part],
            }),
        }
    }

    GenerateRequest {
        contents,
        system_instruction: (!system_parts.is_empty()).then(|| Content {
            role: None,
            parts: system_parts,
        }),
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            stop_sequences: stop.iter().map(|s| s.to_string()).collect(),
        },
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, InquiryError> {
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| InquiryError::Llm("No candidates in response".to_string()))?;

    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() {
        return Err(InquiryError::Llm("No text content in response".to_string()));
    }
    Ok(text)
}
