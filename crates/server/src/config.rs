//! Server configuration

use std::fmt;
use std::str::FromStr;

/// Which hosted model backend to prefer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// OpenAI-compatible chat completions (OpenAI, LM Studio, vLLM, ...)
    OpenAi,
    /// Google Gemini
    Gemini,
}

impl ModelType {
    /// The backend tried when this one fails to initialize
    pub fn other(self) -> Self {
        match self {
            ModelType::OpenAi => ModelType::Gemini,
            ModelType::Gemini => ModelType::OpenAi,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::OpenAi => f.write_str("openai"),
            ModelType::Gemini => f.write_str("gemini"),
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ModelType::OpenAi),
            "gemini" => Ok(ModelType::Gemini),
            other => Err(format!("Unsupported model type: {other}")),
        }
    }
}

/// LLM backend settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model_type: ModelType,
    /// Overrides the backend's default model
    pub model_name: Option<String>,
    /// Base URL for the OpenAI-compatible backend
    pub api_base: Option<String>,
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model_type: ModelType::Gemini,
            model_name: None,
            api_base: None,
            openai_api_key: None,
            google_api_key: None,
        }
    }
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Schema whose tables are described to the model
    pub database_schema: String,
    /// Sample rows shown per table in the schema description
    pub sample_rows: usize,
    pub result_max_rows: usize,
    pub result_max_cell_chars: usize,
    pub bind_address: String,
    pub cors_origins: Vec<String>,
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = env_or("PORT", "8000");

        let model_type = match std::env::var("LLM_TYPE") {
            Ok(raw) => raw.parse::<ModelType>().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to gemini");
                ModelType::Gemini
            }),
            Err(_) => ModelType::Gemini,
        };

        Self {
            database_url: env_or(
                "DATABASE_URL",
                "host=localhost user=postgres dbname=health_insurance_enquiry",
            ),
            database_schema: env_or("DATABASE_SCHEMA", "public"),
            sample_rows: env_parse("SCHEMA_SAMPLE_ROWS", 3),
            result_max_rows: env_parse("RESULT_MAX_ROWS", 100),
            result_max_cell_chars: env_parse("RESULT_MAX_CELL_CHARS", 300),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| format!("0.0.0.0:{port}")),
            cors_origins: parse_origins(&env_or("CORS_ORIGINS", "*")),
            llm: LlmConfig {
                model_type,
                model_name: env_opt("LLM_MODEL_NAME"),
                api_base: env_opt("LLM_API_BASE"),
                openai_api_key: env_opt("OPENAI_API_KEY"),
                google_api_key: env_opt("GOOGLE_API_KEY"),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Unset and empty are treated the same
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default, "Invalid number, using default");
            default
        }),
        Err(_) => default,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}
