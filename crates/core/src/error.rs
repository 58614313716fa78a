use thiserror::Error;

/// Errors raised while answering an inquiry
#[derive(Debug, Error)]
pub enum InquiryError {
    #[error("LLM configuration error: {0}")]
    Config(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Prompt error: {0}")]
    Prompt(String),
}
