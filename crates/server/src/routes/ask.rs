//! Natural-language inquiry endpoint

use axum::{Json, extract::State, response::IntoResponse};
use claimbeaver_core::{AnswerResponse, Question};

use crate::agent::InquiryAgent;
use crate::error::AppError;

/// POST /ask — Answer a healthcare claims question
///
/// Generates SQL for the question, runs it, and has the model phrase the
/// result as a plain-English answer.
pub async fn ask(
    State(agent): State<InquiryAgent>,
    Json(body): Json<Question>,
) -> Result<impl IntoResponse, AppError> {
    let question = body.question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("question must not be empty".to_string()));
    }

    tracing::info!(question = %question, llm = agent.llm().name(), "Inquiry");

    let response = agent.answer(question).await?;
    Ok(Json(AnswerResponse { response }))
}
