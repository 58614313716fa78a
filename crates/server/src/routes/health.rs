//! Health check endpoint

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::agent::InquiryAgent;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    llm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// GET /health - Check database connectivity and report the LLM backend in use
pub async fn check(State(agent): State<InquiryAgent>) -> impl IntoResponse {
    let llm = agent.llm().name().to_string();

    match agent.database().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                llm,
                reason: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    llm,
                    reason: Some(e.to_string()),
                }),
            )
        }
    }
}
